pub mod change_hook;
pub mod change_tracker;
pub mod error;
