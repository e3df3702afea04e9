
pub use health::Health;
pub use weapon::Weapon;
