mod channel;

pub use channel::{ChannelHub, ChannelTransport, DropSwitch};
