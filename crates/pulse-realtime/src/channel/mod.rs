//! Channel naming and pattern matching.

pub mod name;
pub mod pattern;

pub use name::{ChannelFamily, ChannelName};
pub use pattern::ChannelPattern;
