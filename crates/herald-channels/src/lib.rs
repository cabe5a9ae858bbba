//! # Herald Channels
//! Transport implementations for the broadcast engine.

pub mod onebot;

pub use onebot::{GroupInfo, OneBotChannel};
