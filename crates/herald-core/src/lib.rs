//! # Herald Core
//! Shared foundation for the Herald broadcast engine:
//! error type, configuration, core data types, and the transport trait.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::HeraldConfig;
pub use error::{HeraldError, Result};
pub use traits::Transport;
pub use types::{Payload, PayloadId, RecipientId};
