mod client;
mod error;
mod logger;
mod protocol;
mod types;

pub use client::{
    KronotermClient, KronotermClientBuilder, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL,
};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use protocol::Endpoint;
pub use types::*;
