//! dYdX v3 Core Library
//!
//! Asset tables, quantum conversion, StarkEx order signature payloads and the
//! authenticated REST boundary for the dYdX v3 perpetuals exchange.

pub mod api;
pub mod config;
pub mod error;
pub mod starkex;
pub mod types;

pub use error::{Error, ErrorKind, Result};
