//! Core domain types.

pub mod asset;
pub mod order;

pub use asset::*;
pub use order::*;
