//! Clients for the exchange REST API.

pub mod private;

pub use private::PrivateClient;
pub use reqwest::Method;
