pub mod alpaca;
pub mod client;
pub mod error;

pub mod test_support;

pub use alpaca::{AlpacaClient, AlpacaCredentials};
pub use client::Brokerage;
pub use error::BrokerError;
