pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod service;
pub mod types;

pub use api::rest::RestClient;
pub use config::Config;
pub use error::SeedError;
