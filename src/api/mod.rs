pub mod rest;

pub use rest::{Filter, RestClient};
