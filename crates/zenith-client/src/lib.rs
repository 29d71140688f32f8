//! Reqwest-based client implementing the `ZenithSource` seam from
//! `moneta-core` against a live Zenith instance.

pub mod client;
pub mod error;
pub mod types;

pub use client::ZenithClient;
pub use error::{Result, ZenithClientError};
