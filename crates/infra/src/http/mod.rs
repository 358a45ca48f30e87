//! HTTP transport shared by the session clients.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
