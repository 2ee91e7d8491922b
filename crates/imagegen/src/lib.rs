//! Client for the external image generation API.
//!
//! Provides the [`JobClient`](client::JobClient) trait the scheduler
//! drives (submit, poll, download), typed status responses, and the
//! reqwest-backed [`ImageApi`](api::ImageApi) implementation.

pub mod api;
pub mod client;
pub mod error;
pub mod messages;

pub use api::ImageApi;
pub use client::JobClient;
pub use error::JobClientError;
