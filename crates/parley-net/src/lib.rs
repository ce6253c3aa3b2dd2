// HTTP plumbing between the parley components and the chat backend.

pub mod backend;
pub mod client;
pub mod error;
pub mod signal;

pub use backend::{Backend, HttpBackend};
pub use client::{ApiClient, Announce};
pub use error::ApiError;
pub use signal::ErrorSignal;
