#![doc = include_str!("../README.md")]

#[cfg(feature = "client")]
pub mod backend;
pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
#[cfg(feature = "client")]
pub mod resolve;
#[cfg(feature = "client")]
pub mod store;
#[cfg(feature = "client")]
pub mod transport;
pub mod types;

// Re-exports for convenient access
#[cfg(feature = "client")]
pub use backend::{ApiConfig, TokenClient};
pub use error::Error;
#[cfg(feature = "client")]
pub use resolve::{Resolution, Resolved, ResolveFailure, SessionResolver};
#[cfg(feature = "client")]
pub use store::{CredentialStore, Subscription};
#[cfg(feature = "client")]
pub use transport::ApiClient;
pub use types::{AccessToken, Authenticated, RefreshToken, Session, UserId, UserProfile};
