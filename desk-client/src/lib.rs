//! Desk Client - typed gateway to the hosted restaurant backend
//!
//! Provides the [`RemoteGateway`] and [`AuthGateway`] contracts plus two
//! implementations:
//! - [`RestGateway`]: PostgREST / GoTrue over HTTP, with a polling change feed
//! - [`InMemoryGateway`]: in-process backend for tests and offline demos

pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod memory;
pub mod rest;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use filter::{Page, QueueFilter, TableFilter, TableOrder};
pub use gateway::{AuthGateway, AuthSession, AuthUser, ChangeFeed, RemoteGateway};
pub use memory::InMemoryGateway;
pub use rest::RestGateway;
