//! # vigil-remote
//!
//! Contract for the hosted realtime database: a path-addressed,
//! subscribable JSON store. The application only ever talks to the
//! [`RemoteStore`] trait; production builds plug in the hosted backend,
//! tests and offline development use [`MemoryRemote`].

pub mod memory;
pub mod paths;
pub mod store;

mod error;

pub use error::RemoteError;
pub use memory::MemoryRemote;
pub use store::{RemoteStore, Subscription};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RemoteError>;
