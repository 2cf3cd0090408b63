//! Media server backend abstraction for Emby Orchestrator.
//!
//! Defines the capability surface every backend handle exposes
//! ([`MediaBackend`]), the descriptor type backends are configured from,
//! a unified error taxonomy, and the built-in HTTP implementation for
//! Emby-compatible servers.

mod descriptor;
mod emby;
mod error;
mod factory;
mod traits;
mod types;

pub use descriptor::{load_descriptors, BackendDescriptor, DescriptorError};
pub use emby::EmbyBackend;
pub use error::{BackendError, Result};
pub use factory::create_backend;
pub use traits::MediaBackend;
pub use types::{CreatedAccount, FavoriteItem, RemoteUser};
