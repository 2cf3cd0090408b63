//! Backend factory functions.

use std::sync::Arc;

use crate::descriptor::BackendDescriptor;
use crate::emby::EmbyBackend;
use crate::error::Result;
use crate::traits::MediaBackend;

/// Creates a [`MediaBackend`] handle from the given descriptor.
///
/// Construction is local and synchronous; no network call is made. The
/// returned handle is wrapped in `Arc<dyn MediaBackend>` for sharing across
/// async tasks.
pub fn create_backend(descriptor: &BackendDescriptor) -> Result<Arc<dyn MediaBackend>> {
    Ok(Arc::new(EmbyBackend::new(descriptor)?))
}
