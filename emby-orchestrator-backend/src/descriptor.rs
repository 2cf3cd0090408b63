//! Backend descriptor configuration.
//!
//! A descriptor is the static configuration of one media server backend.
//! Descriptors are loaded once at startup, validated, and immutable at
//! runtime; the set of descriptors defines the fleet.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration of a single media server backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique slug identifying the backend (e.g. `anime`, `movie`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Internal API base URL.
    pub base_url: String,
    /// API key used to authenticate against the backend.
    pub api_key: String,
    /// Public access line shown to users.
    pub public_line: String,
    /// Optional dedicated line for whitelisted users.
    #[serde(default)]
    pub vip_line: Option<String>,
    /// Whether the backend participates in orchestration.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Validation error for a descriptor set.
#[derive(Debug, Clone, Error)]
pub enum DescriptorError {
    /// Id is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid backend id '{0}': must be alphanumeric, '_' or '-'")]
    InvalidId(String),

    /// Base URL does not start with `http://` or `https://`.
    #[error("invalid base url for backend '{id}': {url}")]
    InvalidUrl {
        /// Backend id.
        id: String,
        /// Offending URL.
        url: String,
    },

    /// The same id appears more than once in a descriptor set.
    #[error("duplicate backend id '{0}'")]
    DuplicateId(String),

    /// The configuration document could not be parsed.
    #[error("failed to parse backend config: {0}")]
    Parse(String),
}

impl BackendDescriptor {
    /// Validate id and URL format, normalizing the URL in place.
    ///
    /// Trailing slashes are stripped from `base_url` so request paths can be
    /// appended unconditionally.
    pub fn validate(&mut self) -> Result<(), DescriptorError> {
        let id_ok = !self.id.is_empty()
            && self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !id_ok {
            return Err(DescriptorError::InvalidId(self.id.clone()));
        }

        self.base_url = self.base_url.trim_end_matches('/').to_string();
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(DescriptorError::InvalidUrl {
                id: self.id.clone(),
                url: self.base_url.clone(),
            });
        }

        Ok(())
    }
}

/// Parse and validate a JSON array of descriptors.
///
/// Every descriptor must validate and ids must be unique across the set;
/// the whole document is rejected otherwise, so a misconfigured fleet is
/// caught at startup rather than at first use.
pub fn load_descriptors(json: &str) -> Result<Vec<BackendDescriptor>, DescriptorError> {
    let mut descriptors: Vec<BackendDescriptor> =
        serde_json::from_str(json).map_err(|e| DescriptorError::Parse(e.to_string()))?;

    let mut seen = std::collections::HashSet::new();
    for descriptor in &mut descriptors {
        descriptor.validate()?;
        if !seen.insert(descriptor.id.clone()) {
            return Err(DescriptorError::DuplicateId(descriptor.id.clone()));
        }
    }

    Ok(descriptors)
}
