//! Known-license registry: operator overrides that bypass analysis
//!
//! Loaded from a YAML, JSON or TOML document with a top-level `licenses`
//! table. Keys are `<module>@<version>` for a pinned override or `<module>`
//! for one that applies to every version:
//!
//! ```yaml
//! licenses:
//!   acme/widgets@1.2.0:
//!     Name: MIT
//!     Path: /opt/licenses/MIT.txt
//!   acme/gadgets:
//!     Name: Apache-2.0
//!     Path: /opt/licenses/Apache-2.0.txt
//! ```
//!
//! Entry paths are authoritative: the resolver never rewrites them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A single override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownLicenseEntry {
    /// License name, ideally an SPDX identifier
    #[serde(rename = "Name")]
    pub name: String,
    /// Location of the license text, used as given
    #[serde(rename = "Path", default)]
    pub path: String,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} contained no licenses! Did you put them under \"licenses:\"?", path.display())]
    Empty { path: PathBuf },
}

/// On-disk formats accepted for the override file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    /// YAML, which also covers JSON documents
    Yaml,
    Toml,
}

impl RegistryFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// The override table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnownLicenses {
    #[serde(default)]
    pub licenses: HashMap<String, KnownLicenseEntry>,
}

impl KnownLicenses {
    /// Load and validate an override file
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        tracing::debug!("Opening config file for known licenses: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let known = Self::parse(&content, RegistryFormat::from_path(path), path)?;

        if known.is_empty() {
            return Err(RegistryError::Empty {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!("Loaded {} known license entries from {}", known.len(), path.display());
        for key in known.licenses.keys() {
            tracing::trace!("  known license key: {}", key);
        }
        Ok(known)
    }

    /// Parse override content; `origin` is only used in error messages
    pub fn parse(content: &str, format: RegistryFormat, origin: &Path) -> Result<Self, RegistryError> {
        match format {
            RegistryFormat::Yaml => serde_yaml::from_str(content).map_err(|source| RegistryError::Yaml {
                path: origin.to_path_buf(),
                source,
            }),
            RegistryFormat::Toml => toml::from_str(content).map_err(|source| RegistryError::Toml {
                path: origin.to_path_buf(),
                source,
            }),
        }
    }

    /// Find the override for a module: `path@version` first, then bare `path`
    pub fn lookup(&self, path: &str, version: &str) -> Option<&KnownLicenseEntry> {
        let pinned = format!("{}@{}", path, version);
        let found = self
            .licenses
            .get_key_value(&pinned)
            .or_else(|| self.licenses.get_key_value(path));
        if let Some((key, _)) = found {
            tracing::debug!("Found known license entry for {}", key);
        }
        found.map(|(_, entry)| entry)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: KnownLicenseEntry) {
        self.licenses.insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

// ─── Registry Source ───────────────────────────────────────────────

/// Where the resolver gets its override table from
#[derive(Debug, Clone)]
pub enum RegistrySource {
    /// Loaded once, shared read-only for the whole run
    Static(Arc<KnownLicenses>),
    /// Re-read from disk on every resolution so edits apply mid-run
    LiveReload(PathBuf),
}

impl RegistrySource {
    /// No overrides: every dependency is analyzed
    pub fn empty() -> Self {
        Self::Static(Arc::new(KnownLicenses::default()))
    }

    pub fn from_known(known: KnownLicenses) -> Self {
        Self::Static(Arc::new(known))
    }

    /// The table to consult for one resolution
    pub fn snapshot(&self) -> Result<Arc<KnownLicenses>, RegistryError> {
        match self {
            Self::Static(known) => Ok(Arc::clone(known)),
            Self::LiveReload(path) => KnownLicenses::from_file(path).map(Arc::new),
        }
    }
}

impl Default for RegistrySource {
    fn default() -> Self {
        Self::empty()
    }
}
