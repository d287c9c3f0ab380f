//! # licfinder: license resolution for Go module dependencies
//!
//! Reads the records printed by `go list -m -u -json all`, attaches a
//! `License` verdict to each one and prints them back out, one per line.
//!
//! ```text
//!  stdin / -i ──▶ io::spawn_decoder ──▶ engine::BatchRunner ──▶ io::RecordWriter ──▶ stdout
//!                                            │
//!                                      engine::Resolver
//!                                       │            │
//!                            registry::KnownLicenses  analyzer::Analyzer
//!                               (operator overrides)   (FsAnalyzer by default)
//! ```
//!
//! Overrides always win and are reported at confidence 1.0 with their path
//! untouched. Everything else is analyzed under a per-dependency deadline and
//! the whole run is bounded by a global one.

pub mod analyzer;
pub mod cli;
pub mod engine;
pub mod io;
pub mod model;
pub mod registry;

pub use analyzer::{AnalysisResult, Analyzer, FsAnalyzer, LicenseMatch};
pub use engine::{BatchRunner, Resolution, ResolveError, Resolver, ResolverConfig, RunSummary, TimeoutPolicy};
pub use model::{DependencyRecord, LicenseVerdict};
pub use registry::{KnownLicenseEntry, KnownLicenses, RegistryError, RegistrySource};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Everything that can end a run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to open input file {}: {source}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] io::DecodeError),

    #[error("Failed to marshal JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to load known licenses: {0}")]
    KnownLicenses(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Global timeout elapsed after {after:?} trying to get the licenses for all dependencies")]
    GlobalTimeout { after: Duration },
}

impl RunError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Decode(_) => 2,
            Self::Encode(_) | Self::Output(_) => 3,
            Self::InputOpen { .. } => 5,
            Self::GlobalTimeout { .. } => 7,
            Self::KnownLicenses(_) => 9,
            Self::Resolve(e) => e.exit_code(),
        }
    }
}

pub type LicfinderResult<T> = Result<T, RunError>;
