//! License analysis of module source trees
//!
//! The resolver talks to analysis through the [`Analyzer`] trait only. An
//! analyzer is synchronous and may be slow (it walks the filesystem and
//! classifies text), so the resolver runs it on the blocking pool under a
//! deadline. [`FsAnalyzer`] is the built-in implementation.

pub mod classifier;
pub mod database;
pub mod scanner;

pub use classifier::{Classification, ClassificationMethod, LicenseClassifier};
pub use database::{LicenseDb, LicenseDescriptor, LICENSE_DB};
pub use scanner::{is_license_file_name, FsAnalyzer, DEFAULT_MIN_CONFIDENCE};

use std::path::{Path, PathBuf};

/// Diagnostic reported when a directory holds no recognisable license
pub const NO_LICENSE_FOUND: &str = "no license file was found";

/// A candidate license for an analyzed directory
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseMatch {
    /// License name, e.g. `Apache-2.0`
    pub license: String,
    /// File holding the evidence, relative to the analyzed directory
    pub file: String,
    /// 0.0 - 1.0
    pub confidence: f32,
}

/// Everything an analyzer found for one directory
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// The directory that was analyzed
    pub arg: PathBuf,
    /// Best first
    pub matches: Vec<LicenseMatch>,
    /// Why nothing (or not everything) was found
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn failed(dir: &Path, error: impl Into<String>) -> Self {
        Self {
            arg: dir.to_path_buf(),
            matches: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Inspects directories and proposes ranked license matches.
///
/// Implementations must return exactly one [`AnalysisResult`] per input
/// directory, in order. The resolver treats any other count as a broken
/// analyzer and stops the run.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, dirs: &[&Path]) -> Vec<AnalysisResult>;
}
