//! # Resolution Engine
//!
//! Turns one [`DependencyRecord`] into one [`LicenseVerdict`]:
//!
//! ```text
//!   record ─▶ override lookup ─┬─ found ──────────────▶ verdict (path as given)
//!                              └─ absent ─▶ analyzer ─▶ verdict (path joined with Dir)
//!                                           │
//!                                    per-dependency deadline
//!                                           │
//!                                  content load (optional) ─▶ record.License
//! ```
//!
//! The override lookup and the analyzer call form one blocking unit of work
//! that races a timer. If the timer wins the work is abandoned, not
//! interrupted: it keeps its blocking thread until it returns on its own.
//!
//! - `batch`: drives a whole input stream under the global deadline

pub mod batch;

pub use batch::{BatchRunner, RunSummary};

use crate::analyzer::{AnalysisResult, Analyzer};
use crate::model::{DependencyRecord, LicenseVerdict};
use crate::registry::{KnownLicenseEntry, RegistryError, RegistrySource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Verdict error for a record with neither an override nor a `Dir`
pub const NO_SOURCE_DIR: &str = "dependency has no source directory";

// ─── Configuration ─────────────────────────────────────────────────

/// What to do when a single dependency exceeds its deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Stop the whole run
    #[default]
    Abort,
    /// Emit the record with a timeout error and carry on
    Skip,
}

/// Resolution policy, fixed for the lifetime of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Deadline for one dependency's override lookup + analysis
    pub dependency_timeout: Duration,
    /// Deadline for the whole batch
    pub global_timeout: Duration,
    /// Any verdict error ends the run
    pub error_is_fatal: bool,
    /// Read the license text into `Contents`
    pub include_license_contents: bool,
    pub on_timeout: TimeoutPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dependency_timeout: Duration::from_secs(5),
            global_timeout: Duration::from_secs(5 * 60),
            error_is_fatal: false,
            include_license_contents: true,
            on_timeout: TimeoutPolicy::Abort,
        }
    }
}

// ─── Errors ────────────────────────────────────────────────────────

/// Conditions that end the run while resolving a record
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("analyzer returned {count} results for {}, expected exactly one", dir.display())]
    AnalyzerContract { dir: PathBuf, count: usize },

    #[error("Timed out after {after:?} trying to get the license for: '{path}'")]
    DependencyTimeout { path: String, after: Duration },

    #[error("Fatal error for \"{path}\": {error}")]
    Record { path: String, error: String },

    #[error("known licenses: {0}")]
    Registry(#[from] RegistryError),

    #[error("license worker failed: {0}")]
    Worker(String),
}

impl ResolveError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::AnalyzerContract { .. } => 4,
            Self::DependencyTimeout { .. } => 6,
            Self::Record { .. } => 8,
            Self::Registry(_) => 9,
            Self::Worker(_) => 70,
        }
    }
}

// ─── Outcomes ──────────────────────────────────────────────────────

/// What the blocking unit of work produced
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Override(KnownLicenseEntry),
    Analyzed(AnalysisResult),
    MissingDir,
}

/// Where a verdict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    Override,
    AnalyzerMatch,
    AnalyzerNoMatch,
    MissingDir,
    TimedOut,
}

/// A record with its `License` filled in
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: DependencyRecord,
    pub source: VerdictSource,
}

// ─── Resolver ──────────────────────────────────────────────────────

pub struct Resolver {
    config: ResolverConfig,
    registry: RegistrySource,
    analyzer: Arc<dyn Analyzer>,
}

impl Resolver {
    pub fn new(config: ResolverConfig, registry: RegistrySource, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            config,
            registry,
            analyzer,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one record. Any `License` already on the record is replaced.
    pub async fn resolve(&self, mut record: DependencyRecord) -> Result<Resolution, ResolveError> {
        let id = record.display_id();
        tracing::debug!("Getting license for {}", id);

        let registry = self.registry.clone();
        let analyzer = Arc::clone(&self.analyzer);
        let (path, version, dir) = (record.path().to_string(), record.version().to_string(), record.dir().to_string());
        let work = tokio::task::spawn_blocking(move || {
            find_license(&registry, analyzer.as_ref(), &path, &version, &dir)
        });

        let after = self.config.dependency_timeout;
        let outcome = match tokio::time::timeout(after, work).await {
            Ok(Ok(outcome)) => outcome?,
            Ok(Err(e)) => return Err(ResolveError::Worker(e.to_string())),
            Err(_) => match self.config.on_timeout {
                TimeoutPolicy::Abort => {
                    return Err(ResolveError::DependencyTimeout {
                        path: record.path().to_string(),
                        after,
                    })
                }
                TimeoutPolicy::Skip => {
                    tracing::warn!("Timed out after {:?} trying to get the license for: '{}'", after, id);
                    record.license = LicenseVerdict::unresolved(format!(
                        "Timed out after {:?} trying to get the license",
                        after
                    ));
                    return Ok(Resolution {
                        record,
                        source: VerdictSource::TimedOut,
                    });
                }
            },
        };

        let (mut verdict, source) = build_verdict(outcome, record.dir(), &id);
        let located = matches!(source, VerdictSource::Override | VerdictSource::AnalyzerMatch);
        if self.config.include_license_contents && located {
            load_contents(&mut verdict).await;
        }

        tracing::debug!(
            "{}: {:?} -> name={:?} confidence={:.2} error={:?}",
            id,
            source,
            verdict.name,
            verdict.confidence,
            verdict.error
        );
        record.license = verdict;
        Ok(Resolution { record, source })
    }

    /// Apply error-is-fatal to an already emitted resolution
    pub fn escalate(&self, resolution: &Resolution) -> Result<(), ResolveError> {
        let license = &resolution.record.license;
        if self.config.error_is_fatal && license.has_error() {
            return Err(ResolveError::Record {
                path: resolution.record.path().to_string(),
                error: license.error.clone(),
            });
        }
        Ok(())
    }
}

/// Call the analyzer for one directory and enforce its one-result contract
pub fn analyze_single(analyzer: &dyn Analyzer, dir: &Path) -> Result<AnalysisResult, ResolveError> {
    let mut results = analyzer.analyze(&[dir]);
    if results.len() != 1 {
        return Err(ResolveError::AnalyzerContract {
            dir: dir.to_path_buf(),
            count: results.len(),
        });
    }
    Ok(results.swap_remove(0))
}

// ─── Helpers ────────────────────────────────────────────────────────

/// The blocking unit of work: override lookup, then analysis
fn find_license(
    registry: &RegistrySource,
    analyzer: &dyn Analyzer,
    path: &str,
    version: &str,
    dir: &str,
) -> Result<ResolutionOutcome, ResolveError> {
    let known = registry.snapshot()?;
    if let Some(entry) = known.lookup(path, version) {
        return Ok(ResolutionOutcome::Override(entry.clone()));
    }
    if dir.is_empty() {
        return Ok(ResolutionOutcome::MissingDir);
    }
    analyze_single(analyzer, Path::new(dir)).map(ResolutionOutcome::Analyzed)
}

fn build_verdict(outcome: ResolutionOutcome, dir: &str, id: &str) -> (LicenseVerdict, VerdictSource) {
    match outcome {
        ResolutionOutcome::Override(entry) => (LicenseVerdict::from_override(&entry), VerdictSource::Override),
        ResolutionOutcome::MissingDir => (LicenseVerdict::unresolved(NO_SOURCE_DIR), VerdictSource::MissingDir),
        ResolutionOutcome::Analyzed(AnalysisResult { matches, error, .. }) => {
            match matches.into_iter().next() {
                Some(best) => {
                    if let Some(diagnostic) = error.filter(|e| !e.is_empty()) {
                        tracing::debug!("{}: analyzer also reported: {}", id, diagnostic);
                    }
                    (LicenseVerdict::from_match(best, dir), VerdictSource::AnalyzerMatch)
                }
                None => (
                    LicenseVerdict::unresolved(error.unwrap_or_default()),
                    VerdictSource::AnalyzerNoMatch,
                ),
            }
        }
    }
}

/// Read the license text. A failure lands in the verdict, never in the run.
async fn load_contents(verdict: &mut LicenseVerdict) {
    match tokio::fs::read(&verdict.path).await {
        Ok(bytes) => verdict.contents = String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!("Failed to open license file {}: {}", verdict.path, e);
            verdict.error = format!("Failed to open license file: {}: {}", verdict.path, e);
        }
    }
}
