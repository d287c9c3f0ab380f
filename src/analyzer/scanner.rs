//! Filesystem analyzer. Finds license files under a module directory and
//! classifies their text.

use super::classifier::LicenseClassifier;
use super::{AnalysisResult, Analyzer, LicenseMatch, NO_LICENSE_FOUND};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Matches below this confidence are dropped
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// Root plus one level, enough for `LICENSES/` style layouts
const MAX_SCAN_DEPTH: usize = 2;

/// Files larger than this are not license texts
const MAX_LICENSE_FILE_BYTES: u64 = 512 * 1024;

/// Stems that mark a file as license text (compared case-insensitively)
const LICENSE_FILE_STEMS: &[&str] = &[
    "LICENSE", "LICENCE", "COPYING", "COPYRIGHT", "UNLICENSE", "MIT-LICENSE",
];

/// Extensions a license file may carry (`LICENSE.md`, `COPYING.LESSER`, ...)
const LICENSE_FILE_EXTENSIONS: &[&str] = &[
    "MD", "TXT", "RST", "MARKDOWN", "MIT", "APACHE", "APACHE2", "BSD", "GPL", "LGPL", "LESSER", "LIB",
];

/// Directories that hold other modules' code, not this module's license
const SKIPPED_DIRS: &[&str] = &["vendor", "node_modules", "testdata", "third_party"];

/// The built-in [`Analyzer`]
pub struct FsAnalyzer {
    classifier: LicenseClassifier,
    min_confidence: f32,
}

impl FsAnalyzer {
    pub fn new() -> Self {
        Self {
            classifier: LicenseClassifier::new(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    /// Analyze one directory
    pub fn analyze_dir(&self, dir: &Path) -> AnalysisResult {
        if let Err(e) = std::fs::read_dir(dir) {
            return AnalysisResult::failed(dir, format!("cannot read {}: {}", dir.display(), e));
        }

        let candidates = self.license_files(dir);
        tracing::debug!("{}: {} candidate license files", dir.display(), candidates.len());

        let found: Vec<LicenseMatch> = candidates
            .par_iter()
            .filter_map(|path| self.classify_file(dir, path))
            .collect();

        // One match per license, keeping its strongest file
        let mut best: HashMap<String, LicenseMatch> = HashMap::new();
        for m in found {
            match best.get(&m.license) {
                Some(existing) if existing.confidence >= m.confidence => {}
                _ => {
                    best.insert(m.license.clone(), m);
                }
            }
        }

        let mut matches: Vec<LicenseMatch> = best.into_values().collect();
        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(file_priority(&a.file).cmp(&file_priority(&b.file)))
                .then(a.file.cmp(&b.file))
        });

        if matches.is_empty() {
            AnalysisResult::failed(dir, NO_LICENSE_FOUND)
        } else {
            AnalysisResult {
                arg: dir.to_path_buf(),
                matches,
                error: None,
            }
        }
    }

    fn license_files(&self, dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .max_depth(MAX_SCAN_DEPTH)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_str().is_some_and(is_license_file_name))
            .filter(|e| e.metadata().map(|m| m.len() <= MAX_LICENSE_FILE_BYTES).unwrap_or(false))
            .map(|e| e.into_path())
            .collect()
    }

    fn classify_file(&self, root: &Path, path: &Path) -> Option<LicenseMatch> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("skipping {}: {}", path.display(), e);
                return None;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let best = self.classifier.classify(&text)?;
        if best.confidence < self.min_confidence {
            tracing::debug!(
                "{}: best guess {} at {:.2} is below threshold",
                path.display(),
                best.license,
                best.confidence
            );
            return None;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        tracing::trace!("{} -> {} via {:?} {:?}", path.display(), best.license, best.method, best.evidence);
        Some(LicenseMatch {
            license: best.license,
            file: relative.to_string_lossy().replace('\\', "/"),
            confidence: best.confidence,
        })
    }
}

impl Default for FsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for FsAnalyzer {
    fn analyze(&self, dirs: &[&Path]) -> Vec<AnalysisResult> {
        dirs.iter().map(|dir| self.analyze_dir(dir)).collect()
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// `LICENSE`, `LICENSE.md`, `COPYING.LESSER`, `LICENSE-APACHE`, ...
pub fn is_license_file_name(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    LICENSE_FILE_STEMS.iter().any(|stem| match upper.strip_prefix(stem) {
        Some("") => true,
        Some(rest) if rest.starts_with('-') => true,
        Some(rest) => rest
            .strip_prefix('.')
            .is_some_and(|ext| LICENSE_FILE_EXTENSIONS.contains(&ext)),
        None => false,
    })
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.') || SKIPPED_DIRS.contains(&n))
}

/// Root-level files outrank nested ones at equal confidence
fn file_priority(file: &str) -> usize {
    file.matches('/').count()
}
