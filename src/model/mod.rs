//! Dependency records and license verdicts
//!
//! A record keeps the JSON object it was decoded from, field for field, and
//! writes it back unchanged apart from `License`. The fields the resolver
//! needs (`Path`, `Version`, `Dir`, ...) are read-only views checked at
//! decode time.

use crate::analyzer::LicenseMatch;
use crate::registry::KnownLicenseEntry;
use chrono::{DateTime, FixedOffset};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

// ─── Dependency Record ─────────────────────────────────────────────

/// One module from the input stream
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRecord {
    path: String,
    version: String,
    dir: String,
    time: Option<DateTime<FixedOffset>>,
    update: Option<ModuleUpdate>,
    /// Every input field except `License`, in input order
    fields: Map<String, Value>,
    pub license: LicenseVerdict,
}

impl DependencyRecord {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        let (path, version) = (path.into(), version.into());
        let mut fields = Map::new();
        fields.insert("Path".into(), Value::String(path.clone()));
        if !version.is_empty() {
            fields.insert("Version".into(), Value::String(version.clone()));
        }
        Self {
            path,
            version,
            dir: String::new(),
            time: None,
            update: None,
            fields,
            license: LicenseVerdict::default(),
        }
    }

    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self.fields.insert("Dir".into(), Value::String(self.dir.clone()));
        self
    }

    /// Module path, e.g. `gopkg.in/yaml.v2`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Empty when absent or null
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory holding the module source; this is what gets analyzed
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn time(&self) -> Option<&DateTime<FixedOffset>> {
        self.time.as_ref()
    }

    /// Newer version reported by `go list -u`
    pub fn update(&self) -> Option<&ModuleUpdate> {
        self.update.as_ref()
    }

    /// Raw input field, e.g. `Indirect` or `GoMod`
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `path@version`, or just `path` for unversioned records
    pub fn display_id(&self) -> String {
        if self.version.is_empty() {
            self.path.clone()
        } else {
            format!("{}@{}", self.path, self.version)
        }
    }

    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, String> {
        let license = match fields.remove("License") {
            Some(Value::Null) | None => LicenseVerdict::default(),
            Some(value) => LicenseVerdict::deserialize(value).map_err(|e| format!("License: {}", e))?,
        };
        let path = string_field(&fields, "Path")?.ok_or("missing field `Path`")?;
        let version = string_field(&fields, "Version")?.unwrap_or_default();
        let dir = string_field(&fields, "Dir")?.unwrap_or_default();
        let time = time_field(&fields, "Time")?;
        let update = match fields.get("Update") {
            Some(Value::Null) | None => None,
            Some(value) => Some(ModuleUpdate::deserialize(value).map_err(|e| format!("Update: {}", e))?),
        };
        Ok(Self {
            path,
            version,
            dir,
            time,
            update,
            fields,
            license,
        })
    }
}

impl<'de> Deserialize<'de> for DependencyRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(D::Error::custom)
    }
}

impl Serialize for DependencyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("License", &self.license)?;
        map.end()
    }
}

/// The `Update` sub-object of a `go list -u` record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleUpdate {
    #[serde(rename = "Path", default)]
    pub path: String,
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Time", default)]
    pub time: Option<DateTime<FixedOffset>>,
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!("invalid type for `{}`: {}, expected a string", key, other)),
    }
}

fn time_field(fields: &Map<String, Value>, key: &str) -> Result<Option<DateTime<FixedOffset>>, String> {
    match string_field(fields, key)? {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(Some)
            .map_err(|e| format!("invalid `{}` {:?}: {}", key, raw, e)),
    }
}

// ─── License Verdict ───────────────────────────────────────────────

/// The license determination attached to a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenseVerdict {
    /// License name, empty when undetermined
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Where the license text lives
    #[serde(rename = "Path", default)]
    pub path: String,
    /// Raw license text, when content loading is enabled
    #[serde(rename = "Contents", default)]
    pub contents: String,
    #[serde(rename = "Confidence", default)]
    pub confidence: f32,
    /// Empty means no error
    #[serde(rename = "Error", default)]
    pub error: String,
}

impl LicenseVerdict {
    /// Verdict from an operator override. The override path is used as given.
    pub fn from_override(entry: &KnownLicenseEntry) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            confidence: 1.0,
            ..Default::default()
        }
    }

    /// Verdict from an analyzer match; `match.file` is relative to `dir`.
    pub fn from_match(found: LicenseMatch, dir: &str) -> Self {
        Self {
            name: found.license,
            path: join_evidence_path(dir, &found.file),
            confidence: found.confidence,
            ..Default::default()
        }
    }

    /// No license identified; `error` may be empty ("not found" rather than "failed")
    pub fn unresolved(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Join an analyzer-relative file onto the scanned directory, dropping `.` components.
pub fn join_evidence_path(dir: &str, file: &str) -> String {
    let joined: PathBuf = Path::new(dir)
        .join(file)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    joined.to_string_lossy().into_owned()
}
