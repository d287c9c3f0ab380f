//! Command-line surface

use crate::analyzer::{FsAnalyzer, DEFAULT_MIN_CONFIDENCE};
use crate::engine::{BatchRunner, Resolver, ResolverConfig, RunSummary, TimeoutPolicy};
use crate::io::open_input;
use crate::registry::{KnownLicenses, RegistryError, RegistrySource};
use crate::LicfinderResult;
use clap::{ArgAction, Parser};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const LONG_ABOUT: &str = r#"Find the license of every Go module dependency.

Reads the output of `go list -m -u -json all` from stdin (or --input-file) and
prints each record back as one line of JSON with a "License" object added.
Multiple concatenated JSON objects are accepted, for example:

  {
      "Path": "gopkg.in/yaml.v2",
      "Version": "v2.2.2",
      "Time": "2018-11-15T11:05:04Z",
      "Dir": "/home/js/go/pkg/mod/gopkg.in/yaml.v2@v2.2.2",
      "GoMod": "/home/js/go/pkg/mod/cache/download/gopkg.in/yaml.v2/@v/v2.2.2.mod"
  }

Licenses listed in --known-licenses-config are used as given (confidence 1.0)
and skip detection entirely."#;

#[derive(Parser, Debug)]
#[command(name = "licfinder", author, version, about = "Find the licenses of Go module dependencies", long_about = LONG_ABOUT)]
pub struct Cli {
    /// File to read dependencies from [default: stdin]
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Time allowed for a single dependency
    #[arg(long, value_name = "DUR", default_value = "5s", value_parser = parse_duration)]
    pub dependency_timeout: Duration,

    /// Time allowed for the whole run
    #[arg(long, value_name = "DUR", default_value = "5m", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Stop at the first dependency whose license has an error
    #[arg(short, long)]
    pub error_is_fatal: bool,

    /// Include the license text in the output
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub include_license_contents: bool,

    /// YAML, JSON or TOML file of licenses to use instead of detection
    #[arg(short = 'k', long, value_name = "PATH")]
    pub known_licenses_config: Option<PathBuf>,

    /// Re-read the known licenses file for every dependency
    #[arg(long, requires = "known_licenses_config")]
    pub reload_known_licenses: bool,

    /// What to do when a dependency takes longer than --dependency-timeout
    #[arg(long, value_enum, default_value_t = TimeoutPolicy::Abort)]
    pub on_timeout: TimeoutPolicy,

    /// Ignore detected licenses below this confidence
    #[arg(long, value_name = "F", default_value_t = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: f32,
}

impl Cli {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            dependency_timeout: self.dependency_timeout,
            global_timeout: self.timeout,
            error_is_fatal: self.error_is_fatal,
            include_license_contents: self.include_license_contents,
            on_timeout: self.on_timeout,
        }
    }

    /// Load the override table. With live reload the file is still read once
    /// here so a bad file fails the run before any input is consumed.
    pub fn registry_source(&self) -> Result<RegistrySource, RegistryError> {
        let Some(path) = &self.known_licenses_config else {
            return Ok(RegistrySource::empty());
        };
        let known = KnownLicenses::from_file(path)?;
        if self.reload_known_licenses {
            Ok(RegistrySource::LiveReload(path.clone()))
        } else {
            Ok(RegistrySource::from_known(known))
        }
    }

    /// Run against stdin/`--input-file`, writing to stdout
    pub async fn execute(&self) -> LicfinderResult<RunSummary> {
        let registry = self.registry_source()?;
        let analyzer = Arc::new(FsAnalyzer::new().with_min_confidence(self.min_confidence));
        let runner = BatchRunner::new(Resolver::new(self.resolver_config(), registry, analyzer));

        let input = open_input(self.input_file.as_deref())?;
        let stdout = std::io::stdout();
        runner.run(input, BufWriter::new(stdout.lock())).await
    }
}

/// Parse a Go-style duration: `500ms`, `5s`, `5m`, `1h`, `1m30s`, `1.5h`.
/// A bare `0` is accepted; any other number needs a unit.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".into());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {:?}", s));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", s))?;

        let tail = &rest[number_len..];
        let unit_len = tail.find(is_number).unwrap_or(tail.len());
        let nanos_per_unit: u64 = match &tail[..unit_len] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            "" => return Err(format!("missing unit in duration {:?}", s)),
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, s)),
        };
        total += Duration::from_nanos((value * nanos_per_unit as f64).round() as u64);
        rest = &tail[unit_len..];
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["licfinder"]).unwrap();
        let config = cli.resolver_config();
        assert_eq!(config.dependency_timeout, Duration::from_secs(5));
        assert_eq!(config.global_timeout, Duration::from_secs(300));
        assert!(!config.error_is_fatal);
        assert!(config.include_license_contents);
        assert_eq!(config.on_timeout, TimeoutPolicy::Abort);
        assert!(cli.input_file.is_none());
        assert!((cli.min_confidence - DEFAULT_MIN_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "licfinder",
            "-i",
            "deps.json",
            "-v",
            "-e",
            "--dependency-timeout",
            "1m30s",
            "--timeout",
            "1h",
            "--include-license-contents",
            "false",
            "-k",
            "known.yaml",
            "--reload-known-licenses",
            "--on-timeout",
            "skip",
        ])
        .unwrap();
        assert_eq!(cli.input_file.as_deref(), Some(std::path::Path::new("deps.json")));
        assert!(cli.verbose);
        let config = cli.resolver_config();
        assert!(config.error_is_fatal);
        assert!(!config.include_license_contents);
        assert_eq!(config.dependency_timeout, Duration::from_secs(90));
        assert_eq!(config.global_timeout, Duration::from_secs(3600));
        assert_eq!(config.on_timeout, TimeoutPolicy::Skip);
        assert!(cli.reload_known_licenses);
    }

    #[test]
    fn test_reload_requires_known_licenses() {
        assert!(Cli::try_parse_from(["licfinder", "--reload-known-licenses"]).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn test_registry_source_without_file_is_empty() {
        let cli = Cli::try_parse_from(["licfinder"]).unwrap();
        assert!(cli.registry_source().unwrap().snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_registry_source_live_reload_validates_up_front() {
        let cli = Cli::try_parse_from(["licfinder", "-k", "/nonexistent/known.yaml", "--reload-known-licenses"]).unwrap();
        assert!(matches!(cli.registry_source(), Err(RegistryError::Read { .. })));
    }
}
