//! Batch orchestration: streams records through the resolver under one
//! deadline for the whole run

use super::{ResolverConfig, Resolver, VerdictSource};
use crate::io::{spawn_decoder, DecodeError, RecordWriter};
use crate::model::DependencyRecord;
use crate::{LicfinderResult, RunError};
use serde::Serialize;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::Receiver;

/// Counters for a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub resolved: usize,
    pub overridden: usize,
    pub analyzed: usize,
    pub with_errors: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn count(&mut self, source: VerdictSource, has_error: bool) {
        self.resolved += 1;
        match source {
            VerdictSource::Override => self.overridden += 1,
            VerdictSource::AnalyzerMatch | VerdictSource::AnalyzerNoMatch => self.analyzed += 1,
            VerdictSource::MissingDir | VerdictSource::TimedOut => {}
        }
        if has_error {
            self.with_errors += 1;
        }
    }
}

pub struct BatchRunner {
    resolver: Resolver,
}

impl BatchRunner {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    pub fn config(&self) -> &ResolverConfig {
        self.resolver.config()
    }

    /// Resolve every record in `input`, writing each to `output` in order.
    ///
    /// A record is always written before error-is-fatal is applied to it.
    pub async fn run<R, W>(&self, input: R, output: W) -> LicfinderResult<RunSummary>
    where
        R: Read + Send + 'static,
        W: Write,
    {
        let start = Instant::now();
        let after = self.config().global_timeout;
        let mut records = spawn_decoder(input)?;
        let mut writer = RecordWriter::new(output);
        let mut summary = RunSummary::default();

        match tokio::time::timeout(after, self.drive(&mut records, &mut writer, &mut summary)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Gave up after writing {} records", writer.written());
                return Err(RunError::GlobalTimeout { after });
            }
        }

        summary.elapsed = start.elapsed();
        tracing::info!(
            "Resolved {} dependencies in {:?} ({} overridden, {} analyzed, {} with errors)",
            summary.resolved,
            summary.elapsed,
            summary.overridden,
            summary.analyzed,
            summary.with_errors
        );
        Ok(summary)
    }

    async fn drive<W: Write>(
        &self,
        records: &mut Receiver<Result<DependencyRecord, DecodeError>>,
        writer: &mut RecordWriter<W>,
        summary: &mut RunSummary,
    ) -> LicfinderResult<()> {
        while let Some(item) = records.recv().await {
            let resolution = self.resolver.resolve(item?).await?;
            summary.count(resolution.source, resolution.record.license.has_error());
            writer.write_record(&resolution.record)?;
            self.resolver.escalate(&resolution)?;
        }
        Ok(())
    }
}
