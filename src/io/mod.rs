//! Input and output adapters
//!
//! Input is a stream of concatenated JSON objects, exactly what
//! `go list -m -u -json all` prints. Output is one compact JSON object per
//! line.

use crate::model::DependencyRecord;
use crate::{LicfinderResult, RunError};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;
use tokio::sync::mpsc;

/// Records decoded ahead of the resolver
const DECODE_BUFFER: usize = 16;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode input record {index}: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Input record {index} has an empty \"Path\"")]
    EmptyPath { index: usize },
}

/// Open `--input-file`, or stdin when none is given
pub fn open_input(path: Option<&Path>) -> LicfinderResult<Box<dyn Read + Send>> {
    match path {
        Some(path) => {
            tracing::debug!("Reading dependencies from {}", path.display());
            let file = File::open(path).map_err(|source| RunError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(file))
        }
        None => {
            tracing::debug!("Reading dependencies from stdin");
            Ok(Box::new(std::io::stdin()))
        }
    }
}

/// Decode records on a dedicated thread and hand them over one at a time.
///
/// The channel closes at end of input or right after the first decode
/// error. The thread also stops once the receiver is dropped, or stays
/// parked in `read` if the input never delivers; nothing waits for it.
pub fn spawn_decoder<R>(input: R) -> std::io::Result<mpsc::Receiver<Result<DependencyRecord, DecodeError>>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(DECODE_BUFFER);
    std::thread::Builder::new()
        .name("licfinder-decode".into())
        .spawn(move || {
            let stream = serde_json::Deserializer::from_reader(BufReader::new(input)).into_iter::<DependencyRecord>();
            for (i, item) in stream.enumerate() {
                let index = i + 1;
                let item = match item {
                    Ok(record) if record.path().is_empty() => Err(DecodeError::EmptyPath { index }),
                    Ok(record) => Ok(record),
                    Err(source) => Err(DecodeError::Json { index, source }),
                };
                let failed = item.is_err();
                if tx.blocking_send(item).is_err() || failed {
                    break;
                }
            }
            tracing::trace!("decoder finished");
        })?;
    Ok(rx)
}

/// Writes one JSON object per line, flushing after each
pub struct RecordWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_record(&mut self, record: &DependencyRecord) -> LicfinderResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.inner.write_all(&line)?;
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all(input: &'static str) -> Vec<Result<DependencyRecord, DecodeError>> {
        let mut rx = spawn_decoder(Cursor::new(input)).unwrap();
        let mut out = Vec::new();
        while let Some(item) = rx.blocking_recv() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_concatenated_objects() {
        let items = decode_all(r#"{"Path":"a","Version":"v1"}{"Path":"b"}
            {"Path":"c","Dir":"/src/c"}"#);
        let paths: Vec<String> = items.into_iter().map(|r| r.unwrap().path().to_string()).collect();
        assert_eq!(paths, ["a", "b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_all("").is_empty());
        assert!(decode_all("  \n\t ").is_empty());
    }

    #[test]
    fn test_stops_at_first_malformed_record() {
        let items = decode_all(r#"{"Path":"a"} {"Path": 42} {"Path":"c"}"#);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(DecodeError::Json { index: 2, .. })));
    }

    #[test]
    fn test_empty_path_rejected() {
        let items = decode_all(r#"{"Path":""}"#);
        assert!(matches!(items[0], Err(DecodeError::EmptyPath { index: 1 })));
    }

    #[test]
    fn test_writer_emits_one_line_per_record() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_record(&DependencyRecord::new("a", "v1")).unwrap();
        writer.write_record(&DependencyRecord::new("b", "v2")).unwrap();
        assert_eq!(writer.written(), 2);

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["Path"], "a");
        assert_eq!(first["License"]["Name"], "");
    }

    #[test]
    fn test_open_missing_input_file() {
        let err = open_input(Some(Path::new("/nonexistent/deps.json"))).err().unwrap();
        assert_eq!(err.exit_code(), 5);
    }
}
