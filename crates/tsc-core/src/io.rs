//! JSON-lines dataset persistence
//!
//! One record per line: `{"label": "...", "sampling_rate": 300.0,
//! "channel_count": 1, "samples": [...]}`. Malformed lines fail the whole
//! load, fail-fast.

use crate::dataset::{Dataset, LabeledSignal};
use crate::error::{TscError, TscResult};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Serialized form of one labeled signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub label: String,
    pub sampling_rate: f32,
    #[serde(default = "default_channel_count")]
    pub channel_count: usize,
    pub samples: Vec<f32>,
}

fn default_channel_count() -> usize {
    1
}

/// Load a dataset from a JSON-lines file, inferring the label set
pub fn load_jsonl(path: impl AsRef<Path>) -> TscResult<Dataset> {
    Dataset::new(read_records(path.as_ref())?)
}

/// Load a dataset against an explicit label set; records carrying labels
/// outside the set fail with `LabelMismatch`.
pub fn load_jsonl_with_labels(
    path: impl AsRef<Path>,
    labels: Vec<String>,
) -> TscResult<Dataset> {
    Dataset::with_labels(read_records(path.as_ref())?, labels)
}

fn read_records(path: &Path) -> TscResult<Vec<LabeledSignal>> {
    let file = File::open(path).map_err(|e| TscError::DataFormat {
        message: format!("cannot open {}: {}", path.display(), e),
    })?;

    let reader = BufReader::new(file);
    let mut examples = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TscError::DataFormat {
            message: format!("read error at line {}: {}", line_no + 1, e),
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let record: SignalRecord =
            serde_json::from_str(&line).map_err(|e| TscError::DataFormat {
                message: format!("bad record at line {}: {}", line_no + 1, e),
            })?;

        let signal = Signal::new(record.samples, record.channel_count, record.sampling_rate)
            .map_err(|e| TscError::DataFormat {
                message: format!("invalid signal at line {}: {}", line_no + 1, e),
            })?;

        examples.push(LabeledSignal::new(signal, record.label));
    }

    if examples.is_empty() {
        return Err(TscError::DataFormat {
            message: format!("{} contains no records", path.display()),
        });
    }

    Ok(examples)
}

/// Write a dataset as JSON-lines
pub fn save_jsonl(dataset: &Dataset, path: impl AsRef<Path>) -> TscResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| TscError::DataFormat {
        message: format!("cannot create {}: {}", path.display(), e),
    })?;
    let mut writer = BufWriter::new(file);

    for example in dataset.examples() {
        let record = SignalRecord {
            label: example.label.clone(),
            sampling_rate: example.signal.sampling_rate,
            channel_count: example.signal.channel_count,
            samples: example.signal.data.clone(),
        };
        let line = serde_json::to_string(&record).map_err(|e| TscError::DataFormat {
            message: format!("serialization failed: {}", e),
        })?;
        writeln!(writer, "{}", line).map_err(|e| TscError::DataFormat {
            message: format!("write error: {}", e),
        })?;
    }

    writer.flush().map_err(|e| TscError::DataFormat {
        message: format!("write error: {}", e),
    })?;
    Ok(())
}
