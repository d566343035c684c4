//! Labeled Waveform Datasets
//!
//! CSV layout: a header row, one `label` column and one numeric column per
//! time sample. Every row is one labeled waveform.

use data_validator::{ValidationError, Validator};
use feature_engine::FaultType;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use waveform_sim::WaveformGenerator;

/// Name of the label column
pub const LABEL_COLUMN: &str = "label";

/// Errors while reading or writing datasets
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset has no header row")]
    MissingHeader,

    #[error("Dataset header has no 'label' column")]
    MissingLabelColumn,

    #[error("Line {line}: expected {expected} columns, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: {label:?} is not a known fault type")]
    UnknownLabel { line: usize, label: String },

    #[error("Line {line}, column {column}: {value:?} is not a number")]
    InvalidValue {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("Line {line}: {source}")]
    InvalidWaveform {
        line: usize,
        source: ValidationError,
    },
}

/// One waveform with its ground-truth label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledWaveform {
    pub label: FaultType,
    pub resistance: Vec<f64>,
    /// Sample times, when the source records them. CSV rows carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<f64>>,
}

/// Ordered collection of labeled waveforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<LabeledWaveform>,
}

impl Dataset {
    /// Balanced synthetic dataset: `per_class` waveforms of each fault type
    pub fn synthetic(per_class: usize, num_samples: usize, seed: u64) -> Self {
        let mut generator = WaveformGenerator::new(seed);
        let mut samples = Vec::with_capacity(per_class * FaultType::ALL.len());
        for label in FaultType::ALL {
            for _ in 0..per_class {
                let waveform = generator.generate(label, num_samples);
                samples.push(LabeledWaveform {
                    label,
                    resistance: waveform.resistance,
                    time: Some(waveform.time),
                });
            }
        }
        info!(
            "Generated synthetic dataset: {} waveforms x {} samples",
            samples.len(),
            num_samples
        );
        Self { samples }
    }

    /// Read a dataset from a CSV file
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let dataset = Self::read_csv(BufReader::new(File::open(path)?))?;
        info!("Loaded {} waveforms from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse CSV from any buffered reader
    pub fn read_csv(reader: impl BufRead) -> Result<Self, DatasetError> {
        let validator = Validator::default();
        let mut lines = reader.lines().enumerate();

        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Err(DatasetError::MissingHeader),
            }
        };
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let label_idx = columns
            .iter()
            .position(|c| *c == LABEL_COLUMN)
            .ok_or(DatasetError::MissingLabelColumn)?;

        let mut samples = Vec::new();
        for (idx, line) in lines {
            let line = line?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != columns.len() {
                return Err(DatasetError::RaggedRow {
                    line: line_no,
                    expected: columns.len(),
                    found: fields.len(),
                });
            }

            let label = fields[label_idx]
                .parse::<FaultType>()
                .map_err(|_| DatasetError::UnknownLabel {
                    line: line_no,
                    label: fields[label_idx].to_string(),
                })?;

            let resistance = fields
                .iter()
                .enumerate()
                .filter(|(column, _)| *column != label_idx)
                .map(|(column, value)| {
                    value.parse::<f64>().map_err(|_| DatasetError::InvalidValue {
                        line: line_no,
                        column: column + 1,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            validator
                .validate_waveform(&resistance)
                .map_err(|source| DatasetError::InvalidWaveform {
                    line: line_no,
                    source,
                })?;

            samples.push(LabeledWaveform {
                label,
                resistance,
                time: None,
            });
        }

        debug!("Parsed {} CSV rows", samples.len());
        Ok(Self { samples })
    }

    /// Write the dataset as CSV in the same layout [`Dataset::load_csv`] reads
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);

        let width = self.samples.iter().map(|s| s.resistance.len()).max().unwrap_or(0);
        let mut header = vec![LABEL_COLUMN.to_string()];
        header.extend((0..width).map(|i| format!("t{i}")));
        writeln!(out, "{}", header.join(","))?;

        for sample in &self.samples {
            write!(out, "{}", sample.label)?;
            for value in &sample.resistance {
                write!(out, ",{value}")?;
            }
            writeln!(out)?;
        }
        out.flush()?;

        info!("Wrote {} waveforms to {}", self.samples.len(), path.display());
        Ok(())
    }

    /// Samples in dataset order
    pub fn samples(&self) -> &[LabeledWaveform] {
        &self.samples
    }

    /// Number of waveforms
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether every waveform carries its time axis
    pub fn has_time_axis(&self) -> bool {
        self.samples.iter().all(|s| s.time.is_some())
    }

    /// Ground-truth labels in dataset order
    pub fn labels(&self) -> Vec<FaultType> {
        self.samples.iter().map(|s| s.label).collect()
    }
}
