//! Capture source node
//!
//! Streams a recorded two-channel capture (ZDA, ZCL) into a pipeline as
//! [`LogicSample`]s. Captures come from memory or from CSV text:
//!
//! ```text
//! ; Samplerate: 8 MHz
//! zda,zcl
//! 1,1
//! 0,1
//! ```
//!
//! Rows are either `data,clock` (index = row number) or
//! `index,data,clock`. Lines starting with `;` or `#` are comments, and a
//! single header row before the first sample is skipped.

use crate::runtime::node::{InputPort, OutputPort, ProcessNode, WorkError, WorkResult};
use crate::runtime::ports::{PortDirection, PortSchema};
use crate::runtime::LogicSample;
use crate::{Result, ZdiError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Samples sent per work() call
const MAX_SAMPLES_PER_CALL: usize = 4096;

#[derive(Debug)]
pub struct CaptureSource {
    name: String,
    samples: Vec<LogicSample>,
    samplerate: Option<u64>,
    position: usize,
    finished: bool,
}

impl CaptureSource {
    /// Source over samples already in memory
    pub fn from_samples(samples: impl IntoIterator<Item = LogicSample>) -> Self {
        Self {
            name: "capture".to_string(),
            samples: samples.into_iter().collect(),
            samplerate: None,
            position: 0,
            finished: false,
        }
    }

    /// Source over `(data, clock)` pairs, indexed from zero
    pub fn from_bits(bits: &[(bool, bool)]) -> Self {
        Self::from_samples(
            bits.iter()
                .enumerate()
                .map(|(i, &(data, clock))| LogicSample::new(i as u64, data, clock)),
        )
    }

    /// Parse a CSV capture
    pub fn from_csv<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples: Vec<LogicSample> = Vec::new();
        let mut samplerate = None;
        let mut header_seen = false;

        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = line_idx + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }
            if let Some(comment) = trimmed.strip_prefix(';').or_else(|| trimmed.strip_prefix('#')) {
                if let Some(rate) = comment.trim().strip_prefix("Samplerate:") {
                    samplerate = Some(parse_sample_rate(rate.trim()).ok_or_else(|| {
                        ZdiError::Parse {
                            line: line_no,
                            message: format!("Invalid sample rate: {}", rate.trim()),
                        }
                    })?);
                }
                continue;
            }

            let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            let parsed = match fields.as_slice() {
                [data, clock] => parse_bit(data)
                    .zip(parse_bit(clock))
                    .map(|(d, c)| (samples.len() as u64, d, c)),
                [index, data, clock] => index
                    .parse::<u64>()
                    .ok()
                    .zip(parse_bit(data))
                    .zip(parse_bit(clock))
                    .map(|((i, d), c)| (i, d, c)),
                _ => {
                    return Err(ZdiError::Parse {
                        line: line_no,
                        message: format!("Expected 2 or 3 columns, found {}", fields.len()),
                    });
                }
            };

            let Some((index, data, clock)) = parsed else {
                if samples.is_empty() && !header_seen {
                    debug!("Skipping header row: {}", trimmed);
                    header_seen = true;
                    continue;
                }
                return Err(ZdiError::Parse {
                    line: line_no,
                    message: format!("Invalid sample row: {}", trimmed),
                });
            };

            if let Some(last) = samples.last()
                && index <= last.index
            {
                return Err(ZdiError::Parse {
                    line: line_no,
                    message: format!("Sample index {} does not follow {}", index, last.index),
                });
            }
            samples.push(LogicSample::new(index, data, clock));
        }

        info!(
            "Loaded capture: {} samples, sample rate {}",
            samples.len(),
            samplerate.map_or_else(|| "unknown".to_string(), |hz| format!("{} Hz", hz))
        );

        Ok(Self {
            samplerate,
            ..Self::from_samples(samples)
        })
    }

    /// Open and parse a CSV capture file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv(BufReader::new(file))
    }

    /// With custom name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Keep only the first `count` samples
    pub fn with_limit(mut self, count: usize) -> Self {
        self.samples.truncate(count);
        self
    }

    /// Sample rate in Hz, if the capture declared one
    pub fn samplerate(&self) -> Option<u64> {
        self.samplerate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[LogicSample] {
        &self.samples
    }
}

fn parse_bit(field: &str) -> Option<bool> {
    match field {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

/// Parse a rate such as "8 MHz" into Hz
fn parse_sample_rate(rate: &str) -> Option<u64> {
    let parts: Vec<&str> = rate.split_whitespace().collect();
    if parts.len() >= 2
        && let Ok(value) = parts[0].parse::<f64>()
    {
        let multiplier = match parts[1] {
            "GHz" => 1_000_000_000.0,
            "MHz" => 1_000_000.0,
            "KHz" | "kHz" => 1_000.0,
            "Hz" => 1.0,
            _ => return None,
        };
        let hz = value * multiplier;
        return (hz.is_finite() && hz > 0.0).then(|| hz.round() as u64);
    }
    None
}

impl ProcessNode for CaptureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_stop(&self) -> bool {
        self.finished
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn output_schema(&self) -> Vec<PortSchema> {
        vec![PortSchema::new::<LogicSample>("samples", 0, PortDirection::Output)]
    }

    fn work(&mut self, _inputs: &[InputPort], outputs: &[OutputPort]) -> WorkResult<usize> {
        let output = outputs
            .first()
            .and_then(|p| p.get::<LogicSample>())
            .ok_or_else(|| WorkError::NodeError("Missing sample output".into()))?;

        let end = (self.position + MAX_SAMPLES_PER_CALL).min(self.samples.len());
        let batch = &self.samples[self.position..end];
        for sample in batch {
            output.send(*sample)?;
        }
        let sent = batch.len();
        self.position = end;

        if self.position >= self.samples.len() {
            debug!("[{}] All {} samples sent", self.name, self.samples.len());
            output.close();
            self.finished = true;
        }

        Ok(sent)
    }
}
