//! Example: ZDI decoding
//!
//! Decodes a two-channel ZDA/ZCL capture exported as CSV and prints the
//! annotations.
//!
//! Usage:
//!   cargo run --release --example zdi_decode -- --file capture.csv
//!
//! Actions only, first 50:
//!   cargo run --release --example zdi_decode -- \
//!       --file capture.csv --row action -n 50
//!
//! With CSV output:
//!   cargo run --release --example zdi_decode -- \
//!       --file capture.csv --csv-output annotations.csv

use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;
use zdi::nodes::decoders::{Annotation, AnnotationRow, ZdiDecoder};
use zdi::runtime::{InputPort, OutputPort, Pipeline, ProcessNode, WorkError, WorkResult};
use zdi::{CaptureSource, PortDirection, PortSchema};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Row {
    Bits,
    Command,
    Action,
}

impl From<Row> for AnnotationRow {
    fn from(row: Row) -> Self {
        match row {
            Row::Bits => AnnotationRow::Bits,
            Row::Command => AnnotationRow::Command,
            Row::Action => AnnotationRow::Action,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to CSV capture (data,clock or index,data,clock rows)
    #[arg(short, long)]
    file: String,

    /// Only read the first N samples (0 = all)
    #[arg(long, default_value = "0")]
    limit: usize,

    /// Only print annotations of this row
    #[arg(long, value_enum)]
    row: Option<Row>,

    /// Number of annotations to print (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    n: usize,

    /// Channel buffer size between nodes
    #[arg(long, default_value = "100000")]
    buffer_size: usize,

    /// CSV output file path (optional)
    #[arg(long)]
    csv_output: Option<String>,
}

/// Sink that prints annotations
struct AnnotationPrinter {
    row: Option<AnnotationRow>,
    count: usize,
    max_annotations: usize,
}

impl AnnotationPrinter {
    fn new(row: Option<AnnotationRow>, max_annotations: usize) -> Self {
        Self {
            row,
            count: 0,
            max_annotations,
        }
    }
}

impl ProcessNode for AnnotationPrinter {
    fn name(&self) -> &str {
        "annotation_printer"
    }

    fn should_stop(&self) -> bool {
        self.max_annotations > 0 && self.count >= self.max_annotations
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        0 // Sink
    }

    fn input_schema(&self) -> Vec<PortSchema> {
        vec![PortSchema::new::<Annotation>("annotations", 0, PortDirection::Input)]
    }

    fn work(&mut self, inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
        let mut input = inputs
            .first()
            .and_then(|port| port.get::<Annotation>())
            .ok_or_else(|| WorkError::NodeError("Missing input channel".to_string()))?;

        let annotation = input.recv()?;
        if self.row.is_some_and(|row| annotation.class.row() != row) {
            return Ok(0);
        }

        self.count += 1;
        info!(
            "{:>10}..{:<10} {:<10} {}",
            annotation.start,
            annotation.end,
            format!("{:?}", annotation.class),
            annotation.text()
        );

        if self.max_annotations > 0 && self.count >= self.max_annotations {
            info!(
                "[AnnotationPrinter] Max annotations ({}) reached, shutting down",
                self.max_annotations
            );
            return Err(WorkError::Shutdown);
        }

        Ok(1)
    }
}

/// Sink that writes annotations to a CSV file
struct AnnotationCsvWriter {
    writer: BufWriter<File>,
}

impl AnnotationCsvWriter {
    fn new(path: &str) -> Result<Self, std::io::Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "start,end,class,text,short")?;
        Ok(Self {
            writer,
        })
    }
}

impl ProcessNode for AnnotationCsvWriter {
    fn name(&self) -> &str {
        "annotation_csv_writer"
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        0 // Sink
    }

    fn input_schema(&self) -> Vec<PortSchema> {
        vec![PortSchema::new::<Annotation>("annotations", 0, PortDirection::Input)]
    }

    fn work(&mut self, inputs: &[InputPort], _outputs: &[OutputPort]) -> WorkResult<usize> {
        let mut input = inputs
            .first()
            .and_then(|port| port.get::<Annotation>())
            .ok_or_else(|| WorkError::NodeError("Missing input channel".to_string()))?;

        let annotation = match input.recv() {
            Ok(annotation) => annotation,
            Err(e) => {
                let _ = self.writer.flush();
                return Err(e);
            }
        };

        writeln!(
            self.writer,
            "{},{},{},\"{}\",\"{}\"",
            annotation.start,
            annotation.end,
            annotation.class.id(),
            annotation.text(),
            annotation.texts.last().map(String::as_str).unwrap_or("")
        )
        .map_err(|e| WorkError::NodeError(format!("CSV write error: {}", e)))?;

        Ok(1)
    }
}

impl Drop for AnnotationCsvWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("=== ZDI Decode Example ===");
    info!("File: {}", args.file);

    let mut source = CaptureSource::open(&args.file)?;
    if args.limit > 0 {
        source = source.with_limit(args.limit);
    }
    info!("Samples: {}", source.len());

    let mut decoder = ZdiDecoder::new();
    if let Some(hz) = source.samplerate() {
        decoder.set_samplerate(hz);
    }

    let mut pipeline = Pipeline::new().with_default_buffer_size(args.buffer_size);
    pipeline.add_process("source", source)?;
    pipeline.add_process("zdi", decoder)?;
    pipeline.connect("source", "samples", "zdi", "samples")?;

    pipeline.add_process(
        "printer",
        AnnotationPrinter::new(args.row.map(AnnotationRow::from), args.n),
    )?;
    pipeline.connect("zdi", "annotations", "printer", "annotations")?;

    if let Some(csv_path) = &args.csv_output {
        info!("CSV output: {}", csv_path);
        pipeline.add_process("csv_writer", AnnotationCsvWriter::new(csv_path)?)?;
        pipeline.connect("zdi", "annotations", "csv_writer", "annotations")?;
    }

    info!("Building pipeline...");
    let scheduler = pipeline.build()?;

    info!("Running...");
    scheduler.wait();

    info!("Done!");

    Ok(())
}
