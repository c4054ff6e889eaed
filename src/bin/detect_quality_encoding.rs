//! Detect the quality score encoding used in a FASTQ file.

use anyhow::{ensure, Context, Result};
use fqprep::encoding::{infer_encoding, Detection};
use fqprep::fastq::create_quality_line_reader;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Configuration parameters specified as command-line options.
#[derive(StructOpt)]
#[structopt(about = "Detect the quality score encoding used in a FASTQ file.")]
struct Config {
    /// Identifier for dataset.
    #[structopt(short, long)]
    id: Option<String>,

    /// FASTQ file to read quality scores from (may be gzipped).
    #[structopt(parse(from_os_str))]
    fastq_file: PathBuf,

    /// The maximum number of quality lines to examine; by default scanning
    /// continues until the end of the file or until a single encoding is
    /// uniquely determined.
    #[structopt(short = "n", long)]
    max_quality_lines: Option<u64>,

    /// Summary of the detected encoding and the observed quality score
    /// range.
    #[structopt(short, long)]
    summary_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_args();

    if let Some(max_quality_lines) = config.max_quality_lines {
        ensure!(
            max_quality_lines > 0,
            "Invalid maximum number of quality lines"
        );
    }

    let filename = config
        .fastq_file
        .to_str()
        .context("Error obtaining FASTQ file name")?;
    info!("Reading quality scores from {}", filename);

    let mut reader = create_quality_line_reader(&config.fastq_file)?;
    let detection = infer_encoding(&mut reader, config.max_quality_lines)?;

    info!("{} quality lines examined", detection.quality_lines());

    if detection.candidates().is_empty() {
        warn!("No quality scores found in {}", filename);
    } else {
        if detection.is_ambiguous() {
            warn!("More than one quality encoding is consistent with the observed quality scores");
        }
        println!("{}", detection);
    }

    if let Some(summary_file) = &config.summary_file {
        write_summary(&config.id, &detection, summary_file)?;
    }

    Ok(())
}

/// Summary of an encoding detection run.
#[derive(Debug, Serialize)]
struct Summary {
    /// The ID for this detection run.
    id: String,

    /// The detected encoding(s), '|'-separated when still ambiguous.
    encoding: String,

    /// The lowest quality score byte value observed.
    min: Option<u8>,

    /// The highest quality score byte value observed.
    max: Option<u8>,

    /// The number of quality lines examined.
    quality_lines: u64,
}

/// Write the detection summary to a CSV file.
fn write_summary(id: &Option<String>, detection: &Detection, summary_file: &Path) -> Result<()> {
    let summary_filename = summary_file.to_str().unwrap();
    info!("Writing summary to {}", summary_filename);
    let id = match id {
        Some(id) => id.clone(),
        None => String::from(""),
    };
    let (min, max) = match detection.observed_range() {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };
    let summary = Summary {
        id,
        encoding: detection.candidates().join("|"),
        min,
        max,
        quality_lines: detection.quality_lines(),
    };
    let mut summary_writer = csv::Writer::from_path(summary_file)
        .with_context(|| format!("Error creating summary file {}", summary_filename))?;
    summary_writer
        .serialize(summary)
        .with_context(|| format!("Error writing summary to {}", summary_filename))?;
    summary_writer.flush().with_context(|| {
        format!(
            "Error writing summary file {} to completion",
            summary_filename
        )
    })?;

    Ok(())
}
