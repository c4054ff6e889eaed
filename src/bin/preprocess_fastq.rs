//! Detect the quality score encoding of a FASTQ file, then trim and filter
//! its reads by running prinseq-lite configured for the detected encoding.

use anyhow::{bail, ensure, Context, Result};
use fqprep::encoding::infer_encoding;
use fqprep::fastq::create_quality_line_reader;
use fqprep::report::Report;
use fqprep::trim::TrimCommand;
use log::{info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

/// Configuration parameters specified as command-line options.
#[derive(StructOpt)]
#[structopt(
    about = "Detect the quality score encoding of a FASTQ file, then trim and filter its reads using prinseq-lite."
)]
struct Config {
    /// FASTQ file to preprocess (may be gzipped).
    #[structopt(parse(from_os_str))]
    fastq_file: PathBuf,

    /// The maximum number of quality lines to examine when detecting the
    /// quality encoding; by default scanning continues until the end of the
    /// file or until a single encoding is uniquely determined.
    #[structopt(short = "n", long)]
    max_quality_lines: Option<u64>,

    /// File to which the run report will be written.
    #[structopt(short, long, default_value = "log.txt", parse(from_os_str))]
    log_file: PathBuf,

    /// The prefix for prinseq parameter file names; the parameter file used
    /// for a run is <prefix>_<encoding>.txt.
    #[structopt(long, default_value = "prinseq_params")]
    params_prefix: String,
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

    // the encoding must be settled before any external tool is run
    let mut reader = create_quality_line_reader(&config.fastq_file)?;
    let detection = infer_encoding(&mut reader, config.max_quality_lines)?;

    let encoding = match detection.best() {
        Some(encoding) => encoding,
        None => bail!("no quality scores found in {}", filename),
    };

    if detection.is_ambiguous() {
        warn!(
            "More than one quality encoding is consistent with the observed quality scores, proceeding with {}",
            encoding
        );
    }

    info!("Detected quality encoding {}", encoding);

    let mut report = Report::to_file(&config.log_file)?;
    report.encoding_detected(&detection)?;

    let command = TrimCommand::prinseq(&config.fastq_file, encoding, &config.params_prefix)?;
    let status = command.run()?;
    if !status.success() {
        warn!("{} exited with {}", command.program(), status);
    }
    report.trimming_outcome(status.success())?;

    report.finish()?;

    Ok(())
}
