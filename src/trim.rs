//! Invocation of the external read trimming and filtering tool.
//!
//! The tool is run as a child process from a structured argument list; no
//! shell is involved. Exit status 0 means the reads were trimmed and
//! filtered successfully, anything else is reported back to the caller to
//! record, not retried.

use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Known FASTQ file extensions, stripped when deriving output file stems.
const FASTQ_EXTENSIONS: [&str; 4] = [".fastq.gz", ".fq.gz", ".fastq", ".fq"];

/// An external tool invocation as an executable name and a structured
/// argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimCommand {
    program: String,
    args: Vec<String>,
}

impl TrimCommand {
    /// Build the prinseq-lite invocation for the given FASTQ file and
    /// detected quality encoding.
    ///
    /// The parameter file passed to prinseq-lite is named
    /// `<params_prefix>_<encoding>.txt` and the good and bad output sets
    /// are named after the input file with `_good` and `_bad` suffixes.
    pub fn prinseq(fastq_file: &Path, encoding: &str, params_prefix: &str) -> Result<TrimCommand> {
        let fastq_file_name = match fastq_file.to_str() {
            Some(name) => name,
            None => {
                bail!("invalid file name for {:?}", fastq_file)
            }
        };

        let stem = output_stem(fastq_file_name);

        Ok(TrimCommand {
            program: String::from("prinseq-lite"),
            args: vec![
                String::from("-fastq"),
                String::from(fastq_file_name),
                String::from("-params"),
                format!("{}_{}.txt", params_prefix, encoding),
                String::from("-out_good"),
                format!("{}_good", stem),
                String::from("-out_bad"),
                format!("{}_bad", stem),
            ],
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command and wait for it to complete.
    pub fn run(&self) -> Result<ExitStatus> {
        info!("Running {} {}", self.program, self.args.join(" "));
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .with_context(|| format!("Error running {}", self.program))?;
        Ok(status)
    }
}

/// Derive the stem used for output file names by stripping a known FASTQ
/// extension from the given file name. A name with no recognised extension
/// is used whole.
pub fn output_stem(file_name: &str) -> &str {
    for extension in &FASTQ_EXTENSIONS {
        if file_name.ends_with(extension) {
            return &file_name[..file_name.len() - extension.len()];
        }
    }
    file_name
}
