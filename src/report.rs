//! The run report written for each preprocessing run.
//!
//! The report is a short human-readable account of what the run did and is
//! not intended for machine parsing. It is owned by the top-level
//! orchestration routine and flushed when the run finishes; progress and
//! diagnostic messages go to the logger instead.

use crate::encoding::Detection;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct Report<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> Report<W> {
    pub fn new(writer: W) -> Report<W> {
        Report {
            writer: BufWriter::new(writer),
        }
    }

    /// Record the outcome of the encoding detection step.
    pub fn encoding_detected(&mut self, detection: &Detection) -> Result<()> {
        writeln!(
            self.writer,
            "Successfully decoded fastq file quality scores as {}.",
            detection
        )?;
        Ok(())
    }

    /// Record whether the trimming and filtering step succeeded.
    pub fn trimming_outcome(&mut self, success: bool) -> Result<()> {
        if success {
            writeln!(self.writer, "Reads successfully trimmed and filtered.")?;
        } else {
            writeln!(self.writer, "Trimming and filtering of reads failed.")?;
        }
        Ok(())
    }

    /// Flush the report to its destination.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Report<File> {
    pub fn to_file(path: &Path) -> Result<Report<File>> {
        let file = File::create(path)
            .with_context(|| format!("Error creating report file {:?}", path))?;
        Ok(Report::new(file))
    }
}
