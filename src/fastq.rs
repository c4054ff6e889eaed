//! Line-oriented access to the quality scores in FASTQ files.
//!
//! FASTQ records occupy exactly four lines (header, sequence, separator and
//! quality string) so the quality string for each record is the line whose
//! 1-based position within the file is a multiple of four. The reader
//! provided here yields those lines only, with trailing whitespace removed.
//!
//! Example of reading the quality lines from a FASTQ file supplied on
//! standard input:
//!
//! ```
//! # use anyhow::Result;
//! use fqprep::fastq::QualityLineReader;
//! use std::io::{self, BufReader};
//!
//! # fn main() -> Result<()> {
//! let mut reader = QualityLineReader::new(BufReader::new(io::stdin()));
//!
//! let mut number_of_quality_values = 0;
//!
//! while let Some(qual) = reader.read_next()? {
//!     number_of_quality_values += qual.len();
//! }
//!
//! println!("Number of quality values: {}", number_of_quality_values);
//! # Ok(())
//! # }
//! ```
//!
//! A single string buffer can be reused for each iteration to avoid the cost
//! of allocating new instances.
//!
//! ```
//! # use anyhow::Result;
//! use fqprep::fastq::QualityLineReader;
//! use std::io::{self, BufReader};
//!
//! # fn main() -> Result<()> {
//! let mut reader = QualityLineReader::new(BufReader::new(io::stdin()));
//! let mut qual = String::new();
//!
//! let mut number_of_quality_lines = 0;
//!
//! while reader.read_next_into(&mut qual)? {
//!     number_of_quality_lines += 1;
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Context, Result};
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub struct QualityLineReader<R: BufRead> {
    reader: R,
    name: String,
    line_buffer: String,
    line_count: u64,
    quality_line_count: u64,
}

impl<R: BufRead> QualityLineReader<R> {
    pub fn new(reader: R) -> Self {
        QualityLineReader::with_name(reader, "unnamed")
    }

    pub fn with_name(reader: R, name: &str) -> Self {
        QualityLineReader {
            reader,
            name: name.to_string(),
            line_buffer: String::with_capacity(160),
            line_count: 0,
            quality_line_count: 0,
        }
    }

    /// The number of physical lines read so far.
    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    /// The number of quality lines read so far.
    pub fn quality_line_count(&self) -> u64 {
        self.quality_line_count
    }

    pub fn read_next(&mut self) -> Result<Option<String>> {
        let mut qual = String::with_capacity(160);
        if self.read_next_into(&mut qual)? {
            Ok(Some(qual))
        } else {
            Ok(None)
        }
    }

    /// Read the next quality line into the given buffer, returning false
    /// when the end of the input is reached. A trailing partial record, one
    /// ending before its quality line, yields nothing.
    pub fn read_next_into(&mut self, qual: &mut String) -> Result<bool> {
        qual.clear();

        loop {
            self.line_buffer.clear();
            let number_of_bytes =
                self.reader
                    .read_line(&mut self.line_buffer)
                    .with_context(|| {
                        format!(
                            "unexpected problem reading line {}, {}",
                            self.line_count + 1,
                            self.name
                        )
                    })?;

            if number_of_bytes == 0 {
                return Ok(false);
            }

            self.line_count += 1;

            if self.line_count % 4 == 0 {
                self.quality_line_count += 1;
                qual.push_str(self.line_buffer.trim_end());
                return Ok(true);
            }
        }
    }
}

pub fn create_quality_line_reader(
    fastq_file: &Path,
) -> Result<QualityLineReader<BufReader<Box<dyn Read>>>> {
    let fastq_file_name = match fastq_file.to_str() {
        Some(name) => String::from(name),
        None => {
            bail!("invalid file name for {:?}", fastq_file)
        }
    };

    let file = File::open(fastq_file)
        .with_context(|| format!("Error opening file {}", fastq_file_name))?;

    let reader: Box<dyn Read> = if fastq_file_name.ends_with(".gz") {
        Box::new(MultiGzDecoder::new(BufReader::with_capacity(
            64 * 1024,
            file,
        )))
    } else {
        Box::new(file)
    };

    let buffered_reader = BufReader::with_capacity(64 * 1024, reader);
    let quality_line_reader =
        QualityLineReader::with_name(buffered_reader, fastq_file_name.as_str());

    Ok(quality_line_reader)
}
