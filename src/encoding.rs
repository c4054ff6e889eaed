//! Inference of the quality score encoding used in a FASTQ file.
//!
//! Quality scores are stored as printable ASCII characters and the two
//! encoding schemes in common use, Phred+33 and Phred+64, occupy different
//! but overlapping bands of byte values. The inference scan keeps a running
//! range of the quality values observed so far and narrows the set of
//! encodings whose band fully contains that range; the range only ever
//! widens, so an encoding excluded at any point can never become a
//! candidate again.
//!
//! ```
//! # use anyhow::Result;
//! use fqprep::encoding::infer_encoding;
//! use fqprep::fastq::QualityLineReader;
//!
//! # fn main() -> Result<()> {
//! let fastq: &[u8] = b"@read1\nACGT\n+\n!+5?\n";
//! let mut reader = QualityLineReader::new(fastq);
//!
//! let detection = infer_encoding(&mut reader, None)?;
//! assert_eq!(detection.best(), Some("phred33"));
//! # Ok(())
//! # }
//! ```

use crate::fastq::QualityLineReader;
use anyhow::Result;
use std::fmt;
use std::io::BufRead;
use thiserror::Error;

/// A named quality score encoding with inclusive bounds on the byte values
/// its quality characters can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRange {
    pub name: &'static str,
    pub min: u8,
    pub max: u8,
}

impl EncodingRange {
    fn contains(&self, min: u8, max: u8) -> bool {
        self.min <= min && max <= self.max
    }
}

/// The known quality score encodings. The table is fixed for the lifetime
/// of the process.
pub const KNOWN_ENCODINGS: [EncodingRange; 2] = [
    // Sanger and Illumina 1.8+
    EncodingRange {
        name: "phred33",
        min: 33,
        max: 74,
    },
    // Solexa, Illumina 1.3 and Illumina 1.5
    EncodingRange {
        name: "phred64",
        min: 59,
        max: 104,
    },
];

/// Error returned when the observed quality value range is not contained
/// within any known encoding, indicating a corrupt or misformatted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no known quality encoding for observed range ({min}, {max})")]
pub struct NoConsistentEncoding {
    pub min: u8,
    pub max: u8,
}

/// The range of quality byte values observed during a scan. The minimum
/// only ever decreases and the maximum only ever increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ObservedRange {
    min: u8,
    max: u8,
}

impl ObservedRange {
    fn new() -> ObservedRange {
        // sentinel pair, widened by the first observation
        ObservedRange {
            min: u8::MAX,
            max: u8::MIN,
        }
    }

    fn widen(&mut self, min: u8, max: u8) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }
}

/// The outcome of a completed scan: the encodings that remain consistent
/// with every quality value observed.
///
/// A single candidate identifies the encoding; more than one means the scan
/// ended while still ambiguous; none means no quality values were seen at
/// all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    candidates: Vec<&'static str>,
    observed: Option<(u8, u8)>,
    quality_lines: u64,
}

impl Detection {
    /// The names of the encodings still consistent with the observed
    /// quality values, in the order they appear in the built-in table.
    pub fn candidates(&self) -> &[&'static str] {
        &self.candidates
    }

    /// The minimum and maximum quality byte value observed, or None when no
    /// quality values were seen.
    pub fn observed_range(&self) -> Option<(u8, u8)> {
        self.observed
    }

    /// The number of quality lines examined by the scan.
    pub fn quality_lines(&self) -> u64 {
        self.quality_lines
    }

    pub fn is_unique(&self) -> bool {
        self.candidates.len() == 1
    }

    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }

    /// The first remaining candidate, the one a caller electing to proceed
    /// despite ambiguity should use.
    pub fn best(&self) -> Option<&'static str> {
        self.candidates.first().copied()
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.candidates.join("\n"))
    }
}

/// Compute the minimum and maximum byte value over a quality string.
/// Returns None for an empty string.
///
/// ```
/// use fqprep::encoding::quality_range;
///
/// let range = quality_range("DLXYXXRXWYYTPMLUUQWTXTRSXSWMDMTRNDNSMJFJFFRMV");
/// assert_eq!(range, Some((68, 89)));
/// ```
pub fn quality_range(qual: &str) -> Option<(u8, u8)> {
    let mut range: Option<(u8, u8)> = None;
    for value in qual.bytes() {
        range = match range {
            Some((min, max)) => Some((min.min(value), max.max(value))),
            None => Some((value, value)),
        };
    }
    range
}

/// The names of the known encodings whose bounds fully contain the given
/// observed range.
pub fn encodings_in_range(min: u8, max: u8) -> Vec<&'static str> {
    KNOWN_ENCODINGS
        .iter()
        .filter(|encoding| encoding.contains(min, max))
        .map(|encoding| encoding.name)
        .collect()
}

/// Scan quality lines from the given reader and infer the quality score
/// encoding.
///
/// With `max_quality_lines` of None the scan runs until the end of the
/// input or until a single encoding is uniquely determined, whichever comes
/// first; no further lines are read once the answer is known. With
/// `Some(n)` at most `n` quality lines are examined and the remaining
/// candidate set is returned as is, even when still ambiguous; a bounded
/// scan never takes the early-unique shortcut so that the sampling window
/// requested by the caller is what decides.
///
/// Returns a [`NoConsistentEncoding`] error as soon as the observed range
/// falls outside every known encoding. The built-in encoding table cannot
/// be extended at runtime so this is an input-data error, not a retryable
/// condition.
pub fn infer_encoding<R: BufRead>(
    reader: &mut QualityLineReader<R>,
    max_quality_lines: Option<u64>,
) -> Result<Detection> {
    let mut observed = ObservedRange::new();
    let mut candidates: Vec<&'static str> = Vec::new();
    let mut quality_lines: u64 = 0;
    let mut seen_any = false;

    let mut qual = String::with_capacity(160);

    loop {
        if let Some(limit) = max_quality_lines {
            if quality_lines >= limit {
                break;
            }
        }

        if !reader.read_next_into(&mut qual)? {
            break;
        }
        quality_lines += 1;

        if let Some((line_min, line_max)) = quality_range(&qual) {
            seen_any = true;

            if line_min < observed.min || line_max > observed.max {
                observed.widen(line_min, line_max);
                candidates = encodings_in_range(observed.min, observed.max);

                if candidates.is_empty() {
                    return Err(NoConsistentEncoding {
                        min: observed.min,
                        max: observed.max,
                    }
                    .into());
                }

                if candidates.len() == 1 && max_quality_lines.is_none() {
                    break;
                }
            }
        }
    }

    let observed = if seen_any {
        Some((observed.min, observed.max))
    } else {
        None
    };

    Ok(Detection {
        candidates,
        observed,
        quality_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Read};

    /// Build FASTQ content with one 4-line record per quality string.
    fn fastq_with_quality_lines(quals: &[&str]) -> Vec<u8> {
        let mut content = String::new();
        for (i, qual) in quals.iter().enumerate() {
            content.push_str(&format!("@read{}\n", i + 1));
            content.push_str(&"A".repeat(qual.len().max(1)));
            content.push_str("\n+\n");
            content.push_str(qual);
            content.push('\n');
        }
        content.into_bytes()
    }

    fn infer(quals: &[&str], max_quality_lines: Option<u64>) -> Result<Detection> {
        let content = fastq_with_quality_lines(quals);
        let mut reader = QualityLineReader::new(&content[..]);
        infer_encoding(&mut reader, max_quality_lines)
    }

    /// A reader that must never be reached.
    struct ReadBeyondDecision;

    impl Read for ReadBeyondDecision {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            panic!("quality line read beyond the deciding record");
        }
    }

    #[test]
    fn per_line_range() {
        assert_eq!(
            quality_range("DLXYXXRXWYYTPMLUUQWTXTRSXSWMDMTRNDNSMJFJFFRMV"),
            Some((68, 89))
        );
        assert_eq!(quality_range("!!!!!"), Some((33, 33)));
        assert_eq!(quality_range(""), None);
    }

    #[test]
    fn known_encoding_bounds() {
        assert_eq!(encodings_in_range(33, 74), vec!["phred33"]);
        assert_eq!(encodings_in_range(59, 104), vec!["phred64"]);
        assert_eq!(encodings_in_range(59, 74), vec!["phred33", "phred64"]);
        assert!(encodings_in_range(33, 104).is_empty());
    }

    #[test]
    fn all_exclamation_marks_is_phred33() {
        let detection = infer(&["!!!!!"], None).expect("Error inferring encoding");
        assert_eq!(detection.candidates(), ["phred33"]);
        assert!(detection.is_unique());
        assert_eq!(detection.observed_range(), Some((33, 33)));
    }

    #[test]
    fn low_quality_values_are_phred33() {
        // all byte values within [33, 74], at least one below 59
        let detection =
            infer(&["++5?AFFFJJ", "!(5AFFJIJJ"], None).expect("Error inferring encoding");
        assert_eq!(detection.candidates(), ["phred33"]);
    }

    #[test]
    fn high_quality_values_are_phred64() {
        // (68, 89) fits inside phred64's band but exceeds phred33's maximum
        let detection = infer(
            &["DLXYXXRXWYYTPMLUUQWTXTRSXSWMDMTRNDNSMJFJFFRMV"],
            None,
        )
        .expect("Error inferring encoding");
        assert_eq!(detection.candidates(), ["phred64"]);
        assert_eq!(detection.observed_range(), Some((68, 89)));
        assert_eq!(detection.quality_lines(), 1);
    }

    #[test]
    fn overlapping_band_is_ambiguous() {
        // byte values within [59, 74] fit both encodings
        let detection = infer(&["ABCDEF", ";<=>?@"], None).expect("Error inferring encoding");
        assert!(detection.is_ambiguous());
        assert_eq!(detection.candidates(), ["phred33", "phred64"]);
        assert_eq!(detection.best(), Some("phred33"));
        assert_eq!(detection.to_string(), "phred33\nphred64");
    }

    #[test]
    fn conflicting_values_in_one_line_fail() {
        // '(' (40) requires phred33, 'd' (100) requires phred64
        let result = infer(&["(d"], None);
        assert!(result.is_err(), "Expecting no consistent encoding");
        let error = result.unwrap_err();
        let error = error
            .downcast_ref::<NoConsistentEncoding>()
            .expect("Expecting NoConsistentEncoding");
        assert_eq!(*error, NoConsistentEncoding { min: 40, max: 100 });
    }

    #[test]
    fn conflicting_values_across_records_fail() {
        // bounded scan so the first record's unique answer does not end the
        // scan before the conflicting second record is seen
        let result = infer(&["(((", "ddd"], Some(2));
        assert!(result.is_err(), "Expecting no consistent encoding");
        let error = result.unwrap_err();
        assert!(error.downcast_ref::<NoConsistentEncoding>().is_some());
    }

    #[test]
    fn candidates_narrow_monotonically() {
        let quals = ["ABCDEF", "d", "!"];
        let mut previous: Option<Vec<&'static str>> = None;
        for length in 1..=2 {
            let detection = infer(&quals[..length], Some(length as u64))
                .expect("Error inferring encoding");
            let current = detection.candidates().to_vec();
            if let Some(previous) = previous {
                assert!(
                    current.iter().all(|name| previous.contains(name)),
                    "candidate set grew as more lines were scanned"
                );
            }
            previous = Some(current);
        }
        // the third record conflicts with the second and empties the set
        assert!(infer(&quals, Some(3)).is_err());
    }

    #[test]
    fn unbounded_scan_stops_at_unique_answer() {
        // the single record decides phred64; any read past it panics
        let decided: &[u8] = b"@read1\nACGT\n+\ndddd\n";
        let reader = BufReader::new(decided.chain(ReadBeyondDecision));
        let mut reader = QualityLineReader::new(reader);
        let detection =
            infer_encoding(&mut reader, None).expect("Error inferring encoding");
        assert_eq!(detection.candidates(), ["phred64"]);
        assert_eq!(detection.quality_lines(), 1);
    }

    #[test]
    fn bounded_scan_examines_at_most_the_cap() {
        let content = fastq_with_quality_lines(&["AAAA", "BBBB", "CCCC", "dddd"]);
        let mut reader = QualityLineReader::new(&content[..]);
        let detection =
            infer_encoding(&mut reader, Some(2)).expect("Error inferring encoding");
        assert_eq!(detection.quality_lines(), 2);
        assert_eq!(reader.quality_line_count(), 2);
        // the deciding fourth record was never reached
        assert!(detection.is_ambiguous());
    }

    #[test]
    fn bounded_scan_does_not_take_the_early_unique_shortcut() {
        let content = fastq_with_quality_lines(&["dddd", "AAAA", "BBBB"]);
        let mut reader = QualityLineReader::new(&content[..]);
        let detection =
            infer_encoding(&mut reader, Some(3)).expect("Error inferring encoding");
        // unique after the first line but the scan runs to its cap
        assert_eq!(detection.candidates(), ["phred64"]);
        assert_eq!(detection.quality_lines(), 3);
    }

    #[test]
    fn repeated_runs_agree() {
        let quals = ["ABCDEF", "GHIJ"];
        let first = infer(&quals, None).expect("Error inferring encoding");
        let second = infer(&quals, None).expect("Error inferring encoding");
        assert_eq!(first, second);
    }

    #[test]
    fn blank_quality_lines_contribute_no_observation() {
        let detection = infer(&["", "AAAA"], None).expect("Error inferring encoding");
        assert_eq!(detection.observed_range(), Some((65, 65)));
        assert_eq!(detection.quality_lines(), 2);
    }

    #[test]
    fn no_quality_lines_yield_no_candidates() {
        let detection = infer(&[], None).expect("Error inferring encoding");
        assert!(detection.candidates().is_empty());
        assert_eq!(detection.observed_range(), None);
        assert_eq!(detection.quality_lines(), 0);
    }
}
