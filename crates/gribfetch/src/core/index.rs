use tracing::{debug, warn};

use crate::data::{ByteRange, MatchSpec, RangeSet};
use crate::error::{Error, Result};

/// One line of an index document: `seq:offset:...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    /// Message number; sub-message suffixes such as `75.2` are dropped.
    /// `None` when the first field is not numeric.
    pub sequence: Option<u64>,
    /// Start of the record in the payload.
    pub offset: u64,
    pub text: String,
}

impl IndexRecord {
    /// Parse a record from line `line` (1-based) of the document.
    pub fn parse(line: usize, text: &str) -> Result<Self> {
        let malformed = || Error::MalformedIndex {
            line,
            text: text.to_string(),
        };

        let mut fields = text.split(':');
        let sequence = fields
            .next()
            .and_then(|field| field.trim().split('.').next())
            .and_then(|digits| digits.parse::<u64>().ok());
        let offset = fields
            .next()
            .and_then(|field| field.trim().parse::<u64>().ok())
            .ok_or_else(malformed)?;

        Ok(Self {
            sequence,
            offset,
            text: text.to_string(),
        })
    }
}

/// Result of resolving patterns against an index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Matched records in document order.
    pub records: Vec<IndexRecord>,
    /// One range per distinct matched offset, ascending.
    pub ranges: RangeSet,
    /// Patterns that matched no line.
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Non-empty lines with their 1-based line numbers.
fn lines(document: &str) -> Vec<(usize, &str)> {
    document
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line))
        .collect()
}

/// End of the record starting at `offset`: one byte before the next record
/// with a larger offset. Sub-messages sharing the offset are skipped.
fn record_end(offset: u64, following: &[(usize, &str)]) -> Result<Option<u64>> {
    for &(number, text) in following {
        let next = IndexRecord::parse(number, text)?;
        if next.offset > offset {
            return Ok(Some(next.offset - 1));
        }
        if next.offset < offset {
            return Err(Error::MalformedIndex {
                line: number,
                text: text.to_string(),
            });
        }
    }
    Ok(None)
}

/// Resolve `spec` against an index document into byte ranges.
///
/// Each line matching any pattern yields one range, in document order. The
/// last record in the document gets an open-ended range.
///
/// # Errors
///
/// - [`Error::NoMatchingRecords`] when no line matches.
/// - [`Error::MalformedIndex`] when a matched line or its successor has no
///   usable offset, or offsets go backwards.
///
/// # Examples
///
/// ```
/// use gribfetch::{MatchSpec, resolve};
///
/// let index = "1:0:d=2023010100:TMP:2 m above ground\n\
///              2:500:d=2023010100:UGRD:10 m above ground\n\
///              3:1000:d=2023010100:end\n";
///
/// let resolution = resolve(index.as_bytes(), &MatchSpec::literal(["UGRD"])).unwrap();
/// assert_eq!(resolution.ranges.to_string(), "500-999");
/// ```
pub fn resolve(document: &[u8], spec: &MatchSpec) -> Result<Resolution> {
    let document = String::from_utf8_lossy(document);
    let lines = lines(&document);

    let mut hits = vec![false; spec.len()];
    let mut records = Vec::new();
    let mut ranges: Vec<ByteRange> = Vec::new();

    for (position, &(number, text)) in lines.iter().enumerate() {
        let mut matched = false;
        for (index, hit) in hits.iter_mut().enumerate() {
            if spec.matches(index, text) {
                *hit = true;
                matched = true;
            }
        }
        if !matched {
            continue;
        }

        let record = IndexRecord::parse(number, text)?;
        if ranges.last().is_some_and(|last| last.start == record.offset) {
            records.push(record);
            continue;
        }
        let end = record_end(record.offset, &lines[position + 1..])?;
        ranges.push(ByteRange {
            start: record.offset,
            end,
        });
        records.push(record);
    }

    if ranges.is_empty() {
        return Err(Error::NoMatchingRecords {
            patterns: spec.patterns().to_vec(),
        });
    }

    let missing: Vec<String> = spec
        .patterns()
        .iter()
        .zip(&hits)
        .filter(|(_, hit)| !**hit)
        .map(|(pattern, _)| pattern.clone())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "some patterns matched no index records");
    }

    let ranges = RangeSet::new(ranges);
    debug!(ranges = %ranges, "resolved byte ranges");

    Ok(Resolution {
        records,
        ranges,
        missing,
    })
}
