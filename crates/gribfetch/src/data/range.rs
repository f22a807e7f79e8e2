use std::fmt;

/// An inclusive span of a remote file; `end == None` runs to end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn open(start: u64) -> Self {
        Self { start, end: None }
    }

    /// Number of bytes covered, if bounded.
    pub fn len(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.start) + 1)
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Clamp to a local buffer of `size` bytes, as a half-open slice window.
    pub fn window(&self, size: u64) -> std::ops::Range<usize> {
        let start = self.start.min(size);
        let end = self
            .end
            .map(|end| end.saturating_add(1).min(size))
            .unwrap_or(size)
            .max(start);
        start as usize..end as usize
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

/// Ordered byte ranges for one partial retrieval.
///
/// An empty set means "the whole file".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet(Vec<ByteRange>);

impl RangeSet {
    pub fn new(ranges: Vec<ByteRange>) -> Self {
        Self(ranges)
    }

    pub fn whole() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ByteRange> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ByteRange] {
        &self.0
    }

    /// Merge touching or overlapping spans.
    ///
    /// `0-499` followed by `500-` becomes `0-`.
    pub fn coalesced(&self) -> Vec<ByteRange> {
        let mut sorted = self.0.clone();
        sorted.sort_by_key(|r| r.start);

        let mut merged: Vec<ByteRange> = Vec::with_capacity(sorted.len());
        for range in sorted {
            let Some(last) = merged.last_mut() else {
                merged.push(range);
                continue;
            };
            let Some(end) = last.end else {
                continue;
            };
            if range.start <= end.saturating_add(1) {
                last.end = range.end.map(|next_end| next_end.max(end));
            } else {
                merged.push(range);
            }
        }
        merged
    }

    /// Value for an HTTP `Range` header, or `None` for a whole-file request.
    pub fn header(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let spans: Vec<String> = self.coalesced().iter().map(ToString::to_string).collect();
        Some(format!("bytes={}", spans.join(",")))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spans: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", spans.join(","))
    }
}

impl From<Vec<ByteRange>> for RangeSet {
    fn from(ranges: Vec<ByteRange>) -> Self {
        Self(ranges)
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a ByteRange;
    type IntoIter = std::slice::Iter<'a, ByteRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
