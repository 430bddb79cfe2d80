//! Publish sessions and chunked byte ranges.

use serde::{Deserialize, Serialize};

/// An inclusive byte range of an artifact sent in one upload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
    /// Size of the whole artifact.
    pub total: u64,
}

impl ChunkRange {
    /// Split `total` bytes into contiguous ranges of at most `chunk_size`.
    ///
    /// Returns no ranges for an empty artifact or a zero chunk size.
    pub fn plan(total: u64, chunk_size: u64) -> Vec<ChunkRange> {
        if total == 0 || chunk_size == 0 {
            return Vec::new();
        }
        let mut ranges = Vec::with_capacity(total.div_ceil(chunk_size) as usize);
        let mut start = 0;
        while start < total {
            let end = (start + chunk_size).min(total) - 1;
            ranges.push(ChunkRange { start, end, total });
            start = end + 1;
        }
        ranges
    }

    /// Number of bytes in the range. Never zero.
    pub fn byte_len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value: `bytes start-end/total`.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }

    /// Byte indices for slicing the artifact.
    pub fn as_slice_range(&self) -> std::ops::Range<usize> {
        self.start as usize..(self.end + 1) as usize
    }
}

/// Server-assigned upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    pub publish_id: String,
    pub upload_url: String,
    pub total_bytes: u64,
    pub bytes_sent: u64,
}

/// Rejected progress updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadProgressError {
    #[error("range starts at {start} but {sent} bytes were sent")]
    NotContiguous { start: u64, sent: u64 },

    #[error("range total {range_total} does not match session total {session_total}")]
    TotalMismatch { range_total: u64, session_total: u64 },
}

impl UploadSession {
    pub fn new(publish_id: String, upload_url: String, total_bytes: u64) -> Self {
        Self {
            publish_id,
            upload_url,
            total_bytes,
            bytes_sent: 0,
        }
    }

    /// Record a successfully sent range. Ranges must arrive in order.
    pub fn record_sent(&mut self, range: &ChunkRange) -> Result<(), UploadProgressError> {
        if range.total != self.total_bytes {
            return Err(UploadProgressError::TotalMismatch {
                range_total: range.total,
                session_total: self.total_bytes,
            });
        }
        if range.start != self.bytes_sent {
            return Err(UploadProgressError::NotContiguous {
                start: range.start,
                sent: self.bytes_sent,
            });
        }
        self.bytes_sent = range.end + 1;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_sent == self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plan_25mb_in_10mb_chunks() {
        let ranges = ChunkRange::plan(25_000_000, 10_000_000);
        let sizes: Vec<u64> = ranges.iter().map(ChunkRange::byte_len).collect();
        assert_eq!(sizes, vec![10_000_000, 10_000_000, 5_000_000]);
        assert_eq!(ranges[0].content_range(), "bytes 0-9999999/25000000");
        assert_eq!(ranges[2].content_range(), "bytes 20000000-24999999/25000000");
    }

    #[test]
    fn test_plan_exact_multiple_has_no_empty_tail() {
        let ranges = ChunkRange::plan(20, 10);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].end, 19);
    }

    #[test]
    fn test_plan_empty_artifact() {
        assert!(ChunkRange::plan(0, 10).is_empty());
    }

    #[test]
    fn test_session_rejects_out_of_order_range() {
        let mut session = UploadSession::new("p".into(), "u".into(), 30);
        let ranges = ChunkRange::plan(30, 10);
        session.record_sent(&ranges[0]).unwrap();
        assert_eq!(
            session.record_sent(&ranges[2]),
            Err(UploadProgressError::NotContiguous { start: 20, sent: 10 })
        );
        session.record_sent(&ranges[1]).unwrap();
        session.record_sent(&ranges[2]).unwrap();
        assert!(session.is_complete());
    }

    proptest! {
        #[test]
        fn prop_plan_is_contiguous_and_complete(total in 1u64..50_000_000, chunk in 1_000u64..30_000_000) {
            let ranges = ChunkRange::plan(total, chunk);
            prop_assert_eq!(ranges.len() as u64, total.div_ceil(chunk));
            prop_assert_eq!(ranges[0].start, 0);
            prop_assert_eq!(ranges.last().unwrap().end, total - 1);
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[0].end + 1, pair[1].start);
            }
            for range in &ranges {
                prop_assert!(range.byte_len() <= chunk);
            }
        }
    }
}
