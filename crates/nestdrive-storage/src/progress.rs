//! Upload progress reporting.

use std::sync::Arc;

/// Progress of a single payload write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes handed to the object store so far.
    pub bytes_done: u64,
    /// Total payload size.
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completed fraction in `[0, 1]`. An empty payload counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
    }

    /// Whether every byte has been written.
    pub fn is_complete(&self) -> bool {
        self.bytes_done >= self.total_bytes
    }
}

/// Callback invoked as an upload advances.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_bounds() {
        let p = UploadProgress {
            bytes_done: 5,
            total_bytes: 10,
        };
        assert!((p.fraction() - 0.5).abs() < f64::EPSILON);

        let empty = UploadProgress {
            bytes_done: 0,
            total_bytes: 0,
        };
        assert_eq!(empty.fraction(), 1.0);
        assert!(empty.is_complete());
    }
}
