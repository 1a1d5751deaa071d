//! Resource quotas enforced while decoding.

use crate::util::{Error, Result};

/// Ceilings applied to a single decode call.
///
/// The default imposes no limit; each ceiling is opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadQuotas {
    /// Maximum total bytes materialized across all buffers.
    /// `Some(0)` admits no buffer data at all.
    pub max_memory_allocation: Option<u64>,
    /// Maximum number of buffers a document may declare.
    pub max_buffer_count: Option<usize>,
}

impl ReadQuotas {
    /// Quotas with no limits.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_memory_allocation(mut self, bytes: u64) -> Self {
        self.max_memory_allocation = Some(bytes);
        self
    }

    pub fn with_max_buffer_count(mut self, count: usize) -> Self {
        self.max_buffer_count = Some(count);
        self
    }
}

/// Running totals for one decode call.
#[derive(Debug)]
pub struct QuotaGuard {
    quotas: ReadQuotas,
    allocated: u64,
    buffers: usize,
}

impl QuotaGuard {
    pub fn new(quotas: ReadQuotas) -> Self {
        Self {
            quotas,
            allocated: 0,
            buffers: 0,
        }
    }

    /// Bytes accounted so far.
    #[inline]
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Buffers admitted so far.
    #[inline]
    pub fn buffers(&self) -> usize {
        self.buffers
    }

    /// Admit `count` more buffers.
    pub fn admit_buffers(&mut self, count: usize) -> Result<()> {
        let total = self.buffers.saturating_add(count);
        if let Some(max) = self.quotas.max_buffer_count {
            if total > max {
                return Err(Error::BufferCountExceeded { count: total, max });
            }
        }
        self.buffers = total;
        Ok(())
    }

    /// Account for `bytes` more materialized bytes.
    ///
    /// On failure the running total is left unchanged.
    pub fn reserve(&mut self, bytes: u64) -> Result<()> {
        if let Some(max) = self.quotas.max_memory_allocation {
            let fits = self
                .allocated
                .checked_add(bytes)
                .is_some_and(|total| total <= max);
            // A zero ceiling admits nothing, not even empty payloads.
            if !fits || max == 0 {
                return Err(Error::MemoryExceeded {
                    requested: bytes,
                    allocated: self.allocated,
                    max,
                });
            }
        }
        self.allocated = self.allocated.saturating_add(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ErrorKind;

    #[test]
    fn test_unlimited() {
        let mut guard = QuotaGuard::new(ReadQuotas::default());
        guard.admit_buffers(10_000).unwrap();
        guard.reserve(u64::MAX / 2).unwrap();
        guard.reserve(u64::MAX / 2).unwrap();
        assert_eq!(guard.buffers(), 10_000);
    }

    #[test]
    fn test_buffer_count() {
        let mut guard = QuotaGuard::new(ReadQuotas::default().with_max_buffer_count(2));
        guard.admit_buffers(2).unwrap();
        let err = guard.admit_buffers(1).unwrap_err();
        assert!(matches!(err, Error::BufferCountExceeded { count: 3, max: 2 }));
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_zero_buffers() {
        let mut guard = QuotaGuard::new(ReadQuotas::default().with_max_buffer_count(0));
        guard.admit_buffers(0).unwrap();
        assert!(guard.admit_buffers(1).is_err());
    }

    #[test]
    fn test_memory() {
        let mut guard = QuotaGuard::new(ReadQuotas::default().with_max_memory_allocation(10));
        guard.reserve(4).unwrap();
        guard.reserve(6).unwrap();
        let err = guard.reserve(1).unwrap_err();
        assert!(matches!(err, Error::MemoryExceeded { requested: 1, allocated: 10, max: 10 }));
        assert_eq!(guard.allocated(), 10);
    }

    #[test]
    fn test_zero_memory() {
        let mut guard = QuotaGuard::new(ReadQuotas::default().with_max_memory_allocation(0));
        assert!(guard.reserve(1).is_err());
        assert!(guard.reserve(0).is_err());
    }

    #[test]
    fn test_overflow() {
        let mut guard =
            QuotaGuard::new(ReadQuotas::default().with_max_memory_allocation(u64::MAX));
        guard.reserve(u64::MAX).unwrap();
        assert!(guard.reserve(1).is_err());
    }
}
