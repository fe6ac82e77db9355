//! Reentrancy guard
//!
//! At most one sweep may be active per orchestrator. The flag is cleared when
//! the guard drops, on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// RAII guard to ensure the in-progress flag is always released
#[derive(Debug)]
pub struct SweepGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SweepGuard<'a> {
    /// Acquire the flag, or fail with [`Error::Reentrant`] if it is already held
    pub fn try_acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Reentrant)?;
        Ok(Self { flag })
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails() {
        let flag = AtomicBool::new(false);
        let _guard = SweepGuard::try_acquire(&flag).unwrap();
        assert!(matches!(SweepGuard::try_acquire(&flag), Err(Error::Reentrant)));
    }

    #[test]
    fn test_released_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = SweepGuard::try_acquire(&flag).unwrap();
            assert!(flag.load(Ordering::Acquire));
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(SweepGuard::try_acquire(&flag).is_ok());
    }

    #[test]
    fn test_released_on_early_return() {
        fn fails_midway(flag: &AtomicBool) -> Result<()> {
            let _guard = SweepGuard::try_acquire(flag)?;
            Err(Error::InvalidRequest("boom".to_string()))
        }

        let flag = AtomicBool::new(false);
        assert!(fails_midway(&flag).is_err());
        assert!(!flag.load(Ordering::Acquire));
    }
}
