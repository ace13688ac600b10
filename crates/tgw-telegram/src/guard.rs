use std::sync::atomic::{AtomicBool, Ordering};

use tgw_core::{errors::Error, Result};

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Process-wide marker that a [`crate::Bot`] is alive; released on drop.
#[derive(Debug)]
pub(crate) struct InstanceGuard {
    _private: (),
}

impl InstanceGuard {
    pub(crate) fn acquire() -> Result<Self> {
        ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { _private: () })
            .map_err(|_| Error::AlreadyInitialized)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}
