//! Process-wide, run-at-most-once host bootstrap.
//!
//! `bcm_host_init` must run once per process before any dispmanx call, no
//! matter how many devices exist. [`HostBootstrap`] holds that flag behind its
//! own lock. Devices receive it as an `Arc` so tests can hand in a fresh one;
//! production code shares [`HostBootstrap::global`].

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::compositor::{Compositor, NativeCall};
use crate::error::{DisplayError, Result};

static GLOBAL_BOOTSTRAP: Lazy<Arc<HostBootstrap>> = Lazy::new(|| Arc::new(HostBootstrap::new()));

#[derive(Debug, Default)]
pub struct HostBootstrap {
    done: Mutex<bool>,
}

impl HostBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance shared by every device in this process.
    pub fn global() -> Arc<HostBootstrap> {
        Arc::clone(&GLOBAL_BOOTSTRAP)
    }

    /// Runs `compositor.bootstrap()` unless a previous call succeeded.
    ///
    /// Concurrent callers block on the lock, so exactly one of them performs
    /// the native call. A failed bootstrap leaves the flag unset and is retried
    /// by the next caller.
    pub fn initialize_once(&self, compositor: &dyn Compositor) -> Result<()> {
        let mut done = self.done.lock();
        if *done {
            return Ok(());
        }

        info!("initialize bcm host");
        let code = compositor.bootstrap();
        if code != 0 {
            return Err(DisplayError::init(NativeCall::HostInit, code));
        }
        *done = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        *self.done.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::MockCompositor;
    use std::thread;

    #[test]
    fn test_bootstrap_runs_once() {
        let mut mock = MockCompositor::new();
        mock.expect_bootstrap().times(1).return_const(0);

        let bootstrap = HostBootstrap::new();
        bootstrap.initialize_once(&mock).unwrap();
        bootstrap.initialize_once(&mock).unwrap();
        assert!(bootstrap.is_initialized());
    }

    #[test]
    fn test_failed_bootstrap_is_retried() {
        let mut mock = MockCompositor::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_bootstrap().times(1).in_sequence(&mut seq).return_const(-1);
        mock.expect_bootstrap().times(1).in_sequence(&mut seq).return_const(0);

        let bootstrap = HostBootstrap::new();
        let err = bootstrap.initialize_once(&mock).unwrap_err();
        assert!(matches!(
            err,
            DisplayError::Initialization { operation: NativeCall::HostInit, code: -1 }
        ));
        assert!(!bootstrap.is_initialized());

        bootstrap.initialize_once(&mock).unwrap();
        assert!(bootstrap.is_initialized());
    }

    #[test]
    fn test_concurrent_callers_bootstrap_once() {
        let mut mock = MockCompositor::new();
        mock.expect_bootstrap().times(1).return_const(0);
        let mock = Arc::new(mock);
        let bootstrap = Arc::new(HostBootstrap::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mock = Arc::clone(&mock);
                let bootstrap = Arc::clone(&bootstrap);
                thread::spawn(move || bootstrap.initialize_once(mock.as_ref()).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(bootstrap.is_initialized());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&HostBootstrap::global(), &HostBootstrap::global()));
    }
}
