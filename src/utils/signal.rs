//! Cancellation rooted at the process signal handler.
//!
//! `SIGINT` and `SIGTERM` flip a shared flag; child-process launches poll it
//! and terminate their children before the parent exits. The handler is
//! installed once at the CLI entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::error::{Error, Result};

/// A cloneable cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the process signal handler. Call at most once per process.
    pub fn install(&self) -> Result<()> {
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| Error::operation("signal handler installation", "process", e))
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
