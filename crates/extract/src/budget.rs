use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Field budget of {budget_ms} ms exceeded")]
pub struct BudgetExceeded {
    pub budget_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Extraction cancelled")]
pub struct Cancelled;

/// Wall-clock allowance for one extractor. Extractors call [`Budget::check`]
/// between lines and bail out with `?` once it runs out.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    deadline: Instant,
    allowance: Duration,
}

impl Budget {
    pub fn start(allowance: Duration) -> Self {
        Budget {
            deadline: Instant::now() + allowance,
            allowance,
        }
    }

    pub fn unlimited() -> Self {
        // ~31 years; far enough to never fire, close enough not to overflow Instant.
        Budget::start(Duration::from_secs(1 << 30))
    }

    pub fn check(&self) -> Result<(), BudgetExceeded> {
        if Instant::now() > self.deadline {
            Err(BudgetExceeded {
                budget_ms: self.allowance.as_millis() as u64,
            })
        } else {
            Ok(())
        }
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
