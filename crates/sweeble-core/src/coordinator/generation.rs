use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, SweebleError};

/// Identifies one input-triggered request. Totally ordered by issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared monotonic counter. The highest issued generation is the current one.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation, invalidating every older one.
    pub fn advance(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    pub fn token(&self, generation: Generation) -> GenerationToken {
        GenerationToken {
            counter: self.clone(),
            generation,
        }
    }
}

/// Carried by background work to ask "am I still current?" after each suspension.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    counter: GenerationCounter,
    generation: Generation,
}

impl GenerationToken {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.counter.is_current(self.generation)
    }

    /// `Err(Cancelled)` once a newer generation has been issued.
    pub fn check(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(SweebleError::Cancelled)
        }
    }
}
