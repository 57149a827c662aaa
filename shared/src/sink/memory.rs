//! In-memory write sink for development and testing.

use super::{SinkError, WriteSink, WriteTarget};
use crate::models::Point;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// A point written to the in-memory sink, with its target.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    /// The written point.
    pub point: Point,
    /// Where it was addressed.
    pub target: WriteTarget,
}

/// In-memory sink implementation.
#[derive(Debug, Default)]
pub struct InMemorySink {
    writes: Arc<RwLock<Vec<RecordedWrite>>>,
}

impl InMemorySink {
    /// Creates a new empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates a new in-memory sink wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a copy of all recorded writes, in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn writes(&self) -> Result<Vec<RecordedWrite>, SinkError> {
        let writes = self.writes.read().map_err(|_| lock_error())?;
        Ok(writes.clone())
    }

    /// Returns the recorded writes for one measurement.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn writes_for(&self, measurement: &str) -> Result<Vec<RecordedWrite>, SinkError> {
        let writes = self.writes.read().map_err(|_| lock_error())?;
        Ok(writes
            .iter()
            .filter(|w| w.point.measurement() == measurement)
            .cloned()
            .collect())
    }

    /// Returns the number of recorded writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn count(&self) -> Result<usize, SinkError> {
        let writes = self.writes.read().map_err(|_| lock_error())?;
        Ok(writes.len())
    }

    /// Clears all recorded writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn clear(&self) -> Result<(), SinkError> {
        let mut writes = self.writes.write().map_err(|_| lock_error())?;
        writes.clear();
        Ok(())
    }
}

fn lock_error() -> SinkError {
    SinkError::Unavailable("in-memory sink lock poisoned".to_string())
}

#[async_trait]
impl WriteSink for InMemorySink {
    async fn write(&self, point: &Point, target: &WriteTarget) -> Result<(), SinkError> {
        let mut writes = self.writes.write().map_err(|_| lock_error())?;
        writes.push(RecordedWrite {
            point: point.clone(),
            target: target.clone(),
        });
        Ok(())
    }
}
