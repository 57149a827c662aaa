//! Signal completion hooks.

use crate::dispatch::WriteDispatcher;
use crate::points::PointBuilder;

/// Result of handing one completed signal to its processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Points queued for writing.
    pub accepted: usize,
    /// Points that were invalid or could not be queued.
    pub rejected: usize,
}

impl DispatchOutcome {
    /// Adds another outcome to this one.
    pub fn merge(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
    }
}

/// Converts completed signals of one kind into points and queues them.
///
/// `on_complete` never waits for the store; it returns once every point has
/// been queued or dropped.
#[derive(Clone)]
pub struct SignalProcessor<B> {
    builder: B,
    dispatcher: WriteDispatcher,
}

impl<B: PointBuilder> SignalProcessor<B> {
    /// Creates a processor feeding `dispatcher`.
    #[must_use]
    pub fn new(builder: B, dispatcher: WriteDispatcher) -> Self {
        Self {
            builder,
            dispatcher,
        }
    }

    /// Returns the point builder.
    #[must_use]
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Handles one completed signal.
    pub fn on_complete(&self, record: &B::Record) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for point in self.builder.build(record) {
            if let Err(e) = point.validate_point() {
                tracing::warn!(
                    measurement = %point.measurement(),
                    error = %e,
                    "Skipping invalid point"
                );
                outcome.rejected += 1;
                continue;
            }

            match self.dispatcher.enqueue(point) {
                Ok(()) => outcome.accepted += 1,
                Err(_) => outcome.rejected += 1,
            }
        }

        outcome
    }
}
