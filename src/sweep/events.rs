//! Event sinks
//!
//! The orchestrator emits [`SweepEvent`]s through an [`EventSink`]. Sinks must
//! not fail; they log, collect or forward.

use std::sync::{Arc, Mutex};
use tracing::info;

use super::types::SweepEvent;

/// Receiver of sweep events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SweepEvent);
}

/// Logs every event as a structured tracing record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &SweepEvent) {
        match event {
            SweepEvent::TransferCompleted {
                account,
                asset,
                destination,
                amount,
            } => info!(
                event = "transfer_completed",
                account = %account,
                asset = %asset,
                destination = %destination,
                amount = *amount,
                "Swept {} of {} from {}",
                amount,
                asset,
                account
            ),
            SweepEvent::BatchCompleted {
                total_attempted,
                total_succeeded,
            } => info!(
                event = "batch_completed",
                total_attempted = *total_attempted,
                total_succeeded = *total_succeeded,
                "Sweep batch complete: {}/{} entries succeeded",
                total_succeeded,
                total_attempted
            ),
        }
    }
}

/// Keeps every event in memory, for reports and tests
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<SweepEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events collected so far
    pub fn events(&self) -> Vec<SweepEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Remove and return all collected events
    pub fn drain(&self) -> Vec<SweepEvent> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *events)
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &SweepEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}

/// Forwards each event to several sinks in order
#[derive(Default, Clone)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: &SweepEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(attempted: usize) -> SweepEvent {
        SweepEvent::BatchCompleted {
            total_attempted: attempted,
            total_succeeded: 0,
        }
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryEventSink::new();
        sink.emit(&batch(1));
        sink.emit(&batch(2));
        assert_eq!(sink.events(), vec![batch(1), batch(2)]);

        assert_eq!(sink.drain().len(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let first = Arc::new(MemoryEventSink::new());
        let second = Arc::new(MemoryEventSink::new());
        let fanout = FanoutEventSink::new()
            .with(first.clone())
            .with(Arc::new(TracingEventSink))
            .with(second.clone());

        fanout.emit(&batch(3));
        assert_eq!(first.events(), vec![batch(3)]);
        assert_eq!(second.events(), vec![batch(3)]);
    }
}
