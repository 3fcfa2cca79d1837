//! Bridge telemetry collector and helpers.
//!
//! The collector multiplexes lifecycle, handle, signal and frame events into a
//! bounded history plus a broadcast stream host tooling can subscribe to.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;

use crate::config::TelemetryConfig;
use crate::error::{ErrorCode, FatalError};
use crate::handle::HandleKind;
use crate::lifecycle::{LifecycleSignal, LifecycleState};

pub mod events;

pub use events::{HandleOp, MetricEvent};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if self.history_capacity > 0 {
                if history.len() == self.history_capacity {
                    history.pop_front();
                    self.dropped_history.fetch_add(1, Ordering::Relaxed);
                }
                history.push_back(event.clone());
            }
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping the collector with typed recorders.
///
/// One hub is shared by every component of a bridge session.
pub struct TelemetryHub {
    collector: TelemetryCollector,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.channel_capacity, config.history_capacity)
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn record_lifecycle(
        &self,
        signal: LifecycleSignal,
        from: LifecycleState,
        to: LifecycleState,
    ) {
        self.collector.publish(MetricEvent::Lifecycle {
            signal,
            from,
            to,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_handle(&self, op: HandleOp, kind: HandleKind, raw: u64) {
        self.collector.publish(MetricEvent::Handle { op, kind, raw });
    }

    pub fn record_signal_accepted(&self, value: f32, high_water_mark: f32) {
        self.collector.publish(MetricEvent::SignalAccepted {
            value,
            high_water_mark,
        });
    }

    pub fn record_signal_rejected(&self, value: f32, high_water_mark: f32) {
        self.collector.publish(MetricEvent::SignalRejected {
            value,
            high_water_mark,
        });
    }

    pub fn record_frames(&self, drawn: u64, updates: u64) {
        self.collector.publish(MetricEvent::Frames { drawn, updates });
    }

    pub fn record_fatal(&self, err: &FatalError) {
        self.collector.publish(MetricEvent::Fatal {
            code: err.code(),
            exit_status: err.exit_status(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(MetricEvent::SignalAccepted {
            value: 1.0,
            high_water_mark: 1.0,
        });
        collector.publish(MetricEvent::SignalAccepted {
            value: 3.0,
            high_water_mark: 3.0,
        });
        collector.publish(MetricEvent::Frames {
            drawn: 10,
            updates: 4,
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(
            matches!(snapshot.recent[0], MetricEvent::SignalAccepted { value, .. } if (value - 1.0).abs() < f32::EPSILON)
        );
        assert!(matches!(snapshot.recent[2], MetricEvent::Frames { .. }));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        for value in [1.0, 3.0, 5.0] {
            collector.publish(MetricEvent::SignalAccepted {
                value,
                high_water_mark: value,
            });
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(
            matches!(snapshot.recent[0], MetricEvent::SignalAccepted { value, .. } if (value - 3.0).abs() < f32::EPSILON)
        );
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = TelemetryHub::new(8, 8);
        let mut rx = hub.subscribe();

        hub.record_handle(HandleOp::Created, HandleKind::Engine, 1);
        hub.record_signal_rejected(0.9, 1.0);

        assert_eq!(
            rx.try_recv().unwrap(),
            MetricEvent::Handle {
                op: HandleOp::Created,
                kind: HandleKind::Engine,
                raw: 1,
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            MetricEvent::SignalRejected { .. }
        ));
    }

    #[test]
    fn fatal_event_carries_exit_status() {
        let hub = TelemetryHub::default();
        hub.record_fatal(&FatalError::SignalRegression {
            value: 0.5,
            high_water_mark: 1.0,
        });

        let snapshot = hub.snapshot();
        assert!(matches!(
            snapshot.recent.last(),
            Some(MetricEvent::Fatal { exit_status: 3, .. })
        ));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = MetricEvent::Lifecycle {
            signal: LifecycleSignal::Resume,
            from: LifecycleState::SurfaceReady,
            to: LifecycleState::Running,
            timestamp_ms: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "lifecycle");
        assert_eq!(json["payload"]["to"], "running");
    }
}
