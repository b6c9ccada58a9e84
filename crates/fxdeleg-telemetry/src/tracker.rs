//! Delegation trackers: where the binder hands off descriptors.
//!
//! The binder builds one `DelegationEvent` per decision and passes it to
//! whatever `DelegationTracker` the host installed. `report` makes the
//! no-tracker case free: the event closure is never run.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use fxdeleg_core::config::TelemetryConfig;
use fxdeleg_core::functions::TexlFunction;
use fxdeleg_core::hash::{Fingerprint, Hash256};
use fxdeleg_core::id::NodeId;
use fxdeleg_core::syntax::Node;
use serde::Serialize;

use crate::descriptor::DelegationTelemetryInfo;
use crate::metrics::emit_span;
use crate::status::DelegationStatus;

/// One delegation decision as delivered to a tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationEvent {
    pub status: DelegationStatus,
    /// Node the decision was made for, when the binder has one.
    pub node: Option<NodeId>,
    /// Enclosing function (e.g. the `Filter` whose predicate was checked).
    pub function: Option<String>,
    pub info: DelegationTelemetryInfo,
}

impl DelegationEvent {
    pub fn new(status: DelegationStatus, info: DelegationTelemetryInfo) -> Self {
        Self {
            status,
            node: None,
            function: None,
            info,
        }
    }

    pub fn with_node(mut self, node: &Node) -> Self {
        self.node = Some(node.id);
        self
    }

    pub fn with_function(mut self, function: Option<&dyn TexlFunction>) -> Self {
        self.function = function.map(|f| f.name().to_string());
        self
    }

    /// Dedupe identity: the status together with the descriptor. Equal
    /// descriptors filed under different statuses are distinct decisions.
    pub fn dedupe_key(&self) -> Hash256 {
        let fp = Fingerprint::new().field(self.status.tag());
        self.info.digest_into(fp).finish()
    }
}

/// Sink seam. Implementations must tolerate calls from several binder threads.
pub trait DelegationTracker: Send + Sync {
    fn set_status(&self, event: DelegationEvent);
}

/// Report to `tracker` if one is installed; builds the event lazily.
pub fn report<F>(tracker: Option<&dyn DelegationTracker>, event: F)
where
    F: FnOnce() -> DelegationEvent,
{
    if let Some(tracker) = tracker {
        tracker.set_status(event());
    }
}

/// Config filter shared by the trackers below.
fn admits(config: &TelemetryConfig, event: &DelegationEvent) -> bool {
    config.enabled && (config.emit_successful || !event.status.is_success())
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<DelegationEvent>,
    seen: HashSet<Hash256>,
    counts: BTreeMap<DelegationStatus, usize>,
    dropped: usize,
}

/// Thread-safe in-memory tracker. Keeps events in arrival order.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    config: TelemetryConfig,
    inner: Mutex<Recorded>,
}

impl RecordingTracker {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Recorded::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        // A panicking reporter cannot leave `Recorded` half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn events(&self) -> Vec<DelegationEvent> {
        self.lock().events.clone()
    }

    /// Take all retained events, leaving counts and dedupe state intact.
    pub fn drain(&self) -> Vec<DelegationEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events accepted for `status`, including any later drained.
    pub fn count(&self, status: DelegationStatus) -> usize {
        self.lock().counts.get(&status).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> BTreeMap<DelegationStatus, usize> {
        self.lock().counts.clone()
    }

    /// Events rejected by config, dedupe, or the retention cap.
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }
}

impl DelegationTracker for RecordingTracker {
    fn set_status(&self, event: DelegationEvent) {
        let mut inner = self.lock();
        if !admits(&self.config, &event) {
            inner.dropped += 1;
            return;
        }
        if let Some(cap) = self.config.max_events {
            if inner.events.len() >= cap {
                inner.dropped += 1;
                return;
            }
        }
        if self.config.dedupe && !inner.seen.insert(event.dedupe_key()) {
            inner.dropped += 1;
            return;
        }
        emit_span(
            "delegation_status",
            &[
                ("status", event.status.to_string()),
                ("info", event.info.info().to_string()),
            ],
        );
        *inner.counts.entry(event.status).or_insert(0) += 1;
        inner.events.push(event);
    }
}

/// Emits each event as a structured `tracing` event. Successes log at DEBUG,
/// everything else at INFO.
#[cfg(feature = "tracing")]
#[derive(Debug, Default)]
pub struct TracingTracker {
    config: TelemetryConfig,
}

#[cfg(feature = "tracing")]
impl TracingTracker {
    pub fn new(config: TelemetryConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "tracing")]
impl DelegationTracker for TracingTracker {
    fn set_status(&self, event: DelegationEvent) {
        if !admits(&self.config, &event) {
            return;
        }
        let node = event.node.map(|n| n.get());
        let data_source = event.info.data_source_name();
        if event.status.is_success() {
            tracing::debug!(
                status = %event.status,
                info = event.info.info(),
                data_source,
                node,
                function = event.function.as_deref(),
                "delegation"
            );
        } else {
            tracing::info!(
                status = %event.status,
                info = event.info.info(),
                data_source,
                node,
                function = event.function.as_deref(),
                "delegation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxdeleg_core::binding::BindingTable;
    use fxdeleg_core::entities::TabularDataSource;
    use fxdeleg_core::syntax::{BinaryOp, Expr};

    fn success(name: &str) -> DelegationEvent {
        let ds = TabularDataSource::new(name);
        DelegationEvent::new(
            DelegationStatus::DelegationSuccessful,
            DelegationTelemetryInfo::delegation_successful(Some(&ds)),
        )
    }

    fn op_event(op: BinaryOp) -> DelegationEvent {
        DelegationEvent::new(
            DelegationStatus::BinaryOpNotSupported,
            DelegationTelemetryInfo::binary_op_not_supported(op),
        )
    }

    #[test]
    fn report_without_tracker_never_builds_the_event() {
        let mut built = false;
        report(None, || {
            built = true;
            success("Accounts")
        });
        assert!(!built);
    }

    #[test]
    fn records_in_order_with_counts() {
        let t = RecordingTracker::default();
        report(Some(&t), || op_event(BinaryOp::In));
        report(Some(&t), || success("Accounts"));
        report(Some(&t), || op_event(BinaryOp::Concat));

        let events = t.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].info.info(), "In");
        assert_eq!(events[2].info.info(), "Concat");
        assert_eq!(t.count(DelegationStatus::BinaryOpNotSupported), 2);
        assert_eq!(t.count(DelegationStatus::DelegationSuccessful), 1);
    }

    #[test]
    fn config_drops_successes_and_duplicates() {
        let t = RecordingTracker::new(TelemetryConfig {
            emit_successful: false,
            dedupe: true,
            ..Default::default()
        });
        t.set_status(success("Accounts"));
        t.set_status(op_event(BinaryOp::In));
        t.set_status(op_event(BinaryOp::In));
        assert_eq!(t.len(), 1);
        assert_eq!(t.dropped(), 2);
    }

    #[test]
    fn disabled_tracker_keeps_nothing() {
        let t = RecordingTracker::new(TelemetryConfig {
            enabled: false,
            ..Default::default()
        });
        t.set_status(op_event(BinaryOp::Add));
        assert!(t.is_empty());
        assert_eq!(t.count(DelegationStatus::BinaryOpNotSupported), 0);
    }

    #[test]
    fn cap_bounds_retention() {
        let t = RecordingTracker::new(TelemetryConfig {
            max_events: Some(1),
            ..Default::default()
        });
        t.set_status(op_event(BinaryOp::Add));
        t.set_status(op_event(BinaryOp::Mul));
        assert_eq!(t.len(), 1);
        assert_eq!(t.dropped(), 1);
    }

    #[test]
    fn full_tracker_stops_growing_dedupe_state() {
        let t = RecordingTracker::new(TelemetryConfig {
            dedupe: true,
            max_events: Some(1),
            ..Default::default()
        });
        for op in BinaryOp::ALL {
            t.set_status(op_event(op));
        }
        assert_eq!(t.len(), 1);
        assert_eq!(t.dropped(), BinaryOp::ALL.len() - 1);
        assert_eq!(t.lock().seen.len(), 1);
    }

    #[test]
    fn dedupe_key_includes_status() {
        let op = op_event(BinaryOp::In);
        let column = DelegationEvent::new(
            DelegationStatus::NoDelegationSupportByColumn,
            DelegationTelemetryInfo::column_name_not_delegatable("In"),
        );
        assert_eq!(op.info, column.info);
        assert_ne!(op.dedupe_key(), column.dedupe_key());
        assert_eq!(op.dedupe_key(), op_event(BinaryOp::In).dedupe_key());
    }

    #[test]
    fn drain_keeps_counts() {
        let t = RecordingTracker::default();
        t.set_status(op_event(BinaryOp::Add));
        assert_eq!(t.drain().len(), 1);
        assert!(t.is_empty());
        assert_eq!(t.count(DelegationStatus::BinaryOpNotSupported), 1);
    }

    #[test]
    fn event_carries_node_and_function() {
        let node = Node::new(
            NodeId::new(5),
            Expr::Call {
                head: "Rand".into(),
                args: vec![],
            },
        );
        let binding = BindingTable::new();
        let filter = fxdeleg_core::functions::BuiltinFunction::new("Filter");
        let event = DelegationEvent::new(
            DelegationStatus::ImpureNode,
            DelegationTelemetryInfo::impure_node(&node, Some(&binding)),
        )
        .with_node(&node)
        .with_function(Some(&filter));
        assert_eq!(event.node, Some(NodeId::new(5)));
        assert_eq!(event.function.as_deref(), Some("Filter"));
        assert_eq!(event.info.info(), "");
    }

    #[cfg(feature = "tracing")]
    mod logging {
        use super::*;
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        fn capture(run: impl FnOnce()) -> String {
            let out = Captured::default();
            let writer = out.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::TRACE)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            tracing::subscriber::with_default(subscriber, run);
            let bytes = out.0.lock().unwrap().clone();
            String::from_utf8(bytes).unwrap()
        }

        #[test]
        fn successes_log_at_debug_and_failures_at_info() {
            let logs = capture(|| {
                let t = TracingTracker::default();
                t.set_status(success("Accounts"));
                t.set_status(op_event(BinaryOp::Concat));
            });
            let lines: Vec<&str> = logs.lines().collect();
            assert_eq!(lines.len(), 2);
            assert!(lines[0].contains("DEBUG"));
            assert!(lines[0].contains("status=delegation_successful"));
            assert!(lines[0].contains("data_source=\"Accounts\""));
            assert!(lines[1].contains("INFO"));
            assert!(lines[1].contains("info=\"Concat\""));
        }

        #[test]
        fn tracing_tracker_honours_config() {
            let logs = capture(|| {
                let t = TracingTracker::new(TelemetryConfig {
                    emit_successful: false,
                    ..Default::default()
                });
                t.set_status(success("Accounts"));
            });
            assert!(logs.is_empty());
        }

        #[test]
        fn recording_emits_metric_span() {
            let logs = capture(|| {
                RecordingTracker::default().set_status(op_event(BinaryOp::In));
            });
            assert!(logs.contains("TRACE"));
            assert!(logs.contains("metric"));
            assert!(logs.contains("v=In"));
        }
    }
}
