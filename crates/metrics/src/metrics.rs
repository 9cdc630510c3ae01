use std::ops::Deref;
use std::sync::Arc;

use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{linear_buckets, Histogram};

use crate::SharedRegistry;

/// Kind of a consensus message, as a label value.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum MsgKind {
    Propose,
    Prepare,
    Commit,
    RoundChange,
    Decided,
}

/// Side effect of a decision, as a label value.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum SideEffect {
    Persist,
    Broadcast,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct MsgLabels {
    kind: MsgKind,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct SideEffectLabels {
    effect: SideEffect,
}

#[derive(Clone, Debug)]
pub struct Metrics(Arc<Inner>);

impl Deref for Metrics {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub struct Inner {
    instances_started: Counter,
    messages_processed: Family<MsgLabels, Counter>,
    messages_rejected: Family<MsgLabels, Counter>,
    decisions: Counter,
    decision_round: Histogram,
    side_effect_failures: Family<SideEffectLabels, Counter>,
    height: Gauge,
}

impl Inner {
    pub fn new() -> Self {
        Self {
            instances_started: Counter::default(),
            messages_processed: Family::default(),
            messages_rejected: Family::default(),
            decisions: Counter::default(),
            decision_round: Histogram::new(linear_buckets(1.0, 1.0, 15)),
            side_effect_failures: Family::default(),
            height: Gauge::default(),
        }
    }

    pub fn instance_started(&self, height: u64) {
        self.instances_started.inc();
        self.height.set(height as i64);
    }

    pub fn message_processed(&self, kind: MsgKind) {
        self.messages_processed.get_or_create(&MsgLabels { kind }).inc();
    }

    pub fn message_rejected(&self, kind: MsgKind) {
        self.messages_rejected.get_or_create(&MsgLabels { kind }).inc();
    }

    pub fn decided(&self, round: u64) {
        self.decisions.inc();
        self.decision_round.observe(round as f64);
    }

    pub fn side_effect_failed(&self, effect: SideEffect) {
        self.side_effect_failures
            .get_or_create(&SideEffectLabels { effect })
            .inc();
    }

    pub fn set_height(&self, height: u64) {
        self.height.set(height as i64);
    }

    pub fn decisions(&self) -> u64 {
        self.decisions.get()
    }

    pub fn instances_started(&self) -> u64 {
        self.instances_started.get()
    }

    pub fn messages_rejected(&self, kind: MsgKind) -> u64 {
        self.messages_rejected.get_or_create(&MsgLabels { kind }).get()
    }

    pub fn side_effect_failures(&self, effect: SideEffect) -> u64 {
        self.side_effect_failures
            .get_or_create(&SideEffectLabels { effect })
            .get()
    }
}

impl Default for Inner {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self(Arc::new(Inner::new()))
    }

    pub fn register(registry: &SharedRegistry) -> Self {
        let metrics = Self::new();

        registry.with_prefix("qbft", |registry| {
            registry.register(
                "instances_started",
                "Number of consensus instances started",
                metrics.instances_started.clone(),
            );

            registry.register(
                "messages_processed",
                "Number of consensus messages accepted, by kind",
                metrics.messages_processed.clone(),
            );

            registry.register(
                "messages_rejected",
                "Number of consensus messages rejected, by kind",
                metrics.messages_rejected.clone(),
            );

            registry.register(
                "decisions",
                "Number of decisions reached",
                metrics.decisions.clone(),
            );

            registry.register(
                "decision_round",
                "Round in which decisions were reached",
                metrics.decision_round.clone(),
            );

            registry.register(
                "side_effect_failures",
                "Number of failures to persist or broadcast a decision",
                metrics.side_effect_failures.clone(),
            );

            registry.register(
                "height",
                "Height of the latest consensus instance",
                metrics.height.clone(),
            );
        });

        metrics
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
