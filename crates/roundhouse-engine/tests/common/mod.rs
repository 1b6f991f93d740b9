//! Scripted plugins for engine integration tests.
//!
//! Every plugin shares one [`Script`]: knobs that inject failures at given
//! rounds, plus logs of what the engine asked the plugins to do.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use roundhouse_engine::{NamedConfig, PipelineConfig, PipelineHandle};
use roundhouse_sdk::prelude::*;
use roundhouse_sdk::prometheus::IntCounter;
use roundhouse_sdk::{Completable, MetricsProvider, Registry};
use roundhouse_types::{GenesisInfo, InitInfo, PluginConfig, PluginDescriptor, PluginError, RoundUnit, UnitItem};
use serde_json::json;

pub const NETWORK: &str = "testnet";

#[derive(Default)]
pub struct Script {
    /// Rounds past the tip answer `unavailable` forever.
    pub tip: Mutex<Option<u64>>,
    pub source_failures: Mutex<HashMap<u64, u32>>,
    pub transform_failures: Mutex<HashMap<u64, u32>>,
    pub sink_failures: Mutex<HashMap<u64, u32>>,
    pub sink_hook_failures: Mutex<HashMap<u64, u32>>,
    pub round_mismatches: Mutex<HashMap<u64, u32>>,
    pub panic_at: Mutex<Option<u64>>,
    pub fail_sink_init: Mutex<bool>,
    pub fail_source_close: Mutex<bool>,

    pub handle: OnceLock<PipelineHandle>,
    /// `(round, retry_count)` at every `get_unit` call.
    pub fetches: Mutex<Vec<(u64, u64)>>,
    pub received: Mutex<Vec<RoundUnit>>,
    pub events: Mutex<Vec<String>>,
    pub sink_init_round: Mutex<Option<u64>>,
}

impl Script {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tip(self: Arc<Self>, tip: u64) -> Arc<Self> {
        *self.tip.lock() = Some(tip);
        self
    }

    pub fn attach(&self, handle: PipelineHandle) {
        let _ = self.handle.set(handle);
    }

    fn event(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events_with(&self, prefix: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn fetches_of(&self, round: u64) -> Vec<u64> {
        self.fetches
            .lock()
            .iter()
            .filter(|(r, _)| *r == round)
            .map(|(_, retry)| *retry)
            .collect()
    }

    pub fn received_rounds(&self) -> Vec<u64> {
        self.received.lock().iter().map(RoundUnit::round).collect()
    }
}

fn take_failure(map: &Mutex<HashMap<u64, u32>>, round: u64) -> bool {
    let mut map = map.lock();
    match map.get_mut(&round) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

/// Genesis reported by [`ScriptedSource`] for `network`.
pub fn genesis(network: &str) -> GenesisInfo {
    GenesisInfo::new(network, json!({ "seed": 7 }))
}

/// Deterministic unit for `round`: two items tagged with the round number.
pub fn unit_for(round: u64) -> RoundUnit {
    let mut unit = RoundUnit::empty(round);
    unit.items = vec![
        UnitItem::new("pay", json!({ "round": round, "n": 0 })),
        UnitItem::new("call", json!({ "round": round, "n": 1 })),
    ];
    unit
}

pub struct ScriptedSource {
    script: Arc<Script>,
    completable: bool,
    generated: IntCounter,
}

impl Plugin for ScriptedSource {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("scripted", "test source")
    }

    fn as_completable(self: Arc<Self>) -> Option<Arc<dyn Completable>> {
        if self.completable {
            Some(self)
        } else {
            None
        }
    }

    fn as_metrics_provider(self: Arc<Self>) -> Option<Arc<dyn MetricsProvider>> {
        Some(self)
    }
}

#[async_trait]
impl Source for ScriptedSource {
    async fn init(&self, _ctx: &PluginContext, config: PluginConfig) -> Result<GenesisInfo, PluginError> {
        let network = config
            .config
            .get("network")
            .and_then(|v| v.as_str())
            .unwrap_or(NETWORK)
            .to_string();
        self.script.event("init:source");
        Ok(genesis(&network))
    }

    async fn get_unit(&self, round: u64) -> Result<RoundUnit, PluginError> {
        let retry = self.script.handle.get().map_or(0, PipelineHandle::retry_count);
        self.script.fetches.lock().push((round, retry));

        if *self.script.panic_at.lock() == Some(round) {
            panic!("scripted panic at round {round}");
        }
        if self.script.tip.lock().is_some_and(|tip| round > tip) {
            return Err(PluginError::unavailable("AT_TIP", format!("round {round} not produced yet")));
        }
        if take_failure(&self.script.source_failures, round) {
            return Err(PluginError::transient("FETCH_FAILED", "scripted source failure"));
        }
        if take_failure(&self.script.round_mismatches, round) {
            return Ok(unit_for(round + 1));
        }
        self.generated.inc();
        Ok(unit_for(round))
    }

    async fn close(&self) -> Result<(), PluginError> {
        self.script.event("close:source");
        if *self.script.fail_source_close.lock() {
            return Err(PluginError::internal("CLOSE_FAILED", "scripted close failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Completable for ScriptedSource {
    async fn on_complete(&self, unit: &RoundUnit) -> Result<(), PluginError> {
        self.script.event(format!("complete:source:{}", unit.round()));
        Ok(())
    }
}

impl MetricsProvider for ScriptedSource {
    fn provide_collectors(&self) -> Vec<Box<dyn roundhouse_sdk::prometheus::core::Collector>> {
        vec![Box::new(self.generated.clone())]
    }
}

/// Transform that appends a `tag` item carrying its configured id.
pub struct TagTransform {
    script: Arc<Script>,
    id: Mutex<String>,
}

impl Plugin for TagTransform {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("tag", "test transform")
    }

    fn as_completable(self: Arc<Self>) -> Option<Arc<dyn Completable>> {
        Some(self)
    }
}

#[async_trait]
impl Transform for TagTransform {
    async fn init(&self, _ctx: &PluginContext, _info: &InitInfo, config: PluginConfig) -> Result<(), PluginError> {
        let id = config
            .config
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("t")
            .to_string();
        self.script.event(format!("init:transform:{id}"));
        *self.id.lock() = id;
        Ok(())
    }

    async fn process(&self, mut unit: RoundUnit) -> Result<RoundUnit, PluginError> {
        if take_failure(&self.script.transform_failures, unit.round()) {
            return Err(PluginError::transient("PROCESS_FAILED", "scripted transform failure"));
        }
        let id = self.id.lock().clone();
        unit.items.push(UnitItem::new("tag", json!(id)));
        Ok(unit)
    }

    async fn close(&self) -> Result<(), PluginError> {
        let id = self.id.lock().clone();
        self.script.event(format!("close:transform:{id}"));
        Ok(())
    }
}

#[async_trait]
impl Completable for TagTransform {
    async fn on_complete(&self, unit: &RoundUnit) -> Result<(), PluginError> {
        let id = self.id.lock().clone();
        self.script.event(format!("complete:transform:{id}:{}", unit.round()));
        Ok(())
    }
}

pub struct RecordingSink {
    script: Arc<Script>,
}

impl Plugin for RecordingSink {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new("recording", "test sink")
    }

    fn as_completable(self: Arc<Self>) -> Option<Arc<dyn Completable>> {
        Some(self)
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn init(&self, _ctx: &PluginContext, info: &InitInfo, _config: PluginConfig) -> Result<(), PluginError> {
        self.script.event("init:sink");
        if *self.script.fail_sink_init.lock() {
            return Err(PluginError::config("BAD_SINK", "scripted init failure"));
        }
        *self.script.sink_init_round.lock() = Some(info.next_round);
        Ok(())
    }

    async fn receive(&self, unit: &RoundUnit) -> Result<(), PluginError> {
        if take_failure(&self.script.sink_failures, unit.round()) {
            return Err(PluginError::transient("WRITE_FAILED", "scripted sink failure"));
        }
        self.script.received.lock().push(unit.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), PluginError> {
        self.script.event("close:sink");
        Ok(())
    }
}

#[async_trait]
impl Completable for RecordingSink {
    async fn on_complete(&self, unit: &RoundUnit) -> Result<(), PluginError> {
        if take_failure(&self.script.sink_hook_failures, unit.round()) {
            self.script.event(format!("complete:sink:{}:failed", unit.round()));
            return Err(PluginError::transient("HOOK_FAILED", "scripted hook failure"));
        }
        self.script.event(format!("complete:sink:{}", unit.round()));
        Ok(())
    }
}

/// Registry with `scripted` and `hooked` sources, a `tag` transform and a
/// `recording` sink, all bound to `script`.
pub fn registry(script: &Arc<Script>) -> Arc<Registry> {
    let mut registry = Registry::new();

    let s = Arc::clone(script);
    registry
        .register_source("scripted", move || {
            Arc::new(ScriptedSource {
                script: Arc::clone(&s),
                completable: false,
                generated: IntCounter::new("scripted_units_total", "units generated").unwrap(),
            })
        })
        .unwrap();
    let s = Arc::clone(script);
    registry
        .register_source("hooked", move || {
            Arc::new(ScriptedSource {
                script: Arc::clone(&s),
                completable: true,
                generated: IntCounter::new("scripted_units_total", "units generated").unwrap(),
            })
        })
        .unwrap();
    let s = Arc::clone(script);
    registry
        .register_transform("tag", move || {
            Arc::new(TagTransform {
                script: Arc::clone(&s),
                id: Mutex::new(String::new()),
            })
        })
        .unwrap();
    let s = Arc::clone(script);
    registry
        .register_sink("recording", move || {
            Arc::new(RecordingSink {
                script: Arc::clone(&s),
            })
        })
        .unwrap();

    Arc::new(registry)
}

/// `scripted → recording` with a short retry delay.
pub fn config(data_dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(
        data_dir,
        NamedConfig::new("scripted"),
        NamedConfig::new("recording"),
    );
    config.retry_delay_ms = 5;
    config
}

pub fn tag(id: &str) -> NamedConfig {
    NamedConfig::new("tag").with_config(json!({ "id": id }))
}

/// Poll `cond` every few milliseconds for up to five seconds.
pub async fn eventually<F>(what: &str, mut cond: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Await `fut`, failing the test if it takes longer than five seconds.
pub async fn within<T>(what: &str, fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}
