//! Counter Registry - Load service counter definitions from JSON
//!
//! Every service counter is described in `resources/counters.json`: which
//! service it talks to, which listing calls it makes and how each resulting
//! count is labelled. The census engine walks these definitions in order.

use serde::Deserialize;
use std::sync::OnceLock;

/// Embedded counter definitions (compiled into the binary)
const COUNTER_FILE: &str = include_str!("../resources/counters.json");

/// One countable resource kind within a counter
#[derive(Debug, Clone, Deserialize)]
pub struct KindDef {
    /// Service endpoint (e.g. "ec2", "elbv2")
    pub service: String,
    /// Listing operation understood by the SDK dispatcher
    pub sdk_method: String,
    /// Key in the per-region table; absent for global services
    #[serde(default)]
    pub region_label: Option<String>,
    /// Key in the cross-region totals table
    pub total_label: String,
    /// Restrict the listing to resources owned by the account
    #[serde(default)]
    pub owned_only: bool,
}

/// A service counter: an ordered group of resource kinds
#[derive(Debug, Clone, Deserialize)]
pub struct CounterDef {
    pub key: String,
    pub display_name: String,
    pub kinds: Vec<KindDef>,
}

impl CounterDef {
    /// Distinct services used by this counter, in first-use order
    pub fn services(&self) -> Vec<&str> {
        let mut services: Vec<&str> = Vec::new();
        for kind in &self.kinds {
            if !services.contains(&kind.service.as_str()) {
                services.push(&kind.service);
            }
        }
        services
    }

    /// Kinds belonging to one service
    pub fn kinds_for<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a KindDef> + 'a {
        self.kinds.iter().filter(move |k| k.service == service)
    }
}

/// Root structure of resources/counters.json
#[derive(Debug, Clone, Deserialize)]
pub struct CounterConfig {
    pub counters: Vec<CounterDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<CounterConfig> = OnceLock::new();

/// Get the counter registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static CounterConfig {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(COUNTER_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded counter JSON: {}", e))
    })
}

/// All counters in execution order
pub fn get_counters() -> &'static [CounterDef] {
    &get_registry().counters
}

/// Get a counter definition by key
pub fn get_counter(key: &str) -> Option<&'static CounterDef> {
    get_counters().iter().find(|c| c.key == key)
}
