//! Region Registry
//!
//! Resolves the set of regions each AWS service is available in. The data is
//! static endpoint metadata embedded in the binary, so lookups never touch
//! the network.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Embedded region metadata (compiled into the binary)
const REGIONS_FILE: &str = include_str!("../resources/regions.json");

/// Errors raised by region lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown service: {0}")]
    UnknownService(String),
    #[error("Service {0} is regional and has no global endpoint region")]
    NotGlobal(String),
    #[error("Unknown region: {0}")]
    UnknownRegion(String),
}

/// Per-service endpoint metadata
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceRegions {
    /// Explicit region list; replaces the partition defaults when set
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    /// Regions removed from the partition defaults
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Region used to reach a global (account-wide) service
    #[serde(default)]
    pub global_region: Option<String>,
}

/// Root structure of resources/regions.json
#[derive(Debug, Clone, Deserialize)]
pub struct RegionRegistry {
    pub default_regions: Vec<String>,
    /// Regions an account must enable before use; only counted when allowlisted
    #[serde(default)]
    pub opt_in_regions: Vec<String>,
    pub services: HashMap<String, ServiceRegions>,
    /// Optional allowlist narrowing every regional service
    #[serde(skip)]
    allowlist: Option<Vec<String>>,
}

static REGISTRY: OnceLock<RegionRegistry> = OnceLock::new();

/// Get the embedded region registry (parsed on first access)
pub fn get_region_registry() -> &'static RegionRegistry {
    REGISTRY.get_or_init(|| {
        RegionRegistry::from_json(REGIONS_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded region JSON: {}", e))
    })
}

impl RegionRegistry {
    /// Parse a registry from JSON
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Build a registry where every listed service is available in `regions`.
    /// Services in `global` are treated as global and reached through the
    /// first region.
    pub fn uniform(regions: &[&str], regional: &[&str], global: &[&str]) -> Self {
        let home = regions.first().map(|r| r.to_string());
        let mut services = HashMap::new();
        for service in regional {
            services.insert(service.to_string(), ServiceRegions::default());
        }
        for service in global {
            services.insert(
                service.to_string(),
                ServiceRegions {
                    global_region: home.clone(),
                    ..ServiceRegions::default()
                },
            );
        }

        Self {
            default_regions: regions.iter().map(|r| r.to_string()).collect(),
            opt_in_regions: Vec::new(),
            services,
            allowlist: None,
        }
    }

    /// Restrict every regional service to the given regions.
    /// Order follows the registry, not the allowlist. Opt-in regions are
    /// only reachable through the allowlist.
    pub fn with_allowlist(mut self, allowlist: Vec<String>) -> Result<Self, RegistryError> {
        if let Some(unknown) = allowlist.iter().find(|r| !self.is_known_region(r)) {
            return Err(RegistryError::UnknownRegion(unknown.clone()));
        }

        self.allowlist = if allowlist.is_empty() {
            None
        } else {
            Some(allowlist)
        };
        Ok(self)
    }

    fn is_known_region(&self, region: &str) -> bool {
        let listed = |regions: &[String]| regions.iter().any(|r| r == region);

        listed(&self.default_regions)
            || listed(&self.opt_in_regions)
            || self
                .services
                .values()
                .filter_map(|s| s.regions.as_deref())
                .any(listed)
    }

    fn service(&self, service: &str) -> Result<&ServiceRegions, RegistryError> {
        self.services
            .get(service)
            .ok_or_else(|| RegistryError::UnknownService(service.to_string()))
    }

    /// Regions supporting `service`, in registry order
    pub fn regions_for(&self, service: &str) -> Result<Vec<String>, RegistryError> {
        let entry = self.service(service)?;

        let candidates: Vec<&String> = match (&entry.regions, &self.allowlist) {
            (Some(explicit), _) => explicit.iter().collect(),
            (None, None) => self.default_regions.iter().collect(),
            (None, Some(_)) => self
                .default_regions
                .iter()
                .chain(&self.opt_in_regions)
                .collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|r| !entry.exclude.contains(*r))
            .filter(|r| {
                self.allowlist
                    .as_ref()
                    .map(|allow| allow.contains(*r))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    /// Whether `service` is account-wide rather than regional
    pub fn is_global(&self, service: &str) -> Result<bool, RegistryError> {
        Ok(self.service(service)?.global_region.is_some())
    }

    /// The single region through which a global service is queried
    pub fn global_region(&self, service: &str) -> Result<String, RegistryError> {
        self.service(service)?
            .global_region
            .clone()
            .ok_or_else(|| RegistryError::NotGlobal(service.to_string()))
    }
}
