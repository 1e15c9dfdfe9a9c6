//! Census Engine
//!
//! Runs every service counter in registry order against a listing backend.
//! Regional services are walked region by region; global services are
//! queried once through their home region and only feed the totals table.

use super::Census;
use crate::aws::regions::RegionRegistry;
use crate::resource::{count_listing, CounterDef, KindDef, ListRequest, ListingBackend};
use anyhow::Result;

/// Drives service counters and accumulates their results
pub struct CensusEngine<'a, B: ListingBackend + ?Sized> {
    backend: &'a B,
    regions: &'a RegionRegistry,
    account_id: &'a str,
}

impl<'a, B: ListingBackend + ?Sized> CensusEngine<'a, B> {
    pub fn new(backend: &'a B, regions: &'a RegionRegistry, account_id: &'a str) -> Self {
        Self {
            backend,
            regions,
            account_id,
        }
    }

    /// Run `counters` in order and return the filled tables.
    /// The first listing error aborts the run.
    pub async fn run(&self, counters: &[CounterDef]) -> Result<Census> {
        let mut census = Census::new();

        for counter in counters {
            self.run_counter(counter, &mut census).await?;
        }

        Ok(census)
    }

    /// Run a single counter, writing into `census`
    pub async fn run_counter(&self, counter: &CounterDef, census: &mut Census) -> Result<()> {
        tracing::info!("Counting {}", counter.display_name);

        for service in counter.services() {
            let kinds: Vec<&KindDef> = counter.kinds_for(service).collect();

            if self.regions.is_global(service)? {
                let region = self.regions.global_region(service)?;
                for kind in kinds {
                    let count = self.count_kind(kind, &region).await?;
                    census.record_total(&kind.total_label, count);
                    tracing::info!("{}: {}", kind.total_label, count);
                }
                continue;
            }

            let regions = self.regions.regions_for(service)?;
            let mut totals = vec![0u64; kinds.len()];

            for region in &regions {
                for (kind, total) in kinds.iter().zip(totals.iter_mut()) {
                    let count = self.count_kind(kind, region).await?;
                    if let Some(label) = &kind.region_label {
                        census.record_region(region, label, count);
                    }
                    *total += count;
                }
            }

            for (kind, total) in kinds.iter().zip(totals) {
                census.record_total(&kind.total_label, total);
                tracing::info!(
                    "{}: {} across {} regions",
                    kind.total_label,
                    total,
                    regions.len()
                );
            }
        }

        Ok(())
    }

    async fn count_kind(&self, kind: &KindDef, region: &str) -> Result<u64> {
        let request = ListRequest {
            service: &kind.service,
            sdk_method: &kind.sdk_method,
            region,
            owner: kind.owned_only.then_some(self.account_id),
        };
        count_listing(self.backend, &request).await
    }
}
