//! Azure DNS provider session
//!
//! One session per credential scope. Zones are loaded into an in-memory
//! directory at session start and only grow when `ensure_zone_exists`
//! creates a new one. The session implements [`ZoneProvider`]: listing,
//! nameservers, record fetch, planning and an execute wrapper that threads
//! the session's cancellation token through the core executor.

use crate::api::{AzureApi, AzureRestApi};
use crate::credentials::AzureCredentials;
use crate::native::NativeRecordSet;
use crate::plan;
use crate::translate;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zonesync_core::{
    apply_corrections, split_single_long_txt, CanonicalRecord, Correction, Differ, DnsError,
    PlanStrategy, RecordDiffer, Result, ZoneConfig, ZoneProvider,
};

/// Name the orchestrator registers the factory under
pub const AZURE_DNS_PROVIDER: &str = "AZURE_DNS";

/// One zone the directory knows about
#[derive(Debug, Clone)]
pub struct Zone {
    /// ARM resource id
    pub id: String,
    /// Domain, without the trailing root dot
    pub name: String,
    pub nameservers: Vec<String>,
}

pub struct AzureDnsProvider {
    api: Arc<dyn AzureApi>,
    /// Zone directory, keyed by domain
    zones: RwLock<HashMap<String, Zone>>,
    differ: RecordDiffer,
    cancel: CancellationToken,
}

impl AzureDnsProvider {
    /// Builds a session and loads the zone directory
    pub async fn connect(credentials: AzureCredentials) -> Result<Self> {
        let api: Arc<dyn AzureApi> = Arc::new(AzureRestApi::new(credentials)?);
        Self::with_api(api).await
    }

    /// Session over an arbitrary API implementation; the directory is
    /// loaded before the session is handed out
    pub async fn with_api(api: Arc<dyn AzureApi>) -> Result<Self> {
        let provider = AzureDnsProvider {
            api,
            zones: RwLock::new(HashMap::new()),
            differ: RecordDiffer::new(),
            cancel: CancellationToken::new(),
        };
        provider.load_zones().await?;
        Ok(provider)
    }

    /// Token the orchestrator cancels to stop in-flight work before the
    /// next remote call
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Applies a plan in order, honoring the session's cancellation token
    pub async fn execute(&self, corrections: &[Correction]) -> Result<usize> {
        apply_corrections(corrections, &self.cancel).await
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(DnsError::Cancelled);
        }
        Ok(())
    }

    async fn load_zones(&self) -> Result<()> {
        let listed = self.api.list_zones().await?;
        let mut zones = self.zones.write().await;
        zones.clear();
        for zone in listed {
            let domain = zone.name.trim_end_matches('.').to_string();
            zones.insert(
                domain.clone(),
                Zone {
                    id: zone.id,
                    name: domain,
                    nameservers: zone.properties.name_servers,
                },
            );
        }
        info!(zones = zones.len(), "loaded Azure DNS zone directory");
        Ok(())
    }

    async fn resolve(&self, domain: &str) -> Result<Zone> {
        let zones = self.zones.read().await;
        zones
            .get(domain)
            .cloned()
            .ok_or_else(|| DnsError::DomainNotFound(domain.to_string()))
    }

    /// Drains the record set listing for a zone; no partial result on error
    async fn fetch_record_sets(&self, zone: &Zone) -> Result<Vec<NativeRecordSet>> {
        self.check_cancelled()?;
        self.api.list_record_sets(&zone.name).await
    }

    /// Flattens native sets to canonical records. Sets outside the wire
    /// vocabulary are skipped with a warning; other translation failures
    /// propagate.
    fn flatten(&self, sets: &[NativeRecordSet], origin: &str) -> Result<Vec<CanonicalRecord>> {
        let mut records = Vec::new();
        for set in sets {
            match translate::to_canonical(set, origin) {
                Ok(mut flattened) => records.append(&mut flattened),
                Err(DnsError::UnsupportedRecordType(t)) => {
                    warn!(name = %set.name, record_type = %t, "skipping unsupported record set");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ZoneProvider for AzureDnsProvider {
    async fn list_zones(&self) -> Result<Vec<String>> {
        self.check_cancelled()?;
        let zones = self.api.list_zones().await?;
        Ok(zones
            .into_iter()
            .map(|z| z.name.trim_end_matches('.').to_string())
            .collect())
    }

    async fn nameservers(&self, domain: &str) -> Result<Vec<String>> {
        let zone = self.resolve(domain).await?;
        Ok(zone
            .nameservers
            .iter()
            .map(|ns| ns.trim_end_matches('.').to_string())
            .collect())
    }

    async fn zone_records(&self, domain: &str) -> Result<Vec<CanonicalRecord>> {
        let zone = self.resolve(domain).await?;
        let sets = self.fetch_record_sets(&zone).await?;
        self.flatten(&sets, &zone.name)
    }

    async fn plan(
        &self,
        desired: &ZoneConfig,
        strategy: PlanStrategy,
    ) -> Result<Vec<Correction>> {
        self.check_cancelled()?;
        let zone = self.resolve(&desired.domain).await?;
        let native = self.fetch_record_sets(&zone).await?;
        let existing = self.flatten(&native, &zone.name)?;

        // long single-segment TXT records are split before diffing
        let mut desired_records = desired.records.clone();
        split_single_long_txt(&mut desired_records);

        plan::plan_corrections(
            &zone.name,
            &existing,
            &native,
            &desired_records,
            &self.differ as &dyn Differ,
            strategy,
            &self.api,
        )
    }

    async fn ensure_zone_exists(&self, domain: &str) -> Result<()> {
        if self.zones.read().await.contains_key(domain) {
            return Ok(());
        }
        self.check_cancelled()?;
        info!(domain, "creating Azure DNS zone");
        let created = self.api.create_zone(domain).await?;

        // absorb the created zone so later calls resolve it without a
        // directory re-load
        let mut zones = self.zones.write().await;
        zones.insert(
            domain.to_string(),
            Zone {
                id: created.id,
                name: domain.to_string(),
                nameservers: created.properties.name_servers,
            },
        );
        Ok(())
    }
}

/// Factory for [`zonesync_core::ProviderRegistry`]; takes the credential
/// JSON document and hands back a connected session
pub fn provider_factory(credentials: serde_json::Value) -> BoxFuture<'static, Result<Arc<dyn ZoneProvider>>> {
    Box::pin(async move {
        let credentials: AzureCredentials = serde_json::from_value(credentials)?;
        let provider = AzureDnsProvider::connect(credentials).await?;
        Ok(Arc::new(provider) as Arc<dyn ZoneProvider>)
    })
}
