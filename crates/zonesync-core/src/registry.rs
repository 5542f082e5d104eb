//! Provider surface and factory registry
//!
//! Provider sessions reach the orchestrator through an explicit registry
//! built at startup: the orchestrator registers each provider's factory
//! under its type name and later asks for sessions by name. Nothing
//! registers itself at load time, so the registry is plain dependency
//! injection and the core stays unit-testable in isolation.

use crate::corrections::Correction;
use crate::errors::{DnsError, Result};
use crate::records::{CanonicalRecord, ZoneConfig};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which planning algorithm [`ZoneProvider::plan`] runs. Both converge to
/// the same end state; they differ in how changes are walked and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlanStrategy {
    /// Walk changed name+type groups and match native sets per group
    GroupedByName,
    /// Walk pre-sequenced per-recordset change instructions
    #[default]
    ByRecordSet,
}

/// Reconciliation surface a provider session exposes to the orchestrator
///
/// Domains and record names passed in must already be punycode-normalized.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Zone domains visible to the credential scope, fetched fresh from the
    /// provider rather than served from the session cache
    async fn list_zones(&self) -> Result<Vec<String>>;

    /// Nameservers for a managed zone, trailing root dots stripped.
    /// `DomainNotFound` when the account does not hold the zone.
    async fn nameservers(&self, domain: &str) -> Result<Vec<String>>;

    /// Existing records of a managed zone, in canonical form
    async fn zone_records(&self, domain: &str) -> Result<Vec<CanonicalRecord>>;

    /// Ordered corrections that converge the zone onto `desired`
    async fn plan(&self, desired: &ZoneConfig, strategy: PlanStrategy)
        -> Result<Vec<Correction>>;

    /// Creates the zone when the account does not already hold it
    async fn ensure_zone_exists(&self, domain: &str) -> Result<()>;
}

impl fmt::Debug for dyn ZoneProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ZoneProvider")
    }
}

/// Builds a provider session from its JSON credential document
pub type ProviderFactory =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Arc<dyn ZoneProvider>>> + Send + Sync>;

/// Name → factory table the orchestrator assembles at startup
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        ProviderRegistry {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory under a provider-type name, replacing any
    /// previous registration for that name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(Value) -> BoxFuture<'static, Result<Arc<dyn ZoneProvider>>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builds a provider session for `name` from its credential document
    pub async fn create(&self, name: &str, credentials: Value) -> Result<Arc<dyn ZoneProvider>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DnsError::UnknownProvider(name.to_string()))?;
        factory(credentials).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider-type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct StubProvider {
        zones: Vec<String>,
    }

    #[async_trait]
    impl ZoneProvider for StubProvider {
        async fn list_zones(&self) -> Result<Vec<String>> {
            Ok(self.zones.clone())
        }

        async fn nameservers(&self, domain: &str) -> Result<Vec<String>> {
            Err(DnsError::DomainNotFound(domain.to_string()))
        }

        async fn zone_records(&self, domain: &str) -> Result<Vec<CanonicalRecord>> {
            Err(DnsError::DomainNotFound(domain.to_string()))
        }

        async fn plan(
            &self,
            _desired: &ZoneConfig,
            _strategy: PlanStrategy,
        ) -> Result<Vec<Correction>> {
            Ok(Vec::new())
        }

        async fn ensure_zone_exists(&self, _domain: &str) -> Result<()> {
            Ok(())
        }
    }

    fn stub_factory(credentials: Value) -> BoxFuture<'static, Result<Arc<dyn ZoneProvider>>> {
        Box::pin(async move {
            let zone = credentials["zone"]
                .as_str()
                .ok_or_else(|| DnsError::InvalidCredentials("zone missing".to_string()))?
                .to_string();
            Ok(Arc::new(StubProvider { zones: vec![zone] }) as Arc<dyn ZoneProvider>)
        })
    }

    #[tokio::test]
    async fn test_register_and_create() {
        let mut registry = ProviderRegistry::new();
        registry.register("STUB", stub_factory);
        assert!(registry.contains("STUB"));

        let provider = registry
            .create("STUB", json!({"zone": "example.com"}))
            .await
            .unwrap();
        assert_eq!(provider.list_zones().await.unwrap(), vec!["example.com"]);
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let registry = ProviderRegistry::new();
        let err = registry.create("NOPE", json!({})).await.unwrap_err();
        assert!(matches!(err, DnsError::UnknownProvider(name) if name == "NOPE"));
    }

    #[tokio::test]
    async fn test_factory_surfaces_credential_errors() {
        let mut registry = ProviderRegistry::new();
        registry.register("STUB", stub_factory);
        let err = registry.create("STUB", json!({})).await.unwrap_err();
        assert!(matches!(err, DnsError::InvalidCredentials(_)));
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = ProviderRegistry::new();
        registry.register("B", stub_factory);
        registry.register("A", stub_factory);
        assert_eq!(registry.names(), vec!["A", "B"]);
    }
}
