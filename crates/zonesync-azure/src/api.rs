//! ARM REST collaborator
//!
//! The planner and executor only see [`AzureApi`]; [`AzureRestApi`] is the
//! reqwest implementation talking to the Azure Resource Manager `dnsZones`
//! surface. Authentication uses an OAuth2 client-credentials token fetched
//! from the tenant's token endpoint on demand and cached for the session.
//! Paginated listings follow `nextLink` to completion; a failed page aborts
//! the whole listing.

use crate::credentials::AzureCredentials;
use crate::native::{
    ListEnvelope, NativeRecordSet, NativeRecordType, NativeZone, ZoneCreateRequest,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use zonesync_core::{DnsError, Result};

const AZURE_MANAGEMENT_BASE: &str = "https://management.azure.com";
const AZURE_LOGIN_BASE: &str = "https://login.microsoftonline.com";
const API_VERSION: &str = "2018-05-01";

/// Every remote call is bound to this unless a caller picks its own
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Native zone and record set calls the provider session is built on
#[async_trait]
pub trait AzureApi: Send + Sync {
    /// All zones in the credential scope, every page drained
    async fn list_zones(&self) -> Result<Vec<NativeZone>>;

    /// Creates (or updates) the zone; location is always `global`
    async fn create_zone(&self, domain: &str) -> Result<NativeZone>;

    /// All record sets of a zone, every page drained
    async fn list_record_sets(&self, zone: &str) -> Result<Vec<NativeRecordSet>>;

    /// PUT create-or-update of one record set, keyed by relative name and
    /// wire type
    async fn upsert_record_set(
        &self,
        zone: &str,
        name: &str,
        record_type: NativeRecordType,
        set: &NativeRecordSet,
    ) -> Result<()>;

    async fn delete_record_set(
        &self,
        zone: &str,
        name: &str,
        record_type: NativeRecordType,
    ) -> Result<()>;
}

/// Token response from Azure AD
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug)]
pub struct AzureRestApi {
    client: Client,
    credentials: AzureCredentials,
    base_url: String,
    login_url: String,
    /// Cached access token
    access_token: tokio::sync::RwLock<Option<String>>,
}

impl AzureRestApi {
    pub fn new(credentials: AzureCredentials) -> Result<Self> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    /// Builds the client with a caller-chosen per-call timeout
    pub fn with_timeout(credentials: AzureCredentials, timeout: Duration) -> Result<Self> {
        credentials.validate()?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DnsError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            base_url: AZURE_MANAGEMENT_BASE.to_string(),
            login_url: AZURE_LOGIN_BASE.to_string(),
            access_token: tokio::sync::RwLock::new(None),
        })
    }

    /// Client routed at custom endpoints (for testing)
    #[cfg(test)]
    pub fn with_base_url(
        credentials: AzureCredentials,
        base_url: String,
        login_url: String,
    ) -> Result<Self> {
        let mut api = Self::new(credentials)?;
        api.base_url = base_url;
        api.login_url = login_url;
        Ok(api)
    }

    /// Client with a pre-set access token (for testing)
    pub(crate) fn with_test_token(
        credentials: AzureCredentials,
        base_url: String,
        token: String,
    ) -> Result<Self> {
        let mut api = Self::new(credentials)?;
        api.base_url = base_url;
        api.access_token = tokio::sync::RwLock::new(Some(token));
        Ok(api)
    }

    /// Scope prefix all zone and record set paths share
    fn zones_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/dnsZones",
            self.credentials.subscription_id, self.credentials.resource_group
        )
    }

    fn record_set_url(&self, zone: &str, name: &str, record_type: NativeRecordType) -> String {
        format!(
            "{}{}/{}/{}/{}?api-version={}",
            self.base_url,
            self.zones_path(),
            zone,
            record_type.wire_name(),
            name,
            API_VERSION
        )
    }

    /// Get access token for API requests
    async fn get_access_token(&self) -> Result<String> {
        {
            let token = self.access_token.read().await;
            if let Some(ref t) = *token {
                return Ok(t.clone());
            }
        }

        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_url, self.credentials.tenant_id
        );
        debug!("requesting access token for tenant {}", self.credentials.tenant_id);

        let response = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.credentials.client_id),
                ("client_secret", &self.credentials.client_secret),
                ("scope", "https://management.azure.com/.default"),
            ])
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(DnsError::InvalidCredentials(format!(
                "Failed to get access token: {}",
                error
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Api(format!("Failed to parse token response: {}", e)))?;

        {
            let mut token = self.access_token.write().await;
            *token = Some(token_response.access_token.clone());
        }

        Ok(token_response.access_token)
    }

    /// Sends an authenticated request and maps non-success statuses into
    /// `Api` errors carrying status and body
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.get_access_token().await?;
        let response = request
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DnsError::Api(format!(
                "Azure API returned status {}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(self.client.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| DnsError::Api(format!("Failed to parse response: {}", e)))
    }

    /// Drains a paged listing by following `nextLink` (an absolute URL,
    /// already carrying its query) until exhausted. Any failed page aborts
    /// the whole listing; no partial result is returned.
    async fn get_paged<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut url = format!("{}{}?api-version={}", self.base_url, path, API_VERSION);
        let mut items = Vec::new();
        loop {
            debug!("Azure DNS API GET {}", url);
            let envelope: ListEnvelope<T> = self.get_json(&url).await?;
            items.extend(envelope.value);
            match envelope.next_link {
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl AzureApi for AzureRestApi {
    async fn list_zones(&self) -> Result<Vec<NativeZone>> {
        self.get_paged(&self.zones_path()).await
    }

    async fn create_zone(&self, domain: &str) -> Result<NativeZone> {
        let url = format!(
            "{}{}/{}?api-version={}",
            self.base_url,
            self.zones_path(),
            domain,
            API_VERSION
        );
        let body = ZoneCreateRequest {
            location: "global".to_string(),
        };
        let response = self.send(self.client.put(&url).json(&body)).await?;
        response
            .json()
            .await
            .map_err(|e| DnsError::Api(format!("Failed to parse created zone: {}", e)))
    }

    async fn list_record_sets(&self, zone: &str) -> Result<Vec<NativeRecordSet>> {
        let path = format!("{}/{}/recordsets", self.zones_path(), zone);
        self.get_paged(&path).await
    }

    async fn upsert_record_set(
        &self,
        zone: &str,
        name: &str,
        record_type: NativeRecordType,
        set: &NativeRecordSet,
    ) -> Result<()> {
        let url = self.record_set_url(zone, name, record_type);
        debug!("Azure DNS API PUT {}", url);
        self.send(self.client.put(&url).json(set)).await?;
        Ok(())
    }

    async fn delete_record_set(
        &self,
        zone: &str,
        name: &str,
        record_type: NativeRecordType,
    ) -> Result<()> {
        let url = self.record_set_url(zone, name, record_type);
        debug!("Azure DNS API DELETE {}", url);
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }
}
