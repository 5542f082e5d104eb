//! Azure DNS credentials
//!
//! Service principal (app registration) credentials with DNS Zone
//! Contributor on the resource group holding the zones. The orchestrator
//! passes these in as a JSON document; secret material never appears in
//! logs thanks to [`AzureCredentials::masked`].

use serde::{Deserialize, Serialize};
use zonesync_core::{DnsError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureCredentials {
    /// Azure Tenant ID (Directory ID)
    pub tenant_id: String,

    /// Client ID (Application ID)
    pub client_id: String,

    /// Client Secret
    pub client_secret: String,

    /// Azure Subscription ID
    pub subscription_id: String,

    /// Resource Group name containing DNS zones
    pub resource_group: String,
}

impl AzureCredentials {
    /// Rejects credential documents with empty fields before any network
    /// call is made
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("subscription_id", &self.subscription_id),
            ("resource_group", &self.resource_group),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(DnsError::InvalidCredentials(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Masked representation for display and logs
    pub fn masked(&self) -> serde_json::Value {
        serde_json::json!({
            "tenant_id": mask_string(&self.tenant_id),
            "client_id": mask_string(&self.client_id),
            "client_secret": "***",
            "subscription_id": mask_string(&self.subscription_id),
            "resource_group": self.resource_group.clone(),
        })
    }
}

/// Mask a string, showing only first 4 and last 4 characters
fn mask_string(s: &str) -> String {
    if s.len() <= 8 {
        "***".to_string()
    } else {
        format!("{}...{}", &s[..4], &s[s.len() - 4..])
    }
}
