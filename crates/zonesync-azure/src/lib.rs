//! Azure DNS provider for zonesync
//!
//! Implements [`zonesync_core::ZoneProvider`] against the Azure Resource
//! Manager `dnsZones` API. Requires a service principal with DNS Zone
//! Contributor on the resource group holding the zones.
//!
//! The crate splits into:
//!
//! - [`native`]: serde models for the ARM wire format and the closed
//!   [`NativeRecordType`] vocabulary
//! - [`translate`]: canonical record ↔ native record set mapping,
//!   including the `ALIAS` pseudo-type stored as an A/AAAA/CNAME set with a
//!   `targetResource`
//! - [`api`]: the [`AzureApi`] trait and its reqwest implementation (token
//!   cache, `nextLink` pagination, writes)
//! - [`plan`]: the correction planner and its [`WriteOp`] command values
//! - [`provider`]: the session tying it together, plus the factory the
//!   orchestrator registers under [`AZURE_DNS_PROVIDER`]

pub mod api;
pub mod credentials;
pub mod native;
pub mod plan;
pub mod provider;
pub mod translate;

pub use api::{AzureApi, AzureRestApi, DEFAULT_TIMEOUT};
pub use credentials::AzureCredentials;
pub use native::{NativeRecordSet, NativeRecordType, NativeZone};
pub use plan::{RecordWrite, WriteOp};
pub use provider::{provider_factory, AzureDnsProvider, Zone, AZURE_DNS_PROVIDER};
pub use translate::{to_canonical, to_native};
