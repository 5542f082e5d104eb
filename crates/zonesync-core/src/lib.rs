//! Reconciliation core for declarative DNS management
//!
//! Given the desired records for a zone and the records a provider actually
//! holds, zonesync computes the minimal ordered list of corrections that
//! converge actual state onto desired state. This crate holds the
//! provider-agnostic pieces:
//!
//! - **Canonical model**: [`CanonicalRecord`], [`RecordKey`] and the closed
//!   [`RecordType`] vocabulary, including the `ALIAS` pseudo-type
//! - **Diff classifier**: the [`Differ`] interface the planners consume, and
//!   [`RecordDiffer`], the default content-equality policy
//! - **Corrections**: immutable command values plus [`apply_corrections`],
//!   the in-order executor
//! - **Registry**: [`ProviderRegistry`], the explicit factory table the
//!   orchestrator assembles at startup, handing out [`ZoneProvider`]
//!   sessions
//!
//! Provider crates (for example `zonesync-azure`) implement [`ZoneProvider`]
//! and translate between this model and their native record sets.
//!
//! # Usage
//!
//! ```ignore
//! use zonesync_core::{PlanStrategy, ProviderRegistry, ZoneConfig};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register("AZURE_DNS", zonesync_azure::provider_factory);
//!
//! let provider = registry.create("AZURE_DNS", credentials).await?;
//! let corrections = provider
//!     .plan(&ZoneConfig::new("example.com", desired), PlanStrategy::default())
//!     .await?;
//! for correction in &corrections {
//!     println!("{}", correction.message);
//! }
//! zonesync_core::apply_corrections(&corrections, &cancel).await?;
//! ```

pub mod corrections;
pub mod diff;
pub mod errors;
pub mod records;
pub mod registry;
pub mod txt;

// Re-export main types
pub use corrections::{apply_corrections, Correction, CorrectionCommand};
pub use diff::{ChangeKind, Differ, GroupChange, RecordDiffer, RecordSetChange};
pub use errors::{DnsError, Result};
pub use records::{
    fqdn_for, label_for, AliasedType, CanonicalRecord, RecordData, RecordKey, RecordType,
    ZoneConfig,
};
pub use registry::{PlanStrategy, ProviderFactory, ProviderRegistry, ZoneProvider};
pub use txt::{split_single_long_txt, MAX_TXT_SEGMENT};
