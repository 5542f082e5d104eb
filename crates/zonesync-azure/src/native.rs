//! Azure DNS wire model
//!
//! Serde models for the ARM `dnsZones` surface and the closed
//! [`NativeRecordType`] vocabulary with its bidirectional mapping to the
//! namespaced on-wire type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use zonesync_core::{fqdn_for, AliasedType, DnsError, RecordType, Result};

/// Namespace prefix ARM puts in front of record set types
pub const RECORD_TYPE_PREFIX: &str = "Microsoft.Network/dnszones/";

/// Record set types the ARM API stores
///
/// This is the on-wire vocabulary. The canonical `ALIAS` pseudo-type never
/// appears here; alias records are stored as sets of their underlying type
/// carrying a `targetResource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeRecordType {
    A,
    AAAA,
    CAA,
    CNAME,
    MX,
    NS,
    PTR,
    SRV,
    TXT,
    SOA,
}

impl NativeRecordType {
    /// Bare wire name, as used in record set URLs and `type` payload fields
    pub fn wire_name(&self) -> &'static str {
        match self {
            NativeRecordType::A => "A",
            NativeRecordType::AAAA => "AAAA",
            NativeRecordType::CAA => "CAA",
            NativeRecordType::CNAME => "CNAME",
            NativeRecordType::MX => "MX",
            NativeRecordType::NS => "NS",
            NativeRecordType::PTR => "PTR",
            NativeRecordType::SRV => "SRV",
            NativeRecordType::TXT => "TXT",
            NativeRecordType::SOA => "SOA",
        }
    }

    /// Parses a wire type string, with or without the ARM namespace prefix.
    /// Comparison is case-sensitive, matching what the API emits.
    pub fn from_wire(s: &str) -> Result<Self> {
        let bare = s.strip_prefix(RECORD_TYPE_PREFIX).unwrap_or(s);
        match bare {
            "A" => Ok(NativeRecordType::A),
            "AAAA" => Ok(NativeRecordType::AAAA),
            "CAA" => Ok(NativeRecordType::CAA),
            "CNAME" => Ok(NativeRecordType::CNAME),
            "MX" => Ok(NativeRecordType::MX),
            "NS" => Ok(NativeRecordType::NS),
            "PTR" => Ok(NativeRecordType::PTR),
            "SRV" => Ok(NativeRecordType::SRV),
            "TXT" => Ok(NativeRecordType::TXT),
            "SOA" => Ok(NativeRecordType::SOA),
            other => Err(DnsError::UnsupportedRecordType(other.to_string())),
        }
    }
}

impl fmt::Display for NativeRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl From<AliasedType> for NativeRecordType {
    fn from(aliased: AliasedType) -> Self {
        match aliased {
            AliasedType::A => NativeRecordType::A,
            AliasedType::AAAA => NativeRecordType::AAAA,
            AliasedType::CNAME => NativeRecordType::CNAME,
        }
    }
}

/// The wire type a canonical record type is stored as. Total: every
/// canonical type has exactly one native spelling, aliases included.
impl From<RecordType> for NativeRecordType {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::A => NativeRecordType::A,
            RecordType::AAAA => NativeRecordType::AAAA,
            RecordType::CAA => NativeRecordType::CAA,
            RecordType::CNAME => NativeRecordType::CNAME,
            RecordType::MX => NativeRecordType::MX,
            RecordType::NS => NativeRecordType::NS,
            RecordType::PTR => NativeRecordType::PTR,
            RecordType::SRV => NativeRecordType::SRV,
            RecordType::TXT => NativeRecordType::TXT,
            RecordType::Alias(aliased) => aliased.into(),
        }
    }
}

/// Paged ARM listing envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    pub value: Vec<T>,
    #[serde(rename = "nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NativeZone {
    pub id: String,
    pub name: String,
    pub properties: ZoneProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ZoneProperties {
    #[serde(rename = "nameServers")]
    #[serde(default)]
    pub name_servers: Vec<String>,
}

/// Body of the zone create-or-update call
#[derive(Debug, Serialize)]
pub(crate) struct ZoneCreateRequest {
    pub location: String,
}

/// One ARM record set: one name+type, zero or more entries, one TTL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NativeRecordSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Record name relative to the zone; "@" for the apex
    pub name: String,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    pub properties: RecordSetProperties,
}

impl NativeRecordSet {
    /// Fully qualified owner name without the trailing dot. Listings carry
    /// it in the properties; otherwise it is derived from the relative name.
    pub fn fqdn(&self, zone: &str) -> String {
        match &self.properties.fqdn {
            Some(fqdn) => fqdn.trim_end_matches('.').to_string(),
            None => fqdn_for(&self.name, zone),
        }
    }

    /// The set's wire type string; a set without one is malformed
    pub fn wire_type(&self) -> Result<&str> {
        self.record_type.as_deref().ok_or_else(|| {
            DnsError::Validation(format!("record set {} has no type", self.name))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordSetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(rename = "TTL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(rename = "ARecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a_records: Option<Vec<ARecord>>,
    #[serde(rename = "AAAARecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aaaa_records: Option<Vec<AAAARecord>>,
    #[serde(rename = "CNAMERecord")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cname_record: Option<CNAMERecord>,
    #[serde(rename = "TXTRecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txt_records: Option<Vec<TXTRecord>>,
    #[serde(rename = "MXRecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mx_records: Option<Vec<MXRecord>>,
    #[serde(rename = "NSRecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns_records: Option<Vec<NSRecord>>,
    #[serde(rename = "SRVRecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srv_records: Option<Vec<SRVRecord>>,
    #[serde(rename = "CAARecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caa_records: Option<Vec<CAARecord>>,
    #[serde(rename = "PTRRecords")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptr_records: Option<Vec<PTRRecord>>,
    /// Resource an alias set points at; entry lists stay absent on those sets
    #[serde(rename = "targetResource")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_resource: Option<SubResource>,
}

impl RecordSetProperties {
    /// The resource id of an alias set, when this set is one
    pub fn alias_target(&self) -> Option<&str> {
        self.target_resource.as_ref()?.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ARecord {
    #[serde(rename = "ipv4Address")]
    pub ipv4_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AAAARecord {
    #[serde(rename = "ipv6Address")]
    pub ipv6_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CNAMERecord {
    pub cname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TXTRecord {
    pub value: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MXRecord {
    pub preference: u16,
    pub exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NSRecord {
    pub nsdname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SRVRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CAARecord {
    pub flags: u8,
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PTRRecord {
    pub ptrdname: String,
}
