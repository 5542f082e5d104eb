//! Canonical record model
//!
//! Desired and observed zone state is expressed as [`CanonicalRecord`]s. The
//! record type and its payload travel together in [`RecordData`], so a record
//! can never carry a payload of the wrong shape, and the grouping identity of
//! a provider-native record set is a [`RecordKey`].

use crate::errors::DnsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Underlying type an alias record materializes as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AliasedType {
    A,
    AAAA,
    CNAME,
}

impl fmt::Display for AliasedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasedType::A => write!(f, "A"),
            AliasedType::AAAA => write!(f, "AAAA"),
            AliasedType::CNAME => write!(f, "CNAME"),
        }
    }
}

/// Closed vocabulary of record types the tool manages
///
/// `Alias` is a tool-level pseudo-type that resolves to a cloud resource and
/// serializes to whichever underlying type its payload names. Alias records
/// keep their own grouping identity: an alias-of-A and a plain A under the
/// same name are distinct keys even though both are A sets on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    AAAA,
    CAA,
    CNAME,
    MX,
    NS,
    PTR,
    SRV,
    TXT,
    #[serde(rename = "ALIAS")]
    Alias(AliasedType),
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::AAAA => write!(f, "AAAA"),
            RecordType::CAA => write!(f, "CAA"),
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::MX => write!(f, "MX"),
            RecordType::NS => write!(f, "NS"),
            RecordType::PTR => write!(f, "PTR"),
            RecordType::SRV => write!(f, "SRV"),
            RecordType::TXT => write!(f, "TXT"),
            RecordType::Alias(aliased) => write!(f, "ALIAS_{}", aliased),
        }
    }
}

impl FromStr for RecordType {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::AAAA),
            "CAA" => Ok(RecordType::CAA),
            "CNAME" => Ok(RecordType::CNAME),
            "MX" => Ok(RecordType::MX),
            "NS" => Ok(RecordType::NS),
            "PTR" => Ok(RecordType::PTR),
            "SRV" => Ok(RecordType::SRV),
            "TXT" => Ok(RecordType::TXT),
            "ALIAS_A" => Ok(RecordType::Alias(AliasedType::A)),
            "ALIAS_AAAA" => Ok(RecordType::Alias(AliasedType::AAAA)),
            "ALIAS_CNAME" => Ok(RecordType::Alias(AliasedType::CNAME)),
            other => Err(DnsError::UnsupportedRecordType(other.to_string())),
        }
    }
}

/// Type-specific record payload
///
/// TXT keeps its list of character-string segments; zero segments is the
/// empty-string record, which is distinct from the record being absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecordData {
    A {
        address: String,
    },
    AAAA {
        address: String,
    },
    CAA {
        flags: u8,
        tag: String,
        value: String,
    },
    CNAME {
        target: String,
    },
    MX {
        preference: u16,
        exchange: String,
    },
    NS {
        nameserver: String,
    },
    PTR {
        target: String,
    },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    TXT {
        segments: Vec<String>,
    },
    #[serde(rename = "ALIAS")]
    Alias {
        aliased: AliasedType,
        resource_id: String,
    },
}

impl RecordData {
    /// The record type this payload belongs to
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::AAAA { .. } => RecordType::AAAA,
            RecordData::CAA { .. } => RecordType::CAA,
            RecordData::CNAME { .. } => RecordType::CNAME,
            RecordData::MX { .. } => RecordType::MX,
            RecordData::NS { .. } => RecordType::NS,
            RecordData::PTR { .. } => RecordType::PTR,
            RecordData::SRV { .. } => RecordType::SRV,
            RecordData::TXT { .. } => RecordType::TXT,
            RecordData::Alias { aliased, .. } => RecordType::Alias(*aliased),
        }
    }

    /// Human-readable value, used in diff messages and logs
    pub fn value_string(&self) -> String {
        match self {
            RecordData::A { address } => address.clone(),
            RecordData::AAAA { address } => address.clone(),
            RecordData::CAA { flags, tag, value } => format!("{} {} \"{}\"", flags, tag, value),
            RecordData::CNAME { target } => target.clone(),
            RecordData::MX {
                preference,
                exchange,
            } => format!("{} {}", preference, exchange),
            RecordData::NS { nameserver } => nameserver.clone(),
            RecordData::PTR { target } => target.clone(),
            RecordData::SRV {
                priority,
                weight,
                port,
                target,
            } => format!("{} {} {} {}", priority, weight, port, target),
            RecordData::TXT { segments } => {
                if segments.is_empty() {
                    "\"\"".to_string()
                } else {
                    segments
                        .iter()
                        .map(|s| format!("\"{}\"", s))
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            }
            RecordData::Alias { resource_id, .. } => resource_id.clone(),
        }
    }
}

/// One desired or observed record in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Owner name relative to the zone; "@" for the apex
    pub label: String,
    /// Fully qualified owner name, without the trailing root dot
    pub fqdn: String,
    /// Seconds. The native set stores one TTL, so records sharing a key
    /// must agree on it.
    pub ttl: u32,
    pub data: RecordData,
}

impl CanonicalRecord {
    /// Builds a record from a label relative to `origin`
    pub fn new(label: impl Into<String>, origin: &str, ttl: u32, data: RecordData) -> Self {
        let label = label.into();
        let fqdn = fqdn_for(&label, origin);
        CanonicalRecord {
            label,
            fqdn,
            ttl,
            data,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Grouping identity. Alias records key on the alias pseudo-type with
    /// its aliased tag, not on the underlying wire type.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            fqdn: self.fqdn.clone(),
            record_type: self.record_type(),
        }
    }
}

impl fmt::Display for CanonicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ttl={}",
            self.record_type(),
            self.fqdn,
            self.data.value_string(),
            self.ttl
        )
    }
}

/// Grouping identity of a provider-native record set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub fqdn: String,
    pub record_type: RecordType,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.fqdn, self.record_type)
    }
}

/// Desired state for one zone
///
/// The domain and all record names must already be punycode-normalized by
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone domain, without the trailing root dot
    pub domain: String,
    pub records: Vec<CanonicalRecord>,
}

impl ZoneConfig {
    pub fn new(domain: impl Into<String>, records: Vec<CanonicalRecord>) -> Self {
        ZoneConfig {
            domain: domain.into(),
            records,
        }
    }
}

/// Fully qualified name (no trailing dot) for a label within `origin`
pub fn fqdn_for(label: &str, origin: &str) -> String {
    let origin = origin.trim_end_matches('.');
    if label == "@" || label.is_empty() {
        origin.to_string()
    } else {
        format!("{}.{}", label.trim_end_matches('.'), origin)
    }
}

/// Label relative to `origin` for a fully qualified name; "@" at the apex.
/// Names outside the origin are returned unchanged.
pub fn label_for(fqdn: &str, origin: &str) -> String {
    let fqdn = fqdn.trim_end_matches('.');
    let origin = origin.trim_end_matches('.');
    if fqdn == origin {
        "@".to_string()
    } else if let Some(stripped) = fqdn.strip_suffix(origin) {
        match stripped.strip_suffix('.') {
            Some(label) => label.to_string(),
            // Same suffix but not a label boundary ("badexample.com" under
            // "example.com") is a foreign name.
            None => fqdn.to_string(),
        }
    } else {
        fqdn.to_string()
    }
}
