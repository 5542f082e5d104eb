//! Record translator
//!
//! Bidirectional mapping between canonical records and ARM record sets.
//! Reading expands one native set into one canonical record per entry;
//! writing merges the canonical records grouped under one [`RecordKey`] back
//! into a single set. An address or CNAME set without entries but with a
//! `targetResource` is an alias set and reads as the `ALIAS` pseudo-type.

use crate::native::{
    AAAARecord, ARecord, CAARecord, CNAMERecord, MXRecord, NSRecord, NativeRecordSet,
    NativeRecordType, PTRRecord, RecordSetProperties, SRVRecord, SubResource, TXTRecord,
};
use tracing::debug;
use zonesync_core::{
    label_for, AliasedType, CanonicalRecord, DnsError, RecordData, RecordKey, RecordType, Result,
};

/// Flattens one native set into canonical records.
///
/// SOA sets contribute nothing; sets outside the wire vocabulary fail with
/// `UnsupportedRecordType` for the caller to handle. A set without entries
/// and without an alias target also contributes nothing.
pub fn to_canonical(set: &NativeRecordSet, origin: &str) -> Result<Vec<CanonicalRecord>> {
    let native_type = NativeRecordType::from_wire(set.wire_type()?)?;
    if native_type == NativeRecordType::SOA {
        return Ok(Vec::new());
    }

    let ttl = set
        .properties
        .ttl
        .ok_or_else(|| DnsError::Validation(format!("record set {} has no TTL", set.name)))?;
    let fqdn = set.fqdn(origin);
    let label = label_for(&fqdn, origin);
    let p = &set.properties;

    let record = |data: RecordData| CanonicalRecord {
        label: label.clone(),
        fqdn: fqdn.clone(),
        ttl,
        data,
    };

    let mut records = Vec::new();
    match native_type {
        NativeRecordType::A => match &p.a_records {
            Some(entries) => {
                for a in entries {
                    records.push(record(RecordData::A {
                        address: a.ipv4_address.clone(),
                    }));
                }
            }
            None => push_alias(&mut records, record, p, AliasedType::A),
        },
        NativeRecordType::AAAA => match &p.aaaa_records {
            Some(entries) => {
                for aaaa in entries {
                    records.push(record(RecordData::AAAA {
                        address: aaaa.ipv6_address.clone(),
                    }));
                }
            }
            None => push_alias(&mut records, record, p, AliasedType::AAAA),
        },
        NativeRecordType::CNAME => match &p.cname_record {
            Some(cname) => records.push(record(RecordData::CNAME {
                target: cname.cname.clone(),
            })),
            None => push_alias(&mut records, record, p, AliasedType::CNAME),
        },
        NativeRecordType::TXT => match p.txt_records.as_deref() {
            // A TXT set without entries holds the empty-string record
            None | Some([]) => records.push(record(RecordData::TXT { segments: vec![] })),
            Some(entries) => {
                for txt in entries {
                    let segments = if txt.value.len() == 1 && txt.value[0].is_empty() {
                        vec![]
                    } else {
                        txt.value.clone()
                    };
                    records.push(record(RecordData::TXT { segments }));
                }
            }
        },
        NativeRecordType::MX => {
            for mx in p.mx_records.as_deref().unwrap_or_default() {
                records.push(record(RecordData::MX {
                    preference: mx.preference,
                    exchange: mx.exchange.clone(),
                }));
            }
        }
        NativeRecordType::NS => {
            for ns in p.ns_records.as_deref().unwrap_or_default() {
                records.push(record(RecordData::NS {
                    nameserver: ns.nsdname.clone(),
                }));
            }
        }
        NativeRecordType::PTR => {
            for ptr in p.ptr_records.as_deref().unwrap_or_default() {
                records.push(record(RecordData::PTR {
                    target: ptr.ptrdname.clone(),
                }));
            }
        }
        NativeRecordType::SRV => {
            for srv in p.srv_records.as_deref().unwrap_or_default() {
                records.push(record(RecordData::SRV {
                    priority: srv.priority,
                    weight: srv.weight,
                    port: srv.port,
                    target: srv.target.clone(),
                }));
            }
        }
        NativeRecordType::CAA => {
            for caa in p.caa_records.as_deref().unwrap_or_default() {
                records.push(record(RecordData::CAA {
                    flags: caa.flags,
                    tag: caa.tag.clone(),
                    value: caa.value.clone(),
                }));
            }
        }
        NativeRecordType::SOA => unreachable!("SOA handled above"),
    }

    if records.is_empty() && native_type != NativeRecordType::TXT {
        debug!(name = %set.name, record_type = %native_type, "record set has no entries, skipping");
    }
    Ok(records)
}

fn push_alias(
    records: &mut Vec<CanonicalRecord>,
    record: impl Fn(RecordData) -> CanonicalRecord,
    properties: &RecordSetProperties,
    aliased: AliasedType,
) {
    // no entries and no target resource means an empty set, not an alias
    if let Some(target) = properties.alias_target() {
        records.push(record(RecordData::Alias {
            aliased,
            resource_id: target.to_string(),
        }));
    }
}

/// Merges the canonical records grouped under `key` into one native set.
///
/// Fails when the group is empty, its records disagree on TTL, a payload
/// does not match the key's type, or a singleton type carries more than one
/// record. The returned type is the wire type the set is stored as, which
/// for aliases is the aliased type, not `ALIAS`.
pub fn to_native(
    key: &RecordKey,
    records: &[CanonicalRecord],
) -> Result<(NativeRecordSet, NativeRecordType)> {
    let first = records.first().ok_or_else(|| {
        DnsError::Validation(format!("no records to build a set for {}", key))
    })?;

    let ttl = first.ttl;
    for record in records {
        if record.ttl != ttl {
            return Err(DnsError::TtlMismatch {
                key: key.to_string(),
                first: ttl,
                second: record.ttl,
            });
        }
    }

    if matches!(
        key.record_type,
        RecordType::CNAME | RecordType::Alias(_)
    ) && records.len() > 1
    {
        return Err(DnsError::Validation(format!(
            "{} permits only one record, got {}",
            key,
            records.len()
        )));
    }

    let mut properties = RecordSetProperties {
        ttl: Some(ttl),
        ..RecordSetProperties::default()
    };

    for record in records {
        match (&key.record_type, &record.data) {
            (RecordType::A, RecordData::A { address }) => {
                properties.a_records.get_or_insert_with(Vec::new).push(ARecord {
                    ipv4_address: address.clone(),
                });
            }
            (RecordType::AAAA, RecordData::AAAA { address }) => {
                properties
                    .aaaa_records
                    .get_or_insert_with(Vec::new)
                    .push(AAAARecord {
                        ipv6_address: address.clone(),
                    });
            }
            (RecordType::CNAME, RecordData::CNAME { target }) => {
                properties.cname_record = Some(CNAMERecord {
                    cname: target.clone(),
                });
            }
            (RecordType::NS, RecordData::NS { nameserver }) => {
                properties.ns_records.get_or_insert_with(Vec::new).push(NSRecord {
                    nsdname: nameserver.clone(),
                });
            }
            (RecordType::PTR, RecordData::PTR { target }) => {
                properties.ptr_records.get_or_insert_with(Vec::new).push(PTRRecord {
                    ptrdname: target.clone(),
                });
            }
            (RecordType::TXT, RecordData::TXT { segments }) => {
                let entries = properties.txt_records.get_or_insert_with(Vec::new);
                // The empty-string record is a set with zero entries, not an
                // entry holding one empty string
                if !segments.is_empty() {
                    entries.push(TXTRecord {
                        value: segments.clone(),
                    });
                }
            }
            (RecordType::MX, RecordData::MX { preference, exchange }) => {
                properties.mx_records.get_or_insert_with(Vec::new).push(MXRecord {
                    preference: *preference,
                    exchange: exchange.clone(),
                });
            }
            (
                RecordType::SRV,
                RecordData::SRV {
                    priority,
                    weight,
                    port,
                    target,
                },
            ) => {
                properties.srv_records.get_or_insert_with(Vec::new).push(SRVRecord {
                    priority: *priority,
                    weight: *weight,
                    port: *port,
                    target: target.clone(),
                });
            }
            (RecordType::CAA, RecordData::CAA { flags, tag, value }) => {
                properties.caa_records.get_or_insert_with(Vec::new).push(CAARecord {
                    flags: *flags,
                    tag: tag.clone(),
                    value: value.clone(),
                });
            }
            (RecordType::Alias(aliased), RecordData::Alias { aliased: rec_aliased, resource_id })
                if aliased == rec_aliased =>
            {
                properties.target_resource = Some(SubResource {
                    id: Some(resource_id.clone()),
                });
            }
            (_, data) => {
                return Err(DnsError::Validation(format!(
                    "record payload {} does not match key {}",
                    data.record_type(),
                    key
                )));
            }
        }
    }

    let native_type = NativeRecordType::from(key.record_type);
    let set = NativeRecordSet {
        id: None,
        name: first.label.clone(),
        record_type: Some(native_type.wire_name().to_string()),
        properties,
    };
    Ok((set, native_type))
}
