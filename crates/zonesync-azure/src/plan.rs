//! Correction planner
//!
//! Turns classifier output into ordered [`Correction`]s. Two strategies sit
//! behind [`PlanStrategy`]: the per-name walk over changed groups, and the
//! per-recordset walk over pre-sequenced change instructions. Both emit
//! [`WriteOp`] command values that own everything the executor needs, so no
//! correction ever borrows planner state.

use crate::api::AzureApi;
use crate::native::{NativeRecordSet, NativeRecordType};
use crate::translate;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use zonesync_core::{
    label_for, CanonicalRecord, ChangeKind, Correction, CorrectionCommand, Differ, DnsError,
    PlanStrategy, Result,
};

/// One fully specified provider write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Upsert {
        zone: String,
        name: String,
        record_type: NativeRecordType,
        set: NativeRecordSet,
    },
    Delete {
        zone: String,
        name: String,
        record_type: NativeRecordType,
    },
}

/// Binds a [`WriteOp`] to the API it runs against
pub struct RecordWrite {
    api: Arc<dyn AzureApi>,
    op: WriteOp,
}

impl RecordWrite {
    pub fn new(api: Arc<dyn AzureApi>, op: WriteOp) -> Self {
        RecordWrite { api, op }
    }
}

impl fmt::Debug for RecordWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordWrite").field("op", &self.op).finish()
    }
}

#[async_trait]
impl CorrectionCommand for RecordWrite {
    async fn run(&self) -> Result<()> {
        match &self.op {
            WriteOp::Upsert {
                zone,
                name,
                record_type,
                set,
            } => {
                self.api
                    .upsert_record_set(zone, name, *record_type, set)
                    .await
            }
            WriteOp::Delete {
                zone,
                name,
                record_type,
            } => self.api.delete_record_set(zone, name, *record_type).await,
        }
    }
}

/// Plans the corrections that converge `existing` onto `desired`.
///
/// `native` is the record set snapshot `existing` was translated from; the
/// per-name strategy matches deletion targets and conflict candidates
/// against it.
pub(crate) fn plan_corrections(
    zone: &str,
    existing: &[CanonicalRecord],
    native: &[NativeRecordSet],
    desired: &[CanonicalRecord],
    differ: &dyn Differ,
    strategy: PlanStrategy,
    api: &Arc<dyn AzureApi>,
) -> Result<Vec<Correction>> {
    match strategy {
        PlanStrategy::GroupedByName => {
            plan_grouped_by_name(zone, existing, native, desired, differ, api)
        }
        PlanStrategy::ByRecordSet => plan_by_record_set(zone, existing, desired, differ, api),
    }
}

/// Legacy per-name strategy: walk changed groups, match native sets per
/// group, insert CNAME-exclusion deletes ahead of upserts.
fn plan_grouped_by_name(
    zone: &str,
    existing: &[CanonicalRecord],
    native: &[NativeRecordSet],
    desired: &[CanonicalRecord],
    differ: &dyn Differ,
    api: &Arc<dyn AzureApi>,
) -> Result<Vec<Correction>> {
    let changes = differ.changed_groups(existing, desired);
    let mut corrections = Vec::new();

    for change in &changes {
        let message = change.messages.join("\n");
        let group: Vec<CanonicalRecord> = desired
            .iter()
            .filter(|r| r.key() == change.key)
            .cloned()
            .collect();

        if group.is_empty() {
            // Nothing desired under this key: locate the native set to
            // delete, by FQDN and translated type equality. One type has
            // several on-wire spellings, so never compare the raw strings.
            let want_type = NativeRecordType::from(change.key.record_type);
            let mut matched = None;
            for set in native {
                if set.fqdn(zone) != change.key.fqdn {
                    continue;
                }
                let set_type = NativeRecordType::from_wire(set.wire_type()?)?;
                if set_type == want_type {
                    matched = Some(set);
                    break;
                }
            }
            let set = matched.ok_or_else(|| DnsError::NoMatchingRecordSet {
                fqdn: change.key.fqdn.clone(),
                record_type: change.key.record_type.to_string(),
            })?;
            corrections.push(Correction::new(
                message,
                RecordWrite::new(
                    Arc::clone(api),
                    WriteOp::Delete {
                        zone: zone.to_string(),
                        name: set.name.clone(),
                        record_type: want_type,
                    },
                ),
            ));
        } else {
            let (set, new_type) = translate::to_native(&change.key, &group)?;

            // The provider rejects a CNAME coexisting with an address
            // record under one name: delete the other set first.
            for existing_set in native {
                if existing_set.fqdn(zone) != change.key.fqdn {
                    continue;
                }
                let existing_type = NativeRecordType::from_wire(existing_set.wire_type()?)?;
                let cname_involved = existing_type == NativeRecordType::CNAME
                    || new_type == NativeRecordType::CNAME;
                let address_involved = matches!(
                    existing_type,
                    NativeRecordType::A | NativeRecordType::AAAA
                ) || matches!(new_type, NativeRecordType::A | NativeRecordType::AAAA);
                if cname_involved && address_involved {
                    corrections.push(Correction::new(
                        message.clone(),
                        RecordWrite::new(
                            Arc::clone(api),
                            WriteOp::Delete {
                                zone: zone.to_string(),
                                name: existing_set.name.clone(),
                                record_type: existing_type,
                            },
                        ),
                    ));
                }
            }

            corrections.push(Correction::new(
                message,
                RecordWrite::new(
                    Arc::clone(api),
                    WriteOp::Upsert {
                        zone: zone.to_string(),
                        name: set.name.clone(),
                        record_type: new_type,
                        set,
                    },
                ),
            ));
        }
    }

    // Cosmetic ordering only: the sort is stable and conflict deletes share
    // their group's message, so they stay ahead of the paired upsert.
    corrections.sort_by(|a, b| a.message.cmp(&b.message));
    Ok(corrections)
}

/// Set-oriented strategy: trust the classifier's sequencing, emit one
/// correction per change instruction.
fn plan_by_record_set(
    zone: &str,
    existing: &[CanonicalRecord],
    desired: &[CanonicalRecord],
    differ: &dyn Differ,
    api: &Arc<dyn AzureApi>,
) -> Result<Vec<Correction>> {
    let changes = differ.by_record_set(existing, desired);
    let mut corrections = Vec::new();

    for change in changes {
        match change.kind {
            ChangeKind::Report => corrections.push(Correction::report(change.message)),
            ChangeKind::Create | ChangeKind::Change => {
                let (set, record_type) = translate::to_native(&change.key, &change.new)?;
                corrections.push(Correction::new(
                    change.message,
                    RecordWrite::new(
                        Arc::clone(api),
                        WriteOp::Upsert {
                            zone: zone.to_string(),
                            name: set.name.clone(),
                            record_type,
                            set,
                        },
                    ),
                ));
            }
            ChangeKind::Delete => {
                let name = label_for(&change.key.fqdn, zone);
                corrections.push(Correction::new(
                    change.message,
                    RecordWrite::new(
                        Arc::clone(api),
                        WriteOp::Delete {
                            zone: zone.to_string(),
                            name,
                            record_type: NativeRecordType::from(change.key.record_type),
                        },
                    ),
                ));
            }
        }
    }

    Ok(corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeZone;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;
    use zonesync_core::{
        apply_corrections, AliasedType, GroupChange, RecordData, RecordDiffer, RecordKey,
        RecordSetChange,
    };

    const ZONE: &str = "example.com";

    /// Records every write in call order
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<WriteOp>>,
    }

    #[async_trait]
    impl AzureApi for FakeApi {
        async fn list_zones(&self) -> Result<Vec<NativeZone>> {
            unreachable!("planner never lists zones")
        }

        async fn create_zone(&self, _domain: &str) -> Result<NativeZone> {
            unreachable!("planner never creates zones")
        }

        async fn list_record_sets(&self, _zone: &str) -> Result<Vec<NativeRecordSet>> {
            unreachable!("planner consumes a pre-fetched snapshot")
        }

        async fn upsert_record_set(
            &self,
            zone: &str,
            name: &str,
            record_type: NativeRecordType,
            set: &NativeRecordSet,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(WriteOp::Upsert {
                zone: zone.to_string(),
                name: name.to_string(),
                record_type,
                set: set.clone(),
            });
            Ok(())
        }

        async fn delete_record_set(
            &self,
            zone: &str,
            name: &str,
            record_type: NativeRecordType,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(WriteOp::Delete {
                zone: zone.to_string(),
                name: name.to_string(),
                record_type,
            });
            Ok(())
        }
    }

    fn fake_api() -> (Arc<FakeApi>, Arc<dyn AzureApi>) {
        let fake = Arc::new(FakeApi::default());
        let api: Arc<dyn AzureApi> = Arc::clone(&fake) as Arc<dyn AzureApi>;
        (fake, api)
    }

    fn canonical(label: &str, ttl: u32, data: RecordData) -> CanonicalRecord {
        CanonicalRecord::new(label, ZONE, ttl, data)
    }

    fn cname_set(name: &str, target: &str) -> NativeRecordSet {
        serde_json::from_value(json!({
            "name": name,
            "type": "Microsoft.Network/dnszones/CNAME",
            "properties": {"TTL": 300, "CNAMERecord": {"cname": target}}
        }))
        .unwrap()
    }

    async fn apply(corrections: &[Correction]) {
        apply_corrections(corrections, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_identical_states_plan_nothing() {
        let (_, api) = fake_api();
        let records = vec![
            canonical("www", 300, RecordData::A { address: "192.0.2.1".into() }),
            canonical("@", 3600, RecordData::MX { preference: 10, exchange: "mail.example.com.".into() }),
        ];
        for strategy in [PlanStrategy::GroupedByName, PlanStrategy::ByRecordSet] {
            let corrections = plan_corrections(
                ZONE,
                &records,
                &[],
                &records,
                &RecordDiffer::new(),
                strategy,
                &api,
            )
            .unwrap();
            assert!(corrections.is_empty(), "{:?} planned {:?}", strategy, corrections.len());
        }
    }

    #[tokio::test]
    async fn test_cname_deleted_before_address_create() {
        let (fake, api) = fake_api();
        let existing = vec![canonical("@", 300, RecordData::CNAME { target: "old.example.com.".into() })];
        let native = vec![cname_set("@", "old.example.com.")];
        let desired = vec![canonical("@", 300, RecordData::A { address: "1.2.3.4".into() })];

        let corrections = plan_corrections(
            ZONE,
            &existing,
            &native,
            &desired,
            &RecordDiffer::new(),
            PlanStrategy::GroupedByName,
            &api,
        )
        .unwrap();
        apply(&corrections).await;

        let calls = fake.calls.lock().unwrap();
        let cname_delete = calls
            .iter()
            .position(|c| matches!(c, WriteOp::Delete { record_type: NativeRecordType::CNAME, .. }))
            .expect("no CNAME delete planned");
        let a_create = calls
            .iter()
            .position(|c| matches!(c, WriteOp::Upsert { record_type: NativeRecordType::A, .. }))
            .expect("no A upsert planned");
        assert!(cname_delete < a_create, "calls: {:?}", *calls);
    }

    #[tokio::test]
    async fn test_alias_create_writes_underlying_type() {
        let (fake, api) = fake_api();
        let desired = vec![canonical(
            "@",
            300,
            RecordData::Alias {
                aliased: AliasedType::A,
                resource_id: "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/publicIPAddresses/ip1".into(),
            },
        )];

        let corrections = plan_corrections(
            ZONE,
            &[],
            &[],
            &desired,
            &RecordDiffer::new(),
            PlanStrategy::GroupedByName,
            &api,
        )
        .unwrap();
        assert_eq!(corrections.len(), 1);
        apply(&corrections).await;

        let calls = fake.calls.lock().unwrap();
        match &calls[0] {
            WriteOp::Upsert { name, record_type, set, .. } => {
                assert_eq!(name, "@");
                assert_eq!(*record_type, NativeRecordType::A);
                assert!(set.properties.a_records.is_none());
                assert_eq!(
                    set.properties.alias_target(),
                    Some("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/publicIPAddresses/ip1")
                );
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mx_change_rewrites_the_set() {
        let (fake, api) = fake_api();
        let existing = vec![canonical("@", 300, RecordData::MX { preference: 5, exchange: "foo.com.".into() })];
        let desired = vec![canonical("@", 600, RecordData::MX { preference: 50, exchange: "foo2.com.".into() })];

        let corrections = plan_corrections(
            ZONE,
            &existing,
            &[],
            &desired,
            &RecordDiffer::new(),
            PlanStrategy::ByRecordSet,
            &api,
        )
        .unwrap();
        assert_eq!(corrections.len(), 1);
        apply(&corrections).await;

        let calls = fake.calls.lock().unwrap();
        match &calls[0] {
            WriteOp::Upsert { record_type, set, .. } => {
                assert_eq!(*record_type, NativeRecordType::MX);
                assert_eq!(set.properties.ttl, Some(600));
                let mx = set.properties.mx_records.as_ref().unwrap();
                assert_eq!(mx.len(), 1);
                assert_eq!(mx[0].preference, 50);
                assert_eq!(mx[0].exchange, "foo2.com.");
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_uses_apex_and_relative_names() {
        let (fake, api) = fake_api();
        let existing = vec![
            canonical("@", 300, RecordData::A { address: "1.2.3.4".into() }),
            canonical("www", 300, RecordData::A { address: "1.2.3.5".into() }),
        ];

        let corrections = plan_corrections(
            ZONE,
            &existing,
            &[],
            &[],
            &RecordDiffer::new(),
            PlanStrategy::ByRecordSet,
            &api,
        )
        .unwrap();
        apply(&corrections).await;

        let calls = fake.calls.lock().unwrap();
        let names: Vec<&str> = calls
            .iter()
            .map(|c| match c {
                WriteOp::Delete { name, .. } => name.as_str(),
                other => panic!("unexpected call: {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["@", "www"]);
    }

    #[tokio::test]
    async fn test_missing_native_set_for_delete_is_an_error() {
        let (_, api) = fake_api();
        let existing = vec![canonical("www", 300, RecordData::CNAME { target: "old.example.net.".into() })];

        // existing canonical view says the set is there, the snapshot does not
        let err = plan_corrections(
            ZONE,
            &existing,
            &[],
            &[],
            &RecordDiffer::new(),
            PlanStrategy::GroupedByName,
            &api,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DnsError::NoMatchingRecordSet { fqdn, .. } if fqdn == "www.example.com"
        ));
    }

    #[tokio::test]
    async fn test_unknown_native_type_under_changed_name_fails_plan() {
        let (_, api) = fake_api();
        let native: Vec<NativeRecordSet> = vec![serde_json::from_value(json!({
            "name": "www",
            "type": "Microsoft.Network/dnszones/NAPTR",
            "properties": {"fqdn": "www.example.com.", "TTL": 300}
        }))
        .unwrap()];
        let desired = vec![canonical("www", 300, RecordData::A { address: "1.2.3.4".into() })];

        let err = plan_corrections(
            ZONE,
            &[],
            &native,
            &desired,
            &RecordDiffer::new(),
            PlanStrategy::GroupedByName,
            &api,
        )
        .unwrap_err();
        assert!(matches!(err, DnsError::UnsupportedRecordType(t) if t == "NAPTR"));
    }

    #[tokio::test]
    async fn test_ttl_mismatch_fails_plan() {
        let (_, api) = fake_api();
        let desired = vec![
            canonical("www", 300, RecordData::A { address: "1.2.3.4".into() }),
            canonical("www", 600, RecordData::A { address: "1.2.3.5".into() }),
        ];
        for strategy in [PlanStrategy::GroupedByName, PlanStrategy::ByRecordSet] {
            let err = plan_corrections(
                ZONE,
                &[],
                &[],
                &desired,
                &RecordDiffer::new(),
                strategy,
                &api,
            )
            .unwrap_err();
            assert!(matches!(err, DnsError::TtlMismatch { .. }));
        }
    }

    /// Classifier emitting only report entries
    struct ReportDiffer;

    impl Differ for ReportDiffer {
        fn changed_groups(
            &self,
            _existing: &[CanonicalRecord],
            _desired: &[CanonicalRecord],
        ) -> Vec<GroupChange> {
            Vec::new()
        }

        fn by_record_set(
            &self,
            _existing: &[CanonicalRecord],
            desired: &[CanonicalRecord],
        ) -> Vec<RecordSetChange> {
            vec![RecordSetChange {
                key: RecordKey {
                    fqdn: "www.example.com".to_string(),
                    record_type: zonesync_core::RecordType::A,
                },
                kind: ChangeKind::Report,
                old: Vec::new(),
                new: desired.to_vec(),
                message: "would touch www.example.com".to_string(),
            }]
        }
    }

    #[tokio::test]
    async fn test_report_entries_become_message_only_corrections() {
        let (fake, api) = fake_api();
        let corrections = plan_corrections(
            ZONE,
            &[],
            &[],
            &[],
            &ReportDiffer,
            PlanStrategy::ByRecordSet,
            &api,
        )
        .unwrap();
        assert_eq!(corrections.len(), 1);
        assert!(corrections[0].is_report());
        assert_eq!(corrections[0].message, "would touch www.example.com");

        apply(&corrections).await;
        assert!(fake.calls.lock().unwrap().is_empty());
    }
}
