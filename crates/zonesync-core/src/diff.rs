//! Generic diff classifier
//!
//! The planner never decides what changed; it consumes change entries from a
//! [`Differ`]. The policy for "what counts as changed" belongs to the
//! classifier. [`RecordDiffer`] is the default policy: plain content and TTL
//! equality over the records grouped under each [`RecordKey`].

use crate::records::{CanonicalRecord, RecordKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of change a classifier reports for one record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Create,
    Change,
    Delete,
    /// Message-only entry; planners turn it into a no-op report Correction
    Report,
}

/// A key whose record group changed, with per-record messages.
/// Consumed by the per-name planning strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupChange {
    pub key: RecordKey,
    pub messages: Vec<String>,
}

/// One instruction against a native record set, carrying the records before
/// and after. Consumed by the per-recordset planning strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSetChange {
    pub key: RecordKey,
    pub kind: ChangeKind,
    pub old: Vec<CanonicalRecord>,
    pub new: Vec<CanonicalRecord>,
    pub message: String,
}

/// Classifies existing vs desired canonical records into change entries
///
/// Both views serve the same comparison; they differ in shape because the
/// two planning strategies walk changes differently. Implementations must
/// return [`Differ::by_record_set`] entries in an order that is safe to
/// apply without reordering.
pub trait Differ: Send + Sync {
    /// Keys whose groups differ between existing and desired
    fn changed_groups(
        &self,
        existing: &[CanonicalRecord],
        desired: &[CanonicalRecord],
    ) -> Vec<GroupChange>;

    /// Set-oriented change instructions, pre-sequenced for application
    fn by_record_set(
        &self,
        existing: &[CanonicalRecord],
        desired: &[CanonicalRecord],
    ) -> Vec<RecordSetChange>;
}

/// Default classifier: a group changed when its records, compared as a
/// multiset of (payload, TTL), differ. Set-oriented output is sequenced
/// deletes, then changes, then creates, so same-name replacements tear down
/// before they build up.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordDiffer;

impl RecordDiffer {
    pub fn new() -> Self {
        RecordDiffer
    }
}

fn group_by_key(records: &[CanonicalRecord]) -> BTreeMap<RecordKey, Vec<&CanonicalRecord>> {
    let mut groups: BTreeMap<RecordKey, Vec<&CanonicalRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.key()).or_default().push(record);
    }
    groups
}

/// Multiset equality on (payload, TTL)
fn same_group(old: &[&CanonicalRecord], new: &[&CanonicalRecord]) -> bool {
    if old.len() != new.len() {
        return false;
    }
    fn sorted<'a>(records: &[&'a CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        let mut sorted: Vec<_> = records.to_vec();
        sorted.sort_by_key(|r| (r.data.value_string(), r.ttl));
        sorted
    }
    sorted(old)
        .iter()
        .zip(sorted(new))
        .all(|(a, b)| a.data == b.data && a.ttl == b.ttl)
}

fn group_values(records: &[&CanonicalRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{} ttl={}", r.data.value_string(), r.ttl))
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_messages(new: &[&CanonicalRecord]) -> Vec<String> {
    new.iter().map(|r| format!("+ CREATE {}", r)).collect()
}

fn delete_messages(old: &[&CanonicalRecord]) -> Vec<String> {
    old.iter().map(|r| format!("- DELETE {}", r)).collect()
}

fn modify_message(key: &RecordKey, old: &[&CanonicalRecord], new: &[&CanonicalRecord]) -> String {
    format!(
        "~ MODIFY {} ({}) -> ({})",
        key,
        group_values(old),
        group_values(new)
    )
}

impl Differ for RecordDiffer {
    fn changed_groups(
        &self,
        existing: &[CanonicalRecord],
        desired: &[CanonicalRecord],
    ) -> Vec<GroupChange> {
        let old_groups = group_by_key(existing);
        let new_groups = group_by_key(desired);
        let mut changes = Vec::new();

        for (key, old) in &old_groups {
            match new_groups.get(key) {
                None => changes.push(GroupChange {
                    key: key.clone(),
                    messages: delete_messages(old),
                }),
                Some(new) if !same_group(old, new) => changes.push(GroupChange {
                    key: key.clone(),
                    messages: vec![modify_message(key, old, new)],
                }),
                Some(_) => {}
            }
        }
        for (key, new) in &new_groups {
            if !old_groups.contains_key(key) {
                changes.push(GroupChange {
                    key: key.clone(),
                    messages: create_messages(new),
                });
            }
        }
        changes
    }

    fn by_record_set(
        &self,
        existing: &[CanonicalRecord],
        desired: &[CanonicalRecord],
    ) -> Vec<RecordSetChange> {
        let old_groups = group_by_key(existing);
        let new_groups = group_by_key(desired);
        let mut deletes = Vec::new();
        let mut changes = Vec::new();
        let mut creates = Vec::new();

        for (key, old) in &old_groups {
            match new_groups.get(key) {
                None => deletes.push(RecordSetChange {
                    key: key.clone(),
                    kind: ChangeKind::Delete,
                    old: old.iter().map(|r| (*r).clone()).collect(),
                    new: Vec::new(),
                    message: delete_messages(old).join("\n"),
                }),
                Some(new) if !same_group(old, new) => changes.push(RecordSetChange {
                    key: key.clone(),
                    kind: ChangeKind::Change,
                    old: old.iter().map(|r| (*r).clone()).collect(),
                    new: new.iter().map(|r| (*r).clone()).collect(),
                    message: modify_message(key, old, new),
                }),
                Some(_) => {}
            }
        }
        for (key, new) in &new_groups {
            if !old_groups.contains_key(key) {
                creates.push(RecordSetChange {
                    key: key.clone(),
                    kind: ChangeKind::Create,
                    old: Vec::new(),
                    new: new.iter().map(|r| (*r).clone()).collect(),
                    message: create_messages(new).join("\n"),
                });
            }
        }

        deletes.extend(changes);
        deletes.extend(creates);
        deletes
    }
}
