//! Traceability queries
//!
//! Read-only projections over the entity store and the validator's report.
//! The link schema is one-directional (needs <- requirements <- specs <-
//! risks, plus requirement parent chains), so the walks cannot cycle;
//! self-parenting is rejected by validation before a walk can see it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::core::identity::{EntityClass, ItemId};
use crate::core::store::{EntityStore, StoreError};
use crate::core::validate::{ValidationReport, ViolationKind};

/// Outbound references of one record: linked entities plus the parent chain
fn outbound(store: &EntityStore, id: &ItemId) -> Vec<ItemId> {
    let mut targets = Vec::new();
    match id.class() {
        EntityClass::UserNeed => {}
        EntityClass::Requirement => {
            if let Some(req) = store.requirement(id) {
                targets.extend(req.linked_user_needs.iter().cloned());
                if let Some(parent) = &req.parent {
                    targets.push(parent.clone());
                }
            }
        }
        EntityClass::SoftwareSpec | EntityClass::HardwareSpec => {
            if let Some(spec) = store.specification(id) {
                targets.extend(spec.linked_requirements.iter().cloned());
            }
        }
        EntityClass::Risk => {
            if let Some(risk) = store.risk(id) {
                targets.extend(risk.linked_specs.iter().cloned());
            }
        }
    }
    targets
}

/// Inbound adjacency over the whole store: target -> referrers
fn inbound_map(store: &EntityStore) -> BTreeMap<ItemId, Vec<ItemId>> {
    let mut inbound: BTreeMap<ItemId, Vec<ItemId>> = BTreeMap::new();
    for class in EntityClass::all() {
        for record in store.list(*class) {
            for target in outbound(store, record.id()) {
                inbound.entry(target).or_default().push(record.id().clone());
            }
        }
    }
    inbound
}

/// Everything that transitively traces to `id`: the requirements built on a
/// user need, the specifications implementing those requirements, and the
/// risks those specifications mitigate. `id` itself is not included.
pub fn downstream_of(store: &EntityStore, id: &ItemId) -> Result<Vec<ItemId>, StoreError> {
    store.get(id)?;
    let inbound = inbound_map(store);

    let mut reached: BTreeSet<ItemId> = BTreeSet::new();
    let mut queue: VecDeque<ItemId> = VecDeque::from([id.clone()]);
    while let Some(current) = queue.pop_front() {
        if let Some(referrers) = inbound.get(&current) {
            for referrer in referrers {
                if reached.insert(referrer.clone()) {
                    queue.push_back(referrer.clone());
                }
            }
        }
    }
    Ok(reached.into_iter().collect())
}

/// The inverse walk: everything `id` transitively traces to. `id` itself is
/// not included.
pub fn upstream_of(store: &EntityStore, id: &ItemId) -> Result<Vec<ItemId>, StoreError> {
    store.get(id)?;

    let mut reached: BTreeSet<ItemId> = BTreeSet::new();
    let mut queue: VecDeque<ItemId> = VecDeque::from([id.clone()]);
    while let Some(current) = queue.pop_front() {
        for target in outbound(store, &current) {
            if store.contains(&target) && reached.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }
    Ok(reached.into_iter().collect())
}

/// Entities of one class flagged `OrphanEntity` by the validator
pub fn unlinked(report: &ValidationReport, class: EntityClass) -> Vec<ItemId> {
    report
        .violations()
        .iter()
        .filter(|v| v.kind == ViolationKind::OrphanEntity && v.entity.class() == class)
        .map(|v| v.entity.clone())
        .collect()
}
