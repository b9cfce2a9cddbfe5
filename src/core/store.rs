//! In-memory entity store
//!
//! Owns every entity record, keyed by identifier and organized into the five
//! entity classes plus the declared risk category groups. The store enforces
//! identifier uniqueness and blocked deletes only; cross-entity consistency is
//! the link validator's job. Mutating workflows take a snapshot first and
//! restore it when validation fails.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::identity::{EntityClass, ItemId};
use crate::entities::{Requirement, Risk, RiskCategory, Specification, UserNeed};

/// A record of any entity class
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    UserNeed(UserNeed),
    Requirement(Requirement),
    Specification(Specification),
    Risk(Risk),
}

impl Record {
    pub fn id(&self) -> &ItemId {
        match self {
            Record::UserNeed(n) => &n.id,
            Record::Requirement(r) => &r.id,
            Record::Specification(s) => &s.id,
            Record::Risk(r) => &r.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Record::UserNeed(n) => &n.title,
            Record::Requirement(r) => &r.title,
            Record::Specification(s) => &s.title,
            Record::Risk(r) => &r.title,
        }
    }

    pub fn class(&self) -> EntityClass {
        self.id().class()
    }
}

/// The entity store
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    user_needs: BTreeMap<ItemId, UserNeed>,
    requirements: BTreeMap<ItemId, Requirement>,
    software_specs: BTreeMap<ItemId, Specification>,
    hardware_specs: BTreeMap<ItemId, Specification>,
    risks: BTreeMap<ItemId, Risk>,
    categories: BTreeMap<String, RiskCategory>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record; fails if an entity with this id already exists
    pub fn add(&mut self, record: Record) -> Result<(), StoreError> {
        let id = record.id().clone();
        self.check_record_class(&record)?;
        if self.contains(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.insert(record);
        Ok(())
    }

    /// Replace an existing record whole; fails if the id is absent
    pub fn replace(&mut self, record: Record) -> Result<(), StoreError> {
        let id = record.id().clone();
        self.check_record_class(&record)?;
        if !self.contains(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.insert(record);
        Ok(())
    }

    /// Remove a record by id. Fails if the id is absent, or if other records
    /// still reference it - deletes never cascade; the blocking referrers are
    /// reported for the caller to strip first.
    pub fn remove(&mut self, id: &ItemId) -> Result<Record, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        let referrers = self.referrers_of(id);
        if !referrers.is_empty() {
            return Err(StoreError::StillReferenced {
                id: id.clone(),
                referrers,
            });
        }
        let record = match id.class() {
            EntityClass::UserNeed => self.user_needs.remove(id).map(Record::UserNeed),
            EntityClass::Requirement => self.requirements.remove(id).map(Record::Requirement),
            EntityClass::SoftwareSpec => self.software_specs.remove(id).map(Record::Specification),
            EntityClass::HardwareSpec => self.hardware_specs.remove(id).map(Record::Specification),
            EntityClass::Risk => self.risks.remove(id).map(Record::Risk),
        };
        Ok(record.expect("presence checked above"))
    }

    /// Fetch a record by id
    pub fn get(&self, id: &ItemId) -> Result<Record, StoreError> {
        let record = match id.class() {
            EntityClass::UserNeed => self.user_needs.get(id).cloned().map(Record::UserNeed),
            EntityClass::Requirement => self.requirements.get(id).cloned().map(Record::Requirement),
            EntityClass::SoftwareSpec => {
                self.software_specs.get(id).cloned().map(Record::Specification)
            }
            EntityClass::HardwareSpec => {
                self.hardware_specs.get(id).cloned().map(Record::Specification)
            }
            EntityClass::Risk => self.risks.get(id).cloned().map(Record::Risk),
        };
        record.ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        match id.class() {
            EntityClass::UserNeed => self.user_needs.contains_key(id),
            EntityClass::Requirement => self.requirements.contains_key(id),
            EntityClass::SoftwareSpec => self.software_specs.contains_key(id),
            EntityClass::HardwareSpec => self.hardware_specs.contains_key(id),
            EntityClass::Risk => self.risks.contains_key(id),
        }
    }

    /// All records of one class, in identifier order. The iterator is lazy
    /// and can be re-created at any time to observe current state.
    pub fn list(&self, class: EntityClass) -> Box<dyn Iterator<Item = Record> + '_> {
        match class {
            EntityClass::UserNeed => {
                Box::new(self.user_needs.values().cloned().map(Record::UserNeed))
            }
            EntityClass::Requirement => {
                Box::new(self.requirements.values().cloned().map(Record::Requirement))
            }
            EntityClass::SoftwareSpec => Box::new(
                self.software_specs.values().cloned().map(Record::Specification),
            ),
            EntityClass::HardwareSpec => Box::new(
                self.hardware_specs.values().cloned().map(Record::Specification),
            ),
            EntityClass::Risk => Box::new(self.risks.values().cloned().map(Record::Risk)),
        }
    }

    pub fn user_needs(&self) -> impl Iterator<Item = &UserNeed> {
        self.user_needs.values()
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    /// Software then hardware specifications, each in identifier order
    pub fn specifications(&self) -> impl Iterator<Item = &Specification> {
        self.software_specs.values().chain(self.hardware_specs.values())
    }

    pub fn risks(&self) -> impl Iterator<Item = &Risk> {
        self.risks.values()
    }

    pub fn user_need(&self, id: &ItemId) -> Option<&UserNeed> {
        self.user_needs.get(id)
    }

    pub fn requirement(&self, id: &ItemId) -> Option<&Requirement> {
        self.requirements.get(id)
    }

    pub fn specification(&self, id: &ItemId) -> Option<&Specification> {
        self.software_specs.get(id).or_else(|| self.hardware_specs.get(id))
    }

    pub fn risk(&self, id: &ItemId) -> Option<&Risk> {
        self.risks.get(id)
    }

    pub(crate) fn risks_mut(&mut self) -> impl Iterator<Item = &mut Risk> {
        self.risks.values_mut()
    }

    /// Declare (or rename) a risk category group
    pub fn declare_category(&mut self, category: RiskCategory) {
        self.categories.insert(category.key.clone(), category);
    }

    /// Remove a category group; fails while risks still use it
    pub fn remove_category(&mut self, key: &str) -> Result<RiskCategory, StoreError> {
        let users: Vec<ItemId> = self
            .risks
            .values()
            .filter(|r| r.category == key)
            .map(|r| r.id.clone())
            .collect();
        if !users.is_empty() {
            return Err(StoreError::CategoryInUse {
                key: key.to_string(),
                risks: users,
            });
        }
        self.categories
            .remove(key)
            .ok_or_else(|| StoreError::UnknownCategory(key.to_string()))
    }

    pub fn category(&self, key: &str) -> Option<&RiskCategory> {
        self.categories.get(key)
    }

    pub fn categories(&self) -> impl Iterator<Item = &RiskCategory> {
        self.categories.values()
    }

    /// Every record whose outbound links (or parent) reference `id`, sorted
    pub fn referrers_of(&self, id: &ItemId) -> Vec<ItemId> {
        let mut referrers = Vec::new();
        for req in self.requirements.values() {
            if req.linked_user_needs.contains(id) || req.parent.as_ref() == Some(id) {
                referrers.push(req.id.clone());
            }
        }
        for spec in self.specifications() {
            if spec.linked_requirements.contains(id) {
                referrers.push(spec.id.clone());
            }
        }
        for risk in self.risks.values() {
            if risk.linked_specs.contains(id) {
                referrers.push(risk.id.clone());
            }
        }
        referrers.sort();
        referrers
    }

    /// Rank codes of one kind currently used by risks, with the risks using them
    pub fn rank_codes_in_use(
        &self,
        kind: crate::core::registry::RankKind,
    ) -> BTreeMap<String, Vec<ItemId>> {
        use crate::core::registry::RankKind;
        let mut in_use: BTreeMap<String, Vec<ItemId>> = BTreeMap::new();
        for risk in self.risks.values() {
            let code = match kind {
                RankKind::Severity => &risk.severity,
                RankKind::Occurrence => &risk.probability_occurrence,
                RankKind::Harm => &risk.probability_harm,
            };
            in_use.entry(code.clone()).or_default().push(risk.id.clone());
        }
        in_use
    }

    /// Cheap snapshot for the mutate -> validate -> commit-or-rollback cycle
    pub fn snapshot(&self) -> EntityStore {
        self.clone()
    }

    /// Restore a previously taken snapshot
    pub fn restore(&mut self, snapshot: EntityStore) {
        *self = snapshot;
    }

    pub fn len(&self) -> usize {
        self.user_needs.len()
            + self.requirements.len()
            + self.software_specs.len()
            + self.hardware_specs.len()
            + self.risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, record: Record) {
        match record {
            Record::UserNeed(n) => {
                self.user_needs.insert(n.id.clone(), n);
            }
            Record::Requirement(r) => {
                self.requirements.insert(r.id.clone(), r);
            }
            Record::Specification(s) => match s.id.class() {
                EntityClass::HardwareSpec => {
                    self.hardware_specs.insert(s.id.clone(), s);
                }
                _ => {
                    self.software_specs.insert(s.id.clone(), s);
                }
            },
            Record::Risk(r) => {
                self.risks.insert(r.id.clone(), r);
            }
        }
    }

    /// Guard against records deserialized with an identifier from the wrong
    /// class (constructors already enforce this for records built in-process)
    fn check_record_class(&self, record: &Record) -> Result<(), StoreError> {
        let ok = match record {
            Record::UserNeed(n) => n.id.class() == EntityClass::UserNeed,
            Record::Requirement(r) => r.id.class() == EntityClass::Requirement,
            Record::Specification(s) => matches!(
                s.id.class(),
                EntityClass::SoftwareSpec | EntityClass::HardwareSpec
            ),
            Record::Risk(r) => r.id.class() == EntityClass::Risk,
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::ClassMismatch {
                id: record.id().clone(),
            })
        }
    }
}

/// Errors produced by the entity store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate identifier {0}: an entity with this id already exists")]
    DuplicateId(ItemId),

    #[error("no entity found with identifier {0}")]
    NotFound(ItemId),

    #[error("{id} is still referenced by: {}", format_ids(.referrers))]
    StillReferenced { id: ItemId, referrers: Vec<ItemId> },

    #[error("identifier {id} does not match the record's entity class")]
    ClassMismatch { id: ItemId },

    #[error("risk category '{key}' is still used by: {}", format_ids(.risks))]
    CategoryInUse { key: String, risks: Vec<ItemId> },

    #[error("no risk category declared with key '{0}'")]
    UnknownCategory(String),
}

fn format_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::VerificationMethod;

    fn need(id: &str) -> Record {
        Record::UserNeed(
            UserNeed::new(
                id.parse().unwrap(),
                format!("Need {}", id),
                "Description".to_string(),
            )
            .unwrap(),
        )
    }

    fn requirement(id: &str, needs: &[&str]) -> Record {
        let mut req = Requirement::new(
            id.parse().unwrap(),
            format!("Requirement {}", id),
            "The system shall.".to_string(),
            VerificationMethod::Test,
        )
        .unwrap();
        for n in needs {
            req.linked_user_needs.insert(n.parse().unwrap());
        }
        Record::Requirement(req)
    }

    fn spec(id: &str, reqs: &[&str]) -> Record {
        let mut spec = Specification::new(
            id.parse().unwrap(),
            format!("Spec {}", id),
            "Defines behavior.".to_string(),
            "core".to_string(),
        )
        .unwrap();
        for r in reqs {
            spec.linked_requirements.insert(r.parse().unwrap());
        }
        Record::Specification(spec)
    }

    #[test]
    fn test_add_then_get_returns_equal_record() {
        let mut store = EntityStore::new();
        let record = need("UN001");
        store.add(record.clone()).unwrap();
        assert_eq!(store.get(&"UN001".parse().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_add_duplicate_fails() {
        let mut store = EntityStore::new();
        store.add(need("UN001")).unwrap();
        let err = store.add(need("UN001")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[test]
    fn test_remove_then_get_fails_not_found() {
        let mut store = EntityStore::new();
        store.add(need("UN001")).unwrap();
        store.remove(&"UN001".parse().unwrap()).unwrap();
        let err = store.get(&"UN001".parse().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_replace_missing_fails() {
        let mut store = EntityStore::new();
        let err = store.replace(need("UN001")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_list_orders_by_identifier() {
        let mut store = EntityStore::new();
        for id in ["UN010", "UN002", "UN001"] {
            store.add(need(id)).unwrap();
        }
        let ids: Vec<String> = store
            .list(EntityClass::UserNeed)
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["UN001", "UN002", "UN010"]);
    }

    #[test]
    fn test_remove_blocked_by_referrers() {
        let mut store = EntityStore::new();
        store.add(need("UN001")).unwrap();
        store.add(requirement("PR001", &["UN001"])).unwrap();

        let err = store.remove(&"UN001".parse().unwrap()).unwrap_err();
        match err {
            StoreError::StillReferenced { referrers, .. } => {
                assert_eq!(referrers, vec!["PR001".parse().unwrap()]);
            }
            other => panic!("expected StillReferenced, got {:?}", other),
        }

        // Still present after the refused delete
        assert!(store.get(&"UN001".parse().unwrap()).is_ok());
    }

    #[test]
    fn test_parent_link_blocks_removal() {
        let mut store = EntityStore::new();
        store.add(requirement("PR001", &[])).unwrap();
        store.add(requirement("PR001.1", &[])).unwrap();

        let err = store.remove(&"PR001".parse().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::StillReferenced { .. }));
    }

    #[test]
    fn test_specification_routed_by_prefix() {
        let mut store = EntityStore::new();
        store.add(spec("SW001", &[])).unwrap();
        store.add(spec("HW001", &[])).unwrap();

        assert_eq!(store.list(EntityClass::SoftwareSpec).count(), 1);
        assert_eq!(store.list(EntityClass::HardwareSpec).count(), 1);
        assert!(store.specification(&"HW001".parse().unwrap()).is_some());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut store = EntityStore::new();
        store.add(need("UN001")).unwrap();
        let snapshot = store.snapshot();

        store.add(need("UN002")).unwrap();
        assert_eq!(store.len(), 2);

        store.restore(snapshot);
        assert_eq!(store.len(), 1);
        assert!(store.get(&"UN002".parse().unwrap()).is_err());
    }

    #[test]
    fn test_category_removal_blocked_while_in_use() {
        let mut store = EntityStore::new();
        store.declare_category(RiskCategory {
            key: "patient_safety".to_string(),
            name: "Patient Safety".to_string(),
        });
        store
            .add(Record::Risk(
                Risk::new(
                    "R001".parse().unwrap(),
                    "patient_safety".to_string(),
                    "Title".to_string(),
                    "Text".to_string(),
                    "S1".to_string(),
                    "PO1".to_string(),
                    "PH1".to_string(),
                )
                .unwrap(),
            ))
            .unwrap();

        let err = store.remove_category("patient_safety").unwrap_err();
        assert!(matches!(err, StoreError::CategoryInUse { .. }));
    }

    #[test]
    fn test_rank_codes_in_use() {
        use crate::core::registry::RankKind;
        let mut store = EntityStore::new();
        store
            .add(Record::Risk(
                Risk::new(
                    "R001".parse().unwrap(),
                    "patient_safety".to_string(),
                    "Title".to_string(),
                    "Text".to_string(),
                    "S3".to_string(),
                    "PO2".to_string(),
                    "PH3".to_string(),
                )
                .unwrap(),
            ))
            .unwrap();

        let in_use = store.rank_codes_in_use(RankKind::Severity);
        assert_eq!(in_use.len(), 1);
        assert_eq!(in_use["S3"], vec!["R001".parse().unwrap()]);
    }
}
