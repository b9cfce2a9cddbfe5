//! Link validation with structured, itemized reporting
//!
//! `validate` is a pure function over the current store and registry: it
//! walks every entity once, resolves every outbound reference, and reports
//! each problem as its own violation so the host can present all of them at
//! once. Violations are emitted in a stable order (entity class, identifier,
//! kind, referenced id) so repeated runs over identical state produce
//! identical reports.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::identity::ItemId;
use crate::core::registry::{RankKind, RankRegistry};
use crate::core::store::EntityStore;

/// Violation kinds. All but `OrphanEntity` are fatal: they block a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateId,
    DanglingReference,
    InvalidParent,
    UnknownRank,
    OrphanEntity,
}

impl ViolationKind {
    /// Fatal violations block a commit; advisory ones are informational
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ViolationKind::OrphanEntity)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::DuplicateId => "duplicate_id",
            ViolationKind::DanglingReference => "dangling_reference",
            ViolationKind::InvalidParent => "invalid_parent",
            ViolationKind::UnknownRank => "unknown_rank",
            ViolationKind::OrphanEntity => "orphan_entity",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured violation
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// The entity the problem was found on
    pub entity: ItemId,

    pub kind: ViolationKind,

    /// The identifier, code, or category key that failed to resolve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced: Option<String>,

    /// Human-readable detail
    pub detail: String,
}

/// The full result of a validation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind.is_fatal())
    }

    pub fn advisory(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.kind.is_fatal())
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub(crate) fn push(
        &mut self,
        entity: ItemId,
        kind: ViolationKind,
        referenced: Option<String>,
        detail: String,
    ) {
        self.violations.push(Violation {
            entity,
            kind,
            referenced,
            detail,
        });
    }

    pub(crate) fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
        self.finish();
    }

    /// Sort into the stable report order
    pub(crate) fn finish(&mut self) {
        self.violations.sort_by(|a, b| {
            (a.entity.class(), &a.entity, a.kind, &a.referenced).cmp(&(
                b.entity.class(),
                &b.entity,
                b.kind,
                &b.referenced,
            ))
        });
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fatal = self.fatal().count();
        let advisory = self.len() - fatal;
        write!(f, "{} fatal, {} advisory violation(s)", fatal, advisory)
    }
}

/// Validate referential and hierarchical integrity of the whole workspace.
/// Pure: no mutation of the store or registry.
pub fn validate(store: &EntityStore, registry: &RankRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_requirements(store, &mut report);
    check_specifications(store, &mut report);
    check_risks(store, registry, &mut report);
    check_orphans(store, &mut report);

    report.finish();
    report
}

fn check_requirements(store: &EntityStore, report: &mut ValidationReport) {
    for req in store.requirements() {
        let expected = req.expected_parent();
        match (&req.parent, &expected) {
            (None, None) => {}
            (Some(parent), _) if *parent == req.id => {
                report.push(
                    req.id.clone(),
                    ViolationKind::InvalidParent,
                    Some(parent.to_string()),
                    "requirement names itself as parent".to_string(),
                );
            }
            (Some(parent), Some(expected)) if parent == expected => {
                if store.requirement(parent).is_none() {
                    report.push(
                        req.id.clone(),
                        ViolationKind::InvalidParent,
                        Some(parent.to_string()),
                        format!("parent {} does not exist", parent),
                    );
                }
            }
            (Some(parent), Some(expected)) => {
                report.push(
                    req.id.clone(),
                    ViolationKind::InvalidParent,
                    Some(parent.to_string()),
                    format!(
                        "parent {} does not match the identifier's hierarchy (expected {})",
                        parent, expected
                    ),
                );
            }
            (Some(parent), None) => {
                report.push(
                    req.id.clone(),
                    ViolationKind::InvalidParent,
                    Some(parent.to_string()),
                    "level-1 requirement must not declare a parent".to_string(),
                );
            }
            (None, Some(expected)) => {
                report.push(
                    req.id.clone(),
                    ViolationKind::InvalidParent,
                    None,
                    format!("missing parent: expected {}", expected),
                );
            }
        }

        for need_id in &req.linked_user_needs {
            if store.user_need(need_id).is_none() {
                report.push(
                    req.id.clone(),
                    ViolationKind::DanglingReference,
                    Some(need_id.to_string()),
                    format!("linked user need {} does not exist", need_id),
                );
            }
        }
    }
}

fn check_specifications(store: &EntityStore, report: &mut ValidationReport) {
    for spec in store.specifications() {
        for req_id in &spec.linked_requirements {
            if store.requirement(req_id).is_none() {
                report.push(
                    spec.id.clone(),
                    ViolationKind::DanglingReference,
                    Some(req_id.to_string()),
                    format!("linked requirement {} does not exist", req_id),
                );
            }
        }
    }
}

fn check_risks(store: &EntityStore, registry: &RankRegistry, report: &mut ValidationReport) {
    for risk in store.risks() {
        if store.category(&risk.category).is_none() {
            report.push(
                risk.id.clone(),
                ViolationKind::DanglingReference,
                Some(risk.category.clone()),
                format!("risk category '{}' is not declared", risk.category),
            );
        }

        for spec_id in &risk.linked_specs {
            if store.specification(spec_id).is_none() {
                report.push(
                    risk.id.clone(),
                    ViolationKind::DanglingReference,
                    Some(spec_id.to_string()),
                    format!("linked specification {} does not exist", spec_id),
                );
            }
        }

        for (kind, code) in [
            (RankKind::Severity, &risk.severity),
            (RankKind::Occurrence, &risk.probability_occurrence),
            (RankKind::Harm, &risk.probability_harm),
        ] {
            if !registry.scale(kind).contains(code) {
                report.push(
                    risk.id.clone(),
                    ViolationKind::UnknownRank,
                    Some(code.clone()),
                    format!("{} code '{}' is not configured", kind, code),
                );
            }
        }
    }
}

/// Advisory: entities with no inbound link at a tier where inbound
/// traceability is expected. User needs expect a requirement; requirements
/// expect a specification or a child requirement.
fn check_orphans(store: &EntityStore, report: &mut ValidationReport) {
    let mut needs_with_inbound: BTreeSet<&ItemId> = BTreeSet::new();
    let mut reqs_with_inbound: BTreeSet<&ItemId> = BTreeSet::new();

    for req in store.requirements() {
        needs_with_inbound.extend(req.linked_user_needs.iter());
        if let Some(parent) = &req.parent {
            reqs_with_inbound.insert(parent);
        }
    }
    for spec in store.specifications() {
        reqs_with_inbound.extend(spec.linked_requirements.iter());
    }

    for need in store.user_needs() {
        if !needs_with_inbound.contains(&need.id) {
            report.push(
                need.id.clone(),
                ViolationKind::OrphanEntity,
                None,
                "no requirement traces to this user need".to_string(),
            );
        }
    }
    for req in store.requirements() {
        if !reqs_with_inbound.contains(&req.id) {
            report.push(
                req.id.clone(),
                ViolationKind::OrphanEntity,
                None,
                "no specification or child requirement traces to this requirement".to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::entry;
    use crate::core::store::Record;
    use crate::entities::{Requirement, Risk, RiskCategory, Specification, UserNeed, VerificationMethod};

    fn default_registry() -> RankRegistry {
        let mut registry = RankRegistry::new();
        registry
            .set_scale(
                RankKind::Severity,
                vec![entry("S1", "Low", 1), entry("S2", "Medium", 2), entry("S3", "High", 3)],
            )
            .unwrap();
        registry
            .set_scale(
                RankKind::Occurrence,
                vec![entry("PO1", "Low", 1), entry("PO2", "Medium", 2), entry("PO3", "High", 3)],
            )
            .unwrap();
        registry
            .set_scale(
                RankKind::Harm,
                vec![entry("PH1", "Low", 1), entry("PH2", "Medium", 2), entry("PH3", "High", 3)],
            )
            .unwrap();
        registry
    }

    fn linked_store() -> EntityStore {
        let mut store = EntityStore::new();

        store
            .add(Record::UserNeed(
                UserNeed::new(
                    "UN001".parse().unwrap(),
                    "Need".to_string(),
                    "Text".to_string(),
                )
                .unwrap(),
            ))
            .unwrap();

        let mut req = Requirement::new(
            "PR001".parse().unwrap(),
            "Requirement".to_string(),
            "Text".to_string(),
            VerificationMethod::Test,
        )
        .unwrap();
        req.linked_user_needs.insert("UN001".parse().unwrap());
        store.add(Record::Requirement(req)).unwrap();

        let mut spec = Specification::new(
            "SW001".parse().unwrap(),
            "Spec".to_string(),
            "Text".to_string(),
            "core".to_string(),
        )
        .unwrap();
        spec.linked_requirements.insert("PR001".parse().unwrap());
        store.add(Record::Specification(spec)).unwrap();

        store.declare_category(RiskCategory {
            key: "patient_safety".to_string(),
            name: "Patient Safety".to_string(),
        });
        let mut risk = Risk::new(
            "R001".parse().unwrap(),
            "patient_safety".to_string(),
            "Risk".to_string(),
            "Text".to_string(),
            "S3".to_string(),
            "PO2".to_string(),
            "PH3".to_string(),
        )
        .unwrap();
        risk.linked_specs.insert("SW001".parse().unwrap());
        store.add(Record::Risk(risk)).unwrap();

        store
    }

    #[test]
    fn test_fully_linked_store_is_clean() {
        let report = validate(&linked_store(), &default_registry());
        assert!(!report.has_fatal(), "unexpected: {:?}", report.violations());
        assert!(report.is_empty());
    }

    #[test]
    fn test_dangling_user_need_reference() {
        let mut store = linked_store();
        let mut req = store.requirement(&"PR001".parse().unwrap()).unwrap().clone();
        req.linked_user_needs.insert("UN999".parse().unwrap());
        store.replace(Record::Requirement(req)).unwrap();

        let report = validate(&store, &default_registry());
        let dangling: Vec<&Violation> = report
            .violations()
            .iter()
            .filter(|v| v.kind == ViolationKind::DanglingReference)
            .collect();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].referenced.as_deref(), Some("UN999"));
        assert!(report.has_fatal());
    }

    #[test]
    fn test_missing_parent_is_invalid() {
        let mut store = linked_store();
        let req = Requirement::new(
            "PR002.1".parse().unwrap(),
            "Child".to_string(),
            "Text".to_string(),
            VerificationMethod::Test,
        )
        .unwrap();
        store.add(Record::Requirement(req)).unwrap();

        let report = validate(&store, &default_registry());
        assert!(report
            .violations()
            .iter()
            .any(|v| v.kind == ViolationKind::InvalidParent
                && v.detail.contains("parent PR002 does not exist")));
    }

    #[test]
    fn test_mismatched_parent_is_invalid() {
        let mut store = linked_store();
        let mut req = Requirement::new(
            "PR001.1".parse().unwrap(),
            "Child".to_string(),
            "Text".to_string(),
            VerificationMethod::Test,
        )
        .unwrap();
        req.parent = Some("PR003".parse().unwrap());
        store.add(Record::Requirement(req)).unwrap();

        let report = validate(&store, &default_registry());
        assert!(report
            .violations()
            .iter()
            .any(|v| v.kind == ViolationKind::InvalidParent && v.detail.contains("expected PR001")));
    }

    #[test]
    fn test_self_parent_is_invalid() {
        let mut store = linked_store();
        let mut req = Requirement::new(
            "PR009".parse().unwrap(),
            "Loop".to_string(),
            "Text".to_string(),
            VerificationMethod::Test,
        )
        .unwrap();
        req.parent = Some("PR009".parse().unwrap());
        store.add(Record::Requirement(req)).unwrap();

        let report = validate(&store, &default_registry());
        assert!(report
            .violations()
            .iter()
            .any(|v| v.kind == ViolationKind::InvalidParent
                && v.detail.contains("names itself")));
    }

    #[test]
    fn test_unknown_rank_code() {
        let mut store = linked_store();
        let mut risk = store.risk(&"R001".parse().unwrap()).unwrap().clone();
        risk.severity = "S9".to_string();
        store.replace(Record::Risk(risk)).unwrap();

        let report = validate(&store, &default_registry());
        assert!(report
            .violations()
            .iter()
            .any(|v| v.kind == ViolationKind::UnknownRank && v.referenced.as_deref() == Some("S9")));
    }

    #[test]
    fn test_undeclared_category() {
        let mut store = linked_store();
        let mut risk = store.risk(&"R001".parse().unwrap()).unwrap().clone();
        risk.category = "unknown_group".to_string();
        store.replace(Record::Risk(risk)).unwrap();

        let report = validate(&store, &default_registry());
        assert!(report
            .violations()
            .iter()
            .any(|v| v.kind == ViolationKind::DanglingReference
                && v.detail.contains("category 'unknown_group'")));
    }

    #[test]
    fn test_orphan_user_need_is_advisory() {
        let mut store = linked_store();
        store
            .add(Record::UserNeed(
                UserNeed::new(
                    "UN002".parse().unwrap(),
                    "Unlinked".to_string(),
                    "Text".to_string(),
                )
                .unwrap(),
            ))
            .unwrap();

        let report = validate(&store, &default_registry());
        assert!(!report.has_fatal());
        let orphans: Vec<&Violation> = report.advisory().collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].entity, "UN002".parse().unwrap());
    }

    #[test]
    fn test_parent_with_children_is_not_orphaned() {
        let mut store = linked_store();
        // PR001 already has SW001 tracing to it; add a child-only parent
        store
            .add(Record::Requirement(
                Requirement::new(
                    "PR002".parse().unwrap(),
                    "Parent".to_string(),
                    "Text".to_string(),
                    VerificationMethod::Test,
                )
                .unwrap(),
            ))
            .unwrap();
        store
            .add(Record::Requirement(
                Requirement::new(
                    "PR002.1".parse().unwrap(),
                    "Child".to_string(),
                    "Text".to_string(),
                    VerificationMethod::Test,
                )
                .unwrap(),
            ))
            .unwrap();

        let report = validate(&store, &default_registry());
        let orphaned: Vec<String> = report
            .advisory()
            .map(|v| v.entity.to_string())
            .collect();
        // The child has no spec tracing to it; the parent is covered by the child
        assert_eq!(orphaned, vec!["PR002.1"]);
    }

    #[test]
    fn test_report_order_is_stable() {
        let mut store = EntityStore::new();
        // Insert in scrambled order; two violation kinds on the same entity
        let mut risk = Risk::new(
            "R002".parse().unwrap(),
            "missing".to_string(),
            "Risk".to_string(),
            "Text".to_string(),
            "S9".to_string(),
            "PO1".to_string(),
            "PH1".to_string(),
        )
        .unwrap();
        risk.linked_specs.insert("SW404".parse().unwrap());
        store.add(Record::Risk(risk)).unwrap();
        let mut req = Requirement::new(
            "PR001".parse().unwrap(),
            "Req".to_string(),
            "Text".to_string(),
            VerificationMethod::Test,
        )
        .unwrap();
        req.linked_user_needs.insert("UN404".parse().unwrap());
        store.add(Record::Requirement(req)).unwrap();

        let registry = default_registry();
        let first = validate(&store, &registry);
        let second = validate(&store, &registry);

        let keys: Vec<(String, ViolationKind)> = first
            .violations()
            .iter()
            .map(|v| (v.entity.to_string(), v.kind))
            .collect();
        let keys_again: Vec<(String, ViolationKind)> = second
            .violations()
            .iter()
            .map(|v| (v.entity.to_string(), v.kind))
            .collect();
        assert_eq!(keys, keys_again);

        // Requirements sort before risks, dangling before unknown-rank
        assert_eq!(keys[0].0, "PR001");
        let r002: Vec<ViolationKind> = keys
            .iter()
            .filter(|(id, _)| id == "R002")
            .map(|(_, k)| *k)
            .collect();
        assert_eq!(
            r002,
            vec![
                ViolationKind::DanglingReference,
                ViolationKind::DanglingReference,
                ViolationKind::UnknownRank
            ]
        );
    }
}
