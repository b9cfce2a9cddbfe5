//! Workspace: the host-facing facade over store and registry
//!
//! A `Workspace` is an explicit, host-owned instance - there are no ambient
//! globals. It implements the external contract:
//!
//! - **Load**: ingest a [`Document`], validate once, and reject the whole
//!   load if any fatal violation is found (no partial state is retained).
//! - **Mutate**: snapshot, apply one `add`/`replace`/`remove`, validate, and
//!   roll back to the snapshot when validation turns up fatal violations.
//! - **Query**: scoring and traceability projections, all read-only.
//! - **Persist**: serialize the current state back into a [`Document`].
//!
//! The mutate sequence is not internally synchronized; a concurrent host must
//! serialize mutations around the whole mutate -> validate -> commit span.

use thiserror::Error;

use crate::core::document::{Configuration, Document, Metadata};
use crate::core::identity::{EntityClass, ItemId};
use crate::core::registry::{RankEntry, RankKind, RankRegistry, RegistryError};
use crate::core::scoring::{self, MitigationPolicy, RiskScore};
use crate::core::store::{EntityStore, Record, StoreError};
use crate::core::trace;
use crate::core::validate::{validate, ValidationReport, ViolationKind};
use crate::entities::RiskCategory;

/// A loaded, validated DHF workspace
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    metadata: Metadata,
    store: EntityStore,
    registry: RankRegistry,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a document. Identifier collisions inside the document are
    /// collected as `DuplicateId` violations rather than failing one at a
    /// time, so the host sees every problem at once. Any fatal violation
    /// rejects the load wholesale.
    pub fn load(document: Document) -> Result<Self, WorkspaceError> {
        let mut workspace = Workspace {
            metadata: document.metadata,
            store: EntityStore::new(),
            registry: RankRegistry::new(),
        };

        workspace
            .registry
            .set_scale(RankKind::Severity, document.configuration.severity)?;
        workspace.registry.set_scale(
            RankKind::Occurrence,
            document.configuration.probability_occurrence,
        )?;
        workspace
            .registry
            .set_scale(RankKind::Harm, document.configuration.probability_harm)?;
        workspace
            .registry
            .set_mitigation_policy(document.configuration.mitigation_policy)?;

        for category in document.risk_categories {
            workspace.store.declare_category(category);
        }

        let mut duplicates = ValidationReport::default();
        let records = document
            .user_needs
            .into_iter()
            .map(Record::UserNeed)
            .chain(document.product_requirements.into_iter().map(Record::Requirement))
            .chain(
                document
                    .software_specifications
                    .into_iter()
                    .map(Record::Specification),
            )
            .chain(
                document
                    .hardware_specifications
                    .into_iter()
                    .map(Record::Specification),
            )
            .chain(document.risks.into_iter().map(Record::Risk));

        for record in records {
            match workspace.store.add(record) {
                Ok(()) => {}
                Err(StoreError::DuplicateId(id)) => {
                    duplicates.push(
                        id.clone(),
                        ViolationKind::DuplicateId,
                        None,
                        format!("identifier {} appears more than once in the document", id),
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        let mut report = validate(&workspace.store, &workspace.registry);
        report.merge(duplicates);
        if report.has_fatal() {
            return Err(WorkspaceError::Validation(report));
        }
        Ok(workspace)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn registry(&self) -> &RankRegistry {
        &self.registry
    }

    /// Validate current state without mutating anything
    pub fn validate(&self) -> ValidationReport {
        validate(&self.store, &self.registry)
    }

    /// Add a record, then validate; fatal violations roll the store back and
    /// surface the full report. Returns the (advisory-only) report on success.
    pub fn add(&mut self, record: Record) -> Result<ValidationReport, WorkspaceError> {
        self.mutate(|store| store.add(record))
    }

    /// Replace a record whole, with the same validate-or-rollback cycle
    pub fn replace(&mut self, record: Record) -> Result<ValidationReport, WorkspaceError> {
        self.mutate(|store| store.replace(record))
    }

    /// Remove a record. Refused while other records still reference it.
    pub fn remove(&mut self, id: &ItemId) -> Result<ValidationReport, WorkspaceError> {
        self.mutate(|store| store.remove(id).map(|_| ()))
    }

    fn mutate<F>(&mut self, op: F) -> Result<ValidationReport, WorkspaceError>
    where
        F: FnOnce(&mut EntityStore) -> Result<(), StoreError>,
    {
        let snapshot = self.store.snapshot();
        op(&mut self.store)?;
        let report = validate(&self.store, &self.registry);
        if report.has_fatal() {
            self.store.restore(snapshot);
            return Err(WorkspaceError::Validation(report));
        }
        Ok(report)
    }

    /// Replace a whole rank scale. Removing codes still referenced by risks
    /// fails with `RankConflict` unless `force` is set; a forced change flags
    /// the affected risks (they are not deleted, and remain readable) and
    /// returns their ids for the caller to remediate.
    pub fn set_scale(
        &mut self,
        kind: RankKind,
        entries: Vec<RankEntry>,
        force: bool,
    ) -> Result<Vec<ItemId>, WorkspaceError> {
        let kept: std::collections::BTreeSet<&str> =
            entries.iter().map(|e| e.code.as_str()).collect();
        let conflicts: Vec<(String, Vec<ItemId>)> = self
            .store
            .rank_codes_in_use(kind)
            .into_iter()
            .filter(|(code, _)| !kept.contains(code.as_str()))
            .collect();

        if !conflicts.is_empty() && !force {
            return Err(WorkspaceError::RankConflict { kind, conflicts });
        }

        self.registry.set_scale(kind, entries)?;

        let mut flagged = Vec::new();
        if !conflicts.is_empty() {
            let affected: std::collections::BTreeSet<ItemId> = conflicts
                .into_iter()
                .flat_map(|(_, risks)| risks)
                .collect();
            for risk in self.store.risks_mut() {
                if affected.contains(&risk.id) {
                    risk.needs_rank_review = true;
                    flagged.push(risk.id.clone());
                }
            }
        }
        Ok(flagged)
    }

    /// Add or update one scale entry
    pub fn upsert_rank_entry(
        &mut self,
        kind: RankKind,
        entry: RankEntry,
    ) -> Result<(), WorkspaceError> {
        self.registry.upsert_entry(kind, entry)?;
        Ok(())
    }

    /// Remove one scale entry, with the same in-use protection as `set_scale`
    pub fn remove_rank_entry(
        &mut self,
        kind: RankKind,
        code: &str,
        force: bool,
    ) -> Result<Vec<ItemId>, WorkspaceError> {
        let in_use = self.store.rank_codes_in_use(kind);
        if let Some(risks) = in_use.get(code) {
            if !force {
                return Err(WorkspaceError::RankConflict {
                    kind,
                    conflicts: vec![(code.to_string(), risks.clone())],
                });
            }
        }
        self.registry.remove_entry(kind, code)?;

        let mut flagged = Vec::new();
        if let Some(risks) = in_use.get(code) {
            let affected: std::collections::BTreeSet<&ItemId> = risks.iter().collect();
            for risk in self.store.risks_mut() {
                if affected.contains(&risk.id) {
                    risk.needs_rank_review = true;
                    flagged.push(risk.id.clone());
                }
            }
        }
        Ok(flagged)
    }

    pub fn set_mitigation_policy(
        &mut self,
        policy: Option<MitigationPolicy>,
    ) -> Result<(), WorkspaceError> {
        self.registry.set_mitigation_policy(policy)?;
        Ok(())
    }

    pub fn declare_category(&mut self, category: RiskCategory) {
        self.store.declare_category(category);
    }

    pub fn remove_category(&mut self, key: &str) -> Result<RiskCategory, WorkspaceError> {
        Ok(self.store.remove_category(key)?)
    }

    /// Score one risk
    pub fn score(&self, id: &ItemId) -> Result<RiskScore, WorkspaceError> {
        let risk = self
            .store
            .risk(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(scoring::score(risk, &self.registry)?)
    }

    /// Score every risk, lazily, in identifier order
    pub fn score_all(
        &self,
    ) -> impl Iterator<Item = (ItemId, Result<RiskScore, RegistryError>)> + '_ {
        scoring::score_all(&self.store, &self.registry)
    }

    pub fn downstream_of(&self, id: &ItemId) -> Result<Vec<ItemId>, WorkspaceError> {
        Ok(trace::downstream_of(&self.store, id)?)
    }

    pub fn upstream_of(&self, id: &ItemId) -> Result<Vec<ItemId>, WorkspaceError> {
        Ok(trace::upstream_of(&self.store, id)?)
    }

    /// Entities of one class with no inbound traceability where it is expected
    pub fn unlinked(&self, class: EntityClass) -> Vec<ItemId> {
        trace::unlinked(&self.validate(), class)
    }

    /// Serialize current state for persistence
    pub fn to_document(&self) -> Document {
        let entries_of = |kind: RankKind| -> Vec<RankEntry> {
            self.registry
                .scale(kind)
                .entries()
                .into_iter()
                .cloned()
                .collect()
        };

        Document {
            metadata: self.metadata.clone(),
            user_needs: self.store.user_needs().cloned().collect(),
            product_requirements: self.store.requirements().cloned().collect(),
            software_specifications: self
                .store
                .list(EntityClass::SoftwareSpec)
                .filter_map(|r| match r {
                    Record::Specification(s) => Some(s),
                    _ => None,
                })
                .collect(),
            hardware_specifications: self
                .store
                .list(EntityClass::HardwareSpec)
                .filter_map(|r| match r {
                    Record::Specification(s) => Some(s),
                    _ => None,
                })
                .collect(),
            risk_categories: self.store.categories().cloned().collect(),
            risks: self.store.risks().cloned().collect(),
            configuration: Configuration {
                severity: entries_of(RankKind::Severity),
                probability_occurrence: entries_of(RankKind::Occurrence),
                probability_harm: entries_of(RankKind::Harm),
                mitigation_policy: self.registry.mitigation_policy().copied(),
            },
        }
    }
}

/// Errors surfaced at the workspace boundary
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("validation failed: {0}")]
    Validation(ValidationReport),

    #[error("changing the {kind} scale would strand codes still used by risks: {}", format_conflicts(.conflicts))]
    RankConflict {
        kind: RankKind,
        conflicts: Vec<(String, Vec<ItemId>)>,
    },
}

fn format_conflicts(conflicts: &[(String, Vec<ItemId>)]) -> String {
    conflicts
        .iter()
        .map(|(code, risks)| {
            let ids: Vec<String> = risks.iter().map(|r| r.to_string()).collect();
            format!("{} ({})", code, ids.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
