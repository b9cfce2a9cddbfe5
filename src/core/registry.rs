//! Rank scale configuration registry
//!
//! Owns the three rank scales used by risk scoring (severity, probability of
//! occurrence, probability of harm) and the optional mitigation policy.
//! Risks reference scale entries by code; the registry never reaches into the
//! entity store, so in-use protection for scale edits lives in the workspace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::scoring::MitigationPolicy;

/// The three rank scale kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKind {
    Severity,
    Occurrence,
    Harm,
}

impl RankKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankKind::Severity => "severity",
            RankKind::Occurrence => "probability_occurrence",
            RankKind::Harm => "probability_harm",
        }
    }

    pub fn all() -> &'static [RankKind] {
        &[RankKind::Severity, RankKind::Occurrence, RankKind::Harm]
    }
}

impl std::fmt::Display for RankKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a rank scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Code referenced by risks (e.g. `S3`, `PO2`, `PH1`)
    pub code: String,

    /// Display name (e.g. "High")
    pub name: String,

    /// What the level means
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Numeric rank used in scoring; unique within a scale, higher is worse
    pub rank: u32,
}

/// A rank scale: entries keyed by code with unique positive ranks
#[derive(Debug, Clone, Default)]
pub struct RankScale {
    entries: BTreeMap<String, RankEntry>,
}

impl RankScale {
    pub fn get(&self, code: &str) -> Option<&RankEntry> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Entries ordered by rank
    pub fn entries(&self) -> Vec<&RankEntry> {
        let mut entries: Vec<&RankEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.rank);
        entries
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry of rank scales and the mitigation policy
#[derive(Debug, Clone, Default)]
pub struct RankRegistry {
    severity: RankScale,
    occurrence: RankScale,
    harm: RankScale,
    mitigation: Option<MitigationPolicy>,
}

impl RankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn scale_mut(&mut self, kind: RankKind) -> &mut RankScale {
        match kind {
            RankKind::Severity => &mut self.severity,
            RankKind::Occurrence => &mut self.occurrence,
            RankKind::Harm => &mut self.harm,
        }
    }

    pub fn scale(&self, kind: RankKind) -> &RankScale {
        match kind {
            RankKind::Severity => &self.severity,
            RankKind::Occurrence => &self.occurrence,
            RankKind::Harm => &self.harm,
        }
    }

    /// Replace an entire scale atomically. The new entries must have unique
    /// codes and unique positive ranks; otherwise the scale is left untouched.
    pub fn set_scale(
        &mut self,
        kind: RankKind,
        entries: Vec<RankEntry>,
    ) -> Result<(), RegistryError> {
        let mut by_code: BTreeMap<String, RankEntry> = BTreeMap::new();
        let mut by_rank: BTreeMap<u32, String> = BTreeMap::new();

        for entry in entries {
            if entry.rank == 0 {
                return Err(RegistryError::InvalidRank {
                    kind,
                    code: entry.code,
                });
            }
            if let Some(holder) = by_rank.get(&entry.rank) {
                return Err(RegistryError::DuplicateRank {
                    kind,
                    rank: entry.rank,
                    first: holder.clone(),
                    second: entry.code,
                });
            }
            by_rank.insert(entry.rank, entry.code.clone());
            if by_code.insert(entry.code.clone(), entry.clone()).is_some() {
                return Err(RegistryError::DuplicateCode {
                    kind,
                    code: entry.code,
                });
            }
        }

        self.scale_mut(kind).entries = by_code;
        Ok(())
    }

    /// Add or update a single entry, keeping rank uniqueness
    pub fn upsert_entry(&mut self, kind: RankKind, entry: RankEntry) -> Result<(), RegistryError> {
        if entry.rank == 0 {
            return Err(RegistryError::InvalidRank {
                kind,
                code: entry.code,
            });
        }
        let scale = self.scale_mut(kind);
        if let Some(holder) = scale
            .entries
            .values()
            .find(|e| e.rank == entry.rank && e.code != entry.code)
        {
            return Err(RegistryError::DuplicateRank {
                kind,
                rank: entry.rank,
                first: holder.code.clone(),
                second: entry.code,
            });
        }
        scale.entries.insert(entry.code.clone(), entry);
        Ok(())
    }

    /// Remove a single entry by code
    pub fn remove_entry(&mut self, kind: RankKind, code: &str) -> Result<RankEntry, RegistryError> {
        self.scale_mut(kind)
            .entries
            .remove(code)
            .ok_or_else(|| RegistryError::UnknownCode {
                kind,
                code: code.to_string(),
            })
    }

    /// Resolve a code to its numeric rank
    pub fn rank(&self, kind: RankKind, code: &str) -> Result<u32, RegistryError> {
        self.scale(kind)
            .get(code)
            .map(|e| e.rank)
            .ok_or_else(|| RegistryError::UnknownCode {
                kind,
                code: code.to_string(),
            })
    }

    pub fn mitigation_policy(&self) -> Option<&MitigationPolicy> {
        self.mitigation.as_ref()
    }

    /// Configure the mitigation policy used for residual-risk scoring.
    /// A mitigation never eliminates a risk entirely, so the credit ceiling
    /// must stay below 100 percent.
    pub fn set_mitigation_policy(
        &mut self,
        policy: Option<MitigationPolicy>,
    ) -> Result<(), RegistryError> {
        if let Some(ref p) = policy {
            if p.max_percent >= 100 {
                return Err(RegistryError::MitigationBounds {
                    max_percent: p.max_percent,
                });
            }
        }
        self.mitigation = policy;
        Ok(())
    }
}

/// Errors produced by the configuration registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown {kind} code '{code}'")]
    UnknownCode { kind: RankKind, code: String },

    #[error("duplicate code '{code}' in {kind} scale")]
    DuplicateCode { kind: RankKind, code: String },

    #[error("duplicate rank {rank} in {kind} scale (codes '{first}' and '{second}')")]
    DuplicateRank {
        kind: RankKind,
        rank: u32,
        first: String,
        second: String,
    },

    #[error("rank for {kind} code '{code}' must be a positive integer")]
    InvalidRank { kind: RankKind, code: String },

    #[error("mitigation credit must stay below 100 percent (got {max_percent})")]
    MitigationBounds { max_percent: u32 },
}

#[cfg(test)]
pub(crate) fn entry(code: &str, name: &str, rank: u32) -> RankEntry {
    RankEntry {
        code: code.to_string(),
        name: name.to_string(),
        description: String::new(),
        rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_severity() -> RankRegistry {
        let mut registry = RankRegistry::new();
        registry
            .set_scale(
                RankKind::Severity,
                vec![
                    entry("S1", "Low", 1),
                    entry("S2", "Medium", 2),
                    entry("S3", "High", 3),
                ],
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_rank_lookup() {
        let registry = registry_with_severity();
        assert_eq!(registry.rank(RankKind::Severity, "S2").unwrap(), 2);
    }

    #[test]
    fn test_unknown_code() {
        let registry = registry_with_severity();
        let err = registry.rank(RankKind::Severity, "S9").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCode { .. }));
    }

    #[test]
    fn test_set_scale_rejects_duplicate_code() {
        let mut registry = RankRegistry::new();
        let err = registry
            .set_scale(
                RankKind::Harm,
                vec![entry("PH1", "Low", 1), entry("PH1", "Also Low", 2)],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCode { .. }));
        assert!(registry.scale(RankKind::Harm).is_empty());
    }

    #[test]
    fn test_set_scale_rejects_duplicate_rank() {
        let mut registry = RankRegistry::new();
        let err = registry
            .set_scale(
                RankKind::Occurrence,
                vec![entry("PO1", "Low", 1), entry("PO2", "Medium", 1)],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRank { .. }));
    }

    #[test]
    fn test_set_scale_rejects_zero_rank() {
        let mut registry = RankRegistry::new();
        let err = registry
            .set_scale(RankKind::Severity, vec![entry("S0", "None", 0)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRank { .. }));
    }

    #[test]
    fn test_entries_ordered_by_rank() {
        let registry = registry_with_severity();
        let ranks: Vec<u32> = registry
            .scale(RankKind::Severity)
            .entries()
            .iter()
            .map(|e| e.rank)
            .collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_upsert_entry_guards_rank_collision() {
        let mut registry = registry_with_severity();
        let err = registry
            .upsert_entry(RankKind::Severity, entry("S4", "Critical", 3))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRank { .. }));

        // Updating an existing code in place keeps its rank
        registry
            .upsert_entry(RankKind::Severity, entry("S3", "Severe", 3))
            .unwrap();
        assert_eq!(registry.scale(RankKind::Severity).get("S3").unwrap().name, "Severe");
    }

    #[test]
    fn test_remove_entry() {
        let mut registry = registry_with_severity();
        registry.remove_entry(RankKind::Severity, "S3").unwrap();
        assert!(!registry.scale(RankKind::Severity).contains("S3"));
        let err = registry.remove_entry(RankKind::Severity, "S3").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCode { .. }));
    }

    #[test]
    fn test_mitigation_policy_bounds() {
        let mut registry = RankRegistry::new();
        let err = registry
            .set_mitigation_policy(Some(MitigationPolicy {
                percent_per_spec: 50,
                max_percent: 100,
            }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::MitigationBounds { .. }));

        registry
            .set_mitigation_policy(Some(MitigationPolicy {
                percent_per_spec: 20,
                max_percent: 60,
            }))
            .unwrap();
        assert!(registry.mitigation_policy().is_some());
    }
}
