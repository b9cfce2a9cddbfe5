//! Risk scoring: RBM and residual risk after mitigation
//!
//! RBM is the product of the three configured ranks (severity, probability of
//! occurrence, probability of harm). The residual score reduces RBM by the
//! credit a mitigation model grants for the specifications linked to the
//! risk. Scores are recomputed from current state on every call; nothing is
//! cached, so a score always reflects the scales and links as they are now.

use serde::{Deserialize, Serialize};

use crate::core::identity::ItemId;
use crate::core::registry::{RankKind, RankRegistry, RegistryError};
use crate::core::store::EntityStore;
use crate::entities::Risk;

/// The pair of scores computed for a risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskScore {
    /// Risk-benefit matrix score: severity x occurrence x harm
    pub rbm: u32,

    /// Residual risk after mitigation; equals `rbm` when no mitigation
    /// policy is configured
    pub ram: u32,
}

/// Strategy for reducing RBM by the mitigations linked to a risk
pub trait MitigationModel {
    /// The residual score for `risk`, given its unmitigated `rbm`
    fn residual(&self, rbm: u32, risk: &Risk) -> u32;
}

/// The conservative default: mitigations earn no credit until a policy is
/// configured, so the residual equals the unmitigated score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMitigationCredit;

impl MitigationModel for NoMitigationCredit {
    fn residual(&self, rbm: u32, _risk: &Risk) -> u32 {
        rbm
    }
}

/// Count-based mitigation credit: each linked mitigating specification earns
/// a fixed percent reduction, capped at `max_percent` (always below 100 - a
/// mitigation never eliminates a risk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationPolicy {
    /// Percent reduction per linked specification
    pub percent_per_spec: u32,

    /// Ceiling on the combined reduction, in percent
    pub max_percent: u32,
}

impl MitigationModel for MitigationPolicy {
    fn residual(&self, rbm: u32, risk: &Risk) -> u32 {
        let count = risk.linked_specs.len() as u32;
        let credit = (count * self.percent_per_spec).min(self.max_percent);
        // Integer division rounds the credit down, never the residual
        rbm - rbm * credit / 100
    }
}

/// Score one risk against the configured scales and mitigation policy.
/// Fails if any of the risk's three codes is not currently configured.
pub fn score(risk: &Risk, registry: &RankRegistry) -> Result<RiskScore, RegistryError> {
    match registry.mitigation_policy() {
        Some(policy) => score_with(risk, registry, policy),
        None => score_with(risk, registry, &NoMitigationCredit),
    }
}

/// Score one risk with an explicit mitigation model
pub fn score_with(
    risk: &Risk,
    registry: &RankRegistry,
    model: &dyn MitigationModel,
) -> Result<RiskScore, RegistryError> {
    let severity = registry.rank(RankKind::Severity, &risk.severity)?;
    let occurrence = registry.rank(RankKind::Occurrence, &risk.probability_occurrence)?;
    let harm = registry.rank(RankKind::Harm, &risk.probability_harm)?;

    let rbm = severity * occurrence * harm;
    let ram = model.residual(rbm, risk);
    Ok(RiskScore { rbm, ram })
}

/// Score every risk in identifier order. The sequence is lazy and
/// restartable; each traversal re-reads current state.
pub fn score_all<'a>(
    store: &'a EntityStore,
    registry: &'a RankRegistry,
) -> impl Iterator<Item = (ItemId, Result<RiskScore, RegistryError>)> + 'a {
    store
        .risks()
        .map(move |risk| (risk.id.clone(), score(risk, registry)))
}
