//! Risk entity type

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::identity::{EntityClass, ItemId};
use crate::entities::{check_class, EntityError};

/// A declared risk category group. Every risk belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    /// Stable key referenced by `Risk::category`
    pub key: String,

    /// Display name
    pub name: String,
}

/// A risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    /// Unique identifier (R###)
    pub id: ItemId,

    /// Key of the declared category group this risk belongs to
    pub category: String,

    /// Short title
    pub title: String,

    /// Detailed description of the risk
    pub description: String,

    /// The harm that could result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harm: Option<String>,

    /// Sequence of events leading to the hazardous situation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_of_events: Option<String>,

    /// The hazardous situation itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazardous_situation: Option<String>,

    /// Severity code (resolved against the severity scale)
    pub severity: String,

    /// Probability-of-occurrence code
    pub probability_occurrence: String,

    /// Probability-of-harm code
    pub probability_harm: String,

    /// Specifications that mitigate this risk
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub linked_specs: BTreeSet<ItemId>,

    /// Risk acceptability record
    #[serde(default, skip_serializing_if = "is_false")]
    pub cannot_be_reduced_further: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub benefits_outweigh_risk: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,

    /// Set when a forced rank-scale change removed a code this risk still
    /// uses; cleared by replacing the risk with resolvable codes.
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_rank_review: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Risk {
    pub fn new(
        id: ItemId,
        category: String,
        title: String,
        description: String,
        severity: String,
        probability_occurrence: String,
        probability_harm: String,
    ) -> Result<Self, EntityError> {
        check_class(&id, EntityClass::Risk)?;
        Ok(Self {
            id,
            category,
            title,
            description,
            harm: None,
            sequence_of_events: None,
            hazardous_situation: None,
            severity,
            probability_occurrence,
            probability_harm,
            linked_specs: BTreeSet::new(),
            cannot_be_reduced_further: false,
            benefits_outweigh_risk: false,
            justification: None,
            needs_rank_review: false,
        })
    }
}
