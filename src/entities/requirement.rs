//! Product requirement entity type

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::identity::{EntityClass, ItemId};
use crate::entities::{check_class, EntityError};

/// How a requirement is verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum VerificationMethod {
    #[default]
    Test,
    Inspection,
    Analysis,
    Demonstration,
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationMethod::Test => write!(f, "test"),
            VerificationMethod::Inspection => write!(f, "inspection"),
            VerificationMethod::Analysis => write!(f, "analysis"),
            VerificationMethod::Demonstration => write!(f, "demonstration"),
        }
    }
}

impl std::str::FromStr for VerificationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(VerificationMethod::Test),
            "inspection" => Ok(VerificationMethod::Inspection),
            "analysis" => Ok(VerificationMethod::Analysis),
            "demonstration" => Ok(VerificationMethod::Demonstration),
            _ => Err(format!("Unknown verification method: {}", s)),
        }
    }
}

/// A product requirement (up to three hierarchy levels, e.g. `PR001.2.3`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Unique identifier (PR###[.N[.N]])
    pub id: ItemId,

    /// Short title
    pub title: String,

    /// Full requirement text
    pub description: String,

    /// How this requirement is verified
    #[serde(default)]
    pub verification_method: VerificationMethod,

    /// Parent requirement. Must be the identifier one level shallower than
    /// this requirement's own; level-1 requirements have no parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemId>,

    /// User needs this requirement traces to
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub linked_user_needs: BTreeSet<ItemId>,
}

impl Requirement {
    /// Create a requirement with the parent derived from the identifier
    pub fn new(
        id: ItemId,
        title: String,
        description: String,
        verification_method: VerificationMethod,
    ) -> Result<Self, EntityError> {
        check_class(&id, EntityClass::Requirement)?;
        let parent = id.parent().expect("requirement ids are hierarchical");
        Ok(Self {
            id,
            title,
            description,
            verification_method,
            parent,
            linked_user_needs: BTreeSet::new(),
        })
    }

    /// The parent this requirement's identifier implies, regardless of the
    /// stored `parent` field
    pub fn expected_parent(&self) -> Option<ItemId> {
        self.id.parent().unwrap_or(None)
    }
}
