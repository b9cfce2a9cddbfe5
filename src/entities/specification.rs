//! Specification entity type (software and hardware)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::identity::{EntityClass, ItemId};
use crate::entities::EntityError;

/// Specification kind, determined by the identifier prefix (SW or HW)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    Software,
    Hardware,
}

impl std::fmt::Display for SpecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecKind::Software => write!(f, "software"),
            SpecKind::Hardware => write!(f, "hardware"),
        }
    }
}

/// A software or hardware specification. Both kinds share one shape; the
/// identifier prefix carries the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Unique identifier (SW### or HW###)
    pub id: ItemId,

    /// Short title
    pub title: String,

    /// What this specification defines
    pub description: String,

    /// Software module or hardware component that implements it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,

    /// Requirements this specification traces to
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub linked_requirements: BTreeSet<ItemId>,
}

impl Specification {
    pub fn new(
        id: ItemId,
        title: String,
        description: String,
        module: String,
    ) -> Result<Self, EntityError> {
        match id.class() {
            EntityClass::SoftwareSpec | EntityClass::HardwareSpec => Ok(Self {
                id,
                title,
                description,
                module,
                linked_requirements: BTreeSet::new(),
            }),
            actual => Err(EntityError::WrongClass {
                id: id.clone(),
                expected: EntityClass::SoftwareSpec,
                actual,
            }),
        }
    }

    /// Kind tag derived from the identifier prefix
    pub fn kind(&self) -> SpecKind {
        match self.id.class() {
            EntityClass::HardwareSpec => SpecKind::Hardware,
            _ => SpecKind::Software,
        }
    }
}
