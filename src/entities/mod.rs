//! Entity type definitions
//!
//! A device history file carries five entity classes:
//!
//! - [`UserNeed`] - top-level user needs (no outbound links)
//! - [`Requirement`] - hierarchical product requirements linked to user needs
//! - [`Specification`] - software or hardware specifications linked to requirements
//! - [`Risk`] - risk assessments with rank codes and mitigating specifications
//! - [`RiskCategory`] - declared category groups risks belong to
//!
//! Records are immutable-by-replacement: every field is validated when the
//! record is constructed, and edits go through whole-record replacement in the
//! entity store.

pub mod requirement;
pub mod risk;
pub mod specification;
pub mod user_need;

pub use requirement::{Requirement, VerificationMethod};
pub use risk::{Risk, RiskCategory};
pub use specification::{SpecKind, Specification};
pub use user_need::UserNeed;

use thiserror::Error;

use crate::core::identity::{EntityClass, ItemId};

/// Errors raised when constructing an entity record
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("identifier {id} belongs to class {}, expected {}", .actual.key(), .expected.key())]
    WrongClass {
        id: ItemId,
        expected: EntityClass,
        actual: EntityClass,
    },
}

pub(crate) fn check_class(id: &ItemId, expected: EntityClass) -> Result<(), EntityError> {
    if id.class() == expected {
        Ok(())
    } else {
        Err(EntityError::WrongClass {
            id: id.clone(),
            expected,
            actual: id.class(),
        })
    }
}
