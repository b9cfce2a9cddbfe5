//! Core module - the traceability and scoring engine

pub mod document;
pub mod identity;
pub mod registry;
pub mod scoring;
pub mod store;
pub mod trace;
pub mod validate;
pub mod workspace;

pub use document::{Configuration, Document, DocumentError, Metadata};
pub use identity::{EntityClass, IdentityError, ItemId};
pub use registry::{RankEntry, RankKind, RankRegistry, RankScale, RegistryError};
pub use scoring::{score, score_all, MitigationModel, MitigationPolicy, NoMitigationCredit, RiskScore};
pub use store::{EntityStore, Record, StoreError};
pub use trace::{downstream_of, unlinked, upstream_of};
pub use validate::{validate, ValidationReport, Violation, ViolationKind};
pub use workspace::{Workspace, WorkspaceError};
