//! Entity identity scheme: type-prefixed ordinal identifiers
//!
//! Identifiers are case-sensitive and zero-padded: `UN001`, `PR003`, `SW010`,
//! `HW002`, `R001`. Requirement identifiers may carry up to two single-digit
//! sub-levels (`PR001.2.3`) forming a three-level hierarchy whose parent is
//! derived syntactically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The five entity classes of a device history file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    /// User need (UN)
    UserNeed,
    /// Product requirement (PR), hierarchical
    Requirement,
    /// Software specification (SW)
    SoftwareSpec,
    /// Hardware specification (HW)
    HardwareSpec,
    /// Risk assessment (R)
    Risk,
}

impl EntityClass {
    /// Identifier prefix for this class
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityClass::UserNeed => "UN",
            EntityClass::Requirement => "PR",
            EntityClass::SoftwareSpec => "SW",
            EntityClass::HardwareSpec => "HW",
            EntityClass::Risk => "R",
        }
    }

    /// Section key used in data files and query arguments
    pub fn key(&self) -> &'static str {
        match self {
            EntityClass::UserNeed => "user_needs",
            EntityClass::Requirement => "product_requirements",
            EntityClass::SoftwareSpec => "software_specifications",
            EntityClass::HardwareSpec => "hardware_specifications",
            EntityClass::Risk => "risks",
        }
    }

    /// Human-readable singular name
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityClass::UserNeed => "user need",
            EntityClass::Requirement => "requirement",
            EntityClass::SoftwareSpec => "software specification",
            EntityClass::HardwareSpec => "hardware specification",
            EntityClass::Risk => "risk",
        }
    }

    /// All classes, in report order
    pub fn all() -> &'static [EntityClass] {
        &[
            EntityClass::UserNeed,
            EntityClass::Requirement,
            EntityClass::SoftwareSpec,
            EntityClass::HardwareSpec,
            EntityClass::Risk,
        ]
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for EntityClass {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user_needs" | "un" => Ok(EntityClass::UserNeed),
            "product_requirements" | "requirements" | "pr" => Ok(EntityClass::Requirement),
            "software_specifications" | "sw" => Ok(EntityClass::SoftwareSpec),
            "hardware_specifications" | "hw" => Ok(EntityClass::HardwareSpec),
            "risks" | "r" => Ok(EntityClass::Risk),
            _ => Err(IdentityError::UnknownClass(s.to_string())),
        }
    }
}

/// A unique entity identifier: class prefix, zero-padded major ordinal, and
/// up to two single-digit sub-levels (requirements only)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId {
    class: EntityClass,
    major: u16,
    minors: Vec<u8>,
}

impl ItemId {
    /// Parse an identifier from its canonical string form
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        s.parse()
    }

    /// The entity class encoded in the prefix
    pub fn class(&self) -> EntityClass {
        self.class
    }

    /// Hierarchy depth: 1 for `PR001`, 2 for `PR001.2`, 3 for `PR001.2.3`.
    /// Non-requirement identifiers are always depth 1.
    pub fn depth(&self) -> usize {
        1 + self.minors.len()
    }

    /// The identifier one level shallower, or `None` at depth 1.
    ///
    /// Only requirement identifiers are hierarchical; calling this on any
    /// other class is an error.
    pub fn parent(&self) -> Result<Option<ItemId>, IdentityError> {
        if self.class != EntityClass::Requirement {
            return Err(IdentityError::NotHierarchical(self.to_string()));
        }
        if self.minors.is_empty() {
            return Ok(None);
        }
        let mut minors = self.minors.clone();
        minors.pop();
        Ok(Some(ItemId {
            class: self.class,
            major: self.major,
            minors,
        }))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.class.prefix(), self.major)?;
        for minor in &self.minors {
            write!(f, ".{}", minor)?;
        }
        Ok(())
    }
}

impl FromStr for ItemId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentityError::InvalidIdentifier(s.to_string());

        let digits_at = s.find(|c: char| !c.is_ascii_uppercase()).ok_or_else(invalid)?;
        let (prefix, rest) = s.split_at(digits_at);

        let class = match prefix {
            "UN" => EntityClass::UserNeed,
            "PR" => EntityClass::Requirement,
            "SW" => EntityClass::SoftwareSpec,
            "HW" => EntityClass::HardwareSpec,
            "R" => EntityClass::Risk,
            _ => return Err(invalid()),
        };

        let mut segments = rest.split('.');
        let major_str = segments.next().ok_or_else(invalid)?;
        if major_str.len() != 3 || !major_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: u16 = major_str.parse().map_err(|_| invalid())?;

        let mut minors = Vec::new();
        for segment in segments {
            if class != EntityClass::Requirement || minors.len() == 2 {
                return Err(invalid());
            }
            if segment.len() != 1 || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            minors.push(segment.parse().map_err(|_| invalid())?);
        }

        Ok(ItemId {
            class,
            major,
            minors,
        })
    }
}

impl Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors produced by the identifier scheme
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid identifier '{0}' (expected UN###, PR###[.N[.N]], SW###, HW###, or R###)")]
    InvalidIdentifier(String),

    #[error("'{0}' has no parent: only requirement identifiers are hierarchical")]
    NotHierarchical(String),

    #[error("unknown entity class '{0}' (valid: user_needs, product_requirements, software_specifications, hardware_specifications, risks)")]
    UnknownClass(String),
}
