//! User need entity type

use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityClass, ItemId};
use crate::entities::{check_class, EntityError};

/// A user need: the top of the traceability chain, with no outbound links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNeed {
    /// Unique identifier (UN###)
    pub id: ItemId,

    /// Short title
    pub title: String,

    /// What the user needs and why
    pub description: String,
}

impl UserNeed {
    pub fn new(id: ItemId, title: String, description: String) -> Result<Self, EntityError> {
        check_class(&id, EntityClass::UserNeed)?;
        Ok(Self {
            id,
            title,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_need_roundtrip() {
        let need = UserNeed::new(
            "UN001".parse().unwrap(),
            "Accurate Glucose Monitoring".to_string(),
            "The device must accurately measure blood glucose levels".to_string(),
        )
        .unwrap();

        let yaml = serde_yml::to_string(&need).unwrap();
        let parsed: UserNeed = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(need, parsed);
    }

    #[test]
    fn test_user_need_rejects_wrong_class() {
        let err = UserNeed::new(
            "PR001".parse().unwrap(),
            "Title".to_string(),
            "Description".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, EntityError::WrongClass { .. }));
    }
}
