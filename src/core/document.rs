//! Data file shape
//!
//! `Document` is the serde representation of a DHF data file: entity records
//! grouped by section, the declared risk categories, and the configuration
//! block with the three rank scales and the optional mitigation policy. The
//! host deserializes a file into a `Document`, hands it to the workspace, and
//! serializes one back out to persist a validated state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::registry::RankEntry;
use crate::core::scoring::MitigationPolicy;
use crate::entities::{Requirement, Risk, RiskCategory, Specification, UserNeed};

/// Project-level metadata carried through load/persist round trips
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub device_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// The configuration block: rank scales and mitigation policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub severity: Vec<RankEntry>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub probability_occurrence: Vec<RankEntry>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub probability_harm: Vec<RankEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation_policy: Option<MitigationPolicy>,
}

/// A whole DHF data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub metadata: Metadata,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_needs: Vec<UserNeed>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub product_requirements: Vec<Requirement>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub software_specifications: Vec<Specification>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hardware_specifications: Vec<Specification>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub risk_categories: Vec<RiskCategory>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,

    pub configuration: Configuration,
}

impl Document {
    pub fn from_yaml(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_yml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        Ok(serde_yml::to_string(self)?)
    }
}

/// Errors produced while reading or writing a data file
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed data file: {0}")]
    Yaml(#[from] serde_yml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
metadata:
  project_name: Test Diabetes Monitor
  device_type: Continuous Glucose Monitor
  version: 1.0.0
user_needs:
  - id: UN001
    title: Accurate Glucose Monitoring
    description: The device must accurately measure blood glucose levels
product_requirements:
  - id: PR001
    title: Glucose Measurement Accuracy
    description: The device must measure glucose with +/-15% accuracy
    verification_method: test
    linked_user_needs: [UN001]
software_specifications:
  - id: SW001
    title: Glucose Algorithm
    description: Algorithm for converting sensor data to glucose readings
    module: measurement
    linked_requirements: [PR001]
risk_categories:
  - key: patient_safety
    name: Patient Safety
risks:
  - id: R001
    category: patient_safety
    title: Inaccurate Glucose Reading
    description: Sensor malfunction leads to false reading
    harm: Incorrect treatment decisions
    severity: S3
    probability_occurrence: PO2
    probability_harm: PH3
    linked_specs: [SW001]
configuration:
  severity:
    - { code: S1, name: Low, rank: 1 }
    - { code: S2, name: Medium, rank: 2 }
    - { code: S3, name: High, rank: 3 }
  probability_occurrence:
    - { code: PO1, name: Low, rank: 1 }
    - { code: PO2, name: Medium, rank: 2 }
    - { code: PO3, name: High, rank: 3 }
  probability_harm:
    - { code: PH1, name: Low, rank: 1 }
    - { code: PH2, name: Medium, rank: 2 }
    - { code: PH3, name: High, rank: 3 }
"#;

    #[test]
    fn test_parse_sample_document() {
        let doc = Document::from_yaml(SAMPLE).unwrap();
        assert_eq!(doc.metadata.project_name, "Test Diabetes Monitor");
        assert_eq!(doc.user_needs.len(), 1);
        assert_eq!(doc.product_requirements.len(), 1);
        assert_eq!(doc.software_specifications.len(), 1);
        assert_eq!(doc.risks.len(), 1);
        assert_eq!(doc.configuration.severity.len(), 3);
        assert_eq!(doc.risks[0].severity, "S3");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let doc = Document::from_yaml(SAMPLE).unwrap();
        let yaml = doc.to_yaml().unwrap();
        let again = Document::from_yaml(&yaml).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let doc = Document::from_yaml("metadata:\n  project_name: Empty\n").unwrap();
        assert!(doc.user_needs.is_empty());
        assert!(doc.risks.is_empty());
        assert!(doc.configuration.severity.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let err = Document::from_yaml("user_needs: {not: [a, list").unwrap_err();
        assert!(matches!(err, DocumentError::Yaml(_)));
    }
}
