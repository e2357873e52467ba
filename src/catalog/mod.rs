//! Assessment catalog records.
//!
//! The catalog is small and static. It is either the built-in list below or a
//! YAML file named by `catalog_path` in the config, and is validated once
//! before any embedding work starts.

pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use store::CatalogStore;

/// Errors raised while loading or validating the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is empty; refusing to start without recommendable items")]
    EmptyCatalog,

    #[error("duplicate catalog name: {0}")]
    DuplicateName(String),

    #[error("duplicate catalog url: {0}")]
    DuplicateUrl(String),

    #[error("catalog item {0:?} has an empty description")]
    EmptyDescription(String),

    #[error("catalog item {0:?} has a zero duration")]
    ZeroDuration(String),

    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("catalog file is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("failed to embed catalog: {0}")]
    Embedding(#[from] crate::semantic::EmbeddingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    Cognitive,
    Personality,
    Simulation,
    Knowledge,
    Competency,
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TestType::Cognitive => "Cognitive",
            TestType::Personality => "Personality",
            TestType::Simulation => "Simulation",
            TestType::Knowledge => "Knowledge",
            TestType::Competency => "Competency",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub url: String,
    /// Source text for the item's embedding.
    pub description: String,

    #[serde(with = "yes_no")]
    pub remote_testing: bool,
    #[serde(with = "yes_no")]
    pub adaptive_irt: bool,

    #[serde(alias = "duration", deserialize_with = "minutes::deserialize")]
    pub duration_minutes: u32,

    pub test_type: TestType,
}

/// The built-in catalog the service ships with.
pub fn builtin() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            name: "General Ability Test".to_string(),
            url: "https://www.shl.com/product/general-ability-test/".to_string(),
            description: "Measures numerical, verbal, and logical reasoning abilities."
                .to_string(),
            remote_testing: true,
            adaptive_irt: true,
            duration_minutes: 30,
            test_type: TestType::Cognitive,
        },
        CatalogItem {
            name: "Sales Personality Questionnaire".to_string(),
            url: "https://www.shl.com/product/sales-personality-questionnaire/".to_string(),
            description: "Assesses personality traits important for success in sales roles."
                .to_string(),
            remote_testing: true,
            adaptive_irt: false,
            duration_minutes: 25,
            test_type: TestType::Personality,
        },
        CatalogItem {
            name: "Customer Service Simulation".to_string(),
            url: "https://www.shl.com/product/customer-service-simulation/".to_string(),
            description: "Simulates real-world scenarios to evaluate customer service skills."
                .to_string(),
            remote_testing: true,
            adaptive_irt: true,
            duration_minutes: 35,
            test_type: TestType::Simulation,
        },
    ]
}

/// Read a catalog from a YAML list of items.
pub fn load_file(path: &str) -> Result<Vec<CatalogItem>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_string(),
        source,
    })?;
    parse_yaml(&content)
}

pub fn parse_yaml(content: &str) -> Result<Vec<CatalogItem>, CatalogError> {
    let items: Vec<CatalogItem> = serde_yml::from_str(content)?;
    Ok(items)
}

/// Resolve the catalog source: a YAML file when configured, the built-in list otherwise.
pub fn resolve(catalog_path: Option<&str>) -> Result<Vec<CatalogItem>, CatalogError> {
    match catalog_path {
        Some(path) => {
            log::info!("loading catalog from {path}");
            load_file(path)
        }
        None => Ok(builtin()),
    }
}

/// Check the catalog invariants: non-empty, unique names and urls,
/// non-empty descriptions and positive durations.
pub fn validate(items: &[CatalogItem]) -> Result<(), CatalogError> {
    if items.is_empty() {
        return Err(CatalogError::EmptyCatalog);
    }

    let mut names = HashSet::new();
    let mut urls = HashSet::new();

    for item in items {
        if !names.insert(item.name.as_str()) {
            return Err(CatalogError::DuplicateName(item.name.clone()));
        }
        if !urls.insert(item.url.as_str()) {
            return Err(CatalogError::DuplicateUrl(item.url.clone()));
        }
        if item.description.trim().is_empty() {
            return Err(CatalogError::EmptyDescription(item.name.clone()));
        }
        if item.duration_minutes == 0 {
            return Err(CatalogError::ZeroDuration(item.name.clone()));
        }
    }

    Ok(())
}

/// Boolean flags stored as "Yes"/"No".
pub mod yes_no {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn to_str(value: bool) -> &'static str {
        if value {
            "Yes"
        } else {
            "No"
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(to_str(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Text(String),
        }

        match Flag::deserialize(deserializer)? {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => match text.trim().to_lowercase().as_str() {
                "yes" | "y" | "true" => Ok(true),
                "no" | "n" | "false" => Ok(false),
                other => Err(de::Error::custom(format!(
                    "expected \"Yes\" or \"No\", got {other:?}"
                ))),
            },
        }
    }
}

/// Durations given either as a number of minutes or as text like "30 minutes".
mod minutes {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Duration {
            Minutes(u32),
            Text(String),
        }

        match Duration::deserialize(deserializer)? {
            Duration::Minutes(value) => Ok(value),
            Duration::Text(text) => parse(&text).ok_or_else(|| {
                de::Error::custom(format!("invalid duration {text:?}, expected e.g. \"30 minutes\""))
            }),
        }
    }

    pub fn parse(text: &str) -> Option<u32> {
        let mut parts = text.split_whitespace();
        let value = parts.next()?.parse::<u32>().ok()?;
        match parts.next() {
            None => Some(value),
            Some(unit) if matches!(unit.to_lowercase().as_str(), "min" | "mins" | "minute" | "minutes") => {
                parts.next().is_none().then_some(value)
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let items = builtin();
        assert_eq!(items.len(), 3);
        assert!(validate(&items).is_ok());
        assert_eq!(items[0].name, "General Ability Test");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(validate(&[]), Err(CatalogError::EmptyCatalog)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut items = builtin();
        items[1].name = items[0].name.clone();
        assert!(matches!(validate(&items), Err(CatalogError::DuplicateName(_))));
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let mut items = builtin();
        items[2].url = items[0].url.clone();
        assert!(matches!(validate(&items), Err(CatalogError::DuplicateUrl(_))));
    }

    #[test]
    fn test_blank_description_rejected() {
        let mut items = builtin();
        items[0].description = "   ".to_string();
        assert!(matches!(
            validate(&items),
            Err(CatalogError::EmptyDescription(_))
        ));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut items = builtin();
        items[0].duration_minutes = 0;
        assert!(matches!(validate(&items), Err(CatalogError::ZeroDuration(_))));
    }

    #[test]
    fn test_parse_yaml_with_text_fields() {
        let yaml = r#"
- name: Verify Numerical Reasoning
  url: https://www.shl.com/product/verify-numerical-reasoning/
  description: Measures the ability to make correct decisions from numerical data.
  remote_testing: "Yes"
  adaptive_irt: "No"
  duration: 18 minutes
  test_type: Cognitive
- name: Coding Essentials
  url: https://www.shl.com/product/coding-essentials/
  description: Knowledge of core programming concepts.
  remote_testing: true
  adaptive_irt: false
  duration_minutes: 20
  test_type: Knowledge
"#;
        let items = parse_yaml(yaml).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].remote_testing);
        assert!(!items[0].adaptive_irt);
        assert_eq!(items[0].duration_minutes, 18);
        assert_eq!(items[1].duration_minutes, 20);
        assert_eq!(items[1].test_type, TestType::Knowledge);
    }

    #[test]
    fn test_parse_yaml_bad_flag() {
        let yaml = r#"
- name: A
  url: https://example.com/a
  description: something
  remote_testing: maybe
  adaptive_irt: "No"
  duration_minutes: 10
  test_type: Cognitive
"#;
        assert!(matches!(parse_yaml(yaml), Err(CatalogError::Malformed(_))));
    }

    #[test]
    fn test_duration_text_parsing() {
        assert_eq!(minutes::parse("30 minutes"), Some(30));
        assert_eq!(minutes::parse("45"), Some(45));
        assert_eq!(minutes::parse("12 min"), Some(12));
        assert_eq!(minutes::parse("half an hour"), None);
        assert_eq!(minutes::parse("30 hours"), None);
    }

    #[test]
    fn test_flags_serialize_as_yes_no() {
        let item = &builtin()[1];
        let json = serde_json::to_value(item).unwrap();
        assert_eq!(json["remote_testing"], "Yes");
        assert_eq!(json["adaptive_irt"], "No");
        assert_eq!(json["test_type"], "Personality");
    }

    #[test]
    fn test_resolve_missing_file() {
        let result = resolve(Some("/nonexistent/shlrec/catalog.yaml"));
        assert!(matches!(result, Err(CatalogError::Read { .. })));
    }
}
