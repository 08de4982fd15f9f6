//! Fact name → custom attribute key translation
//!
//! The set of reconcilable facts is a single table. A fact whose name has no
//! entry is not relevant and is skipped without touching the inventory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Built-in table: external fact name → inventory custom attribute key
const BUILTIN_RULES: &[(&str, &str)] = &[
    ("location", "location"),
    ("server_environment", "environment"),
    ("net_zone", "netzone"),
    ("server_puppet_profile", "role"),
    ("costco_os1", "os1"),
];

/// Static mapping table, fixed for the lifetime of a run.
///
/// Keys are unique by construction, so each fact name maps to at most one
/// attribute key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingRule {
    rules: BTreeMap<String, String>,
}

impl MappingRule {
    /// The table shipped with factsync
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_RULES
                .iter()
                .map(|(fact, key)| (fact.to_string(), key.to_string()))
                .collect(),
        }
    }

    /// Build a table from configured pairs, rejecting empty names or keys
    pub fn from_pairs<I, F, K>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (F, K)>,
        F: Into<String>,
        K: Into<String>,
    {
        let mut rules = BTreeMap::new();
        for (fact, key) in pairs {
            let (fact, key) = (fact.into(), key.into());
            if fact.trim().is_empty() {
                return Err(ConfigError::InvalidMapping(
                    "fact name must not be empty".to_string(),
                ));
            }
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidMapping(format!(
                    "fact '{}' maps to an empty attribute key",
                    fact
                )));
            }
            if rules.insert(fact.clone(), key).is_some() {
                return Err(ConfigError::InvalidMapping(format!(
                    "fact '{}' is mapped more than once",
                    fact
                )));
            }
        }
        let rule = Self { rules };
        rule.validate()?;
        Ok(rule)
    }

    /// Check a table loaded through serde
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::InvalidMapping(
                "mapping table is empty; no fact would ever be reconciled".to_string(),
            ));
        }
        if let Some((fact, _)) = self
            .rules
            .iter()
            .find(|(fact, key)| fact.trim().is_empty() || key.trim().is_empty())
        {
            return Err(ConfigError::InvalidMapping(format!(
                "entry '{}' has an empty fact name or attribute key",
                fact
            )));
        }
        Ok(())
    }

    /// Fact names covered by this table, in sorted order
    pub fn fact_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for MappingRule {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Pure lookup over a [`MappingRule`]
#[derive(Debug, Clone)]
pub struct FactMapper {
    rule: MappingRule,
}

impl FactMapper {
    pub fn new(rule: MappingRule) -> Self {
        Self { rule }
    }

    /// Attribute key for `fact_name`, or `None` when the fact is not relevant
    pub fn map(&self, fact_name: &str) -> Option<&str> {
        self.rule.rules.get(fact_name).map(String::as_str)
    }

    pub fn rule(&self) -> &MappingRule {
        &self.rule
    }
}

impl Default for FactMapper {
    fn default() -> Self {
        Self::new(MappingRule::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let mapper = FactMapper::default();
        assert_eq!(mapper.map("location"), Some("location"));
        assert_eq!(mapper.map("server_environment"), Some("environment"));
        assert_eq!(mapper.map("net_zone"), Some("netzone"));
        assert_eq!(mapper.map("server_puppet_profile"), Some("role"));
        assert_eq!(mapper.map("costco_os1"), Some("os1"));
        assert_eq!(mapper.rule().len(), 5);
    }

    #[test]
    fn test_unknown_fact_is_not_relevant() {
        let mapper = FactMapper::default();
        assert_eq!(mapper.map("uptime"), None);
        assert_eq!(mapper.map(""), None);
        // Matching is exact, not case-folded
        assert_eq!(mapper.map("Location"), None);
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        let err = MappingRule::from_pairs([("location", "location"), ("location", "site")])
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_from_pairs_rejects_empty_key() {
        assert!(MappingRule::from_pairs([("location", " ")]).is_err());
        assert!(MappingRule::from_pairs([("", "site")]).is_err());
    }

    #[test]
    fn test_empty_table_is_invalid() {
        let empty: [(&str, &str); 0] = [];
        assert!(MappingRule::from_pairs(empty).is_err());
    }

    #[test]
    fn test_yaml_table_round_trip() {
        let rule: MappingRule = serde_yaml::from_str("datacenter: location\nrack: rack\n").unwrap();
        rule.validate().unwrap();
        let mapper = FactMapper::new(rule);
        assert_eq!(mapper.map("datacenter"), Some("location"));
        assert_eq!(mapper.map("location"), None);
        assert_eq!(
            mapper.rule().fact_names().collect::<Vec<_>>(),
            vec!["datacenter", "rack"]
        );
    }
}
