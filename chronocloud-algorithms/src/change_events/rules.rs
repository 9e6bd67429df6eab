//! Rule-based filtering and classification of change events over their [FeatureTable]. Rules are usually read
//! from JSON:
//!
//! ```
//! # use chronocloud_algorithms::change_events::RuleSet;
//! let rules: RuleSet = serde_json::from_str(r#"{
//!     "rockfall": {"change_mean": {"max": -0.1}, "hull_volume": {"min": 0.5}},
//!     "accumulation": {"change_mean": {"min": 0.1}}
//! }"#).unwrap();
//! assert_eq!(rules.labels().collect::<Vec<_>>(), vec!["rockfall", "accumulation"]);
//! ```

use std::{collections::BTreeMap, fmt};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer,
};

use super::features::{FeatureTable, FeatureValue};

/// A condition on the value of a single feature
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Value is a number `>=` the bound
    Min(f64),
    /// Value is a number `<=` the bound
    Max(f64),
    Exact(FeatureValue),
    In(Vec<FeatureValue>),
    NotIn(Vec<FeatureValue>),
}

impl Condition {
    /// Evaluates the condition. A missing value (absent or NaN) fails every condition
    pub fn is_satisfied_by(&self, value: Option<&FeatureValue>) -> bool {
        let value = match value {
            Some(value) if !value.is_missing() => value,
            _ => return false,
        };
        match self {
            Condition::Min(bound) => value.as_number().map_or(false, |v| v >= *bound),
            Condition::Max(bound) => value.as_number().map_or(false, |v| v <= *bound),
            Condition::Exact(expected) => value == expected,
            Condition::In(candidates) => candidates.contains(value),
            Condition::NotIn(candidates) => !candidates.contains(value),
        }
    }
}

/// JSON form of the conditions on one feature, e.g. `{"min": 0.1, "max": 1.0}`
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConditionSpec {
    min: Option<f64>,
    max: Option<f64>,
    exact: Option<FeatureValue>,
    #[serde(rename = "in")]
    in_values: Option<Vec<FeatureValue>>,
    not_in: Option<Vec<FeatureValue>>,
}

impl From<ConditionSpec> for Vec<Condition> {
    fn from(spec: ConditionSpec) -> Self {
        let mut conditions = vec![];
        if let Some(min) = spec.min {
            conditions.push(Condition::Min(min));
        }
        if let Some(max) = spec.max {
            conditions.push(Condition::Max(max));
        }
        if let Some(exact) = spec.exact {
            conditions.push(Condition::Exact(exact));
        }
        if let Some(in_values) = spec.in_values {
            conditions.push(Condition::In(in_values));
        }
        if let Some(not_in) = spec.not_in {
            conditions.push(Condition::NotIn(not_in));
        }
        conditions
    }
}

/// Conditions on named features. A feature table matches the rule if it satisfies every condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    conditions: Vec<(String, Condition)>,
}

impl Rule {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_condition<S: Into<String>>(mut self, feature: S, condition: Condition) -> Self {
        self.conditions.push((feature.into(), condition));
        self
    }

    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    pub fn matches(&self, features: &FeatureTable) -> bool {
        self.conditions
            .iter()
            .all(|(feature, condition)| condition.is_satisfied_by(features.get(feature)))
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let specs = BTreeMap::<String, ConditionSpec>::deserialize(deserializer)?;
        let conditions = specs
            .into_iter()
            .flat_map(|(feature, spec)| {
                Vec::<Condition>::from(spec)
                    .into_iter()
                    .map(move |condition| (feature.clone(), condition))
            })
            .collect();
        Ok(Self { conditions })
    }
}

/// Ordered list of labelled rules. The first rule that matches determines the label of an event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<(String, Rule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_rule<S: Into<String>>(mut self, label: S, rule: Rule) -> Self {
        self.rules.push((label.into(), rule));
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Label of the first rule matching the features, if any
    pub fn classify(&self, features: &FeatureTable) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, rule)| rule.matches(features))
            .map(|(label, _)| label.as_str())
    }
}

struct RuleSetVisitor;

impl<'de> Visitor<'de> for RuleSetVisitor {
    type Value = RuleSet;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from labels to rules")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RuleSet, A::Error> {
        let mut rules = vec![];
        while let Some((label, rule)) = map.next_entry::<String, Rule>()? {
            rules.push((label, rule));
        }
        Ok(RuleSet { rules })
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RuleSetVisitor)
    }
}
