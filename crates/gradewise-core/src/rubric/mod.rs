//! Rubric loading: parse a declarative rubric, merge language overrides and
//! validate it against the rule registry.
//!
//! A rubric is a TOML (or JSON) document with an ordered `[[criteria]]`
//! list. Language overrides may be written inline on a criterion
//! (`[criteria.language_overrides.<lang>]`) or in a top-level
//! `[overrides.<lang>.<criterion>]` table; both end up in
//! [`Criterion::language_overrides`].

pub mod error;
pub mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Dimension;
use crate::rules::{RuleParams, RuleRegistry};

pub use error::{RubricConfigError, ValidationIssue};
pub use validate::{is_valid_criterion_id, validate};

/// Every valid rubric awards exactly this many points in total.
pub const RUBRIC_TOTAL_POINTS: f64 = 100.0;

const BUILTIN_RUBRIC: &str = include_str!("../../rubrics/default.toml");

/// One scoring line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Criterion {
    pub id: String,
    pub dimension: Dimension,
    pub max_points: f64,
    /// Registry name of the rule strategy.
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default rule parameters.
    #[serde(default)]
    pub params: RuleParams,
    /// Lowercased language tag → parameter overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub language_overrides: BTreeMap<String, RuleParams>,
}

impl Criterion {
    /// Default params with the language override's keys replacing them.
    pub fn effective_params(&self, language: &str) -> RuleParams {
        let mut params = self.params.clone();
        if let Some(overrides) = self.language_overrides.get(&normalize_language(language)) {
            for (key, value) in overrides {
                params.insert(key.clone(), value.clone());
            }
        }
        params
    }
}

/// Language → criterion id → parameter overrides.
type OverrideTable = BTreeMap<String, BTreeMap<String, RuleParams>>;

/// On-disk document shape.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RubricDocument {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    dimensions: BTreeMap<String, f64>,
    #[serde(default)]
    criteria: Vec<Criterion>,
    #[serde(default)]
    overrides: OverrideTable,
}

fn default_version() -> String {
    "1".to_string()
}

/// A parsed rubric. Call [`validate`] (or use [`RubricLoader`]) before
/// evaluating with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricDefinition {
    pub version: String,
    /// Declared dimension weights as written; only checked, never used for scoring.
    pub declared_weights: BTreeMap<String, f64>,
    /// Criteria in scoring order.
    pub criteria: Vec<Criterion>,
    /// Top-level overrides naming a criterion that does not exist,
    /// as `(language, criterion_id)`.
    pub dangling_overrides: Vec<(String, String)>,
}

impl RubricDefinition {
    pub fn from_toml_str(input: &str) -> Result<Self, RubricConfigError> {
        let doc: RubricDocument = toml::from_str(input)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_json_str(input: &str) -> Result<Self, RubricConfigError> {
        let doc: RubricDocument = serde_json::from_str(input)?;
        Ok(Self::from_document(doc))
    }

    /// Read and parse `path`: `.json` files as JSON, anything else as TOML.
    pub fn from_path(path: &Path) -> Result<Self, RubricConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| RubricConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&input)
        } else {
            Self::from_toml_str(&input)
        }
    }

    /// The embedded default rubric, validated against the built-in rules.
    pub fn builtin() -> Result<Self, RubricConfigError> {
        RubricLoader::new(RuleRegistry::builtin()).load_toml_str(BUILTIN_RUBRIC)
    }

    fn from_document(doc: RubricDocument) -> Self {
        let mut criteria = doc.criteria;
        for criterion in &mut criteria {
            criterion.language_overrides = std::mem::take(&mut criterion.language_overrides)
                .into_iter()
                .map(|(lang, params)| (normalize_language(&lang), params))
                .collect();
        }

        let mut dangling_overrides = Vec::new();
        for (language, per_criterion) in doc.overrides {
            let language = normalize_language(&language);
            for (criterion_id, params) in per_criterion {
                match criteria.iter_mut().find(|c| c.id == criterion_id) {
                    Some(criterion) => criterion
                        .language_overrides
                        .entry(language.clone())
                        .or_default()
                        .extend(params),
                    None => dangling_overrides.push((language.clone(), criterion_id)),
                }
            }
        }

        Self {
            version: doc.version,
            declared_weights: doc.dimensions,
            criteria,
            dangling_overrides,
        }
    }

    /// Weight of `dimension`: the sum of its criteria's `max_points`.
    pub fn dimension_weight(&self, dimension: Dimension) -> f64 {
        self.criteria
            .iter()
            .filter(|c| c.dimension == dimension)
            .map(|c| c.max_points)
            .sum()
    }

    pub fn total_points(&self) -> f64 {
        self.criteria.iter().map(|c| c.max_points).sum()
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    /// Dimensions that have at least one criterion, in fixed order.
    pub fn dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.criteria.iter().any(|c| c.dimension == *d))
            .collect()
    }
}

/// Parses rubrics and rejects any that fail validation.
#[derive(Debug, Clone)]
pub struct RubricLoader {
    registry: RuleRegistry,
}

impl RubricLoader {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn load(&self, path: &Path) -> Result<RubricDefinition, RubricConfigError> {
        self.checked(RubricDefinition::from_path(path)?)
    }

    pub fn load_toml_str(&self, input: &str) -> Result<RubricDefinition, RubricConfigError> {
        self.checked(RubricDefinition::from_toml_str(input)?)
    }

    pub fn load_json_str(&self, input: &str) -> Result<RubricDefinition, RubricConfigError> {
        self.checked(RubricDefinition::from_json_str(input)?)
    }

    fn checked(&self, def: RubricDefinition) -> Result<RubricDefinition, RubricConfigError> {
        let issues = validate(&def, &self.registry);
        if issues.is_empty() {
            tracing::debug!(
                criteria = def.criteria.len(),
                version = %def.version,
                "rubric loaded"
            );
            Ok(def)
        } else {
            Err(RubricConfigError::Invalid { issues })
        }
    }
}

pub(crate) fn normalize_language(language: &str) -> String {
    language.trim().to_ascii_lowercase()
}
