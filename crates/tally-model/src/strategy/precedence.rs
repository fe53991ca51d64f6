use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::LabelSet;
use crate::error::{ModelError, ModelResult};

/// Resolves key collisions between inherited and more specific labels.
///
/// Applied twice per instance: collector labels against the static labels of a
/// family, then family labels against the labels passed at the call site.
///
/// - `Specific`: the more specific (later applied) value wins.
/// - `Inherited`: the inherited value wins and the specific one is dropped.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelPrecedence {
    #[default]
    Specific,
    Inherited,
}

impl LabelPrecedence {
    /// Merge `specific` into `inherited` according to this policy.
    pub fn resolve(&self, inherited: &LabelSet, specific: &LabelSet) -> LabelSet {
        match self {
            LabelPrecedence::Specific => LabelSet::merge(inherited, specific),
            LabelPrecedence::Inherited => LabelSet::merge(specific, inherited),
        }
    }
}

impl FromStr for LabelPrecedence {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "specific" => Ok(LabelPrecedence::Specific),
            "inherited" => Ok(LabelPrecedence::Inherited),
            _ => Err(ModelError::InvalidValue {
                field: "precedence",
                value: s.to_string(),
            }),
        }
    }
}
