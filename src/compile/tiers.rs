//! Maturity tiers and the course→module tier cross-check
//!
//! A tier is an authored maturity classification. Courses must not depend on
//! modules less mature than themselves: a `production` course pulling in a
//! `draft` module is an error.

use crate::compile::diagnostics::{ContentError, Diagnostics};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Declared maturity, ordered least to most mature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Draft,
    Review,
    Production,
}

impl Tier {
    pub fn parse(value: &str) -> Option<Tier> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Tier::Draft),
            "review" => Some(Tier::Review),
            "production" => Some(Tier::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Draft => "draft",
            Tier::Review => "review",
            Tier::Production => "production",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path → declared tier, built once per run and read-only thereafter.
pub type TierMap = BTreeMap<String, Tier>;

/// Flag a violation if the course's tier is strictly more mature than the
/// referenced module's tier. Documents with no declared tier are skipped.
pub fn check_edge(tiers: &TierMap, course_path: &str, module_path: &str, diags: &mut Diagnostics) {
    let (Some(&course_tier), Some(&module_tier)) =
        (tiers.get(course_path), tiers.get(module_path))
    else {
        return;
    };
    if course_tier > module_tier {
        diags.push(ContentError::error(
            course_path,
            format!(
                "tier violation: course {} is `{}` but includes module {} which is `{}`",
                course_path, course_tier, module_path, module_tier
            ),
        ));
    }
}
