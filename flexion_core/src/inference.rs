//! Exercise to muscle-group inference.
//!
//! Resolution order for one exercise, all results unioned (a compound lift
//! legitimately touches several muscles):
//! 1. Explicit catalog id on the exercise
//! 2. Explicit free-text muscle names on the exercise
//! 3. Keyword scan of name + description against an ordered rule table
//!
//! The keyword scan is data, not code: an ordered list of
//! (keywords, muscle set) rules, so new exercises and synonyms are rule
//! edits rather than logic changes. No match returns the empty set; the
//! fallback policy belongs to the caller.

use crate::taxonomy::{get_default_taxonomy, Taxonomy};
use crate::types::{ExerciseDescriptor, MuscleGroup};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// Cached rule table for the default taxonomy
static DEFAULT_RULES: Lazy<RuleTable> =
    Lazy::new(|| RuleTable::from_taxonomy(get_default_taxonomy()));

/// Keywords that indicate a compound lower-body movement.
///
/// These stamp quads, hamstrings and glutes together; calves are excluded on
/// purpose and only ever match through their own explicit keywords.
const COMPOUND_LOWER_KEYWORDS: &[&str] = &[
    "squat",
    "leg press",
    "lunge",
    "deadlift",
    "step-up",
    "step up",
    "stepup",
    "split squat",
];

/// One keyword-matching rule: if any keyword is a substring of the
/// normalized exercise text, the whole muscle set is included.
#[derive(Clone, Debug)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub muscles: Vec<MuscleGroup>,
}

impl KeywordRule {
    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}

/// Ordered keyword rule table for the fallback scan
#[derive(Clone, Debug)]
pub struct RuleTable {
    rules: Vec<KeywordRule>,
}

impl RuleTable {
    /// Build the rule table for a taxonomy: the compound lower-body rule
    /// first, then one single-muscle rule per catalog synonym list.
    pub fn from_taxonomy(taxonomy: &Taxonomy) -> Self {
        let mut rules = vec![KeywordRule {
            keywords: COMPOUND_LOWER_KEYWORDS.iter().map(|k| (*k).into()).collect(),
            muscles: vec![
                MuscleGroup::Quads,
                MuscleGroup::Hamstrings,
                MuscleGroup::Glutes,
            ],
        }];

        for muscle in MuscleGroup::all() {
            if let Some(info) = taxonomy.info(*muscle) {
                rules.push(KeywordRule {
                    keywords: info.synonyms.clone(),
                    muscles: vec![*muscle],
                });
            }
        }

        Self { rules }
    }

    /// Scan a normalized haystack and union every matching rule's muscles
    pub fn scan(&self, haystack: &str) -> BTreeSet<MuscleGroup> {
        let mut matched = BTreeSet::new();
        for rule in &self.rules {
            if rule.matches(haystack) {
                matched.extend(rule.muscles.iter().copied());
            }
        }
        matched
    }
}

/// Infer the muscle groups an exercise trains, using the default taxonomy.
///
/// Returns the empty set when nothing matches; see the module docs for the
/// fallback policy.
pub fn infer_muscles(exercise: &ExerciseDescriptor) -> BTreeSet<MuscleGroup> {
    infer_muscles_with(get_default_taxonomy(), &DEFAULT_RULES, exercise)
}

/// Infer muscles against an explicit taxonomy and rule table
pub fn infer_muscles_with(
    taxonomy: &Taxonomy,
    rules: &RuleTable,
    exercise: &ExerciseDescriptor,
) -> BTreeSet<MuscleGroup> {
    let mut muscles = BTreeSet::new();

    // Step 1: explicit catalog id
    if let Some(id) = exercise.explicit_muscle_group_id {
        match taxonomy.by_numeric_id(id) {
            Some(muscle) => {
                muscles.insert(muscle);
            }
            None => {
                tracing::debug!("Exercise '{}' has unknown muscle group id {}", exercise.name, id);
            }
        }
    }

    // Step 2: explicit free-text muscle names
    if let Some(ref names) = exercise.explicit_muscle_groups {
        for name in names {
            if let Some(muscle) = taxonomy.by_name(name) {
                muscles.insert(muscle);
            } else {
                tracing::debug!(
                    "Exercise '{}' tagged with unknown muscle name '{}'",
                    exercise.name,
                    name
                );
            }
        }
    }

    // Step 3: keyword scan over name + description
    let mut haystack = exercise.name.to_lowercase();
    if let Some(ref description) = exercise.description {
        haystack.push(' ');
        haystack.push_str(&description.to_lowercase());
    }
    muscles.extend(rules.scan(&haystack));

    muscles
}
