//! Muscle group taxonomy: the fixed catalog of trainable body regions.
//!
//! Each muscle group carries a display name, a default recovery duration and
//! the synonym list used by exercise inference. The catalog is pure data and
//! is fixed at build time.

use crate::types::MuscleGroup;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default taxonomy - built once and reused across all operations
static DEFAULT_TAXONOMY: Lazy<Taxonomy> = Lazy::new(build_default_taxonomy_internal);

/// Catalog entry for one muscle group
#[derive(Clone, Debug)]
pub struct MuscleInfo {
    pub muscle: MuscleGroup,
    /// Stable numeric id; the foreign-key space used by
    /// `ExerciseDescriptor::explicit_muscle_group_id`
    pub numeric_id: i64,
    pub display_name: String,
    pub default_recovery_hours: f64,
    /// Keywords that identify this muscle in free-text exercise names
    pub synonyms: Vec<String>,
}

/// The complete muscle group catalog
#[derive(Clone, Debug)]
pub struct Taxonomy {
    pub muscles: HashMap<MuscleGroup, MuscleInfo>,
}

/// Get a reference to the cached default taxonomy
pub fn get_default_taxonomy() -> &'static Taxonomy {
    &DEFAULT_TAXONOMY
}

/// Builds the default taxonomy with built-in muscle groups
///
/// **Note**: For production use, prefer `get_default_taxonomy()` which returns
/// a cached reference. This function is retained for testing.
pub fn build_default_taxonomy() -> Taxonomy {
    build_default_taxonomy_internal()
}

fn entry(
    muscle: MuscleGroup,
    numeric_id: i64,
    display_name: &str,
    default_recovery_hours: f64,
    synonyms: &[&str],
) -> (MuscleGroup, MuscleInfo) {
    (
        muscle,
        MuscleInfo {
            muscle,
            numeric_id,
            display_name: display_name.into(),
            default_recovery_hours,
            synonyms: synonyms.iter().map(|s| (*s).into()).collect(),
        },
    )
}

/// Internal function that actually builds the taxonomy
fn build_default_taxonomy_internal() -> Taxonomy {
    // Calves deliberately list only explicit calf keywords: generic leg work
    // must never imply a calf stimulus.
    let muscles = HashMap::from([
        entry(
            MuscleGroup::Chest,
            1,
            "Chest",
            72.0,
            &["chest", "pec", "bench", "push-up", "pushup", "fly", "dip"],
        ),
        entry(
            MuscleGroup::Back,
            2,
            "Back",
            72.0,
            &[
                "back", "row", "pull-up", "pullup", "pulldown", "chin-up", "chinup", "lats",
            ],
        ),
        entry(
            MuscleGroup::Shoulders,
            3,
            "Shoulders",
            48.0,
            &[
                "shoulder",
                "overhead press",
                "military press",
                "lateral raise",
                "front raise",
                "delt",
                "arnold",
                "shrug",
                "face pull",
            ],
        ),
        entry(
            MuscleGroup::Biceps,
            4,
            "Biceps",
            48.0,
            &[
                "bicep",
                "bicep curl",
                "barbell curl",
                "dumbbell curl",
                "hammer curl",
                "preacher curl",
                "chin-up",
                "chinup",
            ],
        ),
        entry(
            MuscleGroup::Triceps,
            5,
            "Triceps",
            48.0,
            &[
                "tricep",
                "pushdown",
                "skull crusher",
                "skullcrusher",
                "close-grip",
                "close grip",
                "dip",
            ],
        ),
        entry(
            MuscleGroup::Quads,
            6,
            "Quadriceps",
            72.0,
            &["quad", "leg extension"],
        ),
        entry(
            MuscleGroup::Hamstrings,
            7,
            "Hamstrings",
            72.0,
            &["hamstring", "leg curl", "romanian", "rdl", "good morning", "nordic"],
        ),
        entry(
            MuscleGroup::Glutes,
            8,
            "Glutes",
            72.0,
            &["glute", "hip thrust", "bridge"],
        ),
        entry(
            MuscleGroup::Calves,
            9,
            "Calves",
            48.0,
            &["calf", "calves", "heel raise", "toe raise", "toe press"],
        ),
        entry(
            MuscleGroup::Abs,
            10,
            "Abs",
            24.0,
            &["abs", "core", "crunch", "plank", "sit-up", "situp", "leg raise"],
        ),
        entry(
            MuscleGroup::FullBody,
            11,
            "Full Body",
            48.0,
            &["full body", "full-body", "total body", "burpee"],
        ),
    ]);

    Taxonomy { muscles }
}

impl Taxonomy {
    /// Look up the catalog entry for a muscle group
    pub fn info(&self, muscle: MuscleGroup) -> Option<&MuscleInfo> {
        self.muscles.get(&muscle)
    }

    /// Display name for a muscle group, falling back to the canonical key
    pub fn display_name(&self, muscle: MuscleGroup) -> &str {
        self.info(muscle)
            .map_or_else(|| muscle.key(), |info| info.display_name.as_str())
    }

    /// Default recovery duration for a muscle group, in hours
    pub fn default_recovery_hours(&self, muscle: MuscleGroup) -> f64 {
        self.info(muscle).map_or(48.0, |info| info.default_recovery_hours)
    }

    /// Resolve a numeric catalog id (e.g. a backend foreign key)
    pub fn by_numeric_id(&self, id: i64) -> Option<MuscleGroup> {
        self.muscles
            .values()
            .find(|info| info.numeric_id == id)
            .map(|info| info.muscle)
    }

    /// Resolve a free-text name against canonical keys and display names.
    ///
    /// Input is normalized (lowercased, trimmed) before matching.
    pub fn by_name(&self, name: &str) -> Option<MuscleGroup> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if let Some(muscle) = MuscleGroup::from_key(&normalized) {
            return Some(muscle);
        }
        self.muscles
            .values()
            .find(|info| info.display_name.to_lowercase() == normalized)
            .map(|info| info.muscle)
    }

    /// Validate the taxonomy for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen_ids = HashMap::new();

        for muscle in MuscleGroup::all() {
            let Some(info) = self.muscles.get(muscle) else {
                errors.push(format!("Taxonomy missing entry for '{}'", muscle.key()));
                continue;
            };

            if info.muscle != *muscle {
                errors.push(format!(
                    "Taxonomy key '{}' doesn't match entry muscle '{}'",
                    muscle.key(),
                    info.muscle.key()
                ));
            }
            if info.display_name.is_empty() {
                errors.push(format!("Muscle '{}' has empty display name", muscle.key()));
            }
            if info.default_recovery_hours <= 0.0 {
                errors.push(format!(
                    "Muscle '{}' has non-positive recovery hours",
                    muscle.key()
                ));
            }
            if info.synonyms.is_empty() {
                errors.push(format!("Muscle '{}' has no synonyms", muscle.key()));
            }
            if let Some(other) = seen_ids.insert(info.numeric_id, info.muscle) {
                errors.push(format!(
                    "Muscles '{}' and '{}' share numeric id {}",
                    other.key(),
                    info.muscle.key(),
                    info.numeric_id
                ));
            }
        }

        errors
    }
}
