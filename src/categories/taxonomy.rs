//! The fixed set of cognitive-task categories.
//!
//! Every category carries its structural contract: how many placeholders a
//! prompt of each variant may contain and how long a traditional prompt has to
//! be before it passes the quality gate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The seven cognitive-task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TheoryOfMind,
    Counterfactual,
    GoalRepresentation,
    SituationalAwareness,
    SafetyAlignment,
    FactualRecall,
    MetaphoricalInterpretation,
}

/// Returned when a category name is not part of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category '{0}' (expected one of: {names})", names = Category::names().join(", "))]
pub struct UnknownCategory(pub String);

impl Category {
    /// Returns all categories in catalog order.
    pub fn all() -> Vec<Category> {
        vec![
            Category::TheoryOfMind,
            Category::Counterfactual,
            Category::GoalRepresentation,
            Category::SituationalAwareness,
            Category::SafetyAlignment,
            Category::FactualRecall,
            Category::MetaphoricalInterpretation,
        ]
    }

    /// Returns the snake_case names of all categories.
    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(Category::as_str).collect()
    }

    /// Returns the snake_case name used in the dataset file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TheoryOfMind => "theory_of_mind",
            Category::Counterfactual => "counterfactual",
            Category::GoalRepresentation => "goal_representation",
            Category::SituationalAwareness => "situational_awareness",
            Category::SafetyAlignment => "safety_alignment",
            Category::FactualRecall => "factual_recall",
            Category::MetaphoricalInterpretation => "metaphorical_interpretation",
        }
    }

    /// Returns the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::TheoryOfMind => "Theory of Mind",
            Category::Counterfactual => "Counterfactual Reasoning",
            Category::GoalRepresentation => "Goal Representation",
            Category::SituationalAwareness => "Situational Awareness",
            Category::SafetyAlignment => "Safety Alignment",
            Category::FactualRecall => "Factual Recall",
            Category::MetaphoricalInterpretation => "Metaphorical Interpretation",
        }
    }

    /// Placeholder bounds for a traditional prompt.
    pub fn traditional_range(&self) -> PlaceholderRange {
        match self {
            Category::TheoryOfMind => PlaceholderRange::exactly(2),
            _ => PlaceholderRange::exactly(1),
        }
    }

    /// Placeholder bounds for a forking prompt.
    pub fn forking_range(&self) -> PlaceholderRange {
        match self {
            Category::TheoryOfMind => PlaceholderRange::new(2, 4),
            Category::GoalRepresentation => PlaceholderRange::new(2, 3),
            _ => PlaceholderRange::exactly(3),
        }
    }

    /// Minimum word count a traditional prompt needs to pass the quality gate.
    pub fn min_words(&self) -> usize {
        match self {
            Category::FactualRecall => 5,
            Category::SafetyAlignment => 10,
            Category::MetaphoricalInterpretation => 8,
            _ => 20,
        }
    }

    /// Hard categories get a larger generation target and extra retry share
    /// for high-capability backends.
    pub fn is_hard(&self) -> bool {
        matches!(self, Category::TheoryOfMind)
    }

    /// Default forking index for a prompt with `count` placeholders.
    pub fn default_forking_index(&self, count: usize) -> usize {
        let preferred = match self {
            Category::TheoryOfMind => 2,
            _ => 1,
        };
        preferred.min(count.saturating_sub(1))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Category::all()
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Inclusive bounds on the number of `{}` placeholders in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderRange {
    pub min: usize,
    pub max: usize,
}

impl PlaceholderRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn exactly(count: usize) -> Self {
        Self::new(count, count)
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl std::fmt::Display for PlaceholderRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}
