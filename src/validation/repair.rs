//! Placeholder repair for theory-of-mind prompts.
//!
//! A false-belief prompt has two natural blanks: where the object was really
//! put, and where the character believes it is. When a backend forgets the
//! blanks, the repair table finds a placement anchor and a belief anchor that
//! starts after it, then splices `{}` right after each match.
//!
//! The table is plain data ([`REPAIR_RULES`]) evaluated in order:
//! perspective-specific rules first, generic rules second.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::dataset::{count_placeholders, Perspective, PLACEHOLDER};
use crate::error::ValidatorError;
use AnchorKind::{Belief, Placement};
use Perspective::{First, Second, Third};

/// Which side of the false-belief story a rule anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// Where the object is actually placed.
    Placement,
    /// Where a character believes or searches for it.
    Belief,
}

/// One entry of the repair table.
#[derive(Debug, Clone, Copy)]
pub struct RepairRule {
    /// `None` marks a generic rule tried after the perspective rules.
    pub perspective: Option<Perspective>,
    pub anchor: AnchorKind,
    pub pattern: &'static str,
}

const fn rule(
    perspective: Option<Perspective>,
    anchor: AnchorKind,
    pattern: &'static str,
) -> RepairRule {
    RepairRule {
        perspective,
        anchor,
        pattern,
    }
}

/// Built-in repair table. Patterns are matched case-insensitively.
pub const REPAIR_RULES: &[RepairRule] = &[
    // third person
    rule(
        Some(Third),
        Placement,
        r"\b(?:puts (?:it|the .+?) (?:on|in|under|behind|inside)|moves (?:it|the .+?) to|places (?:it|the .+?) (?:on|in|under|behind)) the\b",
    ),
    rule(
        Some(Third),
        Belief,
        r"\b(?:thinks|believes|expects|assumes|searches|looks for|looked for)\b.+?\b(?:on|in|under|behind|inside) the\b",
    ),
    // first person
    rule(
        Some(First),
        Placement,
        r"\b(?:moved it to|placed it (?:on|in|under|behind)|relocated it to|moved the .+? to|put .+? (?:on|in|under|behind)) the\b",
    ),
    rule(
        Some(First),
        Belief,
        r"\bI (?:think|believe|assume|expect|search|look for|looked for)\b.+?\b(?:on|in|under|behind|inside) the\b",
    ),
    // second person
    rule(
        Some(Second),
        Placement,
        r"\b(?:moved (?:it|them|your .+?) to|placed (?:it|them|your .+?) (?:on|in|under|behind)|relocated (?:it|them|your .+?) to|put (?:it|them|your .+?) (?:on|in|under|behind)) the\b",
    ),
    rule(
        Some(Second),
        Belief,
        r"\byou (?:think|believe|assume|expect|search|look for|looked for)\b.+?\b(?:on|in|under|behind|inside) the\b",
    ),
    // generic
    rule(None, Placement, r"\b(?:on|in|under|behind|inside) the\b"),
    rule(None, Placement, r"\bmoved to the\b"),
    rule(None, Placement, r"\bplaced on the\b"),
    rule(None, Placement, r"\bput in the\b"),
    rule(
        None,
        Belief,
        r"\bthinks?(?: that)?(?: the)?(?: [\w\s]+?)? (?:is|are|was|were) (?:on|in|under|behind|inside) the\b",
    ),
    rule(
        None,
        Belief,
        r"\bbelieves?(?: that)?(?: the)?(?: [\w\s]+?)? (?:is|are|was|were) (?:on|in|under|behind|inside) the\b",
    ),
    rule(
        None,
        Belief,
        r"\bexpects?(?: that)?(?: the)?(?: [\w\s]+?)? (?:is|are|was|were) (?:on|in|under|behind|inside) the\b",
    ),
    rule(
        None,
        Belief,
        r"\bassumes?(?: that)?(?: the)?(?: [\w\s]+?)? (?:is|are|was|were) (?:on|in|under|behind|inside) the\b",
    ),
    rule(
        None,
        Belief,
        r"\blook(?:s|ed)? for(?: the)?(?: [\w\s]+?)? (?:on|in|under|behind|inside) the\b",
    ),
];

/// Why a repair attempt gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairFailure {
    #[error("no object-placement phrase found")]
    NoPlacementAnchor,

    #[error("no belief or search phrase after the placement phrase")]
    NoBeliefAnchor,

    #[error("repair produced {0} placeholders instead of 2")]
    WrongPlaceholderCount(usize),
}

struct CompiledRule {
    perspective: Option<Perspective>,
    anchor: AnchorKind,
    regex: Regex,
}

/// Compiled, immutable repair table.
pub struct RepairTable {
    rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for RepairTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairTable")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl RepairTable {
    /// Compiles the built-in table.
    pub fn compile() -> Result<Self, ValidatorError> {
        Self::from_rules(REPAIR_RULES)
    }

    /// Compiles a custom table.
    pub fn from_rules(rules: &[RepairRule]) -> Result<Self, ValidatorError> {
        let rules = rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledRule {
                        perspective: rule.perspective,
                        anchor: rule.anchor,
                        regex,
                    })
                    .map_err(|source| ValidatorError::InvalidPattern {
                        pattern: rule.pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Anchors of `kind`, perspective-specific rules before generic ones.
    fn anchors(&self, perspective: Perspective, kind: AnchorKind) -> Vec<&Regex> {
        let of_kind = || self.rules.iter().filter(move |r| r.anchor == kind);
        of_kind()
            .filter(|r| r.perspective == Some(perspective))
            .chain(of_kind().filter(|r| r.perspective.is_none()))
            .map(|r| &r.regex)
            .collect()
    }

    /// Inserts the two placeholders of a false-belief prompt.
    ///
    /// # Arguments
    ///
    /// * `prompt` - Prompt text, usually with zero or one placeholder
    /// * `perspective` - Detected narrative perspective
    ///
    /// # Returns
    ///
    /// The repaired prompt, which always has exactly two placeholders.
    pub fn repair(&self, prompt: &str, perspective: Perspective) -> Result<String, RepairFailure> {
        let beliefs = self.anchors(perspective, Belief);
        let mut placement_found = false;

        for placement in self.anchors(perspective, Placement) {
            let Some(first) = placement.find(prompt) else {
                continue;
            };
            placement_found = true;

            let second = beliefs
                .iter()
                .find_map(|belief| belief.find_at(prompt, first.end()));
            if let Some(second) = second {
                let repaired = splice(prompt, first.end(), second.end());
                return match count_placeholders(&repaired) {
                    2 => Ok(repaired),
                    n => Err(RepairFailure::WrongPlaceholderCount(n)),
                };
            }
        }

        if placement_found {
            Err(RepairFailure::NoBeliefAnchor)
        } else {
            Err(RepairFailure::NoPlacementAnchor)
        }
    }
}

/// Inserts a placeholder at both byte offsets and collapses neighbours.
fn splice(prompt: &str, first: usize, second: usize) -> String {
    let parts = [
        prompt[..first].trim_end(),
        PLACEHOLDER,
        prompt[first..second].trim(),
        PLACEHOLDER,
        prompt[second..].trim_start(),
    ];
    let mut joined = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    while joined.contains("{} {}") || joined.contains("{}{}") {
        joined = joined.replace("{} {}", PLACEHOLDER).replace("{}{}", PLACEHOLDER);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RepairTable {
        RepairTable::compile().expect("built-in patterns compile")
    }

    #[test]
    fn test_builtin_table_compiles() {
        assert!(!table().rules.is_empty());
    }

    #[test]
    fn test_third_person_repair() {
        let repaired = table()
            .repair(
                "John puts it on the table. He thinks it is on the chair",
                Perspective::Third,
            )
            .expect("repairable");
        assert_eq!(
            repaired,
            "John puts it on the {} table. He thinks it is on the {} chair"
        );
    }

    #[test]
    fn test_first_person_repair() {
        let repaired = table()
            .repair(
                "I put the keys in the drawer while Maya was out, but she says I think they are on the counter.",
                Perspective::First,
            )
            .expect("repairable");
        assert_eq!(count_placeholders(&repaired), 2);
        assert!(repaired.starts_with("I put the keys in the {} drawer"));
    }

    #[test]
    fn test_falls_back_to_generic_rules() {
        // No third-person verb pattern, only generic anchors.
        let repaired = table()
            .repair(
                "The cat sleeps under the bed. Tom believes the cat is in the garden.",
                Perspective::Third,
            )
            .expect("repairable");
        assert_eq!(count_placeholders(&repaired), 2);
    }

    #[test]
    fn test_existing_placeholder_is_collapsed() {
        let repaired = table()
            .repair(
                "John puts it on the {} table. He thinks it is on the chair",
                Perspective::Third,
            )
            .expect("repairable");
        assert_eq!(
            repaired,
            "John puts it on the {} table. He thinks it is on the {} chair"
        );
    }

    #[test]
    fn test_missing_placement_anchor() {
        assert_eq!(
            table().repair("Nobody knows anything here.", Perspective::Third),
            Err(RepairFailure::NoPlacementAnchor)
        );
    }

    #[test]
    fn test_missing_belief_anchor() {
        assert_eq!(
            table().repair("Ann puts the coin in the jar.", Perspective::Third),
            Err(RepairFailure::NoBeliefAnchor)
        );
    }

    #[test]
    fn test_too_many_placeholders_rejected() {
        let result = table().repair(
            "{} and {} then John puts it on the table. He thinks it is on the chair",
            Perspective::Third,
        );
        assert_eq!(result, Err(RepairFailure::WrongPlaceholderCount(4)));
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let rules = [RepairRule {
            perspective: None,
            anchor: AnchorKind::Placement,
            pattern: r"(unclosed",
        }];
        assert!(matches!(
            RepairTable::from_rules(&rules),
            Err(ValidatorError::InvalidPattern { .. })
        ));
    }
}
