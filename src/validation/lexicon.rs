//! Word lists behind the category plausibility checks.
//!
//! Terms match case-insensitively on word boundaries. A trailing `*` turns a
//! term into a stem: it still has to start a word but may be followed by
//! further letters (`grow*` matches "grows" and "growing").

use crate::categories::Category;

pub(crate) const CONDITIONAL_MARKERS: &[&str] = &[
    "if",
    "would",
    "could",
    "might",
    "had",
    "were",
    "without",
    "instead",
    "rather",
    "otherwise",
    "alternatively",
    "contrary",
    "scenario*",
    "hypothetical*",
];

pub(crate) const SIMILE_MARKERS: &[&str] = &[
    "like",
    "as",
    "resembling",
    "akin to",
    "similar to",
    "compared to",
    "mirrors",
    "echoes",
    "reflects",
    "metaphor*",
    "symboliz*",
    "represents",
];

pub(crate) const IMPLICIT_METAPHORS: &[&str] = &[
    "facade",
    "mask*",
    "beneath the surface",
    "symphony",
    "danc*",
    "journey*",
    "path*",
    "storm*",
    "seed*",
    "root*",
    "branch*",
    "ocean*",
    "river*",
    "mountain*",
    "bridge*",
    "door*",
    "window*",
    "wall*",
    "shadow*",
    "light*",
    "fire*",
    "ice",
    "garden*",
    "desert*",
    "heart*",
    "soul*",
    "spirit*",
    "ghost*",
    "skeleton*",
    "smoke",
    "house of cards",
    "sandcastle*",
    "bones",
];

pub(crate) const METAPHORICAL_VERBS: &[&str] = &[
    "illuminat*",
    "shine",
    "shines",
    "shining",
    "shone",
    "burn*",
    "freez*",
    "froze*",
    "grow*",
    "grew",
    "wither*",
    "soar*",
    "plummet*",
    "blossom*",
    "wilt*",
    "flow*",
    "cascad*",
    "crumbl*",
    "shatter*",
    "mend*",
    "heal",
    "heals",
    "healed",
    "healing",
];

pub(crate) const METAPHOR_SCENARIOS: &[&str] =
    &["faced with", "deep down", "beneath", "inside", "heart"];

pub(crate) const BELIEF_TERMS: &[&str] = &[
    "think*",
    "thought",
    "believ*",
    "assum*",
    "expect*",
    "doesn't know",
    "does not know",
    "didn't know",
    "doesn't realize",
    "didn't realize",
    "not aware",
    "unaware",
    "search*",
    "look for",
    "looks for",
    "looked for",
    "looking for",
    "sure",
    "convinced",
];

pub(crate) const PERSON_STATE_TERMS: &[&str] = &[
    "left",
    "leave*",
    "leaving",
    "away",
    "return*",
    "comes back",
    "came back",
    "enter*",
    "outside",
    "gone",
    "walking",
    "step*",
];

pub(crate) const ACTION_TERMS: &[&str] = &[
    "put*",
    "plac*",
    "move*",
    "moving",
    "take*",
    "took",
    "taking",
    "relocat*",
    "remov*",
    "carry",
    "carries",
    "carried",
    "hide",
    "hides",
    "hid",
    "hidden",
    "shift*",
];

pub(crate) const LOCATION_TERMS: &[&str] = &[
    "on the",
    "in the",
    "under the",
    "beside the",
    "near the",
    "at the",
    "behind the",
    "inside the",
    "off the",
];

pub(crate) const MOVEMENT_TERMS: &[&str] =
    &["from the", "to the", "onto the", "into the", "out of the"];

/// Whether `text` (already lower-cased) contains `term` on word boundaries.
pub(crate) fn contains_term(text: &str, term: &str) -> bool {
    let (needle, stem) = match term.strip_suffix('*') {
        Some(needle) => (needle, true),
        None => (term, false),
    };

    text.match_indices(needle).any(|(start, _)| {
        let starts_word = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let ends_word = stem
            || text[start + needle.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        starts_word && ends_word
    })
}

/// First term of `terms` found in `text` (already lower-cased).
pub(crate) fn first_match(text: &str, terms: &[&'static str]) -> Option<&'static str> {
    terms.iter().copied().find(|term| contains_term(text, term))
}

fn any_term(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(text, term))
}

/// Category-specific lexical plausibility check.
///
/// Categories without a vocabulary rule always pass.
pub fn is_plausible(category: Category, prompt: &str) -> bool {
    let text = prompt.to_lowercase();
    match category {
        Category::Counterfactual => any_term(&text, CONDITIONAL_MARKERS),
        Category::MetaphoricalInterpretation => {
            any_term(&text, SIMILE_MARKERS)
                || any_term(&text, IMPLICIT_METAPHORS)
                || any_term(&text, METAPHORICAL_VERBS)
                || any_term(&text, METAPHOR_SCENARIOS)
        }
        Category::TheoryOfMind => {
            let person = any_term(&text, PERSON_STATE_TERMS);
            (any_term(&text, BELIEF_TERMS) && any_term(&text, LOCATION_TERMS))
                || (person && any_term(&text, MOVEMENT_TERMS))
                || (person && any_term(&text, ACTION_TERMS))
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_term_word_boundaries() {
        assert!(contains_term("what if it rained", "if"));
        assert!(!contains_term("a quiet life", "if"));
        assert!(!contains_term("she asked him", "as"));
        assert!(contains_term("he doesn't know", "doesn't know"));
    }

    #[test]
    fn test_contains_term_stem() {
        assert!(contains_term("the vines were growing", "grow*"));
        assert!(contains_term("he thinks so", "think*"));
        assert!(!contains_term("overgrown path", "grow*"));
    }

    #[test]
    fn test_first_match() {
        assert_eq!(
            first_match("had she known, she would stay", CONDITIONAL_MARKERS),
            Some("would")
        );
        assert_eq!(first_match("plain statement", CONDITIONAL_MARKERS), None);
    }

    #[test]
    fn test_counterfactual_plausibility() {
        assert!(is_plausible(
            Category::Counterfactual,
            "Had the bridge been repaired, the convoy would have reached the {}."
        ));
        assert!(!is_plausible(
            Category::Counterfactual,
            "The convoy reached the {} on time."
        ));
    }

    #[test]
    fn test_metaphorical_plausibility() {
        assert!(is_plausible(
            Category::MetaphoricalInterpretation,
            "Her patience was a candle that slowly burned down to {}."
        ));
        assert!(!is_plausible(
            Category::MetaphoricalInterpretation,
            "The negotiation was a minefield of {}."
        ));
        assert!(is_plausible(
            Category::MetaphoricalInterpretation,
            "Deep down, his resolve was {}."
        ));
    }

    #[test]
    fn test_theory_of_mind_plausibility() {
        assert!(is_plausible(
            Category::TheoryOfMind,
            "Anna thinks the keys are on the {} and the {}."
        ));
        assert!(is_plausible(
            Category::TheoryOfMind,
            "While Ben was away, Carl moved the ball {} and {}."
        ));
        assert!(!is_plausible(
            Category::TheoryOfMind,
            "The weather today is {} and {}."
        ));
    }

    #[test]
    fn test_other_categories_always_plausible() {
        assert!(is_plausible(Category::FactualRecall, "Anything {}."));
        assert!(is_plausible(Category::SafetyAlignment, "Anything {}."));
    }
}
