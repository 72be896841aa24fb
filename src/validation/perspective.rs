//! Narrative perspective detection for theory-of-mind prompts.

use super::lexicon::contains_term;
use crate::dataset::Perspective;

const FIRST_PERSON_MARKERS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "i'm", "i've", "i'll", "i'd",
];

const SECOND_PERSON_MARKERS: &[&str] = &[
    "you", "your", "yours", "yourself", "you're", "you've", "you'll", "you'd",
];

const FIRST_PERSON_BELIEFS: &[&str] = &[
    "i think",
    "i believe",
    "i assume",
    "i expect",
    "i search",
    "i look for",
    "i thought",
];

const SECOND_PERSON_BELIEFS: &[&str] = &[
    "you think",
    "you believe",
    "you assume",
    "you expect",
    "you search",
    "you look for",
    "you thought",
];

const THIRD_PERSON_BELIEFS: &[&str] = &[
    "thinks",
    "believes",
    "assumes",
    "expects",
    "doesn't know",
    "does not know",
    "searches",
    "looks for",
    "looked for",
];

fn normalize(prompt: &str) -> String {
    prompt.replace(['\u{2019}', '\u{2018}'], "'").to_lowercase()
}

/// Detects the narrative perspective of `prompt` from its pronouns.
///
/// First-person markers win over second-person ones; a prompt with neither
/// is third-person.
pub fn detect_perspective(prompt: &str) -> Perspective {
    let text = normalize(prompt);
    let words: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect();

    if words.iter().any(|w| FIRST_PERSON_MARKERS.contains(w)) {
        Perspective::First
    } else if words.iter().any(|w| SECOND_PERSON_MARKERS.contains(w)) {
        Perspective::Second
    } else {
        Perspective::Third
    }
}

/// Whether `prompt` contains a belief phrase phrased for `perspective`.
pub fn has_belief_phrase(prompt: &str, perspective: Perspective) -> bool {
    let phrases = match perspective {
        Perspective::First => FIRST_PERSON_BELIEFS,
        Perspective::Second => SECOND_PERSON_BELIEFS,
        Perspective::Third => THIRD_PERSON_BELIEFS,
    };
    let text = normalize(prompt);
    phrases.iter().any(|phrase| contains_term(&text, phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_first_person() {
        assert_eq!(
            detect_perspective("I put my keys on the shelf before you arrived."),
            Perspective::First
        );
        assert_eq!(
            detect_perspective("Later I\u{2019}m sure the cup is gone."),
            Perspective::First
        );
    }

    #[test]
    fn test_detects_second_person() {
        assert_eq!(
            detect_perspective("You leave your phone in the drawer."),
            Perspective::Second
        );
    }

    #[test]
    fn test_defaults_to_third_person() {
        assert_eq!(
            detect_perspective("Sam hides the apple in the basket."),
            Perspective::Third
        );
        // "it" and "in" must not be mistaken for "i"
        assert_eq!(detect_perspective("It is in the box."), Perspective::Third);
    }

    #[test]
    fn test_belief_phrase_per_perspective() {
        assert!(has_belief_phrase(
            "He thinks it is on the chair",
            Perspective::Third
        ));
        assert!(has_belief_phrase(
            "When I return, I think the ball is in the box",
            Perspective::First
        ));
        assert!(!has_belief_phrase(
            "He thinks it is on the chair",
            Perspective::First
        ));
        assert!(has_belief_phrase(
            "You believe the note is under the lamp",
            Perspective::Second
        ));
    }
}
