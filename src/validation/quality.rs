//! Surface quality gate for traditional prompts.

use super::outcome::RejectReason;

/// Characters a prompt may end with.
pub const ACCEPTED_TERMINALS: [char; 6] = ['?', '.', ':', '!', '{', '}'];

/// Ellipses allowed before a prompt reads as rambling.
pub const MAX_ELLIPSES: usize = 2;

/// Checks word count, terminal character and ellipsis count.
///
/// Returns every failing reason; an empty list means the prompt passes.
pub fn check_quality(prompt: &str, min_words: usize) -> Vec<RejectReason> {
    let mut reasons = Vec::new();

    let words = prompt.split_whitespace().count();
    if words < min_words {
        reasons.push(RejectReason::TooShort {
            words,
            min: min_words,
        });
    }

    let ends_well = prompt
        .trim()
        .chars()
        .next_back()
        .is_some_and(|c| ACCEPTED_TERMINALS.contains(&c));
    if !ends_well {
        reasons.push(RejectReason::BadTerminal);
    }

    let ellipses = prompt.matches("...").count() + prompt.matches('\u{2026}').count();
    if ellipses > MAX_ELLIPSES {
        reasons.push(RejectReason::TooManyEllipses { count: ellipses });
    }

    reasons
}
