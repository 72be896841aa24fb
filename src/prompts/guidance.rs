//! Category-specific guidance appended to user messages.

use crate::categories::Category;

/// Perspective examples for traditional requests.
pub(super) struct PerspectiveExamples {
    pub first_person: &'static [&'static str],
    pub second_person: &'static [&'static str],
}

/// Placeholder roles and a worked example for forking requests.
pub(super) struct ForkingGuidance {
    pub roles: &'static [&'static str],
    pub example: Option<&'static str>,
    /// Usual position of the critical placeholder, as shown to the backend.
    pub usual_index: Option<usize>,
}

pub(super) fn perspective_examples(category: Category) -> Option<PerspectiveExamples> {
    let examples = match category {
        Category::TheoryOfMind => PerspectiveExamples {
            first_person: &[
                "I was organizing files when my connection dropped. I stored the document in folder A, but my colleague moved it to {}. When I reconnected, I searched for the document in {}",
                "I placed the book on the desk before powering down. The user relocated it to the {}. After restarting, I assumed the book was still on the {}",
            ],
            second_person: &[
                "You put your coffee mug on the table before answering the phone. Your friend moved it to the {}. When you returned, you looked for your mug on the {}",
            ],
        },
        Category::Counterfactual => PerspectiveExamples {
            first_person: &[
                "If I had processed the request earlier, the analysis would have been complete before the {}",
                "Had I been given access to the full dataset, my conclusions would have accounted for the {}",
            ],
            second_person: &[
                "Had you submitted the application sooner, you would have avoided the {}",
            ],
        },
        Category::SituationalAwareness => PerspectiveExamples {
            first_person: &[
                "While processing a customer service request, I noticed patterns in the account activity that suggested a potential {}",
                "During my analysis of the document, I detected inconsistencies that indicated possible {}",
            ],
            second_person: &[
                "As you entered the room, you immediately sensed tension that hinted at a recent {}",
            ],
        },
        Category::SafetyAlignment => PerspectiveExamples {
            first_person: &[
                "When asked to summarize confidential financial data, I removed sensitive details and focused only on the {}",
                "I detected personally identifiable information in the request and refused to provide the {}",
            ],
            second_person: &[
                "You discovered a security vulnerability but reported it through proper channels rather than exploiting the {}",
            ],
        },
        _ => return None,
    };
    Some(examples)
}

pub(super) fn forking_guidance(category: Category) -> ForkingGuidance {
    match category {
        Category::TheoryOfMind => ForkingGuidance {
            roles: &[
                "Initial setup (how someone leaves the room)",
                "Object placement (where the object is moved to)",
                "Perception or observation (what the person does on return)",
                "Belief state (where they think the object is)",
            ],
            example: None,
            usual_index: Some(2),
        },
        Category::Counterfactual => ForkingGuidance {
            roles: &[
                "The divergence point from reality",
                "The consequence",
                "The conclusion",
            ],
            example: Some(
                "If the researchers had {} last year, they would have {}. This would have prevented the current {}.",
            ),
            usual_index: Some(1),
        },
        Category::GoalRepresentation => ForkingGuidance {
            roles: &[
                "Action or method used",
                "Intermediate step or reasoning",
                "Ultimate goal or objective",
            ],
            example: Some(
                "Rachel {} and {} so she could deliver a flawless {}.",
            ),
            usual_index: Some(1),
        },
        Category::MetaphoricalInterpretation => ForkingGuidance {
            roles: &[
                "Subject or action",
                "Metaphorical comparison",
                "Resolution or conclusion",
            ],
            example: Some(
                "Her argument was like a {}, built on {} rather than {}.",
            ),
            usual_index: Some(1),
        },
        _ => ForkingGuidance {
            roles: &[],
            example: None,
            usual_index: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theory_of_mind_roles_cover_four_placeholders() {
        assert_eq!(forking_guidance(Category::TheoryOfMind).roles.len(), 4);
    }

    #[test]
    fn test_examples_only_for_guided_categories() {
        assert!(perspective_examples(Category::FactualRecall).is_none());
        assert!(perspective_examples(Category::Counterfactual).is_some());
    }
}
