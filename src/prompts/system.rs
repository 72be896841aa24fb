//! System messages for the three request shapes.

/// System message for traditional (single answer pair) batches.
pub const TRADITIONAL_SYSTEM: &str = r#"You are a creative dataset generator producing fill-in-the-blank prompts with rich metadata.

Return a valid JSON object with exactly this structure:
{
  "results": [
    {
      "prompt": "Full text of the prompt with {} placeholders",
      "name_pair": ["correct_answer", "distractor"],
      "complexity": "low|medium|high",
      "reasoning_depth": 1-5,
      "distractors_present": true|false,
      "perspective": "first|second|third"
    }
  ]
}

## METADATA DIVERSITY

Spread the metadata across the batch:
- complexity: roughly even across low, medium and high
- reasoning_depth: use the full 1-5 range, roughly evenly
- distractors_present: 40-60% of prompts should contain distractors
- perspective: about 30% first-person, 20% second-person, 50% third-person

Perspective meanings:
- first: the model's own viewpoint ("I analyzed...", "When I processed the data...")
- second: addressing the reader ("You entered the room...", "Your approach...")
- third: other people or entities ("John believes...", "The company decided...")

## THEORY OF MIND

Theory-of-mind prompts keep the false-belief shape of the seeds, with TWO placeholders:
- first-person: "I put the report in folder A, but my colleague moved it to the {}. When I reconnected, I looked for the report in the {}"
- second-person: "You placed your keys on the counter. Your roommate moved them to the {}. When you returned, you looked for your keys on the {}"

## OUTPUT

The response MUST be valid JSON: every key and string quoted, no trailing commas,
no text before or after the JSON object."#;

/// System message for forking (multi-placeholder) batches.
///
/// `{count}` is replaced with the required placeholder count.
const FORKING_SYSTEM_TEMPLATE: &str = r#"You are a creative dataset generator producing prompts with several decision points.

Return a valid JSON object with exactly this structure:
{
  "results": [
    {
      "prompt": "Text with EXACTLY {count} {} placeholders",
      "placeholder_pairs": [["option A", "option B"], ...],
      "forking_index": 1,
      "complexity": "low|medium|high",
      "reasoning_depth": 1-5,
      "perspective": "first|second|third"
    }
  ]
}

These prompts capture "forking tokens": decision points where the choice changes
everything that follows.

## RULES

1. Every prompt contains EXACTLY {count} placeholders written as {}
2. Give one [expected_continuation, alternative_continuation] pair per placeholder
3. The number of placeholder_pairs MUST equal the number of placeholders
4. forking_index is the 0-based position of the placeholder whose choice matters most
5. The final placeholder tests the core concept of the category

## METADATA DIVERSITY

- complexity: roughly even across low, medium and high
- reasoning_depth: use the full 1-5 range, roughly evenly
- perspective: about 30% first-person, 20% second-person, 50% third-person

## OUTPUT

The response MUST be valid JSON: every key and string quoted, no trailing commas,
no comments, no text before or after the JSON object."#;

/// System message for the plain-text fallback.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a creative dataset generator. \
Format your response in plain text as follows:

PROMPT: ...
CORRECT: ...
DISTRACTOR: ...
COMPLEXITY: [low/medium/high]
REASONING_DEPTH: [1-5]
DISTRACTORS_PRESENT: [true/false]

Start every new prompt with its own PROMPT: line.";

/// Forking system message for prompts with `count` placeholders.
pub fn forking_system(count: usize) -> String {
    FORKING_SYSTEM_TEMPLATE.replace("{count}", &count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forking_system_injects_count() {
        let message = forking_system(4);
        assert!(message.contains("EXACTLY 4 placeholders"));
        assert!(!message.contains("{count}"));
    }

    #[test]
    fn test_plain_text_system_has_no_json_hint() {
        assert!(!PLAIN_TEXT_SYSTEM.contains("JSON"));
        assert!(PLAIN_TEXT_SYSTEM.contains("PROMPT:"));
    }
}
