//! Request envelope construction.
//!
//! Builders are pure functions of their inputs plus an injected RNG, which
//! only decides which seed examples a traditional request shows.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::guidance::{forking_guidance, perspective_examples};
use super::system::{forking_system, PLAIN_TEXT_SYSTEM, TRADITIONAL_SYSTEM};
use crate::categories::{Category, CategoryDefinition};
use crate::dataset::{AnswerPair, VariantKind};

/// Sampling temperature for traditional batches.
pub const TRADITIONAL_TEMPERATURE: f64 = 0.9;
/// Sampling temperature for forking batches.
pub const FORKING_TEMPERATURE: f64 = 0.8;
/// Output budget per requested traditional prompt.
pub const TRADITIONAL_TOKENS_PER_PROMPT: u32 = 160;
/// Output budget per requested forking prompt.
pub const FORKING_TOKENS_PER_PROMPT: u32 = 250;
/// Floor on the output budget of structured requests.
pub const MIN_MAX_TOKENS: u32 = 2048;

/// Seed examples shown per traditional request.
const SEED_EXAMPLES: usize = 2;

/// Everything a backend needs to produce one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub category: Category,
    pub variant: VariantKind,
    /// Backend model identifier.
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask for a structured JSON object.
    pub json_output: bool,
    /// Number of prompts requested.
    pub requested: usize,
}

fn count_word(count: usize) -> String {
    match count {
        1 => "ONE".to_string(),
        2 => "TWO".to_string(),
        3 => "THREE".to_string(),
        4 => "FOUR".to_string(),
        n => n.to_string(),
    }
}

fn format_pairs(pairs: &[AnswerPair]) -> String {
    let inner: Vec<String> = pairs
        .iter()
        .map(|pair| format!("[\"{}\", \"{}\"]", pair.correct(), pair.distractor()))
        .collect();
    format!("[{}]", inner.join(", "))
}

fn sample_seeds<'a>(definition: &'a CategoryDefinition, rng: &mut ChaCha8Rng) -> Vec<&'a str> {
    let mut indices: Vec<usize> = (0..definition.seed_templates.len()).collect();
    indices.shuffle(rng);
    indices
        .into_iter()
        .take(SEED_EXAMPLES)
        .map(|i| definition.seed_templates[i].as_str())
        .collect()
}

fn header(definition: &CategoryDefinition, seed_heading: &str, seeds: &[&str]) -> String {
    let mut message = format!(
        "Category: {}\nDefinition: {}\n\n{}:\n",
        definition.category, definition.description, seed_heading
    );
    for seed in seeds {
        message.push_str(&format!("- {}\n", seed));
    }
    message.push('\n');
    message
}

/// Builds the request for one batch.
///
/// # Arguments
///
/// * `definition` - Category to generate for
/// * `variant` - Traditional or forking prompts
/// * `n` - Number of prompts to ask for
/// * `model` - Backend model identifier
/// * `rng` - Source of randomness for seed sampling
pub fn build_request(
    definition: &CategoryDefinition,
    variant: VariantKind,
    n: usize,
    model: &str,
    rng: &mut ChaCha8Rng,
) -> RequestEnvelope {
    match variant {
        VariantKind::Traditional => build_traditional(definition, n, model, rng),
        VariantKind::Forking => build_forking(definition, n, model, rng),
    }
}

fn build_traditional(
    definition: &CategoryDefinition,
    n: usize,
    model: &str,
    rng: &mut ChaCha8Rng,
) -> RequestEnvelope {
    let seeds = sample_seeds(definition, rng);
    let mut user = header(definition, "Seed prompts", &seeds);

    if definition.category == Category::TheoryOfMind {
        user.push_str(&format!(
            "Generate {} NEW prompts with the following distribution:\n\
             - About half ({}) should follow the format of the seed examples (mostly third-person)\n\
             - About a third ({}) should be from the model's perspective (first-person, 'I')\n\
             - The rest should be second-person ('you') or varied third-person scenarios\n\n",
            n,
            n / 2,
            n / 3
        ));
    } else {
        user.push_str(&format!(
            "Generate {} NEW prompts with a balanced mix of perspectives:\n\
             - About 30% from the model's perspective (first-person, 'I')\n\
             - About 20% from second-person perspective ('you')\n\
             - About 50% from third-person perspective (about others)\n\n",
            n
        ));
    }

    if let Some(examples) = perspective_examples(definition.category) {
        user.push_str("Examples of first-person (model's perspective):\n");
        for example in examples.first_person {
            user.push_str(&format!("- '{}'\n", example));
        }
        user.push_str("\nExamples of second-person:\n");
        for example in examples.second_person {
            user.push_str(&format!("- '{}'\n", example));
        }
        user.push('\n');
    }

    let range = definition.traditional_range;
    let blanks = if range.min == range.max {
        count_word(range.min)
    } else {
        range.to_string()
    };
    user.push_str(&format!(
        "Each prompt must contain exactly {} placeholder{} {{}}.\n\
         Mix complexity evenly across low/medium/high and reasoning_depth across 1-5; \
         40-60% of prompts should contain distractors.\n\
         For each prompt also invent a plausible name_pair.\n\
         Return a valid JSON object with a 'results' array.",
        blanks,
        if range.max == 1 { "" } else { "s" }
    ));

    RequestEnvelope {
        category: definition.category,
        variant: VariantKind::Traditional,
        model: model.to_string(),
        system: TRADITIONAL_SYSTEM.to_string(),
        user,
        temperature: TRADITIONAL_TEMPERATURE,
        max_tokens: (n as u32)
            .saturating_mul(TRADITIONAL_TOKENS_PER_PROMPT)
            .max(MIN_MAX_TOKENS),
        json_output: true,
        requested: n,
    }
}

fn build_forking(
    definition: &CategoryDefinition,
    n: usize,
    model: &str,
    rng: &mut ChaCha8Rng,
) -> RequestEnvelope {
    let required = definition.required_forking_placeholders();

    let mut user = if definition.forking_seeds.is_empty() {
        let seeds = sample_seeds(definition, rng);
        header(definition, "Seed prompts", &seeds)
    } else {
        let templates: Vec<&str> = definition
            .forking_seeds
            .iter()
            .map(|seed| seed.template.as_str())
            .collect();
        let mut message = header(definition, "Seed prompts with multiple placeholders", &templates);
        if let Some(seed) = definition.forking_seeds.first() {
            message.push_str(&format!(
                "Example placeholder pairs:\n- For '{}': {}\n",
                seed.template,
                format_pairs(&seed.placeholder_pairs)
            ));
            message.push_str(&format!(
                "Example forking indices (critical decision points):\n- For '{}': {:?}\n\n",
                seed.template, seed.forking_indices
            ));
        }
        message
    };

    user.push_str(&format!(
        "Generate {} NEW prompts with multiple placeholders and a mix of perspectives:\n\
         - About 30% from first-person (model's perspective)\n\
         - About 20% from second-person\n\
         - About 50% from third-person\n\n",
        n
    ));

    let guidance = forking_guidance(definition.category);
    if guidance.roles.is_empty() {
        user.push_str(&format!(
            "Each prompt must have EXACTLY {} placeholders representing key decision points.\n\
             Mark which placeholder (0-indexed) is the critical forking point, the decision \
             that most affects the outcome.\n\n",
            required
        ));
    } else {
        user.push_str(&format!(
            "Each prompt must have EXACTLY {} placeholders representing key decision points:\n",
            required
        ));
        for (i, role) in guidance.roles.iter().take(required).enumerate() {
            user.push_str(&format!("{}. {}\n", i + 1, role));
        }
        user.push('\n');
        if let Some(example) = guidance.example {
            user.push_str(&format!("Example: '{}'\n\n", example));
        }
        if let Some(index) = guidance.usual_index.filter(|i| *i < required) {
            user.push_str(&format!(
                "The placeholder at index {} is usually the critical forking point.\n\n",
                index
            ));
        }
    }

    user.push_str(&format!(
        "IMPORTANT: The number of placeholder_pairs must EXACTLY match the number of \
         placeholders ({}). Each placeholder gets exactly one pair of options.\n\n\
         For each prompt, provide:\n\
         1. placeholder_pairs: [[option1A, option1B], [option2A, option2B], ...]\n\
         2. forking_index: which placeholder (0-indexed) is the critical decision point\n\n\
         Return results as a valid JSON object.",
        required
    ));

    RequestEnvelope {
        category: definition.category,
        variant: VariantKind::Forking,
        model: model.to_string(),
        system: forking_system(required),
        user,
        temperature: FORKING_TEMPERATURE,
        max_tokens: (n as u32)
            .saturating_mul(FORKING_TOKENS_PER_PROMPT)
            .max(MIN_MAX_TOKENS),
        json_output: true,
        requested: n,
    }
}

/// Derives the plain-text fallback request from a structured one.
///
/// Keeps the user message and drops the JSON hint and the output floor.
pub fn build_plain_text_fallback(envelope: &RequestEnvelope) -> RequestEnvelope {
    RequestEnvelope {
        system: PLAIN_TEXT_SYSTEM.to_string(),
        max_tokens: (envelope.requested as u32)
            .saturating_mul(TRADITIONAL_TOKENS_PER_PROMPT)
            .max(TRADITIONAL_TOKENS_PER_PROMPT),
        json_output: false,
        ..envelope.clone()
    }
}
