//! Category catalog: immutable per-category definitions and seed records.
//!
//! The catalog is built once at startup and shared behind an `Arc` by the
//! request builder, the validator and the aggregator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::seeds::seed_data;
use super::taxonomy::{Category, PlaceholderRange};
use crate::dataset::{
    count_placeholders, AnswerPair, Complexity, Perspective, PromptRecord, PromptVariant,
    RecordSource,
};

/// Complexity assigned to seed records and to forking records that omit it.
pub const DEFAULT_COMPLEXITY: Complexity = Complexity::Medium;

/// Reasoning depth assigned to seed records and to forking records that omit it.
pub const DEFAULT_REASONING_DEPTH: u8 = 3;

/// A multi-placeholder example prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ForkingSeed {
    /// Template containing one `{}` per placeholder pair.
    pub template: String,
    /// One answer pair per placeholder, in order.
    pub placeholder_pairs: Vec<AnswerPair>,
    /// Critical placeholder positions; the first is the record's forking index.
    pub forking_indices: Vec<usize>,
}

impl ForkingSeed {
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.template)
    }
}

/// Everything the pipeline knows about one category.
#[derive(Debug, Clone)]
pub struct CategoryDefinition {
    pub category: Category,
    /// Instruction text shown to the backend.
    pub description: String,
    /// Traditional example prompts.
    pub seed_templates: Vec<String>,
    /// Answer pairs aligned by index with `seed_templates`.
    pub answer_pairs: Vec<AnswerPair>,
    pub forking_seeds: Vec<ForkingSeed>,
    pub traditional_range: PlaceholderRange,
    pub forking_range: PlaceholderRange,
    /// Quality-gate minimum word count.
    pub min_words: usize,
    /// Hard categories get a larger target and a retry boost.
    pub hard: bool,
}

impl CategoryDefinition {
    /// Builds the standard definition for `category` from the built-in seeds.
    pub fn standard(category: Category) -> Self {
        let data = seed_data(category);

        Self {
            category,
            description: data.description.to_string(),
            seed_templates: data.templates.iter().map(|t| t.to_string()).collect(),
            answer_pairs: data
                .answers
                .iter()
                .map(|(correct, distractor)| AnswerPair::new(*correct, *distractor))
                .collect(),
            forking_seeds: data
                .forking
                .iter()
                .map(|seed| ForkingSeed {
                    template: seed.template.to_string(),
                    placeholder_pairs: seed
                        .pairs
                        .iter()
                        .map(|(correct, distractor)| AnswerPair::new(*correct, *distractor))
                        .collect(),
                    forking_indices: seed.forking_indices.to_vec(),
                })
                .collect(),
            traditional_range: category.traditional_range(),
            forking_range: category.forking_range(),
            min_words: category.min_words(),
            hard: category.is_hard(),
        }
    }

    /// Answer pair for the seed template at `index`.
    ///
    /// When templates outnumber pairs the last pair is reused.
    pub fn answer_for(&self, index: usize) -> Option<&AnswerPair> {
        self.answer_pairs
            .get(index)
            .or_else(|| self.answer_pairs.last())
    }

    /// Number of placeholders a generated forking prompt must carry.
    ///
    /// Taken from the first forking seed when it falls inside the forking
    /// range, otherwise the upper bound of the range.
    pub fn required_forking_placeholders(&self) -> usize {
        self.forking_seeds
            .first()
            .map(ForkingSeed::placeholder_count)
            .filter(|count| self.forking_range.contains(*count))
            .unwrap_or(self.forking_range.max)
    }

    /// Seed records for this category, traditional first, then forking.
    ///
    /// # Arguments
    ///
    /// * `now` - Timestamp stamped on every seed record
    pub fn seed_records(&self, now: DateTime<Utc>) -> Vec<PromptRecord> {
        let traditional = self
            .seed_templates
            .iter()
            .enumerate()
            .filter_map(|(index, template)| {
                let answer = self.answer_for(index)?.clone();
                Some(self.seed_record(
                    template,
                    PromptVariant::Traditional {
                        answer,
                        distractors_present: false,
                    },
                    now,
                ))
            });

        let forking = self.forking_seeds.iter().map(|seed| {
            let count = seed.placeholder_pairs.len();
            let forking_index = seed
                .forking_indices
                .first()
                .copied()
                .filter(|index| *index < count)
                .unwrap_or_else(|| self.category.default_forking_index(count));
            self.seed_record(
                &seed.template,
                PromptVariant::Forking {
                    placeholder_pairs: seed.placeholder_pairs.clone(),
                    forking_index,
                },
                now,
            )
        });

        traditional.chain(forking).collect()
    }

    fn seed_record(
        &self,
        prompt: &str,
        variant: PromptVariant,
        now: DateTime<Utc>,
    ) -> PromptRecord {
        PromptRecord {
            id: Uuid::new_v4(),
            category: self.category,
            source: RecordSource::Seed,
            created_at: now,
            prompt: prompt.to_string(),
            variant,
            complexity: Some(DEFAULT_COMPLEXITY),
            reasoning_depth: Some(DEFAULT_REASONING_DEPTH),
            perspective: Perspective::Third,
        }
    }
}

/// Immutable registry of category definitions in catalog order.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    definitions: Vec<CategoryDefinition>,
}

impl CategoryCatalog {
    /// The built-in catalog covering all seven categories.
    pub fn standard() -> Self {
        Self {
            definitions: Category::all()
                .into_iter()
                .map(CategoryDefinition::standard)
                .collect(),
        }
    }

    /// Builds a catalog from explicit definitions, keeping catalog order and
    /// dropping later duplicates of a category.
    pub fn from_definitions(definitions: Vec<CategoryDefinition>) -> Self {
        let mut unique: Vec<CategoryDefinition> = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if !unique.iter().any(|d| d.category == definition.category) {
                unique.push(definition);
            }
        }
        unique.sort_by_key(|d| d.category);
        Self {
            definitions: unique,
        }
    }

    /// Looks up the definition for `category`.
    pub fn get(&self, category: Category) -> Option<&CategoryDefinition> {
        self.definitions.iter().find(|d| d.category == category)
    }

    /// Iterates definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryDefinition> {
        self.definitions.iter()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.definitions.iter().map(|d| d.category).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_all_categories() {
        let catalog = CategoryCatalog::standard();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.categories(), Category::all());
    }

    #[test]
    fn test_seed_templates_match_traditional_range() {
        let catalog = CategoryCatalog::standard();
        for definition in catalog.iter() {
            assert_eq!(definition.seed_templates.len(), 4);
            for template in &definition.seed_templates {
                assert!(
                    definition
                        .traditional_range
                        .contains(count_placeholders(template)),
                    "{} seed has wrong placeholder count: {}",
                    definition.category,
                    template
                );
            }
        }
    }

    #[test]
    fn test_forking_seeds_are_consistent() {
        let catalog = CategoryCatalog::standard();
        for definition in catalog.iter() {
            for seed in &definition.forking_seeds {
                assert_eq!(seed.placeholder_count(), seed.placeholder_pairs.len());
                assert!(definition.forking_range.contains(seed.placeholder_count()));
                assert!(seed.forking_indices[0] < seed.placeholder_count());
            }
        }
    }

    #[test]
    fn test_required_forking_placeholders() {
        let catalog = CategoryCatalog::standard();
        let tom = catalog.get(Category::TheoryOfMind).expect("tom");
        let factual = catalog.get(Category::FactualRecall).expect("factual");
        assert_eq!(tom.required_forking_placeholders(), 4);
        assert_eq!(factual.required_forking_placeholders(), 3);
    }

    #[test]
    fn test_answer_for_reuses_last_pair() {
        let mut definition = CategoryDefinition::standard(Category::Counterfactual);
        definition.answer_pairs.truncate(2);
        assert_eq!(
            definition.answer_for(3),
            Some(&AnswerPair::new("extreme heat", "mild winters"))
        );
    }

    #[test]
    fn test_seed_records() {
        let definition = CategoryDefinition::standard(Category::TheoryOfMind);
        let now = Utc::now();
        let records = definition.seed_records(now);

        assert_eq!(records.len(), 5);
        assert!(records[..4].iter().all(|r| !r.is_forking()));
        assert!(records[4].is_forking());
        assert!(records.iter().all(|r| r.source == RecordSource::Seed));
        assert!(records.iter().all(|r| r.complexity == Some(Complexity::Medium)));
        assert!(records.iter().all(|r| r.reasoning_depth == Some(3)));
        assert!(records.iter().all(|r| r.perspective == Perspective::Third));
        assert!(records.iter().all(|r| r.created_at == now));

        match &records[4].variant {
            PromptVariant::Forking {
                placeholder_pairs,
                forking_index,
            } => {
                assert_eq!(placeholder_pairs.len(), 4);
                assert_eq!(*forking_index, 2);
            }
            other => panic!("expected forking variant, got {:?}", other),
        }
    }

    #[test]
    fn test_from_definitions_orders_and_dedups() {
        let catalog = CategoryCatalog::from_definitions(vec![
            CategoryDefinition::standard(Category::FactualRecall),
            CategoryDefinition::standard(Category::TheoryOfMind),
            CategoryDefinition::standard(Category::FactualRecall),
        ]);
        assert_eq!(
            catalog.categories(),
            vec![Category::TheoryOfMind, Category::FactualRecall]
        );
        assert!(catalog.get(Category::Counterfactual).is_none());
    }
}
