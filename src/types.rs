use serde::Deserialize;

/// A single OMOP concept. Extended fields are populated only when the
/// request asked for them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Concept {
    pub concept_id: i64,
    pub concept_name: String,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub vocabulary_id: Option<String>,
    #[serde(default)]
    pub concept_class_id: Option<String>,
    /// `"S"` for standard, `"C"` for classification, absent otherwise.
    #[serde(default)]
    pub standard_concept: Option<String>,
    #[serde(default)]
    pub concept_code: Option<String>,
    #[serde(default)]
    pub valid_start_date: Option<String>,
    #[serde(default)]
    pub valid_end_date: Option<String>,
    #[serde(default)]
    pub invalid_reason: Option<String>,
    #[serde(default)]
    pub synonyms: Option<Vec<String>>,
    #[serde(default)]
    pub relationships: Option<Vec<ConceptRelationship>>,
}

/// Result of a batch concept lookup.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct BatchConceptResult {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    /// IDs that matched no concept.
    #[serde(default)]
    pub not_found: Vec<i64>,
}

/// Autocomplete suggestion.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Suggestion {
    pub suggestion: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub concept_id: Option<i64>,
    #[serde(default)]
    pub vocabulary_id: Option<String>,
}

/// A concept related to the query concept, with its relatedness score.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelatedConcept {
    #[serde(flatten)]
    pub concept: Concept,
    #[serde(default)]
    pub relatedness_score: Option<f64>,
    #[serde(default)]
    pub relationship_path: Option<Vec<String>>,
}

/// One relationship edge from a concept.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ConceptRelationship {
    pub relationship_id: String,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub target_concept_id: Option<i64>,
    #[serde(default)]
    pub target_concept_name: Option<String>,
    #[serde(default)]
    pub target_vocabulary_id: Option<String>,
    #[serde(default)]
    pub invalid_reason: Option<String>,
}

/// A hierarchy entry (ancestor or descendant) with its distance from the
/// query concept.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HierarchyConcept {
    #[serde(flatten)]
    pub concept: Concept,
    /// Levels of separation from the query concept.
    #[serde(default)]
    pub distance: Option<u32>,
    #[serde(default)]
    pub paths: Option<Vec<Vec<i64>>>,
}

/// A mapping from a source concept into another vocabulary.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ConceptMapping {
    #[serde(default)]
    pub source_concept_id: Option<i64>,
    pub target_concept_id: i64,
    #[serde(default)]
    pub target_concept_name: Option<String>,
    #[serde(default)]
    pub target_concept_code: Option<String>,
    #[serde(default)]
    pub target_vocabulary_id: Option<String>,
    #[serde(default)]
    pub mapping_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Mappings found for one source concept in a bulk map request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MappingResult {
    pub source_concept_id: i64,
    #[serde(default)]
    pub mappings: Vec<ConceptMapping>,
}

/// Full vocabulary information.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Vocabulary {
    pub vocabulary_id: String,
    pub vocabulary_name: String,
    #[serde(default)]
    pub vocabulary_reference: Option<String>,
    #[serde(default)]
    pub vocabulary_version: Option<String>,
    #[serde(default)]
    pub vocabulary_concept_id: Option<i64>,
    #[serde(default)]
    pub concept_count: Option<u64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub domains: Option<Vec<VocabularyDomain>>,
    #[serde(default)]
    pub statistics: Option<VocabularyStats>,
}

/// Domain statistics within a vocabulary.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct VocabularyDomain {
    pub domain_id: String,
    #[serde(default)]
    pub concept_count: u64,
    #[serde(default)]
    pub standard_count: Option<u64>,
    #[serde(default)]
    pub classification_count: Option<u64>,
}

/// Vocabulary-wide statistics.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct VocabularyStats {
    #[serde(default)]
    pub total_concepts: u64,
    #[serde(default)]
    pub standard_concepts: Option<u64>,
    #[serde(default)]
    pub classification_concepts: Option<u64>,
    #[serde(default)]
    pub invalid_concepts: Option<u64>,
    #[serde(default)]
    pub relationships_count: Option<u64>,
    #[serde(default)]
    pub synonyms_count: Option<u64>,
}

/// An OMOP domain.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Domain {
    pub domain_id: String,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub domain_concept_id: Option<i64>,
    #[serde(default)]
    pub concept_count: Option<u64>,
}

/// A relationship type available in the vocabulary graph.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelationshipType {
    pub relationship_id: String,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub is_hierarchical: Option<bool>,
    #[serde(default)]
    pub defines_ancestry: Option<bool>,
    #[serde(default)]
    pub reverse_relationship_id: Option<String>,
}
