//! Typed parameter structs for each endpoint family.
//!
//! Every struct renders itself into an [`ApiRequest`], so the async and
//! blocking clients share one definition of each endpoint's wire shape.
//! Absent optionals are not sent; list parameters are comma-joined.

use serde_json::json;

use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::request::ApiRequest;

/// Options for fetching a single concept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConceptOptions {
    pub include_relationships: bool,
    pub include_synonyms: bool,
}

impl ConceptOptions {
    pub(crate) fn request(&self, concept_id: i64) -> ApiRequest {
        ApiRequest::get(format!("/concepts/{concept_id}"))
            .flag("include_relationships", self.include_relationships)
            .flag("include_synonyms", self.include_synonyms)
    }
}

/// Bulk concept lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchConceptsRequest {
    pub concept_ids: Vec<i64>,
    pub include_relationships: bool,
    pub include_synonyms: bool,
    pub include_mappings: bool,
    pub vocabulary_filter: Vec<String>,
    pub standard_only: bool,
}

impl BatchConceptsRequest {
    pub fn new(concept_ids: Vec<i64>) -> Self {
        Self {
            concept_ids,
            ..Self::default()
        }
    }

    pub(crate) fn request(&self) -> ApiRequest {
        let mut body = json!({ "concept_ids": self.concept_ids });
        if self.include_relationships {
            body["include_relationships"] = json!(true);
        }
        if self.include_synonyms {
            body["include_synonyms"] = json!(true);
        }
        if self.include_mappings {
            body["include_mappings"] = json!(true);
        }
        if !self.vocabulary_filter.is_empty() {
            body["vocabulary_filter"] = json!(self.vocabulary_filter);
        }
        if self.standard_only {
            body["standard_only"] = json!(true);
        }
        ApiRequest::post("/concepts/batch", body)
    }
}

/// Options for concept suggestions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuggestOptions {
    pub vocabulary: Option<String>,
    pub domain: Option<String>,
    pub limit: Option<u32>,
}

impl SuggestOptions {
    pub(crate) fn request(&self, query: &str) -> ApiRequest {
        ApiRequest::get("/concepts/suggest")
            .param("query", query)
            .param_opt("vocabulary", self.vocabulary.as_deref())
            .param_opt("domain", self.domain.as_deref())
            .param_opt("limit", self.limit)
    }
}

/// Options for related-concept lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelatedOptions {
    pub relatedness_types: Vec<String>,
    pub vocabulary_ids: Vec<String>,
    pub domain_ids: Vec<String>,
    pub min_relatedness_score: Option<f64>,
    pub max_results: Option<u32>,
    pub include_scores: bool,
    pub standard_concepts_only: bool,
}

impl RelatedOptions {
    pub(crate) fn request(&self, concept_id: i64) -> ApiRequest {
        ApiRequest::get(format!("/concepts/{concept_id}/related"))
            .list("relatedness_types", &self.relatedness_types)
            .list("vocabulary_ids", &self.vocabulary_ids)
            .list("domain_ids", &self.domain_ids)
            .param_opt("min_relatedness_score", self.min_relatedness_score)
            .param_opt("max_results", self.max_results)
            .flag("include_scores", self.include_scores)
            .flag("standard_concepts_only", self.standard_concepts_only)
    }
}

/// Options for listing a concept's relationships.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationshipOptions {
    pub relationship_type: Option<String>,
    pub target_vocabulary: Option<String>,
    pub include_invalid: bool,
}

impl RelationshipOptions {
    pub(crate) fn request(&self, concept_id: i64) -> ApiRequest {
        ApiRequest::get(format!("/concepts/{concept_id}/relationships"))
            .param_opt("relationship_type", self.relationship_type.as_deref())
            .param_opt("target_vocabulary", self.target_vocabulary.as_deref())
            .flag("include_invalid", self.include_invalid)
    }
}

/// A concept search. Used for basic search, paged iteration and advanced
/// (faceted) search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub vocabulary_ids: Vec<String>,
    pub domain_ids: Vec<String>,
    pub concept_class_ids: Vec<String>,
    /// Filter by standard status: `"S"` or `"C"`.
    pub standard_concept: Option<String>,
    pub include_synonyms: bool,
    pub include_invalid: bool,
    pub min_score: Option<f64>,
    pub exact_match: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            vocabulary_ids: Vec::new(),
            domain_ids: Vec::new(),
            concept_class_ids: Vec::new(),
            standard_concept: None,
            include_synonyms: false,
            include_invalid: false,
            min_score: None,
            exact_match: false,
            sort_by: None,
            sort_order: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn vocabularies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn domains<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Query parameters shared by the single-shot and paged variants.
    pub(crate) fn template(&self) -> ApiRequest {
        ApiRequest::get("/search/concepts")
            .param("query", &self.query)
            .list("vocabulary_ids", &self.vocabulary_ids)
            .list("domain_ids", &self.domain_ids)
            .list("concept_class_ids", &self.concept_class_ids)
            .param_opt("standard_concept", self.standard_concept.as_deref())
            .flag("include_synonyms", self.include_synonyms)
            .flag("include_invalid", self.include_invalid)
            .param_opt("min_score", self.min_score)
            .flag("exact_match", self.exact_match)
            .param_opt("sort_by", self.sort_by.as_deref())
            .param_opt("sort_order", self.sort_order.as_deref())
    }

    pub(crate) fn request(&self) -> ApiRequest {
        self.template().paged(self.page, self.page_size)
    }

    /// The POST body for `/search/advanced`.
    pub(crate) fn advanced_request(&self) -> ApiRequest {
        let mut body = json!({ "query": self.query });
        if !self.vocabulary_ids.is_empty() {
            body["vocabulary_ids"] = json!(self.vocabulary_ids);
        }
        if !self.domain_ids.is_empty() {
            body["domain_ids"] = json!(self.domain_ids);
        }
        if !self.concept_class_ids.is_empty() {
            body["concept_class_ids"] = json!(self.concept_class_ids);
        }
        if self.standard_concept.is_some() {
            body["standard_concepts_only"] = json!(true);
        }
        if self.include_invalid {
            body["include_invalid"] = json!(true);
        }
        body["page"] = json!(self.page);
        body["page_size"] = json!(self.page_size);
        ApiRequest::post("/search/advanced", body)
    }
}

/// Direction of a hierarchy walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HierarchyDirection {
    Ancestors,
    Descendants,
}

/// Options for hierarchy traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyOptions {
    pub vocabulary_id: Option<String>,
    pub max_levels: Option<u32>,
    /// Relationship types to follow; the server defaults to `"Is a"`.
    pub relationship_types: Vec<String>,
    pub include_paths: bool,
    pub include_distance: bool,
    pub standard_only: bool,
    pub include_deprecated: bool,
    pub page: u32,
    pub page_size: u32,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            vocabulary_id: None,
            max_levels: None,
            relationship_types: Vec::new(),
            include_paths: false,
            include_distance: true,
            standard_only: false,
            include_deprecated: false,
            page: 1,
            page_size: 100,
        }
    }
}

impl HierarchyOptions {
    pub(crate) fn request(&self, concept_id: i64, direction: HierarchyDirection) -> ApiRequest {
        let segment = match direction {
            HierarchyDirection::Ancestors => "ancestors",
            HierarchyDirection::Descendants => "descendants",
        };
        ApiRequest::get(format!("/concepts/{concept_id}/{segment}"))
            .param_opt("vocabulary_id", self.vocabulary_id.as_deref())
            .param_opt("max_levels", self.max_levels)
            .list("relationship_types", &self.relationship_types)
            .flag("include_paths", self.include_paths)
            .flag("include_distance", self.include_distance)
            .flag("standard_only", self.standard_only)
            .flag("include_deprecated", self.include_deprecated)
            .paged(self.page, self.page_size)
    }
}

/// Options for listing a concept's mappings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingOptions {
    pub target_vocabularies: Vec<String>,
    pub mapping_types: Vec<String>,
    /// `"outgoing"`, `"incoming"` or `"both"`.
    pub direction: String,
    pub include_indirect: bool,
    pub standard_only: bool,
    pub active_only: bool,
    pub page: u32,
    pub page_size: u32,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            target_vocabularies: Vec::new(),
            mapping_types: Vec::new(),
            direction: "both".to_owned(),
            include_indirect: false,
            standard_only: false,
            active_only: true,
            page: 1,
            page_size: 50,
        }
    }
}

impl MappingOptions {
    pub(crate) fn request(&self, concept_id: i64) -> ApiRequest {
        let mut request = ApiRequest::get(format!("/concepts/{concept_id}/mappings"))
            .param("direction", &self.direction)
            .list("target_vocabularies", &self.target_vocabularies)
            .list("mapping_types", &self.mapping_types)
            .flag("include_indirect", self.include_indirect)
            .flag("standard_only", self.standard_only);
        // active_only defaults to true server-side; only the opt-out is sent.
        if !self.active_only {
            request = request.param("active_only", "false");
        }
        request.paged(self.page, self.page_size)
    }
}

/// Bulk mapping of concepts into a target vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapConceptsRequest {
    pub source_concepts: Vec<i64>,
    pub target_vocabulary: String,
    /// `"direct"`, `"equivalent"`, `"broader"` or `"narrower"`.
    pub mapping_type: Option<String>,
    pub include_invalid: bool,
}

impl MapConceptsRequest {
    pub fn new(source_concepts: Vec<i64>, target_vocabulary: impl Into<String>) -> Self {
        Self {
            source_concepts,
            target_vocabulary: target_vocabulary.into(),
            mapping_type: None,
            include_invalid: false,
        }
    }

    pub(crate) fn request(&self) -> ApiRequest {
        let mut body = json!({
            "source_concepts": self.source_concepts,
            "target_vocabulary": self.target_vocabulary,
        });
        if let Some(mapping_type) = &self.mapping_type {
            body["mapping_type"] = json!(mapping_type);
        }
        if self.include_invalid {
            body["include_invalid"] = json!(true);
        }
        ApiRequest::post("/concepts/map", body)
    }
}

/// Options for listing vocabularies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VocabularyListOptions {
    pub include_stats: bool,
    pub include_inactive: bool,
}

impl VocabularyListOptions {
    pub(crate) fn request(&self) -> ApiRequest {
        ApiRequest::get("/vocabularies")
            .flag("include_stats", self.include_stats)
            .flag("include_inactive", self.include_inactive)
    }
}

/// Filter for listing the concepts of a vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VocabularyConceptsFilter {
    pub domain_id: Option<String>,
    pub concept_class_id: Option<String>,
    pub standard_only: bool,
}

impl VocabularyConceptsFilter {
    pub(crate) fn template(&self, vocabulary_id: &str) -> ApiRequest {
        ApiRequest::get(format!("/vocabularies/{vocabulary_id}/concepts"))
            .param_opt("domain_id", self.domain_id.as_deref())
            .param_opt("concept_class_id", self.concept_class_id.as_deref())
            .flag("standard_only", self.standard_only)
    }
}

/// Options for listing domains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainListOptions {
    pub vocabulary_ids: Vec<String>,
    pub include_concept_counts: bool,
    pub include_statistics: bool,
    pub standard_only: bool,
    pub active_only: bool,
}

impl Default for DomainListOptions {
    fn default() -> Self {
        Self {
            vocabulary_ids: Vec::new(),
            include_concept_counts: true,
            include_statistics: false,
            standard_only: false,
            active_only: true,
        }
    }
}

impl DomainListOptions {
    pub(crate) fn request(&self) -> ApiRequest {
        let mut request = ApiRequest::get("/domains")
            .list("vocabulary_ids", &self.vocabulary_ids)
            .flag("include_concept_counts", self.include_concept_counts)
            .flag("include_statistics", self.include_statistics)
            .flag("standard_only", self.standard_only);
        if !self.active_only {
            request = request.param("active_only", "false");
        }
        request
    }
}

/// Options for listing relationship types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationshipTypesOptions {
    pub vocabulary_ids: Vec<String>,
    pub include_reverse: bool,
    pub category: Option<String>,
    pub standard_only: bool,
}

impl RelationshipTypesOptions {
    pub(crate) fn request(&self) -> ApiRequest {
        ApiRequest::get("/relationships/types")
            .list("vocabulary_ids", &self.vocabulary_ids)
            .flag("include_reverse", self.include_reverse)
            .param_opt("category", self.category.as_deref())
            .flag("standard_only", self.standard_only)
    }
}
