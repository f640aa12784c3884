//! `omophub-http` is an HTTP client for the OMOPHub medical vocabulary API
//! (OMOP/ATHENA terminologies).
//!
//! The crate wraps the REST endpoints with typed methods:
//! - concepts: [`OmopHub::concept`], [`OmopHub::concepts_batch`]
//! - search: [`OmopHub::search_concepts`], [`OmopHub::search_concepts_pages`]
//! - hierarchy: [`OmopHub::concept_ancestors`], [`OmopHub::concept_descendants`]
//! - mappings: [`OmopHub::concept_mappings`], [`OmopHub::map_concepts`]
//! - vocabularies and domains: [`OmopHub::vocabularies`], [`OmopHub::domains`]
//!
//! Failed requests are retried with exponential backoff and jitter; HTTP 429
//! responses honor the server's `Retry-After` header. Paginated listings are
//! exposed as [`Pager`]s that follow the server's continuation flag.
//!
//! A blocking client with the same surface lives in [`blocking`] behind the
//! `blocking` cargo feature.

mod client;
mod decode;
mod error;
mod options;
mod pagination;
mod params;
mod request;
mod retry;
mod types;
mod wire;

#[cfg(feature = "blocking")]
pub mod blocking;

pub use client::{OmopHub, DEFAULT_BASE_URL};
pub use error::OmopHubError;
pub use options::ClientOptions;
pub use pagination::{PageMeta, Paged, Pager, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use params::{
    BatchConceptsRequest, ConceptOptions, DomainListOptions, HierarchyOptions,
    MapConceptsRequest, MappingOptions, RelatedOptions, RelationshipOptions,
    RelationshipTypesOptions, SearchQuery, SuggestOptions, VocabularyConceptsFilter,
    VocabularyListOptions,
};
pub use types::{
    BatchConceptResult, Concept, ConceptMapping, ConceptRelationship, Domain,
    HierarchyConcept, MappingResult, RelatedConcept, RelationshipType, Suggestion,
    Vocabulary, VocabularyDomain, VocabularyStats,
};

pub type Result<T> = std::result::Result<T, OmopHubError>;
