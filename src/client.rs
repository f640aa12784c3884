use std::fmt;
use std::time::Duration;

use reqwest::header;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    decode,
    pagination::{PageMeta, Paged, Pager},
    params::{
        BatchConceptsRequest, ConceptOptions, DomainListOptions, HierarchyDirection,
        HierarchyOptions, MapConceptsRequest, MappingOptions, RelatedOptions,
        RelationshipOptions, RelationshipTypesOptions, SearchQuery, SuggestOptions,
        VocabularyConceptsFilter, VocabularyListOptions,
    },
    request::{ApiRequest, HttpMethod},
    retry::{self, AttemptOutcome, RetryPolicy},
    types::{
        BatchConceptResult, Concept, ConceptMapping, ConceptRelationship, Domain,
        HierarchyConcept, MappingResult, RelatedConcept, RelationshipType, Suggestion,
        Vocabulary, VocabularyDomain, VocabularyStats,
    },
    wire::Envelope,
    ClientOptions, OmopHubError, Result,
};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.omophub.com/v1";

/// Async HTTP client for the OMOPHub medical vocabulary API.
#[derive(Clone)]
pub struct OmopHub {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
    vocab_version: Option<String>,
    options: ClientOptions,
    policy: RetryPolicy,
}

impl fmt::Debug for OmopHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmopHub")
            .field("base_url", &self.base_url)
            .field("authorization", &"<redacted>")
            .field("vocab_version", &self.vocab_version)
            .field("options", &self.options)
            .finish()
    }
}

impl OmopHub {
    /// Creates a client against the production endpoint.
    ///
    /// If the key is missing the `Bearer ` prefix, it is added
    /// automatically.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use omophub_http::OmopHub;
    ///
    /// let client = OmopHub::new("oh_live_key");
    /// ```
    pub fn new(api_key: impl AsRef<str>) -> Self {
        let options = ClientOptions::default();
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            authorization: normalize_bearer_authorization(api_key.as_ref()),
            vocab_version: None,
            policy: RetryPolicy::new(&options),
            options,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `OMOPHUB_API_KEY` — the API key (Bearer prefix optional)
    /// - `OMOPHUB_BASE_URL` — optional endpoint override
    ///
    /// Returns an error if the key is missing or empty.
    pub fn from_env() -> std::result::Result<Self, String> {
        let api_key = std::env::var("OMOPHUB_API_KEY")
            .map_err(|_| "missing OMOPHUB_API_KEY environment variable".to_owned())?;
        if api_key.trim().is_empty() {
            return Err("OMOPHUB_API_KEY is set but empty".to_owned());
        }
        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OMOPHUB_BASE_URL") {
            if !base_url.trim().is_empty() {
                client = client.with_base_url(base_url);
            }
        }
        Ok(client)
    }

    /// Points the client at a different endpoint, e.g. a staging server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.policy = RetryPolicy::new(&options);
        self.options = options;
        self
    }

    /// Pins every request to a specific vocabulary release via the
    /// `X-Vocab-Version` header.
    pub fn with_vocab_version(mut self, version: impl Into<String>) -> Self {
        self.vocab_version = Some(version.into());
        self
    }

    /// Fetches a concept by OMOP concept ID.
    pub async fn concept(&self, concept_id: i64, options: &ConceptOptions) -> Result<Concept> {
        self.fetch(options.request(concept_id)).await
    }

    /// Fetches a concept by vocabulary and code, e.g. `("SNOMED", "44054006")`.
    pub async fn concept_by_code(
        &self,
        vocabulary_id: &str,
        concept_code: &str,
    ) -> Result<Concept> {
        self.fetch(ApiRequest::get(format!(
            "/concepts/by-code/{vocabulary_id}/{concept_code}"
        )))
        .await
    }

    /// Fetches multiple concepts in one call.
    pub async fn concepts_batch(
        &self,
        request: &BatchConceptsRequest,
    ) -> Result<BatchConceptResult> {
        self.fetch(request.request()).await
    }

    /// Suggests concepts matching a partial query.
    pub async fn suggest_concepts(
        &self,
        query: &str,
        options: &SuggestOptions,
    ) -> Result<Vec<Suggestion>> {
        self.fetch_items(options.request(query)).await
    }

    /// Lists concepts related to the given concept, with relatedness scores.
    pub async fn related_concepts(
        &self,
        concept_id: i64,
        options: &RelatedOptions,
    ) -> Result<Vec<RelatedConcept>> {
        self.fetch_items(options.request(concept_id)).await
    }

    /// Lists a concept's relationship edges.
    pub async fn concept_relationships(
        &self,
        concept_id: i64,
        options: &RelationshipOptions,
    ) -> Result<Vec<ConceptRelationship>> {
        self.fetch_items(options.request(concept_id)).await
    }

    /// Runs a concept search and returns one page with its pagination
    /// metadata.
    pub async fn search_concepts(&self, query: &SearchQuery) -> Result<Paged<Concept>> {
        self.fetch_paged(query.request()).await
    }

    /// Walks every result of a concept search across pages.
    pub fn search_concepts_pages(&self, query: &SearchQuery) -> Pager<'_, Concept> {
        Pager::new(self, query.template(), query.page_size)
    }

    /// Faceted search via `/search/advanced`.
    pub async fn advanced_search(&self, query: &SearchQuery) -> Result<Paged<Concept>> {
        self.fetch_paged(query.advanced_request()).await
    }

    /// Autocomplete suggestions for a partial query.
    pub async fn autocomplete(&self, query: &str, limit: Option<u32>) -> Result<Vec<Suggestion>> {
        self.fetch_items(
            ApiRequest::get("/search/suggest")
                .param("query", query)
                .param_opt("limit", limit),
        )
        .await
    }

    /// Lists a concept's ancestors.
    pub async fn concept_ancestors(
        &self,
        concept_id: i64,
        options: &HierarchyOptions,
    ) -> Result<Paged<HierarchyConcept>> {
        self.fetch_paged(options.request(concept_id, HierarchyDirection::Ancestors))
            .await
    }

    /// Lists a concept's descendants.
    pub async fn concept_descendants(
        &self,
        concept_id: i64,
        options: &HierarchyOptions,
    ) -> Result<Paged<HierarchyConcept>> {
        self.fetch_paged(options.request(concept_id, HierarchyDirection::Descendants))
            .await
    }

    /// Lists cross-vocabulary mappings for a concept.
    pub async fn concept_mappings(
        &self,
        concept_id: i64,
        options: &MappingOptions,
    ) -> Result<Paged<ConceptMapping>> {
        self.fetch_paged(options.request(concept_id)).await
    }

    /// Maps a set of concepts into a target vocabulary.
    pub async fn map_concepts(&self, request: &MapConceptsRequest) -> Result<Vec<MappingResult>> {
        self.fetch_items(request.request()).await
    }

    /// Lists available vocabularies.
    pub async fn vocabularies(&self, options: &VocabularyListOptions) -> Result<Vec<Vocabulary>> {
        self.fetch_items(options.request()).await
    }

    /// Fetches one vocabulary by ID, e.g. `"SNOMED"`.
    pub async fn vocabulary(&self, vocabulary_id: &str) -> Result<Vocabulary> {
        self.fetch(ApiRequest::get(format!("/vocabularies/{vocabulary_id}")))
            .await
    }

    /// Fetches statistics for one vocabulary.
    pub async fn vocabulary_stats(&self, vocabulary_id: &str) -> Result<VocabularyStats> {
        self.fetch(ApiRequest::get(format!(
            "/vocabularies/{vocabulary_id}/stats"
        )))
        .await
    }

    /// Lists domain statistics across vocabularies.
    pub async fn vocabulary_domains(&self) -> Result<Vec<VocabularyDomain>> {
        self.fetch_items(ApiRequest::get("/vocabularies/domains"))
            .await
    }

    /// Walks the concepts of a vocabulary across pages.
    pub fn vocabulary_concepts_pages(
        &self,
        vocabulary_id: &str,
        filter: &VocabularyConceptsFilter,
        page_size: u32,
    ) -> Pager<'_, Concept> {
        Pager::new(self, filter.template(vocabulary_id), page_size)
    }

    /// Lists OMOP domains.
    pub async fn domains(&self, options: &DomainListOptions) -> Result<Vec<Domain>> {
        self.fetch_items(options.request()).await
    }

    /// Walks the concepts of a domain across pages.
    pub fn domain_concepts_pages(&self, domain_id: &str, page_size: u32) -> Pager<'_, Concept> {
        Pager::new(
            self,
            ApiRequest::get(format!("/domains/{domain_id}/concepts")),
            page_size,
        )
    }

    /// Lists relationship types available in the vocabulary graph.
    pub async fn relationship_types(
        &self,
        options: &RelationshipTypesOptions,
    ) -> Result<Vec<RelationshipType>> {
        self.fetch_items(options.request()).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let envelope = self.send_with_retry(&request).await?;
        decode::data_payload(envelope)
    }

    async fn fetch_items<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Vec<T>> {
        let (items, _) = self.fetch_page(&request).await?;
        Ok(items)
    }

    async fn fetch_paged<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Paged<T>> {
        let (items, meta) = self.fetch_page(&request).await?;
        Ok(Paged { items, meta })
    }

    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<(Vec<T>, Option<PageMeta>)> {
        let envelope = self.send_with_retry(request).await?;
        decode::page_payload(envelope)
    }

    /// Sends one logical request, retrying per policy.
    ///
    /// The attempt counter lives on this call's stack: retry state never
    /// leaks between calls.
    async fn send_with_retry(&self, request: &ApiRequest) -> Result<Envelope> {
        let mut attempt: u32 = 0;
        loop {
            let (error, suggested_delay) = match self.send_once(request).await {
                Ok(envelope) => return Ok(envelope),
                Err(AttemptOutcome::Fatal(error)) => return Err(error),
                Err(AttemptOutcome::Retryable {
                    error,
                    suggested_delay,
                }) => (error, suggested_delay),
            };

            if attempt >= self.policy.max_retries() {
                return Err(OmopHubError::ExhaustedRetries {
                    attempts: attempt + 1,
                    source: Box::new(error),
                });
            }

            let delay = self
                .policy
                .clamp(suggested_delay.unwrap_or_else(|| self.policy.backoff_delay(attempt)));

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying request"
            );

            sleep(delay).await;
            attempt += 1;
        }
    }

    /// One attempt: transport call plus classification.
    async fn send_once(&self, request: &ApiRequest) -> std::result::Result<Envelope, AttemptOutcome> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        };
        builder = builder
            .header(header::AUTHORIZATION, &self.authorization)
            .header(header::ACCEPT, "application/json")
            .timeout(Duration::from_millis(self.options.timeout_ms));
        if let Some(version) = &self.vocab_version {
            builder = builder.header("X-Vocab-Version", version);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return Err(retry::classify_transport_failure(err)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return Err(retry::classify_transport_failure(err)),
        };

        if !status.is_success() {
            return Err(retry::classify_http_failure(status, &headers, body));
        }

        decode::parse_envelope(&body).map_err(AttemptOutcome::Fatal)
    }
}

pub(crate) fn normalize_bearer_authorization(api_key: &str) -> String {
    let trimmed = api_key.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_bearer_authorization, OmopHub};

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("oh_test_key"),
            "Bearer oh_test_key".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR oh_test_key"),
            "bEaReR oh_test_key".to_owned()
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = OmopHub::new("oh_secret_key");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("oh_secret_key"));
    }

    #[test]
    fn with_base_url_trims_trailing_slash() {
        let client = OmopHub::new("key").with_base_url("https://staging.omophub.com/v1/");
        let debug = format!("{client:?}");
        assert!(debug.contains("https://staging.omophub.com/v1\""));
    }
}
