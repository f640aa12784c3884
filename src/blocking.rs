//! Blocking client, enabled by the `blocking` cargo feature.
//!
//! Same endpoints, same retry policy and same pagination cursor as the
//! async [`crate::OmopHub`]; only the transport call and the wait are
//! expressed synchronously.

use std::collections::VecDeque;
use std::fmt;
use std::thread;
use std::time::Duration;

use reqwest::header;
use serde::de::DeserializeOwned;

use crate::{
    client::{normalize_bearer_authorization, DEFAULT_BASE_URL},
    decode,
    pagination::{PageCursor, PageMeta, Paged},
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

/// Blocking HTTP client for the OMOPHub medical vocabulary API.
#[derive(Clone)]
pub struct OmopHub {
    http: reqwest::blocking::Client,
    base_url: String,
    authorization: String,
    vocab_version: Option<String>,
    options: ClientOptions,
    policy: RetryPolicy,
}

impl fmt::Debug for OmopHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::OmopHub")
            .field("base_url", &self.base_url)
            .field("authorization", &"<redacted>")
            .field("vocab_version", &self.vocab_version)
            .field("options", &self.options)
            .finish()
    }
}

impl OmopHub {
    /// Creates a blocking client against the production endpoint.
    pub fn new(api_key: impl AsRef<str>) -> Self {
        let options = ClientOptions::default();
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            authorization: normalize_bearer_authorization(api_key.as_ref()),
            vocab_version: None,
            policy: RetryPolicy::new(&options),
            options,
        }
    }

    /// Creates a client from `OMOPHUB_API_KEY` and optional
    /// `OMOPHUB_BASE_URL`.
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

    /// Points the client at a different endpoint.
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

    /// Pins every request to a specific vocabulary release.
    pub fn with_vocab_version(mut self, version: impl Into<String>) -> Self {
        self.vocab_version = Some(version.into());
        self
    }

    pub fn concept(&self, concept_id: i64, options: &ConceptOptions) -> Result<Concept> {
        self.fetch(options.request(concept_id))
    }

    pub fn concept_by_code(&self, vocabulary_id: &str, concept_code: &str) -> Result<Concept> {
        self.fetch(ApiRequest::get(format!(
            "/concepts/by-code/{vocabulary_id}/{concept_code}"
        )))
    }

    pub fn concepts_batch(&self, request: &BatchConceptsRequest) -> Result<BatchConceptResult> {
        self.fetch(request.request())
    }

    pub fn suggest_concepts(
        &self,
        query: &str,
        options: &SuggestOptions,
    ) -> Result<Vec<Suggestion>> {
        self.fetch_items(options.request(query))
    }

    pub fn related_concepts(
        &self,
        concept_id: i64,
        options: &RelatedOptions,
    ) -> Result<Vec<RelatedConcept>> {
        self.fetch_items(options.request(concept_id))
    }

    pub fn concept_relationships(
        &self,
        concept_id: i64,
        options: &RelationshipOptions,
    ) -> Result<Vec<ConceptRelationship>> {
        self.fetch_items(options.request(concept_id))
    }

    pub fn search_concepts(&self, query: &SearchQuery) -> Result<Paged<Concept>> {
        self.fetch_paged(query.request())
    }

    /// Iterates every result of a concept search across pages.
    pub fn search_concepts_pages(&self, query: &SearchQuery) -> Pager<'_, Concept> {
        Pager::new(self, query.template(), query.page_size)
    }

    pub fn advanced_search(&self, query: &SearchQuery) -> Result<Paged<Concept>> {
        self.fetch_paged(query.advanced_request())
    }

    pub fn autocomplete(&self, query: &str, limit: Option<u32>) -> Result<Vec<Suggestion>> {
        self.fetch_items(
            ApiRequest::get("/search/suggest")
                .param("query", query)
                .param_opt("limit", limit),
        )
    }

    pub fn concept_ancestors(
        &self,
        concept_id: i64,
        options: &HierarchyOptions,
    ) -> Result<Paged<HierarchyConcept>> {
        self.fetch_paged(options.request(concept_id, HierarchyDirection::Ancestors))
    }

    pub fn concept_descendants(
        &self,
        concept_id: i64,
        options: &HierarchyOptions,
    ) -> Result<Paged<HierarchyConcept>> {
        self.fetch_paged(options.request(concept_id, HierarchyDirection::Descendants))
    }

    pub fn concept_mappings(
        &self,
        concept_id: i64,
        options: &MappingOptions,
    ) -> Result<Paged<ConceptMapping>> {
        self.fetch_paged(options.request(concept_id))
    }

    pub fn map_concepts(&self, request: &MapConceptsRequest) -> Result<Vec<MappingResult>> {
        self.fetch_items(request.request())
    }

    pub fn vocabularies(&self, options: &VocabularyListOptions) -> Result<Vec<Vocabulary>> {
        self.fetch_items(options.request())
    }

    pub fn vocabulary(&self, vocabulary_id: &str) -> Result<Vocabulary> {
        self.fetch(ApiRequest::get(format!("/vocabularies/{vocabulary_id}")))
    }

    pub fn vocabulary_stats(&self, vocabulary_id: &str) -> Result<VocabularyStats> {
        self.fetch(ApiRequest::get(format!(
            "/vocabularies/{vocabulary_id}/stats"
        )))
    }

    pub fn vocabulary_domains(&self) -> Result<Vec<VocabularyDomain>> {
        self.fetch_items(ApiRequest::get("/vocabularies/domains"))
    }

    pub fn vocabulary_concepts_pages(
        &self,
        vocabulary_id: &str,
        filter: &VocabularyConceptsFilter,
        page_size: u32,
    ) -> Pager<'_, Concept> {
        Pager::new(self, filter.template(vocabulary_id), page_size)
    }

    pub fn domains(&self, options: &DomainListOptions) -> Result<Vec<Domain>> {
        self.fetch_items(options.request())
    }

    pub fn domain_concepts_pages(&self, domain_id: &str, page_size: u32) -> Pager<'_, Concept> {
        Pager::new(
            self,
            ApiRequest::get(format!("/domains/{domain_id}/concepts")),
            page_size,
        )
    }

    pub fn relationship_types(
        &self,
        options: &RelationshipTypesOptions,
    ) -> Result<Vec<RelationshipType>> {
        self.fetch_items(options.request())
    }

    fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let envelope = self.send_with_retry(&request)?;
        decode::data_payload(envelope)
    }

    fn fetch_items<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Vec<T>> {
        let (items, _) = self.fetch_page(&request)?;
        Ok(items)
    }

    fn fetch_paged<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Paged<T>> {
        let (items, meta) = self.fetch_page(&request)?;
        Ok(Paged { items, meta })
    }

    fn fetch_page<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<(Vec<T>, Option<PageMeta>)> {
        let envelope = self.send_with_retry(request)?;
        decode::page_payload(envelope)
    }

    /// Sends one logical request, retrying per policy. The decision logic
    /// is identical to the async executor; only the wait differs.
    fn send_with_retry(&self, request: &ApiRequest) -> Result<Envelope> {
        let mut attempt: u32 = 0;
        loop {
            let (error, suggested_delay) = match self.send_once(request) {
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

            thread::sleep(delay);
            attempt += 1;
        }
    }

    fn send_once(&self, request: &ApiRequest) -> std::result::Result<Envelope, AttemptOutcome> {
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

        let response = match builder.send() {
            Ok(response) => response,
            Err(err) => return Err(retry::classify_transport_failure(err)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => return Err(retry::classify_transport_failure(err)),
        };

        if !status.is_success() {
            return Err(retry::classify_http_failure(status, &headers, body));
        }

        decode::parse_envelope(&body).map_err(AttemptOutcome::Fatal)
    }
}

/// Blocking counterpart of [`crate::Pager`]: iterates items across pages.
///
/// Yields `Result<T>`; a failed page fetch yields its error once and ends
/// the iteration.
pub struct Pager<'a, T> {
    client: &'a OmopHub,
    template: ApiRequest,
    cursor: PageCursor,
    buffer: VecDeque<T>,
}

impl<'a, T: DeserializeOwned> Pager<'a, T> {
    fn new(client: &'a OmopHub, template: ApiRequest, page_size: u32) -> Self {
        Self {
            client,
            template,
            cursor: PageCursor::new(page_size),
            buffer: VecDeque::new(),
        }
    }

    /// Fetches the next page, or `None` once the server reports the end.
    pub fn next_page(&mut self) -> Option<Result<Paged<T>>> {
        let (page, page_size) = self.cursor.next_request()?;
        let request = self.template.clone().paged(page, page_size);
        match self.client.fetch_page(&request) {
            Ok((items, meta)) => {
                self.cursor.advance(meta.as_ref());
                Some(Ok(Paged { items, meta }))
            }
            Err(err) => {
                self.cursor.finish();
                Some(Err(err))
            }
        }
    }
}

impl<'a, T: DeserializeOwned> Iterator for Pager<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.next_page()? {
                Ok(page) => self.buffer.extend(page.items),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
