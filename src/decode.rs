use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{pagination::PageMeta, wire::Envelope, OmopHubError, Result};

/// Parses a success body into the response envelope.
pub(crate) fn parse_envelope(body: &str) -> Result<Envelope> {
    let raw: JsonValue = serde_json::from_str(body)
        .map_err(|err| OmopHubError::Decode(format!("invalid response envelope JSON: {err}")))?;
    let mut envelope = if raw.is_object() {
        serde_json::from_value(raw.clone())
            .map_err(|err| OmopHubError::Decode(format!("invalid response envelope: {err}")))?
    } else {
        Envelope::default()
    };
    envelope.raw = raw;
    Ok(envelope)
}

/// A 2xx body can still carry `success: false` with a structured error.
fn reported_failure(envelope: Envelope) -> Result<Envelope> {
    if envelope.success == Some(false) {
        if let Some(error) = envelope.error {
            return Err(OmopHubError::Api {
                message: error.message,
                code: error.code,
            });
        }
    }
    Ok(envelope)
}

/// Extracts and deserializes the `data` payload of an envelope.
///
/// Endpoints that reply without the envelope wrapper are decoded from the
/// body itself.
pub(crate) fn data_payload<T: DeserializeOwned>(envelope: Envelope) -> Result<T> {
    let envelope = reported_failure(envelope)?;
    let data = envelope.data.unwrap_or(envelope.raw);
    serde_json::from_value(data)
        .map_err(|err| OmopHubError::Decode(format!("unexpected data payload shape: {err}")))
}

/// Splits a paginated envelope into items and pagination metadata.
///
/// `data` is either the item array itself or an object wrapping one, e.g.
/// `{"concepts": [...]}`; both shapes occur across endpoints.
pub(crate) fn page_payload<T: DeserializeOwned>(
    envelope: Envelope,
) -> Result<(Vec<T>, Option<PageMeta>)> {
    let envelope = reported_failure(envelope)?;
    let meta = envelope.meta.and_then(|meta| meta.pagination);
    let values = match envelope.data {
        // Unwrapped body: the item array is the body itself, or sits under
        // some key of it. An envelope without items stays an empty page.
        None | Some(JsonValue::Null) => match envelope.raw {
            JsonValue::Array(values) => values,
            JsonValue::Object(map) => map
                .into_iter()
                .find_map(|(_, value)| match value {
                    JsonValue::Array(values) => Some(values),
                    _ => None,
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        },
        Some(JsonValue::Array(values)) => values,
        Some(JsonValue::Object(map)) => map
            .into_iter()
            .find_map(|(_, value)| match value {
                JsonValue::Array(values) => Some(values),
                _ => None,
            })
            .ok_or_else(|| {
                OmopHubError::Decode("paginated data payload holds no item array".to_owned())
            })?,
        Some(other) => {
            return Err(OmopHubError::Decode(format!(
                "paginated data payload is neither array nor object: {other}"
            )))
        }
    };

    let items = values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|err| OmopHubError::Decode(format!("unexpected item shape: {err}")))
        })
        .collect::<Result<Vec<T>>>()?;
    Ok((items, meta))
}

/// Builds the fatal error for a non-429 4xx response, preferring the API's
/// structured error payload over the raw body.
pub(crate) fn client_error(status: u16, headers: &HeaderMap, body: &str) -> OmopHubError {
    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let parsed: Option<Envelope> = serde_json::from_str(body).ok();
    let (message, code) = match parsed.and_then(|envelope| envelope.error) {
        Some(error) => (error.message, error.code),
        None => (body.trim().to_owned(), None),
    };

    OmopHubError::Client {
        status,
        message,
        code,
        request_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Concept;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn data_payload_decodes_typed_object() {
        let envelope = parse_envelope(
            r#"{"success": true, "data": {"concept_id": 201826, "concept_name": "Type 2 diabetes mellitus"}}"#,
        )
        .unwrap();
        let concept: Concept = data_payload(envelope).unwrap();
        assert_eq!(concept.concept_id, 201826);
        assert_eq!(concept.concept_name, "Type 2 diabetes mellitus");
    }

    #[test]
    fn data_payload_missing_is_a_decode_error() {
        let envelope = parse_envelope(r#"{"success": true}"#).unwrap();
        let result: Result<Concept> = data_payload(envelope);
        assert!(matches!(result, Err(OmopHubError::Decode(_))));
    }

    #[test]
    fn data_payload_falls_back_to_unwrapped_body() {
        let envelope = parse_envelope(r#"{"concept_id": 123, "concept_name": "Test"}"#).unwrap();
        let concept: Concept = data_payload(envelope).unwrap();
        assert_eq!(concept.concept_id, 123);
        assert_eq!(concept.concept_name, "Test");
    }

    #[test]
    fn success_false_with_error_payload_is_an_api_error() {
        let envelope = parse_envelope(
            r#"{"success": false, "error": {"message": "Release unavailable", "code": "release_unavailable"}}"#,
        )
        .unwrap();
        let result: Result<Concept> = data_payload(envelope);
        match result {
            Err(OmopHubError::Api { message, code }) => {
                assert_eq!(message, "Release unavailable");
                assert_eq!(code.as_deref(), Some("release_unavailable"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn page_payload_accepts_bare_array() {
        let envelope = parse_envelope(
            r#"{"data": [{"concept_id": 1, "concept_name": "a"}],
                "meta": {"pagination": {"page": 1, "page_size": 20, "has_next": true}}}"#,
        )
        .unwrap();
        let (items, meta): (Vec<Concept>, _) = page_payload(envelope).unwrap();
        assert_eq!(items.len(), 1);
        assert!(meta.unwrap().has_next);
    }

    #[test]
    fn page_payload_accepts_wrapped_array() {
        let envelope = parse_envelope(
            r#"{"data": {"concepts": [{"concept_id": 1, "concept_name": "a"},
                                      {"concept_id": 2, "concept_name": "b"}]},
                "meta": {"pagination": {"page": 2, "page_size": 20, "has_next": false}}}"#,
        )
        .unwrap();
        let (items, meta): (Vec<Concept>, _) = page_payload(envelope).unwrap();
        assert_eq!(items.len(), 2);
        assert!(!meta.unwrap().has_next);
    }

    #[test]
    fn page_payload_accepts_unwrapped_array_body() {
        let envelope = parse_envelope(r#"[{"concept_id": 1, "concept_name": "a"}]"#).unwrap();
        let (items, meta): (Vec<Concept>, _) = page_payload(envelope).unwrap();
        assert_eq!(items.len(), 1);
        assert!(meta.is_none());
    }

    #[test]
    fn page_payload_missing_data_is_empty_single_page() {
        let envelope = parse_envelope(r#"{"success": true}"#).unwrap();
        let (items, meta): (Vec<Concept>, _) = page_payload(envelope).unwrap();
        assert!(items.is_empty());
        assert!(meta.is_none());
    }

    #[test]
    fn client_error_prefers_structured_payload() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req_abc123"));
        let body = json!({
            "success": false,
            "error": {"message": "Not found", "code": "not_found"}
        })
        .to_string();

        match client_error(404, &headers, &body) {
            OmopHubError::Client {
                status,
                message,
                code,
                request_id,
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not found");
                assert_eq!(code.as_deref(), Some("not_found"));
                assert_eq!(request_id.as_deref(), Some("req_abc123"));
            }
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[test]
    fn client_error_falls_back_to_raw_body() {
        match client_error(400, &HeaderMap::new(), "bad request") {
            OmopHubError::Client { message, code, .. } => {
                assert_eq!(message, "bad request");
                assert!(code.is_none());
            }
            other => panic!("expected client error, got {other:?}"),
        }
    }
}
