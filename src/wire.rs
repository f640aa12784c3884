use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::pagination::PageMeta;

/// Response envelope shared by every OMOPHub endpoint:
/// `{"success": ..., "data": ..., "meta": {...}, "error": {...}}`.
///
/// A few endpoints reply without the wrapper; `raw` keeps the parsed body
/// so the decoders can fall back to it.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<JsonValue>,
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    #[serde(skip)]
    pub raw: JsonValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Meta {
    #[serde(default)]
    pub pagination: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}
