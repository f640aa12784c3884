use serde_json::Value as JsonValue;

/// HTTP verb of an [`ApiRequest`]. The API only uses these two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
}

/// One fully built API call. Immutable once handed to an executor; the
/// builder methods below consume and return the request by value.
#[derive(Clone, Debug)]
pub(crate) struct ApiRequest {
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
    pub(crate) query: Vec<(&'static str, String)>,
    pub(crate) body: Option<JsonValue>,
}

impl ApiRequest {
    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn post(path: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub(crate) fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present.
    pub(crate) fn param_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Adds `key=true` only when the flag is set. The API treats absent
    /// flags as false.
    pub(crate) fn flag(self, key: &'static str, on: bool) -> Self {
        if on {
            self.param(key, "true")
        } else {
            self
        }
    }

    /// Adds a comma-joined list parameter, skipped when empty.
    pub(crate) fn list(self, key: &'static str, values: &[String]) -> Self {
        if values.is_empty() {
            self
        } else {
            self.param(key, values.join(","))
        }
    }

    /// Appends pagination parameters for one page fetch.
    pub(crate) fn paged(self, page: u32, page_size: u32) -> Self {
        self.param("page", page).param("page_size", page_size)
    }
}
