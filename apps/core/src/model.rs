use serde::{Deserialize, Serialize};

/// One organic result as returned by the search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultItem {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    pub url: String,
}

impl ResultItem {
    pub fn new(title: &str, abstract_text: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            url: url.to_string(),
        }
    }

    /// Host segment of the URL (`scheme://host/...`), empty when there is none.
    pub fn domain(&self) -> &str {
        domain_of(&self.url)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instant_answer: Option<String>,
    #[serde(default)]
    pub results: Vec<ResultItem>,
}

impl BackendResponse {
    /// The instant answer, treating an empty string as absent.
    pub fn instant_answer(&self) -> Option<&str> {
        self.instant_answer
            .as_deref()
            .filter(|answer| !answer.trim().is_empty())
    }
}

/// Backend response tagged with the query it was fetched for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedResponse {
    pub query: String,
    #[serde(flatten)]
    pub response: BackendResponse,
}

impl CachedResponse {
    pub fn new(query: &str, response: BackendResponse) -> Self {
        Self {
            query: query.to_string(),
            response,
        }
    }

    pub fn is_valid_for(&self, query: &str) -> bool {
        self.query == query
    }
}

pub fn domain_of(url: &str) -> &str {
    url.split('/').nth(2).unwrap_or_default()
}

pub fn first_word(query: &str) -> &str {
    query.split_whitespace().next().unwrap_or_default()
}
