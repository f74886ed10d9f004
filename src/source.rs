use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ImageItem, ResponseShape};

/// One parameterized read against a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
    pub shape: ResponseShape,
}

impl ListingQuery {
    pub fn new(endpoint: String, shape: ResponseShape) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
            shape,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Same query, asking for pre-rendered fragments instead of records
    pub fn with_html(&self) -> Self {
        self.clone().with_param("html", "true")
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Server that can answer listing queries in both response forms.
///
/// A 404 is the natural end of a listing and comes back as `Ok(vec![])`.
/// Everything else that goes wrong is an `Err`; the paginator decides
/// whether that ends the session or allows a retry.
#[async_trait]
pub trait ListingSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn fetch_items(&self, query: &ListingQuery) -> Result<Vec<ImageItem>>;
    async fn fetch_fragments(&self, query: &ListingQuery) -> Result<Vec<String>>;
}
