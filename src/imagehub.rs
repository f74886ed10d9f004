use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{FeedError, Result};
use crate::source::{ListingQuery, ListingSource};
use crate::types::{ImageItem, ResponseShape};

pub struct ImageHub {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for ImageHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHub")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ImageHub {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("imagefeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, query: &ListingQuery) -> String {
        let qs = query.query_string();
        if qs.is_empty() {
            format!("{}/api/v1/{}", self.base_url, query.endpoint)
        } else {
            format!("{}/api/v1/{}?{}", self.base_url, query.endpoint, qs)
        }
    }

    async fn get_listing<T: DeserializeOwned>(&self, query: &ListingQuery) -> Result<Vec<T>> {
        let url = self.api_url(query);
        tracing::debug!(%url, "fetching listing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "listing returned 404, treating as empty");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        decode_listing(query.shape, &body)
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct PagedBody<T> {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    results: Vec<T>,
}

/// Decode a 200 body into its list of entries.
pub fn decode_listing<T: DeserializeOwned>(shape: ResponseShape, body: &str) -> Result<Vec<T>> {
    match shape {
        ResponseShape::Bare => {
            serde_json::from_str(body).map_err(|e| FeedError::Decode(e.to_string()))
        }
        ResponseShape::Paged => {
            let paged: PagedBody<T> =
                serde_json::from_str(body).map_err(|e| FeedError::Decode(e.to_string()))?;
            if let Some(count) = paged.count {
                tracing::trace!(count, returned = paged.results.len(), "paged listing");
            }
            Ok(paged.results)
        }
    }
}

#[async_trait]
impl ListingSource for ImageHub {
    fn name(&self) -> &str {
        "imagehub"
    }

    async fn fetch_items(&self, query: &ListingQuery) -> Result<Vec<ImageItem>> {
        self.get_listing(query).await
    }

    async fn fetch_fragments(&self, query: &ListingQuery) -> Result<Vec<String>> {
        self.get_listing(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_base_endpoint_and_params() {
        let hub = ImageHub::new("http://localhost:8000/").unwrap();
        let q = ListingQuery::new("images/recents".into(), ResponseShape::Paged)
            .with_param("limit", 10)
            .with_param("p", 3);
        assert_eq!(
            hub.api_url(&q.with_html()),
            "http://localhost:8000/api/v1/images/recents?limit=10&p=3&html=true"
        );
    }

    #[test]
    fn api_url_without_params() {
        let hub = ImageHub::new("https://hub.example").unwrap();
        let q = ListingQuery::new("images".into(), ResponseShape::Bare);
        assert_eq!(hub.api_url(&q), "https://hub.example/api/v1/images");
    }

    #[test]
    fn decode_bare_item_list() {
        let items: Vec<ImageItem> =
            decode_listing(ResponseShape::Bare, r#"[{"id": 1}, {"id": 2}]"#).unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn decode_paged_fragments() {
        let frags: Vec<String> = decode_listing(
            ResponseShape::Paged,
            r#"{"count": 31, "results": ["<div>a</div>", "<div>b</div>"]}"#,
        )
        .unwrap();
        assert_eq!(frags, vec!["<div>a</div>", "<div>b</div>"]);
    }

    #[test]
    fn decode_paged_without_results_is_empty() {
        let items: Vec<ImageItem> = decode_listing(ResponseShape::Paged, r#"{"detail": "x"}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn decode_shape_mismatch_is_an_error() {
        let err = decode_listing::<ImageItem>(ResponseShape::Bare, r#"{"results": []}"#).unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
    }
}
