//! In-memory listing source for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::source::{ListingQuery, ListingSource};
use crate::types::{ImageId, ImageItem};

pub fn items(ids: &[ImageId]) -> Vec<ImageItem> {
    ids.iter().map(|&id| ImageItem::with_id(id)).collect()
}

pub fn fragments(ids: &[ImageId]) -> Vec<String> {
    ids.iter()
        .map(|id| format!("<div class=\"masonry-item\"><img alt=\"image {}\"></div>", id))
        .collect()
}

/// Answers each call with the next scripted response; an empty script
/// answers with an empty listing, like a 404.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    items: Mutex<VecDeque<Result<Vec<ImageItem>>>>,
    fragments: Mutex<VecDeque<Result<Vec<String>>>>,
    calls: Mutex<Vec<ListingQuery>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, items: Result<Vec<ImageItem>>, fragments: Result<Vec<String>>) {
        self.items.lock().unwrap().push_back(items);
        self.fragments.lock().unwrap().push_back(fragments);
    }

    pub fn calls(&self) -> Vec<ListingQuery> {
        self.calls.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_items(&self, query: &ListingQuery) -> Result<Vec<ImageItem>> {
        self.calls.lock().unwrap().push(query.clone());
        self.pause().await;
        self.items
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_fragments(&self, query: &ListingQuery) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(query.clone());
        self.pause().await;
        self.fragments
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
