use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FeedError, Result};

pub type ImageId = u64;

/// Structured record returned by the listing endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    pub id: ImageId,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub open_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ImageItem {
    #[cfg(test)]
    pub fn with_id(id: ImageId) -> Self {
        Self {
            id,
            file_url: None,
            open_url: None,
            description: String::new(),
            category_id: None,
            user_id: None,
            uploaded_at: None,
            updated_at: None,
        }
    }
}

/// How a listing advances from one fetch cycle to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `limit` + `p`, page number incremented per cycle
    Counter,
    /// `exclude`, the server skips everything already shown
    Exclusion,
}

/// Body layout of a 200 response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A bare JSON list
    Bare,
    /// `{ "count": n, "results": [...] }`
    Paged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingMode {
    All,
    Recent,
    ByCategory { slug: String },
    ByAccount { username: String },
    ByAccountAfterId { image_id: ImageId },
}

impl ListingMode {
    /// Path below `/api/v1/`
    pub fn endpoint(&self) -> String {
        match self {
            ListingMode::All => "images".to_string(),
            ListingMode::Recent => "images/recents".to_string(),
            ListingMode::ByCategory { slug } => {
                format!("images/category/{}", urlencoding::encode(slug))
            }
            ListingMode::ByAccount { username } => {
                format!("images/account/{}", urlencoding::encode(username))
            }
            ListingMode::ByAccountAfterId { image_id } => format!("image/id/{}/after", image_id),
        }
    }

    pub fn pagination(&self) -> Pagination {
        match self {
            ListingMode::All => Pagination::Exclusion,
            _ => Pagination::Counter,
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            ListingMode::All => ResponseShape::Bare,
            _ => ResponseShape::Paged,
        }
    }

    pub fn title(&self) -> String {
        match self {
            ListingMode::All => "All images".to_string(),
            ListingMode::Recent => "Recent images".to_string(),
            ListingMode::ByCategory { slug } => format!("Category: {}", slug),
            ListingMode::ByAccount { username } => format!("Account: {}", username),
            ListingMode::ByAccountAfterId { image_id } => format!("After image #{}", image_id),
        }
    }
}

impl fmt::Display for ListingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

fn default_start_page() -> u32 {
    2
}

/// Page context handed over at session start. Read once; the listing mode
/// it resolves to is fixed for the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub key: String,
    /// Identifiers already on screen before the first cycle
    #[serde(default)]
    pub images: Vec<ImageId>,
    #[serde(default, alias = "category_slug")]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "image_id")]
    pub image_id: Option<ImageId>,
    /// First page requested by counter-based modes
    #[serde(default = "default_start_page", alias = "start_page")]
    pub start_page: u32,
}

impl PageContext {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            images: Vec::new(),
            category_slug: None,
            username: None,
            image_id: None,
            start_page: default_start_page(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FeedError::Context(e.to_string()))
    }

    pub fn listing_mode(&self) -> Result<ListingMode> {
        match self.key.as_str() {
            "index" | "all" => Ok(ListingMode::All),
            "recents" | "recent" => Ok(ListingMode::Recent),
            "category" => {
                let slug = non_empty(self.category_slug.as_deref())
                    .ok_or_else(|| FeedError::Context("category listing needs a slug".into()))?;
                Ok(ListingMode::ByCategory {
                    slug: slug.to_string(),
                })
            }
            "account" => {
                if let Some(image_id) = self.image_id {
                    return Ok(ListingMode::ByAccountAfterId { image_id });
                }
                let username = non_empty(self.username.as_deref()).ok_or_else(|| {
                    FeedError::Context("account listing needs a username or image id".into())
                })?;
                Ok(ListingMode::ByAccount {
                    username: username.to_string(),
                })
            }
            other => Err(FeedError::Context(format!(
                "unknown listing key '{}'",
                other
            ))),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
