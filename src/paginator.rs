//! Fetch-cycle state machine.
//!
//! A session moves `Idle -> Loading -> Idle` for every cycle that finds new
//! images, and ends in `Exhausted` once a cycle finds none. Only one cycle
//! is in flight at a time; [`Paginator::begin_cycle`] refuses to start
//! another while one is outstanding or after exhaustion.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::dedup::SeenSet;
use crate::error::{FeedError, Result};
use crate::feed::{AppendSink, Fragment};
use crate::source::{ListingQuery, ListingSource};
use crate::types::{ImageId, ImageItem, ListingMode, PageContext, Pagination};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    Loading,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Next page number to request
    Page(u32),
    /// Everything in the seen set is excluded server-side
    Exclude,
}

/// What a failed fetch means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Treat the failure as an empty listing, ending the session
    #[default]
    Exhaust,
    /// Go back to idle at the same cursor so the next scroll retries
    Retry,
}

/// Both halves of one cycle: structured records and rendered fragments.
#[derive(Debug)]
pub struct CyclePayload {
    pub items: Result<Vec<ImageItem>>,
    pub fragments: Result<Vec<String>>,
}

impl CyclePayload {
    pub fn failed(err: FeedError) -> Self {
        Self {
            items: Err(err),
            fragments: Ok(Vec::new()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum CycleOutcome {
    /// New ids were admitted and the whole fragment batch went to the sink
    Appended {
        admitted: Vec<ImageId>,
        fragments: usize,
    },
    /// No new ids; the session is over
    Exhausted,
    /// Records without fragments (or a cancelled cycle); nothing changed
    Skipped,
    /// Fetch failed under [`FailurePolicy::Retry`]
    Failed(String),
    /// Completion arrived with no cycle in flight
    Ignored,
}

#[derive(Debug)]
pub struct Paginator {
    mode: ListingMode,
    page_size: u32,
    cursor: Cursor,
    seen: SeenSet,
    in_flight: bool,
    exhausted: bool,
    policy: FailurePolicy,
}

impl Paginator {
    pub fn new(context: &PageContext, page_size: u32, policy: FailurePolicy) -> Result<Self> {
        let mode = context.listing_mode()?;
        let cursor = match mode.pagination() {
            Pagination::Counter => Cursor::Page(context.start_page),
            Pagination::Exclusion => Cursor::Exclude,
        };

        Ok(Self {
            mode,
            page_size,
            cursor,
            seen: SeenSet::from_ids(context.images.iter().copied()),
            in_flight: false,
            exhausted: false,
            policy,
        })
    }

    pub fn mode(&self) -> &ListingMode {
        &self.mode
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn state(&self) -> PagerState {
        if self.exhausted {
            PagerState::Exhausted
        } else if self.in_flight {
            PagerState::Loading
        } else {
            PagerState::Idle
        }
    }

    /// Structured-form query for the current cursor
    pub fn query(&self) -> ListingQuery {
        let query = ListingQuery::new(self.mode.endpoint(), self.mode.response_shape());
        let query = match self.cursor {
            Cursor::Page(page) => query
                .with_param("limit", self.page_size)
                .with_param("p", page),
            Cursor::Exclude => query.with_param("exclude", self.seen.exclude_param()),
        };

        match self.mode {
            ListingMode::ByAccountAfterId { .. } => query.with_param("filter_by", "account"),
            _ => query,
        }
    }

    /// Start a cycle unless one is in flight or the listing is exhausted.
    pub fn begin_cycle(&mut self) -> Option<ListingQuery> {
        if self.exhausted {
            tracing::trace!("listing exhausted, not fetching");
            return None;
        }
        if self.in_flight {
            tracing::trace!("cycle already in flight");
            return None;
        }

        self.in_flight = true;
        let query = self.query();
        tracing::debug!(endpoint = %query.endpoint, params = %query.query_string(), "cycle started");
        Some(query)
    }

    pub fn complete_cycle(
        &mut self,
        payload: CyclePayload,
        sink: &mut dyn AppendSink,
    ) -> CycleOutcome {
        if !self.in_flight {
            tracing::warn!("cycle completion without a cycle in flight");
            return CycleOutcome::Ignored;
        }
        self.in_flight = false;

        let items = match payload.items {
            Ok(items) => items,
            Err(FeedError::Cancelled) => return CycleOutcome::Skipped,
            Err(e) => match self.policy {
                FailurePolicy::Retry => {
                    tracing::warn!(error = %e, "structured fetch failed, will retry");
                    return CycleOutcome::Failed(e.to_string());
                }
                FailurePolicy::Exhaust => {
                    tracing::warn!(error = %e, "structured fetch failed");
                    Vec::new()
                }
            },
        };

        if items.is_empty() {
            self.exhaust(sink);
            return CycleOutcome::Exhausted;
        }

        let fragments = match payload.fragments {
            Ok(fragments) => fragments,
            Err(e) => match self.policy {
                FailurePolicy::Retry => {
                    tracing::warn!(error = %e, "fragment fetch failed, will retry");
                    return CycleOutcome::Failed(e.to_string());
                }
                FailurePolicy::Exhaust => {
                    tracing::warn!(error = %e, "fragment fetch failed");
                    Vec::new()
                }
            },
        };

        if fragments.is_empty() {
            tracing::debug!(items = items.len(), "fragment payload missing, skipping cycle");
            return CycleOutcome::Skipped;
        }

        let admitted = self.seen.filter_new(&items);
        if admitted.is_empty() {
            self.exhaust(sink);
            return CycleOutcome::Exhausted;
        }

        let batch = pair_fragments(items, fragments);
        let count = batch.len();
        sink.append(batch);

        if let Cursor::Page(page) = &mut self.cursor {
            *page += 1;
        }

        tracing::info!(new = admitted.len(), fragments = count, "appended page");
        CycleOutcome::Appended {
            admitted,
            fragments: count,
        }
    }

    fn exhaust(&mut self, sink: &mut dyn AppendSink) {
        self.exhausted = true;
        sink.end_of_results();
        tracing::info!(seen = self.seen.len(), "listing exhausted");
    }
}

/// Attach records to fragments by position. The batch is shown whole
/// either way; records only ride along when both lists have the same length.
fn pair_fragments(items: Vec<ImageItem>, fragments: Vec<String>) -> Vec<Fragment> {
    if items.len() != fragments.len() {
        tracing::debug!(
            items = items.len(),
            fragments = fragments.len(),
            "response lengths differ, appending fragments unpaired"
        );
        return fragments.into_iter().map(Fragment::new).collect();
    }

    items
        .into_iter()
        .zip(fragments)
        .map(|(item, html)| Fragment {
            html,
            item: Some(item),
        })
        .collect()
}

/// Run both fetches of one cycle, bounded by `deadline` and `cancel`.
pub async fn run_cycle(
    source: Arc<dyn ListingSource>,
    query: ListingQuery,
    deadline: Duration,
    cancel: CancellationToken,
) -> CyclePayload {
    let html_query = query.with_html();
    let fetch = async {
        tokio::join!(
            source.fetch_items(&query),
            source.fetch_fragments(&html_query)
        )
    };

    tokio::select! {
        _ = cancel.cancelled() => CyclePayload::failed(FeedError::Cancelled),
        res = tokio::time::timeout(deadline, fetch) => match res {
            Ok((items, fragments)) => CyclePayload { items, fragments },
            Err(_) => CyclePayload::failed(FeedError::Timeout(deadline)),
        },
    }
}

/// Run cycles back to back until the listing is exhausted, a cycle makes
/// no progress, or `max_cycles` is reached. Returns the number of cycles run.
pub async fn drain(
    source: Arc<dyn ListingSource>,
    paginator: &mut Paginator,
    sink: &mut dyn AppendSink,
    deadline: Duration,
    max_cycles: Option<usize>,
) -> usize {
    let cancel = CancellationToken::new();
    let mut cycles = 0;

    while max_cycles.map_or(true, |max| cycles < max) {
        let Some(query) = paginator.begin_cycle() else {
            break;
        };
        cycles += 1;

        let payload = run_cycle(Arc::clone(&source), query, deadline, cancel.clone()).await;
        match paginator.complete_cycle(payload, sink) {
            CycleOutcome::Appended { .. } => {}
            CycleOutcome::Exhausted | CycleOutcome::Ignored => break,
            // Without a reader scrolling there is no later retry
            CycleOutcome::Failed(msg) => {
                tracing::warn!(%msg, "cycle failed, stopping");
                break;
            }
            CycleOutcome::Skipped => {
                tracing::warn!("records arrived without fragments, stopping");
                break;
            }
        }
    }

    cycles
}
