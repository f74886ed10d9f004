use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::config::FeedConfig;
use crate::event::Event;
use crate::feed::Feed;
use crate::layout::FeedLayout;
use crate::paginator::{run_cycle, CycleOutcome, PagerState, Paginator};
use crate::source::{ListingQuery, ListingSource};
use crate::trigger::{ScrollTrigger, Viewport};
use crate::types::ImageItem;

/// Header + status bar
const CHROME_ROWS: u16 = 2;
/// Feed block borders
const BORDER: u16 = 2;

pub struct App {
    pub paginator: Paginator,
    pub feed: Feed,
    pub layout: FeedLayout,
    pub scroll_offset: usize,
    pub viewport_height: usize,
    pub feed_width: usize,
    pub error: Option<String>,
    pub should_quit: bool,
    trigger: ScrollTrigger,
    fetch_timeout: Duration,
    source: Arc<dyn ListingSource>,
    cancel: CancellationToken,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        source: Arc<dyn ListingSource>,
        paginator: Paginator,
        config: &FeedConfig,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            paginator,
            feed: Feed::default(),
            layout: FeedLayout::default(),
            scroll_offset: 0,
            viewport_height: 0,
            feed_width: 0,
            error: None,
            should_quit: false,
            trigger: ScrollTrigger::new(config.scroll_threshold),
            fetch_timeout: config.fetch_timeout(),
            source,
            cancel: CancellationToken::new(),
            action_tx,
        }
    }

    pub fn pager_state(&self) -> PagerState {
        self.paginator.state()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            offset: self.scroll_offset,
            height: self.viewport_height,
            content_height: self.layout.content_height(),
        }
    }

    /// Re-lay-out the feed for a terminal of `width` x `height` cells.
    pub fn reflow(&mut self, width: u16, height: u16) {
        self.feed_width = width.saturating_sub(BORDER) as usize;
        self.viewport_height = height.saturating_sub(CHROME_ROWS + BORDER) as usize;
        self.relayout();
    }

    /// Rebuild the layout at the current size if the feed or width changed.
    fn relayout(&mut self) {
        if self.layout.is_stale(&self.feed, self.feed_width) {
            self.layout = FeedLayout::reflow(&self.feed, self.feed_width);
        }
        self.scroll_offset = self.scroll_offset.min(self.viewport().max_offset());
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::CheckScroll,
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('d') if ctrl => Action::PageDown,
            KeyCode::Char('u') if ctrl => Action::PageUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Char('o') => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some() && !matches!(action, Action::CycleFinished(_) | Action::None) {
            self.error = None;
        }

        let scrolled = action.is_scroll();
        let half_page = (self.viewport_height / 2).max(1);
        let max_offset = self.viewport().max_offset();

        match action {
            Action::Quit => {
                self.cancel.cancel();
                self.should_quit = true;
            }
            Action::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            Action::ScrollDown => {
                self.scroll_offset = (self.scroll_offset + 1).min(max_offset);
            }
            Action::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(half_page);
            }
            Action::PageDown => {
                self.scroll_offset = (self.scroll_offset + half_page).min(max_offset);
            }
            Action::GoToTop => {
                self.scroll_offset = 0;
            }
            Action::GoToBottom => {
                self.scroll_offset = max_offset;
            }
            Action::CheckScroll => {}

            Action::CycleFinished(payload) => {
                match self.paginator.complete_cycle(*payload, &mut self.feed) {
                    CycleOutcome::Failed(msg) => {
                        self.error = Some(msg);
                    }
                    CycleOutcome::Appended { .. } | CycleOutcome::Exhausted => {
                        self.relayout();
                    }
                    CycleOutcome::Skipped | CycleOutcome::Ignored => {}
                }
            }

            Action::OpenInBrowser => {
                match self.selected_item().and_then(|item| item.open_url.clone()) {
                    Some(url) => {
                        if let Err(e) = open::that(&url) {
                            self.error = Some(format!("Failed to open browser: {}", e));
                        }
                    }
                    None => self.error = Some("No link for this image".to_string()),
                }
            }
            Action::YankUrl => {
                match self.selected_item().and_then(|item| item.file_url.clone()) {
                    Some(url) => {
                        let copied = arboard::Clipboard::new()
                            .and_then(|mut clipboard| clipboard.set_text(url));
                        if let Err(e) = copied {
                            self.error = Some(format!("Failed to copy: {}", e));
                        }
                    }
                    None => self.error = Some("No file URL for this image".to_string()),
                }
            }

            Action::None => {}
        }

        if scrolled {
            self.check_scroll();
        }
    }

    /// Entry at the top of the viewport
    pub fn selected_item(&self) -> Option<&ImageItem> {
        let index = self.layout.entry_at(self.scroll_offset)?;
        self.feed.entries().get(index)?.item.as_ref()
    }

    fn check_scroll(&mut self) {
        if !self.trigger.should_fire(&self.viewport()) {
            return;
        }
        if let Some(query) = self.paginator.begin_cycle() {
            self.spawn_cycle(query);
        }
    }

    fn spawn_cycle(&self, query: ListingQuery) {
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        let deadline = self.fetch_timeout;
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            let payload = run_cycle(source, query, deadline, cancel).await;
            tx.send(Action::CycleFinished(Box::new(payload))).ok();
        });
    }
}
