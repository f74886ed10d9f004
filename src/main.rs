mod action;
mod app;
mod config;
mod dedup;
mod error;
mod event;
mod feed;
mod imagehub;
mod layout;
mod paginator;
mod source;
#[cfg(test)]
mod testing;
mod trigger;
mod tui;
mod types;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::error::FeedError;
use crate::event::Event;
use crate::feed::PrintSink;
use crate::imagehub::ImageHub;
use crate::paginator::{drain, Paginator};
use crate::source::ListingSource;
use crate::tui::EventHandler;
use crate::types::{ImageId, PageContext};

#[derive(Parser, Debug)]
#[command(name = "imagefeed", version, about)]
struct Cli {
    /// Server base URL, e.g. http://localhost:8000
    #[arg(long, global = true)]
    server: Option<String>,

    /// Config file (default: <config dir>/imagefeed/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Page context as JSON, instead of a listing subcommand
    #[arg(long)]
    context: Option<PathBuf>,

    /// Ids already shown, excluded from the feed
    #[arg(long, global = true, value_delimiter = ',')]
    seen: Vec<ImageId>,

    /// First page for paged listings [default: 1, or the context's own]
    #[arg(long, global = true)]
    start_page: Option<u32>,

    /// Print fragments to stdout instead of opening the TUI
    #[arg(long, global = true)]
    print: bool,

    /// Stop after this many cycles in --print mode
    #[arg(long, global = true)]
    max_cycles: Option<usize>,

    #[command(subcommand)]
    listing: Option<Listing>,
}

#[derive(Subcommand, Debug, Clone)]
enum Listing {
    /// Every image, excluding ones already shown
    All,
    /// Most recently uploaded first
    Recent,
    /// Images in one category
    Category { slug: String },
    /// Images uploaded by one account
    Account {
        username: String,
        /// Only images after this one
        #[arg(long)]
        after: Option<ImageId>,
    },
}

impl Cli {
    fn page_context(&self) -> Result<PageContext, FeedError> {
        let mut context = match (&self.context, &self.listing) {
            (Some(path), _) => {
                let json = std::fs::read_to_string(path)?;
                PageContext::from_json(&json)?
            }
            (None, None) | (None, Some(Listing::All)) => PageContext::new("index"),
            (None, Some(Listing::Recent)) => PageContext::new("recents"),
            (None, Some(Listing::Category { slug })) => {
                let mut ctx = PageContext::new("category");
                ctx.category_slug = Some(slug.clone());
                ctx
            }
            (None, Some(Listing::Account { username, after })) => {
                let mut ctx = PageContext::new("account");
                ctx.username = Some(username.clone());
                ctx.image_id = *after;
                ctx
            }
        };

        // Flags add to a loaded context rather than replacing it
        context.images.extend(&self.seen);
        match (self.start_page, &self.context) {
            (Some(page), _) => context.start_page = page.max(1),
            (None, None) => context.start_page = 1,
            (None, Some(_)) => {}
        }
        Ok(context)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }

    let context = cli.page_context()?;
    let paginator = Paginator::new(&context, config.feed.page_size, config.feed.on_error)?;
    let source: Arc<dyn ListingSource> = Arc::new(ImageHub::new(&config.server.base_url)?);
    tracing::info!(mode = %paginator.mode(), server = %config.server.base_url, "session start");

    if cli.print {
        return run_headless(source, paginator, &config, cli.max_cycles).await;
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(source, paginator, &config).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    source: Arc<dyn ListingSource>,
    paginator: Paginator,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(source, paginator, &config.feed, action_tx.clone());
    let size = terminal.size()?;
    app.reflow(size.width, size.height);

    let reflow_rate = Duration::from_millis(config.ui.tick_rate_ms.max(16));
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(reflow_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    app.update(Action::Quit);
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    Event::Tick => {
                        let size = terminal.size()?;
                        app.reflow(size.width, size.height);
                    }
                    Event::Resize(width, height) => {
                        app.reflow(width, height);
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn run_headless(
    source: Arc<dyn ListingSource>,
    mut paginator: Paginator,
    config: &Config,
    max_cycles: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut sink = PrintSink::new(stdout.lock());

    let cycles = drain(
        source,
        &mut paginator,
        &mut sink,
        config.feed.fetch_timeout(),
        max_cycles,
    )
    .await;

    tracing::info!(cycles, printed = sink.written(), "headless run finished");
    Ok(())
}
