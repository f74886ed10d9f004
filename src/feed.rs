use std::io::Write;

use crate::types::ImageItem;

pub const END_OF_POSTS: &str = "End of posts";

/// A pre-rendered entry, with its structured record when the two
/// responses lined up.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub html: String,
    pub item: Option<ImageItem>,
}

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            item: None,
        }
    }
}

/// Where a finished cycle puts its fragments. Appends are trusted: the
/// caller has already decided what should be shown.
pub trait AppendSink {
    fn append(&mut self, fragments: Vec<Fragment>);
    fn end_of_results(&mut self);
}

/// The append-only display surface of the terminal client.
#[derive(Debug, Default)]
pub struct Feed {
    entries: Vec<Fragment>,
    ended: bool,
    /// Bumped on every mutation so the layout knows when to rebuild
    revision: u64,
}

impl Feed {
    pub fn entries(&self) -> &[Fragment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl AppendSink for Feed {
    fn append(&mut self, fragments: Vec<Fragment>) {
        if fragments.is_empty() {
            return;
        }
        self.entries.extend(fragments);
        self.revision += 1;
    }

    fn end_of_results(&mut self) {
        if !self.ended {
            self.ended = true;
            self.revision += 1;
        }
    }
}

/// Writes fragments straight to an output stream, one per line.
pub struct PrintSink<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AppendSink for PrintSink<W> {
    fn append(&mut self, fragments: Vec<Fragment>) {
        for fragment in fragments {
            // Stops at the first failed write (e.g. piped into `head`)
            if let Err(e) = writeln!(self.out, "{}", fragment.html.trim()) {
                tracing::warn!(error = %e, "failed to write fragment");
                return;
            }
            self.written += 1;
        }
    }

    fn end_of_results(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "failed to flush output");
        }
        tracing::info!(written = self.written, "{}", END_OF_POSTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_order_across_batches() {
        let mut feed = Feed::default();
        feed.append(vec![Fragment::new("a"), Fragment::new("b")]);
        feed.append(vec![Fragment::new("c")]);
        let html: Vec<_> = feed.entries().iter().map(|f| f.html.as_str()).collect();
        assert_eq!(html, vec!["a", "b", "c"]);
    }

    #[test]
    fn append_does_not_dedup() {
        let mut feed = Feed::default();
        feed.append(vec![Fragment::new("a")]);
        feed.append(vec![Fragment::new("a")]);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn end_of_results_is_idempotent() {
        let mut feed = Feed::default();
        feed.end_of_results();
        let rev = feed.revision();
        feed.end_of_results();
        assert!(feed.ended());
        assert_eq!(feed.revision(), rev);
    }

    #[test]
    fn empty_append_leaves_revision() {
        let mut feed = Feed::default();
        feed.append(Vec::new());
        assert_eq!(feed.revision(), 0);
    }

    #[test]
    fn print_sink_writes_one_line_per_fragment() {
        let mut sink = PrintSink::new(Vec::new());
        sink.append(vec![Fragment::new("<a>1</a>\n"), Fragment::new("<a>2</a>")]);
        assert_eq!(sink.written(), 2);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "<a>1</a>\n<a>2</a>\n");
    }

    /// Accepts writes, refuses to flush
    struct StuckPipe {
        buf: Vec<u8>,
        flushes: usize,
    }

    impl Write for StuckPipe {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn print_sink_survives_failed_final_flush() {
        let mut sink = PrintSink::new(StuckPipe {
            buf: Vec::new(),
            flushes: 0,
        });
        sink.append(vec![Fragment::new("<a>1</a>")]);
        sink.end_of_results();
        assert_eq!(sink.written(), 1);
        let pipe = sink.into_inner();
        assert_eq!(pipe.flushes, 1);
        assert_eq!(pipe.buf, b"<a>1</a>\n");
    }
}
