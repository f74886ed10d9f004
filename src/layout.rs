use std::borrow::Cow;

use crate::feed::{Feed, END_OF_POSTS};

/// Row layout of the feed at a given width. Rebuilt periodically, on
/// resize, and after an append.
#[derive(Debug, Default, Clone)]
pub struct FeedLayout {
    width: usize,
    revision: u64,
    lines: Vec<String>,
    /// First row of each entry
    starts: Vec<usize>,
}

impl FeedLayout {
    pub fn reflow(feed: &Feed, width: usize) -> Self {
        let width = width.max(1);
        let mut lines = Vec::new();
        let mut starts = Vec::with_capacity(feed.len());

        for fragment in feed.entries() {
            starts.push(lines.len());
            let text = fragment_text(&fragment.html);
            let text = if text.is_empty() {
                match &fragment.item {
                    Some(item) => format!("image #{}", item.id),
                    None => "(empty)".to_string(),
                }
            } else {
                text
            };
            lines.extend(wrap(&text, width));
            lines.push(String::new());
        }

        if feed.ended() {
            lines.push(END_OF_POSTS.to_string());
        }

        Self {
            width,
            revision: feed.revision(),
            lines,
            starts,
        }
    }

    /// Whether the layout no longer matches the feed or the width
    pub fn is_stale(&self, feed: &Feed, width: usize) -> bool {
        self.revision != feed.revision() || self.width != width.max(1)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn content_height(&self) -> usize {
        self.lines.len()
    }

    /// Index of the entry covering `row`
    pub fn entry_at(&self, row: usize) -> Option<usize> {
        if self.starts.is_empty() {
            return None;
        }
        match self.starts.binary_search(&row) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }
}

/// Reduce a markup fragment to readable text: tags dropped, common
/// entities decoded, whitespace collapsed. `alt` text stands in for images.
pub fn fragment_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            rest = &rest[open..];
            break;
        };
        let tag = &rest[open + 1..open + close];
        if let Some(alt) = attribute(tag, "alt") {
            out.push(' ');
            out.push_str(alt);
        }
        if is_block_tag(tag) {
            out.push('\n');
        } else {
            out.push(' ');
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    decode_entities(&out)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    matches!(
        name.as_str(),
        "div" | "p" | "br" | "li" | "h1" | "h2" | "h3" | "h4" | "figure" | "figcaption"
    )
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len]).filter(|v| !v.is_empty())
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width)
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{AppendSink, Fragment};
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn strips_tags_and_keeps_alt_text() {
        let html = r#"<div class="masonry-item"><a href="/x"><img src="a.png" alt="Sunset"></a><p>Beach &amp; sea</p></div>"#;
        assert_eq!(fragment_text(html), "Sunset\nBeach & sea");
    }

    #[test]
    fn unterminated_tag_is_kept_as_text() {
        assert_eq!(fragment_text("a < b"), "a < b");
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn wraps_by_display_width() {
        let rows = wrap("漢字漢字漢字", 6);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.concat(), "漢字漢字漢字");
        assert!(rows.iter().all(|row| row.width() <= 6));
    }

    #[test]
    fn keeps_paragraph_breaks() {
        assert_eq!(wrap("Sunset\nBeach & sea", 20), vec!["Sunset", "Beach & sea"]);
    }

    #[test]
    fn reflow_counts_rows_and_end_marker() {
        let mut feed = Feed::default();
        feed.append(vec![Fragment::new("<p>first</p>"), Fragment::new("<p>second one</p>")]);
        let layout = FeedLayout::reflow(&feed, 6);
        // "first", "", "second", "one", ""
        assert_eq!(layout.content_height(), 5);
        assert_eq!(layout.entry_at(0), Some(0));
        assert_eq!(layout.entry_at(1), Some(0));
        assert_eq!(layout.entry_at(2), Some(1));
        assert_eq!(layout.entry_at(4), Some(1));

        feed.end_of_results();
        assert!(layout.is_stale(&feed, 6));
        let layout = FeedLayout::reflow(&feed, 6);
        assert_eq!(layout.lines().last().map(String::as_str), Some(END_OF_POSTS));
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let layout = FeedLayout::reflow(&Feed::default(), 40);
        assert_eq!(layout.content_height(), 0);
        assert_eq!(layout.entry_at(0), None);
    }

    #[test]
    fn width_change_makes_layout_stale() {
        let feed = Feed::default();
        let layout = FeedLayout::reflow(&feed, 40);
        assert!(!layout.is_stale(&feed, 40));
        assert!(layout.is_stale(&feed, 80));
    }
}
