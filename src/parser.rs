//! Streaming feed parser for RSS 2.0 and Atom.
//!
//! Single forward pass over a quick-xml event stream. Field capture is keyed
//! on the currently open tag name only; there is deliberately no depth
//! tracking, so a nested element that reuses a field's tag name is captured
//! the same way real-world readers of these dialects do it. Malformed input
//! is never fatal: the parser returns whatever entries it finished before the
//! stream broke.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::identity;
use crate::model::Candidate;

/// Max characters kept from an entry summary after HTML stripping.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Which schema the document turned out to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Unknown,
    Rss,
    Atom,
}

#[derive(Default)]
struct EntryAccumulators {
    title: String,
    link: String,
    summary: String,
    guid: String,
    date: String,
}

struct FeedScan {
    dialect: Dialect,
    inside_entry: bool,
    current_tag: String,
    acc: EntryAccumulators,
    candidates: Vec<Candidate>,
}

/// Parse raw feed bytes into candidates.
///
/// The owning feed id is attached by the caller. A document that parses to
/// nothing (malformed, wrong schema, empty) yields an empty vec, not an
/// error.
pub fn parse(raw: &[u8]) -> Vec<Candidate> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().check_end_names = false;

    let mut scan = FeedScan {
        dialect: Dialect::Unknown,
        inside_entry: false,
        current_tag: String::new(),
        acc: EntryAccumulators::default(),
        candidates: Vec::new(),
    };

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => scan.on_start(&e),
            Ok(Event::Empty(e)) => {
                // A self-closing element opens and closes in one event.
                scan.on_start(&e);
                scan.on_end(e.name().as_ref());
            }
            Ok(Event::Text(e)) => {
                let text = match e.unescape() {
                    Ok(cow) => cow.into_owned(),
                    Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
                };
                scan.on_text(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                scan.on_text(&text);
            }
            Ok(Event::End(e)) => scan.on_end(e.name().as_ref()),
            Ok(Event::Eof) => break,
            // Partial results beat a hard failure on truncated or broken XML.
            Err(_) => break,
            Ok(_) => {}
        }
        buf.clear();
    }

    scan.candidates
}

impl FeedScan {
    fn on_start(&mut self, e: &BytesStart<'_>) {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        self.current_tag = name.clone();

        match name.as_str() {
            "rss" => self.dialect = Dialect::Rss,
            "feed" => {
                if self.dialect == Dialect::Unknown {
                    self.dialect = Dialect::Atom;
                }
            }
            "item" | "entry" => {
                self.inside_entry = true;
                self.acc = EntryAccumulators::default();
            }
            "link" => {
                if self.inside_entry && self.dialect == Dialect::Atom {
                    self.capture_atom_link(e);
                }
            }
            _ => {}
        }
    }

    /// Atom carries the link in an `href` attribute. Only a link with no
    /// `rel`, or `rel="alternate"`, counts; the first one captured wins.
    fn capture_atom_link(&mut self, e: &BytesStart<'_>) {
        let mut rel: Option<String> = None;
        let mut href: Option<String> = None;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"rel" => rel = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                b"href" => {
                    href = Some(match attr.unescape_value() {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                    })
                }
                _ => {}
            }
        }
        let rel = rel.unwrap_or_else(|| "alternate".to_owned());
        if rel == "alternate" && self.link_unset() {
            if let Some(href) = href {
                self.acc.link = href;
            }
        }
    }

    fn link_unset(&self) -> bool {
        self.acc.link.is_empty()
    }

    fn on_text(&mut self, text: &str) {
        if !self.inside_entry {
            return;
        }
        match self.current_tag.as_str() {
            "title" => self.acc.title.push_str(text),
            "link" => {
                if self.dialect == Dialect::Rss {
                    self.acc.link.push_str(text);
                }
            }
            "description" => self.acc.summary.push_str(text),
            "summary" | "content" => {
                if self.dialect == Dialect::Atom {
                    self.acc.summary.push_str(text);
                }
            }
            "guid" | "id" => self.acc.guid.push_str(text),
            "pubDate" | "updated" | "published" => self.acc.date.push_str(text),
            _ => {}
        }
    }

    fn on_end(&mut self, name: &[u8]) {
        // Clear so trailing whitespace is not appended to a stale field.
        self.current_tag.clear();

        if name != b"item" && name != b"entry" {
            return;
        }
        self.inside_entry = false;

        let acc = std::mem::take(&mut self.acc);
        let title = acc.title.trim().to_owned();
        let link = acc.link.trim().to_owned();
        let summary = normalize_summary(acc.summary.trim());
        let guid = acc.guid.trim().to_owned();
        let date = acc.date.trim().to_owned();

        let id = identity::resolve(&guid, &link, &title);
        let published_at = parse_date(&date);

        self.candidates.push(Candidate {
            id,
            title,
            link,
            summary: summary.chars().take(SUMMARY_MAX_CHARS).collect(),
            published_at,
        });
    }
}

/// Strip HTML tags and decode the handful of entities that show up in feed
/// summaries in practice. Not a sanitizer.
pub fn normalize_summary(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// RFC-822 first (RSS), then RFC-3339 (Atom, with or without fractional
/// seconds), then a zone-less ISO-8601 read as UTC. Anything else is simply
/// an absent timestamp.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}
