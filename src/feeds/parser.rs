//! RSS 2.0 and Atom parsing with quick-xml.
//!
//! Only titles and summaries are kept. Element names are compared by local
//! name so namespace prefixes never matter. Markup embedded in descriptions
//! (CDATA or escaped HTML) is stripped to plain text.

use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::config::FeedKind;

use super::{FeedError, FeedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Content,
}

impl Field {
    fn from_local(kind: FeedKind, name: &[u8]) -> Option<Self> {
        match (kind, name) {
            (_, b"title") => Some(Field::Title),
            (FeedKind::Rss, b"description") => Some(Field::Summary),
            (FeedKind::Atom, b"summary") => Some(Field::Summary),
            (FeedKind::Atom, b"content") => Some(Field::Content),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Pending {
    title: String,
    summary: String,
    content: String,
}

impl Pending {
    fn buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        }
    }

    fn finish(self) -> FeedItem {
        let summary = if self.summary.trim().is_empty() {
            self.content
        } else {
            self.summary
        };
        FeedItem {
            title: plain_text(&self.title),
            summary: plain_text(&summary),
        }
    }
}

fn item_tag(kind: FeedKind) -> &'static [u8] {
    match kind {
        FeedKind::Rss => b"item",
        FeedKind::Atom => b"entry",
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex should compile"))
}

/// Whitespace left before closing punctuation or after an opening bracket.
fn stray_space_regex() -> &'static Regex {
    static STRAY_RE: OnceLock<Regex> = OnceLock::new();
    STRAY_RE.get_or_init(|| {
        Regex::new(r"\s+([.,;:!?)\]])|([(\[])\s+").expect("stray space regex should compile")
    })
}

/// Strip markup and collapse whitespace.
fn plain_text(raw: &str) -> String {
    let stripped = tag_regex().replace_all(raw, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    stray_space_regex().replace_all(&collapsed, "$1$2").into_owned()
}

/// Append a chunk of field text, keeping separate chunks apart.
fn push_chunk(buffer: &mut String, chunk: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(chunk);
}

/// Parse a feed document into items, in document order.
pub fn parse_feed(kind: FeedKind, body: &[u8]) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut items = Vec::new();

    let mut current: Option<Pending> = None;
    // Element depth below the open item; fields are only its direct children.
    let mut depth = 0usize;
    // Field being read and the nesting depth inside it.
    let mut field: Option<(Field, usize)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                if let Some((_, inner)) = field.as_mut() {
                    *inner += 1;
                } else if current.is_some() {
                    depth += 1;
                    if depth == 1 {
                        field = Field::from_local(kind, local.as_ref()).map(|f| (f, 0));
                    }
                } else if local.as_ref() == item_tag(kind) {
                    current = Some(Pending::default());
                    depth = 0;
                }
            }
            Ok(Event::End(_)) => match field.as_mut() {
                Some((_, 0)) => {
                    field = None;
                    depth -= 1;
                }
                Some((_, inner)) => *inner -= 1,
                None if current.is_some() && depth == 0 => {
                    if let Some(pending) = current.take() {
                        items.push(pending.finish());
                    }
                }
                None if current.is_some() => depth -= 1,
                None => {}
            },
            Ok(Event::Text(ref e)) => {
                if let (Some(pending), Some((f, _))) = (current.as_mut(), field) {
                    match e.unescape() {
                        Ok(text) => push_chunk(pending.buffer(f), &text),
                        Err(_) => push_chunk(pending.buffer(f), &String::from_utf8_lossy(e)),
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(pending), Some((f, _))) = (current.as_mut(), field) {
                    push_chunk(pending.buffer(f), &String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FeedError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(FeedError::Xml(format!(
            "document ended inside <{}>",
            String::from_utf8_lossy(item_tag(kind))
        )));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &[u8] = include_bytes!("../../tests/fixtures/sample_rss.xml");
    const ATOM: &[u8] = include_bytes!("../../tests/fixtures/sample_atom.xml");

    #[test]
    fn test_parse_rss_items() {
        let items = parse_feed(FeedKind::Rss, RSS).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Coup rumors spread as coup plotters mobilize");
        assert_eq!(items[0].summary, "Troops were seen near the presidential palace.");
        assert_eq!(
            items[1].summary,
            "Envoys & mediators meet for a second round of negotiations."
        );
        assert_eq!(items[2].summary, "");
    }

    #[test]
    fn test_channel_title_not_an_item() {
        let items = parse_feed(FeedKind::Rss, RSS).unwrap();
        assert!(items.iter().all(|i| i.title != "World news"));
    }

    #[test]
    fn test_parse_atom_entries() {
        let items = parse_feed(FeedKind::Atom, ATOM).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "M 7.1 - 40 km SW of Example City");
        assert_eq!(items[0].summary, "Time 2026-10-18 09:10:00 UTC");
        // No <summary>, so <content> is used.
        assert_eq!(items[1].summary, "Tsunami warning issued for coastal areas");
    }

    #[test]
    fn test_wrong_kind_finds_nothing() {
        assert!(parse_feed(FeedKind::Atom, RSS).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let broken = b"<rss><channel><item><title>Riots</item></channel></rss>";
        assert!(matches!(
            parse_feed(FeedKind::Rss, broken),
            Err(FeedError::Xml(_))
        ));
    }

    #[test]
    fn test_truncated_document_is_error() {
        let truncated = b"<rss><channel><item><title>Riots in";
        assert!(parse_feed(FeedKind::Rss, truncated).is_err());
    }

    #[test]
    fn test_plain_text_strips_markup() {
        assert_eq!(plain_text("  <p>Hello <i>world</i></p>\n\n"), "Hello world");
        assert_eq!(
            plain_text("<p>Talks <b>stalled</b>, envoys say (<i>again</i>).</p>"),
            "Talks stalled, envoys say (again)."
        );
    }

    #[test]
    fn test_nested_fields_are_ignored() {
        let items = parse_feed(FeedKind::Rss, RSS).unwrap();
        // <media:content><media:title> belongs to the media element, not the item.
        assert_eq!(items[0].title, "Coup rumors spread as coup plotters mobilize");

        let atom = parse_feed(FeedKind::Atom, ATOM).unwrap();
        // <source><title> names the originating feed.
        assert_eq!(atom[1].title, "M 6.4 - offshore");
    }

    #[test]
    fn test_field_chunks_stay_separate() {
        let body = b"<rss><channel><item>\
            <title>Coup in capital</title>\
            <description>Riots<![CDATA[Curfew declared]]></description>\
            </item></channel></rss>";
        let items = parse_feed(FeedKind::Rss, body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Coup in capital");
        assert_eq!(items[0].summary, "Riots Curfew declared");
    }
}
