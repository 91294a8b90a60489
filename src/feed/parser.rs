use std::borrow::Cow;
use std::sync::OnceLock;

use htmlescape::decode_html;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::feed::document::{FeedDocument, FeedItem};

const ENTITY_PATTERN: &str = r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);";

static ENTITY: OnceLock<Option<Regex>> = OnceLock::new();

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed feed document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed feed document: {0}")]
    Structure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            _ => None,
        }
    }
}

/// First occurrence of each field wins.
#[derive(Default)]
struct Fields {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
}

impl Fields {
    fn set_first(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn into_item(self) -> FeedItem {
        FeedItem {
            title: self.title.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            pub_date: self.pub_date.unwrap_or_default(),
        }
    }
}

struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

/// Collects the first `<channel>` under the root. Only unprefixed elements
/// that are direct children of the channel or of an `<item>` are read, so
/// `atom:link`, `media:title` and friends never shadow the RSS fields.
#[derive(Default)]
struct ChannelBuilder {
    depth: usize,
    done: bool,
    fields: Fields,
    items: Vec<FeedItem>,
    item: Option<(usize, Fields)>,
    capture: Option<Capture>,
}

impl ChannelBuilder {
    fn start(&mut self, name: QName<'_>, depth: usize) {
        if self.capture.is_some() || name.prefix().is_some() {
            return;
        }

        let local = name.local_name();
        match local.as_ref() {
            b"channel" if depth == 2 && self.depth == 0 && !self.done => self.depth = depth,
            b"item" if self.depth != 0 && self.item.is_none() && depth == self.depth + 1 => {
                self.item = Some((depth, Fields::default()));
            }
            other => {
                let Some(field) = Field::from_name(other) else {
                    return;
                };
                let parent = self.item.as_ref().map_or(self.depth, |(d, _)| *d);
                if self.depth != 0 && depth == parent + 1 {
                    self.capture = Some(Capture {
                        field,
                        depth,
                        text: String::new(),
                    });
                }
            }
        }
    }

    fn end(&mut self, depth: usize) {
        if self.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let Some(capture) = self.capture.take() {
                match &mut self.item {
                    Some((_, fields)) => fields.set_first(capture.field, capture.text),
                    None => self.fields.set_first(capture.field, capture.text),
                }
            }
            return;
        }

        if self.item.as_ref().is_some_and(|(d, _)| *d == depth) {
            if let Some((_, fields)) = self.item.take() {
                self.items.push(fields.into_item());
            }
            return;
        }

        if self.depth != 0 && self.depth == depth {
            self.depth = 0;
            self.done = true;
        }
    }

    fn capturing(&self) -> bool {
        self.capture.is_some()
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = &mut self.capture {
            capture.text.push_str(text);
        }
    }

    fn finish(self) -> FeedDocument {
        let channel = self.fields.into_item();
        FeedDocument {
            title: channel.title,
            link: channel.link,
            description: channel.description,
            items: self.items,
        }
    }
}

/// Parse an RSS 2.0 body and decode HTML entities in every title and
/// description.
pub fn parse_document(bytes: &[u8]) -> Result<FeedDocument, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut builder = ChannelBuilder::default();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                builder.start(e.name(), depth);
            }
            Event::End(_) => {
                builder.end(depth);
                depth = depth.saturating_sub(1);
            }
            Event::Empty(_) => saw_root = true,
            Event::Text(e) if builder.capturing() => {
                // Undeclared entities such as &nbsp; are left for the HTML pass.
                let text = e
                    .unescape()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                builder.text(&text);
            }
            Event::CData(e) if builder.capturing() => {
                builder.text(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ParseError::Structure("no root element".to_string()));
    }
    if depth != 0 {
        return Err(ParseError::Structure(format!(
            "document ended with {} unclosed elements",
            depth
        )));
    }

    let mut document = builder.finish();

    document.title = decode_entities(&document.title);
    document.description = decode_entities(&document.description);

    for item in &mut document.items {
        item.title = decode_entities(&item.title);
        item.description = decode_entities(&item.description);
    }

    Ok(document)
}

/// Decode each HTML entity on its own. Providers often double-encode
/// (`&amp;amp;`); a bare `&` or an unknown name is kept as written.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let Some(entity) = ENTITY.get_or_init(|| Regex::new(ENTITY_PATTERN).ok()) else {
        return text.to_string();
    };

    entity
        .replace_all(text, |caps: &Captures| {
            decode_html(&caps[0]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
