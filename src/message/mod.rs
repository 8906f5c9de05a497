//! Email decoding — subject and body extraction from a raw RFC 5322 message.
//!
//! Decoding never fails: input without a header block is taken as a plain
//! text body under the placeholder subject.

pub mod render;

use mail_parser::{Message, MessageParser, MimeHeaders, PartType};
use tracing::{debug, warn};

pub use render::{CommandRenderer, HtmlRenderer, strip_html};

/// Subject used when the message has none.
pub const NO_SUBJECT_PLACEHOLDER: &str = "E-Mail import: no subject specified.";

/// Label put in front of a real subject in the task description.
pub const SUBJECT_LABEL: &str = "E-Mail subject: ";

/// Charset assumed for parts that do not declare one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Body part kinds this program cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Plain,
    Html,
}

/// A decoded text part of the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    pub kind: BodyKind,
    /// Declared charset, lowercased, or `utf-8` when absent.
    pub charset: String,
    /// Payload after transfer and charset decoding.
    pub text: String,
}

/// Where the notes body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// Concatenated `text/plain` payloads.
    Plain(String),
    /// Concatenated `text/html` payloads, still to be rendered.
    Html(String),
    Empty,
}

/// A decoded email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    /// Decoded subject, never empty.
    pub subject: String,
    /// Text parts in encounter order.
    pub parts: Vec<BodyPart>,
}

impl ParsedEmail {
    /// Decode a raw message.
    pub fn parse(raw: &[u8]) -> Self {
        let message = MessageParser::default()
            .parse(raw)
            .filter(|m| !m.headers().is_empty());
        let Some(message) = message else {
            warn!(bytes = raw.len(), "Input has no mail headers, treating it as plain text");
            return Self::headerless(raw);
        };

        let subject = message
            .subject()
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_SUBJECT_PLACEHOLDER)
            .to_string();

        let mut parts = Vec::new();
        collect_text_parts(&message, &mut parts);
        debug!(subject = %subject, parts = parts.len(), "Decoded email");

        Self { subject, parts }
    }

    /// Input without a header block is all body, as a single UTF-8 text part.
    fn headerless(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw).into_owned();
        let parts = if text.is_empty() {
            Vec::new()
        } else {
            vec![BodyPart {
                kind: BodyKind::Plain,
                charset: DEFAULT_CHARSET.to_string(),
                text,
            }]
        };
        Self {
            subject: NO_SUBJECT_PLACEHOLDER.to_string(),
            parts,
        }
    }

    /// Whether the subject is the placeholder.
    pub fn has_subject(&self) -> bool {
        self.subject != NO_SUBJECT_PLACEHOLDER
    }

    /// Task description: the labelled subject, or the placeholder verbatim.
    pub fn task_description(&self) -> String {
        if self.has_subject() {
            format!("{SUBJECT_LABEL}{}", self.subject)
        } else {
            self.subject.clone()
        }
    }

    /// Pick the body: plain text if present, otherwise HTML, otherwise empty.
    pub fn body_source(&self) -> BodySource {
        let plain = self.concat(BodyKind::Plain);
        if let Some(text) = plain {
            return BodySource::Plain(text);
        }
        match self.concat(BodyKind::Html) {
            Some(html) => BodySource::Html(html),
            None => BodySource::Empty,
        }
    }

    /// Final notes body. HTML goes through `renderer`; if the renderer fails
    /// the tags are stripped instead.
    pub async fn render_body(&self, renderer: &dyn HtmlRenderer) -> String {
        match self.body_source() {
            BodySource::Plain(text) => text,
            BodySource::Html(html) => match renderer.render(&html).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "HTML renderer failed, falling back to tag stripping");
                    strip_html(&html)
                }
            },
            BodySource::Empty => String::new(),
        }
    }

    fn concat(&self, kind: BodyKind) -> Option<String> {
        let mut matching = self.parts.iter().filter(|p| p.kind == kind).peekable();
        matching.peek()?;
        Some(matching.map(|p| p.text.as_str()).collect())
    }
}

/// Walk parts depth first, descending into attached messages.
fn collect_text_parts(message: &Message<'_>, out: &mut Vec<BodyPart>) {
    for part in &message.parts {
        let text = match &part.body {
            PartType::Text(text) | PartType::Html(text) => text,
            PartType::Message(inner) => {
                collect_text_parts(inner, out);
                continue;
            }
            _ => continue,
        };
        if text.is_empty() {
            continue;
        }

        let content_type = MimeHeaders::content_type(part);
        let kind = match content_type {
            None => BodyKind::Plain,
            Some(ct) if !ct.ctype().eq_ignore_ascii_case("text") => continue,
            Some(ct) => match ct.subtype().map(str::to_ascii_lowercase).as_deref() {
                Some("plain") | None => BodyKind::Plain,
                Some("html") => BodyKind::Html,
                _ => continue,
            },
        };
        let charset = content_type
            .and_then(|ct| ct.attribute("charset"))
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_CHARSET.to_string());

        out.push(BodyPart {
            kind,
            charset,
            text: text.to_string(),
        });
    }
}
