//! HTML to plain text rendering.
//!
//! The default renderer pipes the HTML through an external text browser
//! (`elinks --dump`). [`strip_html`] is the built-in fallback.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::RenderError;

/// Turns HTML into readable plain text.
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<String, RenderError>;
}

/// Renderer backed by an external command reading HTML on stdin.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Build from a command line split into program and arguments.
    pub fn new(command: &[String]) -> Result<Self, RenderError> {
        let (program, args) = command.split_first().ok_or(RenderError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl HtmlRenderer for CommandRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        debug!(program = %self.program, args = ?self.args, bytes = html.len(), "Rendering HTML");

        let spawn_err = |source: std::io::Error| RenderError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_err)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_err(std::io::Error::other("renderer stdin unavailable")))?;
        let input = html.as_bytes().to_vec();

        // Feed stdin while draining stdout so large documents cannot deadlock.
        let writer = async move {
            let res = stdin.write_all(&input).await;
            drop(stdin);
            res
        };
        let (written, output) = tokio::join!(writer, child.wait_with_output());
        let output = output.map_err(spawn_err)?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
            });
        }
        written.map_err(spawn_err)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Tags that end a line of text.
const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
];

/// Tags whose content is never displayed.
const HIDDEN_TAGS: &[&str] = &["style", "script", "head", "title"];

/// Entities common in mail HTML. `&amp;` last so `&amp;lt;` stays `&lt;`.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Crude HTML to text conversion, used when the renderer is unavailable.
///
/// Block-level tags become line breaks, `<style>`/`<script>` bodies are
/// dropped, common entities are decoded and whitespace inside a line is
/// collapsed. Empty lines are removed.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        push_collapsed(&mut text, &rest[..open]);
        let Some(len) = rest[open..].find('>') else {
            // Unterminated tag: drop the remainder.
            rest = "";
            break;
        };
        let tag = &rest[open + 1..open + len];
        rest = &rest[open + len + 1..];

        let closing = tag.starts_with('/');
        let name = tag_name(tag);
        if BLOCK_TAGS.contains(&name.as_str()) {
            text.push('\n');
        }
        if !closing && HIDDEN_TAGS.contains(&name.as_str()) {
            let end_tag = format!("</{name}");
            rest = match rest.to_ascii_lowercase().find(&end_tag) {
                Some(pos) => &rest[pos..],
                None => "",
            };
        }
    }
    push_collapsed(&mut text, rest);

    let decoded = ENTITIES
        .iter()
        .fold(text, |acc, (entity, ch)| acc.replace(entity, ch));

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Source whitespace (including newlines) is insignificant in HTML.
fn push_collapsed(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
