//! Template rendering for WordprocessingML (`.docx`) documents.
//!
//! A `.docx` file is a zip archive of XML parts. [`DocxRenderer`] renders the
//! parts that carry document text through `minijinja` and copies every other
//! part unchanged.

use std::io::{Cursor, Read, Write};

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde_json::Value;
use sha2::{Digest, Sha256};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Turns template bytes plus a content mapping into rendered document bytes.
pub trait DocumentRenderer {
    fn render(&self, template: &[u8], content: &Value) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl DocumentRenderer for DocxRenderer {
    fn render(&self, template: &[u8], content: &Value) -> Result<Vec<u8>, RenderError> {
        if !content.is_object() {
            return Err(RenderError::new("content must be a JSON object"));
        }

        let mut archive = ZipArchive::new(Cursor::new(template))
            .map_err(|error| RenderError::new(format!("template is not a docx archive: {error}")))?;

        if archive.by_name(DOCUMENT_PART).is_err() {
            return Err(RenderError::new(format!(
                "template is missing {DOCUMENT_PART}"
            )));
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|error| RenderError::new(format!("unreadable docx entry: {error}")))?;
            let name = entry.name().to_string();

            if entry.is_dir() {
                writer
                    .add_directory(name, FileOptions::default())
                    .map_err(|error| RenderError::new(error.to_string()))?;
                continue;
            }

            let options = FileOptions::default().compression_method(match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            });

            let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry
                .read_to_end(&mut bytes)
                .map_err(|error| RenderError::new(format!("failed to read {name}: {error}")))?;

            let bytes = if is_text_part(&name) {
                let source = String::from_utf8(bytes)
                    .map_err(|error| RenderError::new(format!("{name} is not UTF-8: {error}")))?;
                render_part(&name, &source, content)?.into_bytes()
            } else {
                bytes
            };

            writer
                .start_file(name.clone(), options)
                .map_err(|error| RenderError::new(format!("failed to write {name}: {error}")))?;
            writer
                .write_all(&bytes)
                .map_err(|error| RenderError::new(format!("failed to write {name}: {error}")))?;
        }

        let cursor = writer
            .finish()
            .map_err(|error| RenderError::new(format!("failed to finish docx archive: {error}")))?;
        Ok(cursor.into_inner())
    }
}

pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn is_text_part(name: &str) -> bool {
    let Some(file_name) = name.strip_prefix("word/") else {
        return false;
    };
    if file_name.contains('/') || !file_name.ends_with(".xml") {
        return false;
    }

    file_name == "document.xml"
        || file_name == "footnotes.xml"
        || file_name == "endnotes.xml"
        || file_name.starts_with("header")
        || file_name.starts_with("footer")
}

fn render_part(name: &str, source: &str, content: &Value) -> Result<String, RenderError> {
    let source = hoist_block_tags(&strip_markup_inside_tags(source));

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Lenient);
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_template(name, &source)
        .map_err(|error| RenderError::new(format!("invalid template syntax in {name}: {error}")))?;
    let template = env
        .get_template(name)
        .map_err(|error| RenderError::new(error.to_string()))?;
    template
        .render(content)
        .map_err(|error| RenderError::new(format!("failed to render {name}: {error}")))
}

/// Word processors split text into runs, which can land XML tags in the middle
/// of a `{{ ... }}` or `{% ... %}` expression. Those tags are dropped so the
/// expression reaches the template engine intact.
fn strip_markup_inside_tags(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = find_tag_open(rest) {
        let (before, tail) = rest.split_at(start);
        output.push_str(before);

        let close = if tail.starts_with("{{") { "}}" } else { "%}" };
        let Some(end) = tail[2..].find(close) else {
            output.push_str(tail);
            return output;
        };
        let expression = &tail[..end + 2 + close.len()];
        output.push_str(&remove_xml_tags(expression));
        rest = &tail[expression.len()..];
    }

    output.push_str(rest);
    output
}

fn find_tag_open(text: &str) -> Option<usize> {
    match (text.find("{{"), text.find("{%")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn remove_xml_tags(expression: &str) -> String {
    let mut cleaned = String::with_capacity(expression.len());
    let mut in_tag = false;
    for ch in expression.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => cleaned.push(ch),
            _ => {}
        }
    }
    cleaned
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace("&amp;", "&")
}

/// Elements a block tag can control, outermost first. `{%tr for x in xs %}`
/// repeats the enclosing table row, `{%p if c %}` the enclosing paragraph.
const BLOCK_TAG_ELEMENTS: [&str; 4] = ["tr", "tc", "p", "r"];

/// Replaces the element enclosing each `{%tr`, `{%tc`, `{%p` or `{%r` tag with
/// the plain `{% ... %}` statement, so the statement wraps whole elements.
fn hoist_block_tags(source: &str) -> String {
    let mut text = source.to_string();
    for element in BLOCK_TAG_ELEMENTS {
        let marker = format!("{{%{element} ");
        let open_tags = [format!("<w:{element}>"), format!("<w:{element} ")];
        let close_tag = format!("</w:{element}>");

        let mut search_from = 0;
        while let Some(offset) = text[search_from..].find(&marker) {
            let tag_start = search_from + offset;
            let statement_start = tag_start + marker.len() - 1;
            let Some(statement_len) = text[statement_start..].find("%}") else {
                break;
            };
            let statement = text[statement_start..statement_start + statement_len].to_string();
            let tag_end = statement_start + statement_len + 2;
            let replacement = format!("{{%{statement}%}}");

            let head = &text[..tag_start];
            let enclosing = open_tags.iter().filter_map(|open| head.rfind(open.as_str())).max();
            let closing = text[tag_end..].find(&close_tag).map(|at| tag_end + at + close_tag.len());

            let (start, end) = match (enclosing, closing) {
                (Some(start), Some(end)) => (start, end),
                _ => (tag_start, tag_end),
            };
            text.replace_range(start..end, &replacement);
            search_from = start + replacement.len();
        }
    }
    text
}
