//! Image embedding: tokenizing scan and in-place rewrite of `<img>` tags.
//!
//! The scan records each tag's byte span so rewrites splice into the body
//! without touching surrounding markup.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use url::Url;

/// An `<img>` tag found in a body fragment.
#[derive(Debug)]
pub(crate) struct ImageTag {
    /// Byte range of the tag text within the body.
    pub start: usize,
    pub end: usize,
    /// Attributes in document order, values unescaped.
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl ImageTag {
    /// Value of the textually first `src`/`data-src` attribute.
    ///
    /// A lazy-loading `data-src` listed ahead of a placeholder `src` wins,
    /// so the fetched reference is the first one the author wrote.
    pub(crate) fn primary_source(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| is_source_attr(key))
            .map(|(_, value)| value.as_str())
    }

    /// Render the tag with the primary source replaced by `new_src`.
    ///
    /// The first source attribute becomes `src`; any later source attribute
    /// is kept as a `data-src` annotation with its original value.
    pub(crate) fn render(&self, new_src: &str) -> String {
        let mut out = String::from("<img");
        let mut seen_source = false;
        for (key, value) in &self.attrs {
            if is_source_attr(key) {
                if seen_source {
                    out.push_str(&format!(" data-src=\"{}\"", escape(value.as_str())));
                } else {
                    out.push_str(&format!(" src=\"{}\"", escape(new_src)));
                    seen_source = true;
                }
            } else {
                out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
            }
        }
        out.push_str(if self.self_closing { " />" } else { ">" });
        out
    }
}

fn is_source_attr(key: &str) -> bool {
    key.eq_ignore_ascii_case("src") || key.eq_ignore_ascii_case("data-src")
}

/// Tokenize a body fragment and return every `<img>` tag with its byte span.
///
/// A tokenizer error ends the scan; tags found before the error are still
/// returned.
pub(crate) fn find_image_tags(body: &str) -> Vec<ImageTag> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().check_end_names = false;

    let mut tags = Vec::new();
    let mut last = 0usize;
    loop {
        let event = reader.read_event();
        let pos = reader.buffer_position() as usize;
        match event {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if e.name().as_ref().eq_ignore_ascii_case(b"img")
                    && let Some(tag) = parse_tag(&e, last, pos, false)
                {
                    tags.push(tag);
                }
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref().eq_ignore_ascii_case(b"img")
                    && let Some(tag) = parse_tag(&e, last, pos, true)
                {
                    tags.push(tag);
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
        last = pos;
    }
    tags
}

/// Collect a tag's attributes; a tag with an unparseable attribute is
/// dropped so its text is left untouched.
fn parse_tag(e: &BytesStart, start: usize, end: usize, self_closing: bool) -> Option<ImageTag> {
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.ok()?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().ok()?.into_owned();
        attrs.push((key, value));
    }
    Some(ImageTag {
        start,
        end,
        attrs,
        self_closing,
    })
}

/// File extension (with the dot, lowercased) from a source's path component.
pub(crate) fn source_extension(source: &str) -> Option<String> {
    let path = Url::parse(source)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| source.to_string());
    let base = path.rsplit('/').next().unwrap_or_default();
    base.rfind('.').map(|i| base[i..].to_ascii_lowercase())
}

/// Map a `Content-Type` header value to a file extension.
pub(crate) fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    match essence {
        "image/jpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/svg+xml" => Some(".svg"),
        "image/webp" => Some(".webp"),
        "image/avif" => Some(".avif"),
        _ => None,
    }
}

/// Apply non-overlapping `(start, end, replacement)` edits, in order.
pub(crate) fn apply_edits(body: &str, edits: &[(usize, usize, String)]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        out.push_str(&body[cursor..*start]);
        out.push_str(replacement);
        cursor = *end;
    }
    out.push_str(&body[cursor..]);
    out
}
