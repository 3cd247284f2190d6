//! XHTML document wrapper around a caller-supplied body fragment.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::error::{Error, Result};

const XMLNS_XHTML: &str = "http://www.w3.org/1999/xhtml";
const XMLNS_EPUB: &str = "http://www.idpf.org/2007/ops";

/// A section document: title, optional stylesheet link, and the raw body
/// fragment that goes between the `<body>` tags.
#[derive(Debug, Clone)]
pub(crate) struct Xhtml {
    title: String,
    body: String,
    stylesheet: Option<String>,
}

impl Xhtml {
    /// Wrap a body fragment.
    ///
    /// The body is not validated against any grammar; only hard tokenizer
    /// errors (an unterminated tag, a malformed attribute) are rejected.
    /// HTML-style void elements like `<br>` pass.
    pub(crate) fn new(body: &str) -> Result<Self> {
        check_fragment(body)?;
        Ok(Xhtml {
            title: String::new(),
            body: body.to_string(),
            stylesheet: None,
        })
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub(crate) fn body(&self) -> &str {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: String) {
        self.body = body;
    }

    pub(crate) fn set_stylesheet(&mut self, href: &str) {
        self.stylesheet = Some(href.to_string());
    }

    /// Render the complete XHTML document.
    pub(crate) fn serialize(&self) -> String {
        let mut doc = String::new();
        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str("<!DOCTYPE html>\n");
        doc.push_str(&format!(
            "<html xmlns=\"{XMLNS_XHTML}\" xmlns:epub=\"{XMLNS_EPUB}\">\n"
        ));
        doc.push_str("<head>\n");
        doc.push_str(&format!(
            "  <title>{}</title>\n",
            escape(self.title.as_str())
        ));
        if let Some(href) = &self.stylesheet {
            doc.push_str(&format!(
                "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>\n",
                escape(href.as_str())
            ));
        }
        doc.push_str("</head>\n<body>\n");
        doc.push_str(&self.body);
        doc.push_str("\n</body>\n</html>\n");
        doc
    }
}

/// Tokenize the fragment end to end; fail on the first hard error.
fn check_fragment(body: &str) -> Result<()> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().check_end_names = false;
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(Error::InvalidFragment(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_fragment() {
        assert!(Xhtml::new("<h1>Hi</h1><p>Body</p>").is_ok());
    }

    #[test]
    fn accepts_html_void_elements() {
        assert!(Xhtml::new("<p>line<br>break</p>").is_ok());
    }

    #[test]
    fn rejects_unterminated_tag() {
        let err = Xhtml::new("<p attr=\"x").unwrap_err();
        assert!(matches!(err, Error::InvalidFragment(_)));
    }

    #[test]
    fn serialize_includes_title_and_stylesheet() {
        let mut xhtml = Xhtml::new("<p>Body</p>").unwrap();
        xhtml.set_title("A <Title>");
        xhtml.set_stylesheet("../css/style.css");
        let doc = xhtml.serialize();
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.contains("<title>A &lt;Title&gt;</title>"));
        assert!(doc.contains("href=\"../css/style.css\""));
        assert!(doc.contains("<body>\n<p>Body</p>\n</body>"));
        assert!(doc.contains("xmlns:epub=\"http://www.idpf.org/2007/ops\""));
    }

    #[test]
    fn serialize_without_stylesheet_has_no_link() {
        let xhtml = Xhtml::new("<p>Body</p>").unwrap();
        assert!(!xhtml.serialize().contains("<link"));
    }
}
