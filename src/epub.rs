//! The in-memory EPUB: metadata, media stores, section forest, and cover.

use std::collections::HashMap;

use uuid::Uuid;

use crate::embed;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, encode_data_url};
use crate::media::{MediaKind, MediaStore, base_name};
use crate::properties::properties_from_body;
use crate::section::{self, Section};
use crate::xhtml::Xhtml;

const DEFAULT_COVER_CSS: &str = "body {\n  background-color: #FFFFFF;\n  margin-bottom: 0px;\n  margin-left: 0px;\n  margin-right: 0px;\n  margin-top: 0px;\n  text-align: center;\n}\nimg {\n  max-height: 100%;\n  max-width: 100%;\n}\n";
const DEFAULT_COVER_CSS_FILENAME: &str = "cover.css";
const DEFAULT_COVER_XHTML_FILENAME: &str = "cover.xhtml";
const DEFAULT_LANG: &str = "en";
const SECTION_EXT: &str = ".xhtml";
const URN_UUID_PREFIX: &str = "urn:uuid:";

/// An EPUB being assembled in memory.
///
/// All mutation goes through `&mut self`; the aggregate owns every store,
/// section, and the cover, so exclusive access is enforced by the borrow
/// checker rather than a lock.
pub struct Epub {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) identifier: String,
    pub(crate) lang: String,
    pub(crate) description: String,
    pub(crate) ppd: String,
    pub(crate) cover: Option<Cover>,
    pub(crate) styles: MediaStore,
    pub(crate) fonts: MediaStore,
    pub(crate) images: MediaStore,
    pub(crate) videos: MediaStore,
    pub(crate) audios: MediaStore,
    pub(crate) sections: Vec<Section>,
    pub(crate) fetcher: Fetcher,
}

/// The installed cover's artifacts, retired wholesale when it is replaced.
pub(crate) struct Cover {
    pub image_filename: String,
    pub css_filename: Option<String>,
    /// Synthesized stylesheet payload, present only when no caller
    /// stylesheet was supplied.
    pub css_temp: Option<String>,
    pub xhtml_filename: String,
}

/// Result of installing a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverOutcome {
    /// Cover page, image, and stylesheet are all in place.
    Installed,
    /// Both conventional names for the default stylesheet were taken; the
    /// cover page was installed without a dedicated stylesheet.
    StylesheetSkipped,
}

impl Epub {
    /// Create an EPUB with the given title, a generated `urn:uuid`
    /// identifier, and the default language.
    pub fn new(title: &str) -> Self {
        let mut epub = Epub {
            title: String::new(),
            author: String::new(),
            identifier: String::new(),
            lang: String::new(),
            description: String::new(),
            ppd: String::new(),
            cover: None,
            styles: MediaStore::new(MediaKind::Style),
            fonts: MediaStore::new(MediaKind::Font),
            images: MediaStore::new(MediaKind::Image),
            videos: MediaStore::new(MediaKind::Video),
            audios: MediaStore::new(MediaKind::Audio),
            sections: Vec::new(),
            fetcher: Fetcher::new(),
        };
        epub.set_identifier(&format!("{URN_UUID_PREFIX}{}", Uuid::new_v4()));
        epub.set_lang(DEFAULT_LANG);
        epub.set_title(title);
        epub
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author(&mut self, author: &str) {
        self.author = author.to_string();
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Set the unique identifier, such as a UUID, DOI, ISBN or ISSN.
    pub fn set_identifier(&mut self, identifier: &str) {
        self.identifier = identifier.to_string();
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn set_lang(&mut self, lang: &str) {
        self.lang = lang.to_string();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    /// Page progression direction (`ltr` or `rtl`).
    pub fn ppd(&self) -> &str {
        &self.ppd
    }

    pub fn set_ppd(&mut self, direction: &str) {
        self.ppd = direction.to_string();
    }

    /// Add a CSS file and return the path to use from section bodies
    /// (`../css/<filename>`).
    ///
    /// The source is a URL, a local path, or a `data:` URL; it is validated
    /// now and retrieved when the EPUB is written. With no filename given,
    /// one is derived from the source or generated. A filename already used
    /// by another CSS file yields [`Error::FilenameUsed`].
    pub fn add_css(&mut self, source: &str, internal_filename: Option<&str>) -> Result<String> {
        self.styles.add(&self.fetcher, source, internal_filename)
    }

    /// Add a font file; see [`Epub::add_css`] for the source and filename
    /// rules. Returns `../fonts/<filename>`.
    pub fn add_font(&mut self, source: &str, internal_filename: Option<&str>) -> Result<String> {
        self.fonts.add(&self.fetcher, source, internal_filename)
    }

    /// Add an image; see [`Epub::add_css`] for the source and filename
    /// rules. Returns `../images/<filename>`.
    pub fn add_image(&mut self, source: &str, internal_filename: Option<&str>) -> Result<String> {
        self.images.add(&self.fetcher, source, internal_filename)
    }

    /// Add a video; see [`Epub::add_css`] for the source and filename
    /// rules. Returns `../videos/<filename>`.
    pub fn add_video(&mut self, source: &str, internal_filename: Option<&str>) -> Result<String> {
        self.videos.add(&self.fetcher, source, internal_filename)
    }

    /// Add an audio file; see [`Epub::add_css`] for the source and filename
    /// rules. Returns `../audios/<filename>`.
    pub fn add_audio(&mut self, source: &str, internal_filename: Option<&str>) -> Result<String> {
        self.audios.add(&self.fetcher, source, internal_filename)
    }

    /// Add a section (chapter) and return its internal filename.
    ///
    /// The body goes between the `<body>` tags of the section document and
    /// is not validated beyond tokenization. A section without a title is
    /// left out of the navigation documents. The filename must be unique
    /// across all sections; `.xhtml` is appended when missing. The optional
    /// CSS path is one returned by [`Epub::add_css`].
    pub fn add_section(
        &mut self,
        body: &str,
        title: Option<&str>,
        internal_filename: Option<&str>,
        css_path: Option<&str>,
    ) -> Result<String> {
        self.add_section_inner(None, body, title, internal_filename, css_path)
    }

    /// Add a nested section under an existing one, identified by the
    /// internal filename an earlier add returned.
    ///
    /// Fails with [`Error::ParentMissing`] when no section anywhere in the
    /// document has that filename. Otherwise behaves like
    /// [`Epub::add_section`].
    pub fn add_subsection(
        &mut self,
        parent_filename: &str,
        body: &str,
        title: Option<&str>,
        internal_filename: Option<&str>,
        css_path: Option<&str>,
    ) -> Result<String> {
        self.add_section_inner(
            Some(parent_filename),
            body,
            title,
            internal_filename,
            css_path,
        )
    }

    fn add_section_inner(
        &mut self,
        parent_filename: Option<&str>,
        body: &str,
        title: Option<&str>,
        internal_filename: Option<&str>,
        css_path: Option<&str>,
    ) -> Result<String> {
        let existing = section::filenames(&self.sections);

        // One search produces the insertion path; the existence check and
        // the append can't disagree.
        let parent_path = match parent_filename {
            Some(name) if !name.is_empty() => Some(
                section::find_path(&self.sections, name)
                    .ok_or_else(|| Error::ParentMissing(name.to_string()))?,
            ),
            _ => None,
        };

        let filename = match internal_filename {
            Some(name) => {
                let mut name = name.to_string();
                if !name.ends_with(SECTION_EXT) {
                    name.push_str(SECTION_EXT);
                }
                if existing.contains(&name) {
                    return Err(Error::FilenameUsed(name));
                }
                name
            }
            None => {
                let mut index = 1;
                loop {
                    let candidate = format!("section{index:04}{SECTION_EXT}");
                    if !existing.contains(&candidate) {
                        break candidate;
                    }
                    index += 1;
                }
            }
        };

        let mut xhtml = Xhtml::new(body)?;
        if let Some(title) = title {
            xhtml.set_title(title);
        }
        if let Some(css) = css_path {
            xhtml.set_stylesheet(css);
        }

        let new_section = Section {
            filename: filename.clone(),
            xhtml,
            children: Vec::new(),
            properties: properties_from_body(body),
        };

        match parent_path {
            None => self.sections.push(new_section),
            Some(path) => {
                let parent = section::section_at_mut(&mut self.sections, &path)
                    .ok_or_else(|| {
                        Error::ParentMissing(parent_filename.unwrap_or_default().to_string())
                    })?;
                parent.children.push(new_section);
            }
        }

        Ok(filename)
    }

    /// Set the cover page from an already-added image path (as returned by
    /// [`Epub::add_image`]) and an optional already-added CSS path.
    ///
    /// Replaces any existing cover: the old wrapper section, image entry,
    /// stylesheet entry, and synthesized stylesheet payload are all removed
    /// first. Without a CSS path a default stylesheet is stored as
    /// `cover.css` (one retry under a generated name; if both names are
    /// taken the cover is installed without a stylesheet and
    /// [`CoverOutcome::StylesheetSkipped`] is returned).
    pub fn set_cover(
        &mut self,
        internal_image_path: &str,
        internal_css_path: Option<&str>,
    ) -> Result<CoverOutcome> {
        if let Some(old) = self.cover.take() {
            // The wrapper is always created at the root; only root-level
            // sections are searched.
            if let Some(i) = self
                .sections
                .iter()
                .position(|s| s.filename == old.xhtml_filename)
            {
                self.sections.remove(i);
            }
            self.images.remove(&old.image_filename);
            if let Some(css) = &old.css_filename {
                self.styles.remove(css);
            }
            // old.css_temp drops with `old`.
        }

        let image_filename = base_name(internal_image_path);
        let mut outcome = CoverOutcome::Installed;
        let mut css_temp = None;

        let css_path = match internal_css_path {
            Some(path) => Some(path.to_string()),
            None => {
                let temp = encode_data_url("text/css", DEFAULT_COVER_CSS.as_bytes());
                let added = match self
                    .styles
                    .add(&self.fetcher, &temp, Some(DEFAULT_COVER_CSS_FILENAME))
                {
                    Ok(path) => Some(path),
                    Err(Error::FilenameUsed(_)) => {
                        let fallback = self.styles.generated_name(".css");
                        match self.styles.add(&self.fetcher, &temp, Some(&fallback)) {
                            Ok(path) => Some(path),
                            Err(Error::FilenameUsed(name)) => {
                                log::warn!(
                                    "cover stylesheet name {name} already used; installing cover without one"
                                );
                                outcome = CoverOutcome::StylesheetSkipped;
                                None
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Err(e) => return Err(e),
                };
                if added.is_some() {
                    css_temp = Some(temp);
                }
                added
            }
        };

        let body = format!(
            "<img src=\"{}\" alt=\"Cover Image\" />",
            quick_xml::escape::escape(internal_image_path)
        );
        // No title, so the cover page stays out of the navigation documents.
        let xhtml_filename = match self.add_section_inner(
            None,
            &body,
            None,
            Some(DEFAULT_COVER_XHTML_FILENAME),
            css_path.as_deref(),
        ) {
            Ok(name) => name,
            Err(Error::FilenameUsed(_)) => {
                self.add_section_inner(None, &body, None, None, css_path.as_deref())?
            }
            Err(e) => return Err(e),
        };

        self.cover = Some(Cover {
            image_filename,
            css_filename: css_path.as_deref().map(base_name),
            css_temp,
            xhtml_filename,
        });
        Ok(outcome)
    }

    /// Download every external `<img>` reference in the document and rewrite
    /// the tags to the stored copies (`../images/<filename>`).
    ///
    /// Each distinct source is fetched once per section; tags whose source
    /// is already a `data:image/` blob or an internal path are left alone,
    /// so running this twice is a no-op. A failed fetch is logged and the
    /// original tag kept; nothing is returned or raised.
    pub fn embed_images(&mut self) {
        for i in 0..self.sections.len() {
            let body = self.sections[i].xhtml.body().to_string();
            if let Some(new_body) = self.embed_images_in_body(&body) {
                self.sections[i].xhtml.set_body(new_body);
            }
        }
    }

    fn embed_images_in_body(&mut self, body: &str) -> Option<String> {
        let tags = embed::find_image_tags(body);
        if tags.is_empty() {
            return None;
        }

        // source -> stored relative path, per section
        let mut embedded: HashMap<String, String> = HashMap::new();
        let mut edits: Vec<(usize, usize, String)> = Vec::new();

        for tag in &tags {
            let Some(source) = tag.primary_source() else {
                continue;
            };
            if source.starts_with("data:image/") || source.starts_with("../") {
                continue;
            }
            let source = source.to_string();

            let path = match embedded.get(&source) {
                Some(path) => path.clone(),
                None => {
                    let extension = embed::source_extension(&source)
                        .or_else(|| self.probe_extension(&source))
                        .unwrap_or_default();
                    let filename = self.images.generated_name(&extension);
                    match self.images.add(&self.fetcher, &source, Some(&filename)) {
                        Ok(path) => {
                            embedded.insert(source.clone(), path.clone());
                            path
                        }
                        Err(e) => {
                            log::warn!("can't add image to the EPUB: {e}");
                            continue;
                        }
                    }
                }
            };

            edits.push((tag.start, tag.end, tag.render(&path)));
        }

        if edits.is_empty() {
            None
        } else {
            Some(embed::apply_edits(body, &edits))
        }
    }

    /// Probe a remote source's content type when its URL has no extension.
    fn probe_extension(&self, source: &str) -> Option<String> {
        if !source.starts_with("http://") && !source.starts_with("https://") {
            return None;
        }
        match self.fetcher.content_type(source) {
            Some(content_type) => {
                embed::extension_for_content_type(&content_type).map(str::to_string)
            }
            None => {
                log::warn!("can't get image headers for {source}");
                None
            }
        }
    }
}
