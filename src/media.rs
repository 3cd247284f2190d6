//! Per-kind media stores: filename allocation and source bookkeeping.
//!
//! Each media kind (CSS, fonts, images, videos, audio) is its own namespace.
//! A store maps internal filenames to the source references they will be
//! retrieved from at write time.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};
use crate::fetch::Fetcher;

/// Folder names used for resources inside the EPUB.
pub const CSS_FOLDER_NAME: &str = "css";
pub const FONT_FOLDER_NAME: &str = "fonts";
pub const IMAGE_FOLDER_NAME: &str = "images";
pub const VIDEO_FOLDER_NAME: &str = "videos";
pub const AUDIO_FOLDER_NAME: &str = "audios";

/// Longest internal filename accepted before a name is generated instead.
const MAX_FILENAME_LEN: usize = 255;

/// A media namespace within the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MediaKind {
    Style,
    Font,
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Folder the kind's files live in, relative to the content root.
    pub(crate) fn folder_name(self) -> &'static str {
        match self {
            MediaKind::Style => CSS_FOLDER_NAME,
            MediaKind::Font => FONT_FOLDER_NAME,
            MediaKind::Image => IMAGE_FOLDER_NAME,
            MediaKind::Video => VIDEO_FOLDER_NAME,
            MediaKind::Audio => AUDIO_FOLDER_NAME,
        }
    }

    /// Prefix for generated filenames (`css0001.css`, `image0002.png`, ...).
    fn file_prefix(self) -> &'static str {
        match self {
            MediaKind::Style => "css",
            MediaKind::Font => "font",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

/// Maps internal filenames to source references for one media kind.
///
/// Keys are unique within the store; insertion order is preserved so the
/// generated manifest is deterministic.
#[derive(Debug)]
pub(crate) struct MediaStore {
    kind: MediaKind,
    entries: IndexMap<String, String>,
}

impl MediaStore {
    pub(crate) fn new(kind: MediaKind) -> Self {
        MediaStore {
            kind,
            entries: IndexMap::new(),
        }
    }

    pub(crate) fn kind(&self) -> MediaKind {
        self.kind
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub(crate) fn remove(&mut self, filename: &str) -> Option<String> {
        self.entries.shift_remove(filename)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
    }

    /// Add a media file and return the path to it usable from section bodies
    /// (`../<folder>/<filename>`).
    ///
    /// The source is validated for retrievability but not materialized. With
    /// no filename given, one is derived from the source's base name, falling
    /// back to a generated sequence name when the derived one is overlong,
    /// not a well-formed relative path, or already taken.
    pub(crate) fn add(
        &mut self,
        fetcher: &Fetcher,
        source: &str,
        internal_filename: Option<&str>,
    ) -> Result<String> {
        fetcher.check(source)?;

        let filename = match internal_filename {
            Some(name) => name.to_string(),
            None => {
                let derived = base_name(source);
                if derived.len() > MAX_FILENAME_LEN
                    || !is_valid_filename(&derived)
                    || self.entries.contains_key(&derived)
                {
                    self.generated_name(&extension(source).to_lowercase())
                } else {
                    derived
                }
            }
        };

        if self.entries.contains_key(&filename) {
            return Err(Error::FilenameUsed(filename));
        }

        let path = format!("../{}/{}", self.kind.folder_name(), filename);
        self.entries.insert(filename, source.to_string());
        Ok(path)
    }

    /// Next generated filename for this store: `<prefix><4-digit seq><ext>`.
    pub(crate) fn generated_name(&self, extension: &str) -> String {
        format!(
            "{}{:04}{}",
            self.kind.file_prefix(),
            self.entries.len() + 1,
            extension
        )
    }
}

/// Last path segment of a source, percent-decoded.
pub(crate) fn base_name(source: &str) -> String {
    let trimmed = source.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Whether a name is a well-formed relative path for the archive.
fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name.starts_with('/') {
        return false;
    }
    name.split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Extension of a source's last path segment (with the dot), or empty.
fn extension(source: &str) -> String {
    let base = source.rsplit('/').next().unwrap_or(source);
    match base.rfind('.') {
        Some(i) => base[i..].to_string(),
        None => String::new(),
    }
}

/// Manifest media type for an internal filename, by extension.
pub(crate) fn media_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    match lower.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "xhtml" | "html" => "application/xhtml+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::encode_data_url;

    fn store() -> MediaStore {
        MediaStore::new(MediaKind::Image)
    }

    #[test]
    fn base_name_from_url() {
        assert_eq!(base_name("http://example.com/a/pic.png"), "pic.png");
        assert_eq!(base_name("/tmp/pic.png"), "pic.png");
        assert_eq!(base_name("pic.png"), "pic.png");
        assert_eq!(base_name("http://example.com/my%20pic.png"), "my pic.png");
    }

    #[test]
    fn filename_validity() {
        assert!(is_valid_filename("pic.png"));
        assert!(is_valid_filename("nested/pic.png"));
        assert!(!is_valid_filename(""));
        assert!(!is_valid_filename("/pic.png"));
        assert!(!is_valid_filename("../pic.png"));
        assert!(!is_valid_filename("a//b.png"));
    }

    #[test]
    fn extension_is_lowercased_for_generated_names() {
        assert_eq!(extension("http://example.com/PIC.PNG"), ".PNG");
        assert_eq!(extension("noext"), "");
    }

    #[test]
    fn generated_names_are_sequential() {
        let mut store = store();
        assert_eq!(store.generated_name(".png"), "image0001.png");
        store
            .entries
            .insert("image0001.png".into(), "src".into());
        assert_eq!(store.generated_name(".png"), "image0002.png");
    }

    #[test]
    fn explicit_filename_collision_is_an_error() {
        let fetcher = Fetcher::new();
        let source = encode_data_url("image/png", b"bytes");
        let mut store = store();
        store.add(&fetcher, &source, Some("pic.png")).unwrap();
        let err = store.add(&fetcher, &source, Some("pic.png")).unwrap_err();
        assert!(matches!(err, Error::FilenameUsed(name) if name == "pic.png"));
    }

    #[test]
    fn derived_collision_falls_back_to_generated_name() {
        let fetcher = Fetcher::new();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pic.png");
        std::fs::write(&file, b"bytes").unwrap();
        let source = file.to_str().unwrap();

        let mut store = store();
        let first = store.add(&fetcher, source, None).unwrap();
        assert_eq!(first, "../images/pic.png");
        let second = store.add(&fetcher, source, None).unwrap();
        assert_eq!(second, "../images/image0002.png");
    }

    #[test]
    fn media_types_by_extension() {
        assert_eq!(media_type_for("style.css"), "text/css");
        assert_eq!(media_type_for("photo.JPEG"), "image/jpeg");
        assert_eq!(media_type_for("clip.mp4"), "video/mp4");
        assert_eq!(media_type_for("mystery.bin"), "application/octet-stream");
    }
}
