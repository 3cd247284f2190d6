//! # bindery
//!
//! A library for building EPUB 3 ebooks in memory and writing them as
//! packaged `.epub` files.
//!
//! ## Features
//!
//! - Hierarchical sections (chapters and nested subsections) with a
//!   generated EPUB 3 navigation document and EPUB 2 NCX for compatibility
//! - CSS, font, image, video, and audio resources from URLs, local files,
//!   or embedded `data:` URLs
//! - Cover pages with replace semantics
//! - Automatic download and deduplication of `<img>` references via
//!   [`Epub::embed_images`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use bindery::Epub;
//!
//! let mut epub = Epub::new("My Title");
//! epub.set_author("Hingle McCringleberry");
//!
//! let body = "<h1>Section 1</h1>\n<p>This is a paragraph.</p>";
//! epub.add_section(body, Some("Section 1"), None, None).unwrap();
//!
//! epub.write("my-title.epub").unwrap();
//! ```

pub mod epub;
pub mod error;
pub mod fetch;

mod embed;
mod media;
mod nav;
mod package;
mod properties;
mod section;
mod writer;
mod xhtml;

pub use epub::{CoverOutcome, Epub};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use media::{
    AUDIO_FOLDER_NAME, CSS_FOLDER_NAME, FONT_FOLDER_NAME, IMAGE_FOLDER_NAME, VIDEO_FOLDER_NAME,
};
