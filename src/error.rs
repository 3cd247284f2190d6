//! Error types for bindery operations.

use thiserror::Error;

/// Errors that can occur while assembling or writing an EPUB.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested or derived internal filename is already taken within
    /// its namespace (one namespace per media kind, one for all sections).
    #[error("filename already used: {0}")]
    FilenameUsed(String),

    /// A resource source could not be validated or fetched.
    #[error("error retrieving {source}: {cause}")]
    Retrieval {
        /// The source reference whose retrieval failed.
        source: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A subsection referenced a parent filename that is not in the document.
    #[error("parent with the internal filename {0} does not exist")]
    ParentMissing(String),

    /// A content fragment could not be tokenized into a document.
    #[error("invalid content fragment: {0}")]
    InvalidFragment(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;
