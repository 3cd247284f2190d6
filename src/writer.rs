//! Archive writing: serialize the in-memory EPUB to a packaged file.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::epub::Epub;
use crate::error::Result;
use crate::{nav, package, section};

const MIMETYPE: &str = "application/epub+zip";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

impl Epub {
    /// Write the assembled EPUB to a file.
    ///
    /// All media sources are retrieved at this point; a failed retrieval
    /// aborts the write with [`crate::Error::Retrieval`].
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the assembled EPUB to any `Write + Seek` destination.
    ///
    /// Useful for writing to memory buffers or network streams.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // The container convention: mimetype first, uncompressed.
        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE.as_bytes())?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        zip.start_file("EPUB/package.opf", deflated)?;
        zip.write_all(package::generate_opf(self).as_bytes())?;

        zip.start_file("EPUB/nav.xhtml", deflated)?;
        zip.write_all(nav::generate_nav(self).as_bytes())?;

        zip.start_file("EPUB/toc.ncx", deflated)?;
        zip.write_all(nav::generate_ncx(self).as_bytes())?;

        for store in [
            &self.styles,
            &self.fonts,
            &self.images,
            &self.videos,
            &self.audios,
        ] {
            let folder = store.kind().folder_name();
            for (filename, source) in store.iter() {
                let bytes = self.fetcher.retrieve(source)?;
                zip.start_file(format!("EPUB/{folder}/{filename}"), deflated)?;
                zip.write_all(&bytes)?;
            }
        }

        for section in section::flatten(&self.sections) {
            zip.start_file(format!("EPUB/xhtml/{}", section.filename), deflated)?;
            zip.write_all(section.xhtml.serialize().as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }
}
