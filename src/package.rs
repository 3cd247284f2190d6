//! OPF package document generation (metadata, manifest, spine).

use quick_xml::escape::escape;

use crate::epub::Epub;
use crate::media::{MediaStore, media_type_for};
use crate::section;

/// Manifest id of the cover image item, also referenced by the EPUB 2
/// compatibility `<meta name="cover">`.
const COVER_IMAGE_ID: &str = "cover-image";

/// Generate the `package.opf` document.
///
/// Manifest hrefs are relative to the content folder; sections live under
/// `xhtml/`, media under its kind folder. The spine lists sections in
/// depth-first forest order.
pub(crate) fn generate_opf(epub: &Epub) -> String {
    let mut opf = String::new();

    opf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    opf.push_str(
        "<package xmlns=\"http://www.idpf.org/2007/opf\" unique-identifier=\"pub-id\" version=\"3.0\">\n",
    );
    opf.push_str("  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n");

    opf.push_str(&format!(
        "    <dc:identifier id=\"pub-id\">{}</dc:identifier>\n",
        escape(epub.identifier())
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape(epub.title())
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape(epub.lang())
    ));
    if !epub.author().is_empty() {
        opf.push_str(&format!(
            "    <dc:creator id=\"creator\">{}</dc:creator>\n",
            escape(epub.author())
        ));
    }
    if !epub.description().is_empty() {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape(epub.description())
        ));
    }
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    ));
    if epub.cover.is_some() {
        opf.push_str(&format!(
            "    <meta name=\"cover\" content=\"{COVER_IMAGE_ID}\"/>\n"
        ));
    }
    opf.push_str("  </metadata>\n  <manifest>\n");

    opf.push_str(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );

    for store in [
        &epub.styles,
        &epub.fonts,
        &epub.images,
        &epub.videos,
        &epub.audios,
    ] {
        push_media_items(&mut opf, epub, store);
    }

    for section in section::flatten(&epub.sections) {
        let properties = if section.properties.is_empty() {
            String::new()
        } else {
            format!(" properties=\"{}\"", escape(section.properties.as_str()))
        };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"xhtml/{}\" media-type=\"application/xhtml+xml\"{}/>\n",
            href_to_id(&section.filename),
            escape(section.filename.as_str()),
            properties
        ));
    }

    opf.push_str("  </manifest>\n");

    if epub.ppd().is_empty() {
        opf.push_str("  <spine toc=\"ncx\">\n");
    } else {
        opf.push_str(&format!(
            "  <spine toc=\"ncx\" page-progression-direction=\"{}\">\n",
            escape(epub.ppd())
        ));
    }
    for section in section::flatten(&epub.sections) {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            href_to_id(&section.filename)
        ));
    }
    opf.push_str("  </spine>\n</package>\n");

    opf
}

fn push_media_items(opf: &mut String, epub: &Epub, store: &MediaStore) {
    let folder = store.kind().folder_name();
    let cover_image = epub
        .cover
        .as_ref()
        .map(|cover| cover.image_filename.as_str());

    for (filename, _) in store.iter() {
        let is_cover = store.kind() == crate::media::MediaKind::Image
            && cover_image == Some(filename);
        let id = if is_cover {
            COVER_IMAGE_ID.to_string()
        } else {
            href_to_id(filename)
        };
        let properties = if is_cover { " properties=\"cover-image\"" } else { "" };
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}/{}\" media-type=\"{}\"{}/>\n",
            id,
            folder,
            escape(filename),
            media_type_for(filename),
            properties
        ));
    }
}

/// Turn an href into a usable manifest id.
fn href_to_id(href: &str) -> String {
    href.replace(['/', '.', ' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::encode_data_url;

    #[test]
    fn opf_lists_metadata_manifest_and_spine() {
        let mut epub = Epub::new("Title & Co");
        epub.set_author("An Author");
        epub.set_description("About");
        epub.add_css(&encode_data_url("text/css", b"a{}"), Some("style.css"))
            .unwrap();
        epub.add_section("<p>a</p>", Some("A"), None, None).unwrap();
        epub.add_section("<svg></svg>", Some("B"), None, None).unwrap();

        let opf = generate_opf(&epub);
        assert!(opf.contains("<dc:title>Title &amp; Co</dc:title>"));
        assert!(opf.contains("<dc:creator id=\"creator\">An Author</dc:creator>"));
        assert!(opf.contains("<dc:language>en</dc:language>"));
        assert!(opf.contains("<meta property=\"dcterms:modified\">"));
        assert!(opf.contains("href=\"css/style.css\" media-type=\"text/css\""));
        assert!(opf.contains("href=\"xhtml/section0001.xhtml\""));
        assert!(opf.contains("properties=\"svg\""));
        assert!(opf.contains("<itemref idref=\"section0001_xhtml\"/>"));
        assert!(!opf.contains("page-progression-direction"));
        assert!(!opf.contains("<meta name=\"cover\""));
    }

    #[test]
    fn spine_follows_depth_first_order() {
        let mut epub = Epub::new("t");
        let a = epub.add_section("<p>a</p>", Some("A"), None, None).unwrap();
        epub.add_section("<p>b</p>", Some("B"), None, None).unwrap();
        epub.add_subsection(&a, "<p>a1</p>", Some("A1"), None, None)
            .unwrap();

        let opf = generate_opf(&epub);
        let first = opf.find("idref=\"section0001_xhtml\"").unwrap();
        let sub = opf.find("idref=\"section0003_xhtml\"").unwrap();
        let second = opf.find("idref=\"section0002_xhtml\"").unwrap();
        assert!(first < sub && sub < second);
    }

    #[test]
    fn cover_image_gets_the_cover_item_and_meta() {
        let mut epub = Epub::new("t");
        let image = epub
            .add_image(&encode_data_url("image/png", b"png"), Some("pic.png"))
            .unwrap();
        epub.set_cover(&image, None).unwrap();

        let opf = generate_opf(&epub);
        assert!(opf.contains("<meta name=\"cover\" content=\"cover-image\"/>"));
        assert!(opf.contains(
            "<item id=\"cover-image\" href=\"images/pic.png\" media-type=\"image/png\" properties=\"cover-image\"/>"
        ));
    }

    #[test]
    fn ppd_is_written_on_the_spine() {
        let mut epub = Epub::new("t");
        epub.set_ppd("rtl");
        let opf = generate_opf(&epub);
        assert!(opf.contains("<spine toc=\"ncx\" page-progression-direction=\"rtl\">"));
    }
}
