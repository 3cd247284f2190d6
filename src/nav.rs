//! Navigation documents: EPUB 3 nav.xhtml and EPUB 2 toc.ncx.
//!
//! Both mirror the titled portion of the section forest. Untitled sections
//! (the cover wrapper) and their subtrees are left out.

use quick_xml::escape::escape;

use crate::epub::Epub;
use crate::section::Section;

/// Generate the EPUB 3 navigation document.
pub(crate) fn generate_nav(epub: &Epub) -> String {
    let mut nav = String::new();

    nav.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    nav.push_str(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n",
    );
    nav.push_str("<head>\n");
    nav.push_str(&format!("  <title>{}</title>\n", escape(epub.title())));
    nav.push_str("</head>\n<body>\n");
    nav.push_str("  <nav epub:type=\"toc\">\n");
    write_nav_list(&mut nav, &epub.sections, 2);
    nav.push_str("  </nav>\n</body>\n</html>\n");

    nav
}

fn write_nav_list(nav: &mut String, sections: &[Section], indent: usize) {
    let titled: Vec<&Section> = sections
        .iter()
        .filter(|s| !s.xhtml.title().is_empty())
        .collect();
    if titled.is_empty() {
        return;
    }

    let pad = "  ".repeat(indent);
    nav.push_str(&format!("{pad}<ol>\n"));
    for section in titled {
        nav.push_str(&format!(
            "{pad}  <li>\n{pad}    <a href=\"xhtml/{}\">{}</a>\n",
            escape(section.filename.as_str()),
            escape(section.xhtml.title())
        ));
        write_nav_list(nav, &section.children, indent + 2);
        nav.push_str(&format!("{pad}  </li>\n"));
    }
    nav.push_str(&format!("{pad}</ol>\n"));
}

/// Generate the EPUB 2 NCX table of contents.
pub(crate) fn generate_ncx(epub: &Epub) -> String {
    let mut ncx = String::new();

    ncx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    ncx.push_str("<!DOCTYPE ncx PUBLIC \"-//NISO//DTD ncx 2005-1//EN\" \"http://www.daisy.org/z3986/2005/ncx-2005-1.dtd\">\n");
    ncx.push_str("<ncx xmlns=\"http://www.daisy.org/z3986/2005/ncx/\" version=\"2005-1\">\n");
    ncx.push_str("  <head>\n");
    ncx.push_str(&format!(
        "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
        escape(epub.identifier())
    ));
    ncx.push_str("    <meta name=\"dtb:depth\" content=\"1\"/>\n");
    ncx.push_str("    <meta name=\"dtb:totalPageCount\" content=\"0\"/>\n");
    ncx.push_str("    <meta name=\"dtb:maxPageNumber\" content=\"0\"/>\n");
    ncx.push_str("  </head>\n  <docTitle>\n");
    ncx.push_str(&format!("    <text>{}</text>\n", escape(epub.title())));
    ncx.push_str("  </docTitle>\n  <navMap>\n");

    let mut play_order = 1;
    for section in &epub.sections {
        write_nav_point(&mut ncx, section, &mut play_order, 2);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, section: &Section, play_order: &mut usize, indent: usize) {
    if section.xhtml.title().is_empty() {
        return;
    }
    let pad = "  ".repeat(indent);

    ncx.push_str(&format!(
        "{pad}<navPoint id=\"navpoint-{play_order}\" playOrder=\"{play_order}\">\n"
    ));
    ncx.push_str(&format!(
        "{pad}  <navLabel>\n{pad}    <text>{}</text>\n{pad}  </navLabel>\n",
        escape(section.xhtml.title())
    ));
    ncx.push_str(&format!(
        "{pad}  <content src=\"xhtml/{}\"/>\n",
        escape(section.filename.as_str())
    ));

    *play_order += 1;

    for child in &section.children {
        write_nav_point(ncx, child, play_order, indent + 1);
    }

    ncx.push_str(&format!("{pad}</navPoint>\n"));
}
