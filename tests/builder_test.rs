//! Integration tests for the public assembly surface.

use bindery::fetch::encode_data_url;
use bindery::{Epub, Error};

fn css_source(payload: &[u8]) -> String {
    encode_data_url("text/css", payload)
}

fn image_source() -> String {
    encode_data_url("image/png", b"pretend png bytes")
}

#[test]
fn generated_media_filenames_follow_the_sequence_template() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pic.png");
    std::fs::write(&file, b"bytes").unwrap();
    let source = file.to_str().unwrap();

    let mut epub = Epub::new("t");
    let first = epub.add_image(source, None).unwrap();
    let second = epub.add_image(source, None).unwrap();
    let third = epub.add_image(source, None).unwrap();

    // The first add keeps the source's base name; later adds of the same
    // base name fall back to the zero-padded sequence template.
    assert_eq!(first, "../images/pic.png");
    assert_eq!(second, "../images/image0002.png");
    assert_eq!(third, "../images/image0003.png");
}

#[test]
fn kind_namespaces_are_independent() {
    let mut epub = Epub::new("t");
    epub.add_css(&css_source(b"a{}"), Some("shared.name")).unwrap();
    epub.add_font(&css_source(b"ttf"), Some("shared.name")).unwrap();
    epub.add_image(&image_source(), Some("shared.name")).unwrap();
    epub.add_video(&image_source(), Some("shared.name")).unwrap();
    epub.add_audio(&image_source(), Some("shared.name")).unwrap();
}

#[test]
fn same_kind_rejects_a_reused_filename() {
    let mut epub = Epub::new("t");
    epub.add_css(&css_source(b"a{}"), Some("style.css")).unwrap();
    let err = epub
        .add_css(&css_source(b"b{}"), Some("style.css"))
        .unwrap_err();
    assert!(matches!(err, Error::FilenameUsed(name) if name == "style.css"));
}

#[test]
fn media_paths_use_the_kind_folder() {
    let mut epub = Epub::new("t");
    assert_eq!(
        epub.add_css(&css_source(b"a{}"), Some("s.css")).unwrap(),
        "../css/s.css"
    );
    assert_eq!(
        epub.add_font(&css_source(b"f"), Some("f.ttf")).unwrap(),
        "../fonts/f.ttf"
    );
    assert_eq!(
        epub.add_image(&image_source(), Some("i.png")).unwrap(),
        "../images/i.png"
    );
    assert_eq!(
        epub.add_video(&image_source(), Some("v.mp4")).unwrap(),
        "../videos/v.mp4"
    );
    assert_eq!(
        epub.add_audio(&image_source(), Some("a.mp3")).unwrap(),
        "../audios/a.mp3"
    );
}

#[test]
fn unreachable_source_reports_retrieval_failure() {
    let mut epub = Epub::new("t");
    let err = epub.add_image("/no/such/pic.png", None).unwrap_err();
    match err {
        Error::Retrieval { source, .. } => assert_eq!(source, "/no/such/pic.png"),
        other => panic!("expected retrieval error, got {other:?}"),
    }
}

#[test]
fn subsection_requires_an_existing_parent() {
    let mut epub = Epub::new("t");
    let a = epub.add_section("<p>a</p>", Some("A"), None, None).unwrap();
    let a1 = epub
        .add_subsection(&a, "<p>a1</p>", Some("A1"), None, None)
        .unwrap();
    // A parent can sit at any depth.
    epub.add_subsection(&a1, "<p>a1i</p>", Some("A1i"), None, None)
        .unwrap();

    let err = epub
        .add_subsection("ghost.xhtml", "<p>x</p>", None, None, None)
        .unwrap_err();
    assert!(matches!(err, Error::ParentMissing(name) if name == "ghost.xhtml"));
}

#[test]
fn invalid_fragment_is_rejected() {
    let mut epub = Epub::new("t");
    let err = epub
        .add_section("<p attr=\"unterminated", None, None, None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFragment(_)));
}

#[test]
fn metadata_round_trips() {
    let mut epub = Epub::new("Original");
    epub.set_title("Renamed");
    epub.set_author("Author");
    epub.set_identifier("urn:isbn:123");
    epub.set_lang("fr");
    epub.set_description("A description");
    epub.set_ppd("rtl");

    assert_eq!(epub.title(), "Renamed");
    assert_eq!(epub.author(), "Author");
    assert_eq!(epub.identifier(), "urn:isbn:123");
    assert_eq!(epub.lang(), "fr");
    assert_eq!(epub.description(), "A description");
    assert_eq!(epub.ppd(), "rtl");
}
