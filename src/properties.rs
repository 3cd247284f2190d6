//! Structural capability scanning of body fragments.

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};

const MATHML_NS: &[u8] = b"http://www.w3.org/1998/Math/MathML";

/// Scan a body fragment for structural features that must be declared on its
/// manifest item: `svg`, `mathml`, `scripted`.
///
/// Only a `math` element bound to the MathML namespace counts; a bare
/// `<math>` is ignored. Tags are reported space-joined in discovery order.
/// Scanning stops quietly at the first unparseable token, so a malformed
/// fragment yields whatever was found up to that point.
pub(crate) fn properties_from_body(body: &str) -> String {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().check_end_names = false;

    let mut props: Vec<&str> = Vec::new();
    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) | Ok((ns, Event::Empty(e))) => {
                let name = e.local_name();
                let tag = if name.as_ref().eq_ignore_ascii_case(b"svg") {
                    Some("svg")
                } else if name.as_ref().eq_ignore_ascii_case(b"math")
                    && matches!(ns, ResolveResult::Bound(Namespace(n)) if n == MATHML_NS)
                {
                    Some("mathml")
                } else if name.as_ref().eq_ignore_ascii_case(b"script") {
                    Some("scripted")
                } else {
                    None
                };
                if let Some(tag) = tag {
                    if !props.contains(&tag) {
                        props.push(tag);
                    }
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    props.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fragment_has_no_properties() {
        assert_eq!(properties_from_body("<h1>Hi</h1><p>text</p>"), "");
    }

    #[test]
    fn svg_element_is_detected() {
        assert_eq!(
            properties_from_body("<p>see</p><svg viewBox=\"0 0 1 1\"></svg>"),
            "svg"
        );
        assert_eq!(properties_from_body("<SVG></SVG>"), "svg");
    }

    #[test]
    fn math_requires_the_mathml_namespace() {
        let namespaced =
            "<math xmlns=\"http://www.w3.org/1998/Math/MathML\"><mi>x</mi></math>";
        assert_eq!(properties_from_body(namespaced), "mathml");
        assert_eq!(properties_from_body("<math><mi>x</mi></math>"), "");
    }

    #[test]
    fn script_element_is_detected() {
        assert_eq!(
            properties_from_body("<script type=\"text/javascript\">x()</script>"),
            "scripted"
        );
    }

    #[test]
    fn tags_join_in_discovery_order_without_duplicates() {
        let body = "<script>a()</script><svg></svg><script>b()</script>";
        assert_eq!(properties_from_body(body), "scripted svg");
    }

    #[test]
    fn malformed_fragment_keeps_partial_results() {
        let body = "<svg></svg><p attr=";
        assert_eq!(properties_from_body(body), "svg");
    }
}
