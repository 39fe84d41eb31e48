/*!
 * Tests for sentence segmentation and segment materialization
 */

use origreg::segmentation::{materialize, segment_document, segment_id, Segmenter};
use origreg::tei::{Document, Element, Node};

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_segment_withThreeSentences_shouldSplitAfterEachBoundary() {
    let segmenter = Segmenter::default();
    assert_eq!(
        segmenter.segment("I hope this works. Will it? Yes!"),
        vec!["I hope this works.", "Will it?", "Yes!"]
    );
}

#[test]
fn test_segment_withOnlyBoundariesAndSpaces_shouldReturnNothing() {
    let segmenter = Segmenter::default();
    assert!(segmenter.segment("...   ").is_empty());
    assert!(segmenter.segment("").is_empty());
}

#[test]
fn test_segment_withSingleBoundaries_shouldBeLossless() {
    let segmenter = Segmenter::default();
    let inputs = [
        "Monsieur, ie vous escris. Est-il vray? Ouy!",
        "Premierement: le Roy; puis la Reyne",
        "  une seule phrase sans fin",
    ];
    for input in inputs {
        let joined: String = segmenter.segment(input).concat();
        assert_eq!(strip_whitespace(&joined), strip_whitespace(input), "input: {}", input);
    }
}

#[test]
fn test_segment_withCustomBoundaries_shouldOnlySplitOnThem() {
    let segmenter = Segmenter::new("|").unwrap();
    assert_eq!(segmenter.segment("a. b | c"), vec!["a. b |", "c"]);
}

#[test]
fn test_new_withEmptyBoundaries_shouldFail() {
    assert!(Segmenter::new("").is_err());
}

#[test]
fn test_segment_shouldNeverReturnEmptySegments() {
    let segmenter = Segmenter::default();
    for input in ["; ; ;", " . a . ", "!?.:;", "\n\t."] {
        assert!(segmenter.segment(input).iter().all(|s| !s.trim().is_empty()));
    }
}

#[test]
fn test_materialize_shouldNumberSegmentsFromOne() {
    let mut unit = Element::new("p").with_attribute("rend", "indent").with_text("old");
    let created = materialize(&mut unit, vec!["Un.".to_string(), "Deux.".to_string(), "Trois.".to_string()]);

    assert_eq!(created, 3);
    assert_eq!(unit.attribute("rend"), Some("indent"));

    let segs: Vec<&Element> = unit.child_elements().collect();
    for (i, seg) in segs.iter().enumerate() {
        let ordinal = i + 1;
        assert_eq!(seg.local_name(), "seg");
        assert_eq!(seg.attribute("n"), Some(ordinal.to_string().as_str()));
        assert_eq!(seg.attribute("xml:id"), Some(segment_id(ordinal).as_str()));
    }
    assert!(!unit.children.iter().any(|node| matches!(node, Node::Text(_))));
}

#[test]
fn test_materialize_withNoSegments_shouldLeaveUnitEmpty() {
    let mut unit = Element::new("ab").with_text("...");
    assert_eq!(materialize(&mut unit, Vec::new()), 0);
    assert!(unit.children.is_empty());
}

#[test]
fn test_segment_document_withPrefixedNames_shouldReusePrefix() {
    let mut doc = Document::parse(
        r#"<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0"><tei:text><tei:body><tei:p>Un. Deux.</tei:p></tei:body></tei:text></tei:TEI>"#,
    )
    .unwrap();

    let stats = segment_document(&mut doc, &Segmenter::default());

    assert_eq!(stats.segments, 2);
    let xml = doc.to_xml_string();
    assert!(xml.contains(r#"<tei:seg n="1" xml:id="s1">Un.</tei:seg>"#));
    assert!(xml.contains(r#"<tei:seg n="2" xml:id="s2">Deux.</tei:seg>"#));
}
