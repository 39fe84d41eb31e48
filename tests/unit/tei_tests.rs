/*!
 * Tests for TEI parsing, unit cleanup and orig/reg duplication
 */

use origreg::errors::DocumentError;
use origreg::segmentation::{segment_document, Segmenter};
use origreg::tei::{clean_document, duplicate_segments, Document, Element};

use crate::common::SAMPLE_TEI;

fn unit_texts(doc: &mut Document, local_name: &str) -> Vec<Option<String>> {
    let mut units = Vec::new();
    doc.root.collect_named_mut(local_name, &mut units);
    units.iter().map(|unit| unit.text_content()).collect()
}

#[test]
fn test_clean_document_withSampleLetter_shouldFlattenMarkup() {
    let mut doc = Document::parse(SAMPLE_TEI).unwrap();

    let changed = clean_document(&mut doc);

    assert_eq!(changed, 2);
    assert_eq!(
        unit_texts(&mut doc, "p"),
        vec![
            Some("Monsieur, ie vous escris ceste lettre. Est-il vray? Ouy!".to_string()),
            Some("- Ie suis vostre serviteur.".to_string()),
        ]
    );
    assert_eq!(unit_texts(&mut doc, "ab"), vec![Some("Adieu; a bientost".to_string())]);
}

#[test]
fn test_clean_document_shouldLeaveHeaderUntouched() {
    let xml = "<TEI><teiHeader><p>Un <hi>titre</hi>.</p></teiHeader><text><p>a<hi>b</hi></p></text></TEI>";
    let mut doc = Document::parse(xml).unwrap();

    assert_eq!(clean_document(&mut doc), 1);

    let header = doc.root.child_elements().next().unwrap();
    let header_p = header.child_elements().next().unwrap();
    assert_eq!(header_p.child_elements().count(), 1);
}

#[test]
fn test_segment_document_shouldOnlyVisitUnitsInTheirScope() {
    let xml = "<TEI><teiHeader><p>Note. Deux.</p></teiHeader><text><front><ab>Titre. Sous-titre.</ab></front><body><ab>A. B.</ab><div><p>C.</p></div></body></text></TEI>";
    let mut doc = Document::parse(xml).unwrap();

    let stats = segment_document(&mut doc, &Segmenter::default());

    assert_eq!(stats.units, 2);
    assert_eq!(stats.segments, 3);
    assert_eq!(doc.root.count_named("seg"), 3);
}

#[test]
fn test_duplicate_segments_afterSegmentation_shouldPairEverySegment() {
    let mut doc = Document::parse(SAMPLE_TEI).unwrap();
    clean_document(&mut doc);
    let stats = segment_document(&mut doc, &Segmenter::default());

    let duplicated = duplicate_segments(&mut doc);

    assert_eq!(stats.segments, 6);
    assert_eq!(duplicated, 6);
    assert_eq!(doc.root.count_named("orig"), 6);
    assert_eq!(doc.root.count_named("reg"), 6);

    let xml = doc.to_xml_string();
    assert!(xml.contains("<orig>Est-il vray?</orig>"));
    assert!(xml.contains("<reg>Est-il vray?</reg>"));
    assert!(xml.contains(r#"<seg n="2" xml:id="s2">"#));
}

#[test]
fn test_duplicate_segments_withoutUnits_shouldDoNothing() {
    let mut doc = Document::new(Element::new("TEI").with_child(Element::new("seg").with_text("Hors.")));
    assert_eq!(duplicate_segments(&mut doc), 0);
}

#[test]
fn test_to_xml_string_shouldKeepNamespaceAndReparse() {
    let mut doc = Document::parse(SAMPLE_TEI).unwrap();
    clean_document(&mut doc);
    segment_document(&mut doc, &Segmenter::default());
    duplicate_segments(&mut doc);

    let xml = doc.to_xml_string();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">"#));
    assert!(xml.contains(r#"<p xml:id="p1">"#));

    let reparsed = Document::parse(&xml).unwrap();
    assert_eq!(reparsed, doc);
}

#[test]
fn test_parse_withEmptyInput_shouldReportMissingRoot() {
    let result = Document::parse("");
    assert!(matches!(result, Err(DocumentError::MissingRoot)));
}

#[test]
fn test_parse_withUnclosedRoot_shouldFail() {
    assert!(Document::parse("<TEI><text><p>a</p></text>").is_err());
}
