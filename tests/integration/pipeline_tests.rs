/*!
 * Integration tests for the in-memory pipeline: segment, duplicate, normalize
 */

use origreg::app_config::Config;
use origreg::app_controller::segment_xml;
use origreg::normalization::{BatchNormalizer, NormalizerOptions, TextCleaner};
use origreg::providers::mock::MockModel;
use origreg::segmentation::Segmenter;
use origreg::tei::{segment_parts_mut, Document};

use crate::common::{self, SAMPLE_TEI};

fn part_texts(doc: &mut Document, local_name: &str) -> Vec<String> {
    segment_parts_mut(&mut doc.root, local_name)
        .into_iter()
        .map(|part| part.text_content().unwrap_or_default())
        .collect()
}

fn normalizer(model: MockModel, batch_size: usize) -> BatchNormalizer<MockModel> {
    let options = NormalizerOptions {
        batch_size,
        debug_samples: false,
        ..NormalizerOptions::default()
    };
    BatchNormalizer::new(model, TextCleaner::default(), options).unwrap()
}

#[test]
fn test_segment_xml_withSampleLetter_shouldProduceSixPairs() {
    let (mut doc, stats) = segment_xml(SAMPLE_TEI, &Segmenter::default()).unwrap();

    assert_eq!(stats.units, 3);
    assert_eq!(stats.segments, 6);
    assert_eq!(
        part_texts(&mut doc, "orig"),
        vec![
            "Monsieur, ie vous escris ceste lettre.",
            "Est-il vray?",
            "Ouy!",
            "- Ie suis vostre serviteur.",
            "Adieu;",
            "a bientost",
        ]
    );
    assert_eq!(part_texts(&mut doc, "orig"), part_texts(&mut doc, "reg"));
}

#[tokio::test]
async fn test_normalize_document_withSampleLetter_shouldFillRegAndCleanOrig() {
    common::init_logging();
    let (mut doc, _) = segment_xml(SAMPLE_TEI, &Segmenter::default()).unwrap();
    let model = MockModel::working();
    let normalizer = normalizer(model.clone(), 4);
    let mut completed = Vec::new();

    let stats = normalizer
        .normalize_document(&mut doc, |progress| completed.push((progress.completed, progress.total)))
        .await
        .unwrap();

    assert_eq!(stats.originals_cleaned, 1);
    assert_eq!(stats.candidates, 6);
    assert_eq!(stats.batches, 2);
    assert_eq!(stats.missing_results, 0);
    assert_eq!(completed, vec![(4, 6), (6, 6)]);

    let originals = part_texts(&mut doc, "orig");
    assert_eq!(originals[3], "Ie suis vostre serviteur.");
    let candidates = part_texts(&mut doc, "reg");
    assert_eq!(candidates[0], "MONSIEUR, IE VOUS ESCRIS CESTE LETTRE.");
    assert_eq!(candidates[3], "IE SUIS VOSTRE SERVITEUR.");
    assert_eq!(candidates[5], "A BIENTOST");

    assert_eq!(model.calls()[1], vec!["Adieu;".to_string(), "a bientost".to_string()]);
}

#[tokio::test]
async fn test_normalize_document_withFailingSecondBatch_shouldLeaveLaterRegUntouched() {
    let (mut doc, _) = segment_xml(SAMPLE_TEI, &Segmenter::default()).unwrap();
    let normalizer = normalizer(MockModel::failing_on_call(1), 4);

    let result = normalizer.normalize_document(&mut doc, |_| {}).await;

    assert!(result.is_err());
    let candidates = part_texts(&mut doc, "reg");
    assert_eq!(candidates[0], "MONSIEUR, IE VOUS ESCRIS CESTE LETTRE.");
    assert_eq!(candidates[4], "Adieu;");
    assert_eq!(candidates[5], "a bientost");
}

#[test]
fn test_pipeline_withConfiguredBoundaries_shouldFollowConfig() {
    let mut config = Config::default();
    config.segmentation.boundary_chars = ".".to_string();
    let segmenter = config.segmenter().unwrap();

    let (mut doc, stats) = segment_xml(SAMPLE_TEI, &segmenter).unwrap();

    assert_eq!(stats.segments, 4);
    assert_eq!(
        part_texts(&mut doc, "orig"),
        vec![
            "Monsieur, ie vous escris ceste lettre.",
            "Est-il vray? Ouy!",
            "- Ie suis vostre serviteur.",
            "Adieu; a bientost",
        ]
    );
}

#[test]
fn test_segment_xml_withEmptyUnit_shouldKeepUnitWithoutSegments() {
    let xml = "<TEI><text><body><p><pb n=\"1\"/></p><p>Un.</p></body></text></TEI>";

    let (doc, stats) = segment_xml(xml, &Segmenter::default()).unwrap();

    assert_eq!(stats.units, 2);
    assert_eq!(stats.empty_units, 1);
    assert_eq!(stats.segments, 1);
    assert!(doc.to_xml_string().contains("<p/>"));
}

#[test]
fn test_segment_xml_withBlankInlineElement_shouldKeepWordsApart() {
    let xml = "<TEI><text><body><p>Le<hi> </hi>Roy dit.</p></body></text></TEI>";

    let (mut doc, stats) = segment_xml(xml, &Segmenter::default()).unwrap();

    assert_eq!(stats.segments, 1);
    assert_eq!(part_texts(&mut doc, "orig"), vec!["Le Roy dit."]);
}
