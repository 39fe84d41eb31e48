/*!
 * Sentence segmentation of TEI units.
 *
 * - `segmenter`: punctuation-based splitting of unit text
 * - `materializer`: replacement of unit content by numbered `<seg>` elements
 */

use log::debug;

use crate::tei::model::Document;
use crate::tei::visit_units_mut;

pub mod materializer;
pub mod segmenter;

pub use self::materializer::{materialize, segment_id};
pub use self::segmenter::Segmenter;

/// Counters collected while segmenting a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentationStats {
    /// Units visited
    pub units: usize,
    /// Segments created
    pub segments: usize,
    /// Units without any text node
    pub empty_units: usize,
}

/// Segment every unit of the document in place.
///
/// A unit without text yields zero segments; it is counted in
/// `empty_units` and is not an error.
pub fn segment_document(doc: &mut Document, segmenter: &Segmenter) -> SegmentationStats {
    let mut stats = SegmentationStats::default();
    visit_units_mut(&mut doc.root, &mut |unit| {
        stats.units += 1;
        let segments = match unit.text_content() {
            Some(text) => segmenter.segment(&text),
            None => {
                debug!("Unit <{}> has no text, leaving it empty", unit.name);
                stats.empty_units += 1;
                Vec::new()
            }
        };
        stats.segments += materialize(unit, segments);
    });
    stats
}
