/*!
 * Turns segment strings into `<seg>` elements.
 */

use crate::tei::model::{Element, Node};
use crate::tei::{name_like, SEGMENT};

/// Attribute carrying the 1-based ordinal
pub const ORDINAL_ATTRIBUTE: &str = "n";

/// Attribute carrying the segment identifier
pub const ID_ATTRIBUTE: &str = "xml:id";

/// Identifier of the segment with the given 1-based ordinal
pub fn segment_id(ordinal: usize) -> String {
    format!("s{}", ordinal)
}

/// Build one `<seg>` element
pub fn build_segment(unit_name: &str, ordinal: usize, text: String) -> Element {
    Element::new(name_like(unit_name, SEGMENT))
        .with_attribute(ORDINAL_ATTRIBUTE, ordinal.to_string())
        .with_attribute(ID_ATTRIBUTE, segment_id(ordinal))
        .with_text(text)
}

/// Replace the content of `unit` with one `<seg>` per segment string.
///
/// The new children are built completely before the old content is
/// dropped, and unit attributes are kept. An empty `segments` list leaves
/// the unit without children. Returns the number of segments created.
pub fn materialize(unit: &mut Element, segments: Vec<String>) -> usize {
    let children: Vec<Node> = segments
        .into_iter()
        .enumerate()
        .map(|(index, text)| Node::Element(build_segment(&unit.name, index + 1, text)))
        .collect();
    let count = children.len();
    unit.replace_children(children);
    count
}
