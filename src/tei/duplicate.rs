/*!
 * Original/normalized duplication of segments.
 *
 * Every `<seg>` of a unit receives an `<orig>` and a `<reg>` child holding
 * the same trimmed text. The `orig` copy keeps the historical spelling, the
 * `reg` copy is later overwritten by the normalization model.
 */

use super::model::{Document, Element, Node};
use super::{name_like, visit_units_mut, CANDIDATE, ORIGINAL, SEGMENT};

/// Duplicate the text of every segment of the document.
///
/// Returns the number of segments that were rewritten. Segments that
/// already carry exactly one `orig` and one `reg` are left untouched.
pub fn duplicate_segments(doc: &mut Document) -> usize {
    let mut duplicated = 0;
    visit_units_mut(&mut doc.root, &mut |unit| {
        for seg in unit.child_elements_mut() {
            if seg.local_name() == SEGMENT && duplicate_segment(seg) {
                duplicated += 1;
            }
        }
    });
    duplicated
}

/// Rewrite one segment into its `orig`/`reg` pair
pub fn duplicate_segment(seg: &mut Element) -> bool {
    if is_duplicated(seg) {
        return false;
    }

    let text = seg.text_content().unwrap_or_default().trim().to_string();
    let original = Element::new(name_like(&seg.name, ORIGINAL)).with_text(text.clone());
    let candidate = Element::new(name_like(&seg.name, CANDIDATE)).with_text(text);

    seg.replace_children(vec![Node::Element(original), Node::Element(candidate)]);
    true
}

fn is_duplicated(seg: &Element) -> bool {
    match seg.children.as_slice() {
        [Node::Element(first), Node::Element(second)] => {
            first.local_name() == ORIGINAL && second.local_name() == CANDIDATE
        }
        _ => false,
    }
}
