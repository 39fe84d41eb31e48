/*!
 * TEI document handling.
 *
 * - `model`: owned XML tree with parser and pretty serializer
 * - `cleanup`: structural cleanup of segmentable units before segmentation
 * - `duplicate`: original/normalized duplication of segments
 *
 * Only two element kinds are segmentable: `p` anywhere below `text`, and
 * `ab` anywhere below `body`. Everything else is left as parsed.
 */

pub mod cleanup;
pub mod duplicate;
pub mod model;

pub use self::cleanup::clean_document;
pub use self::duplicate::duplicate_segments;
pub use self::model::{Document, Element, Node};

/// Local name of paragraph units
pub const PARAGRAPH: &str = "p";

/// Local name of speech/anonymous-block units
pub const SPEECH: &str = "ab";

/// Local name of segment elements
pub const SEGMENT: &str = "seg";

/// Local name of the original-spelling child
pub const ORIGINAL: &str = "orig";

/// Local name of the normalized-spelling child
pub const CANDIDATE: &str = "reg";

/// Call `visitor` on every segmentable unit, outermost first.
///
/// The content of a visited unit is not searched for further units.
pub fn visit_units_mut<F>(root: &mut Element, visitor: &mut F)
where
    F: FnMut(&mut Element),
{
    let mut units = Vec::new();
    gather_units(root, false, false, &mut units);
    for unit in units {
        visitor(unit);
    }
}

/// Collect the `local_name` children of every segment, in document order.
///
/// Only direct children of segments that are direct children of a unit
/// are returned, so `orig`/`reg` elements outside segmented units stay
/// out of reach.
pub fn segment_parts_mut<'a>(root: &'a mut Element, local_name: &str) -> Vec<&'a mut Element> {
    let mut units = Vec::new();
    gather_units(root, false, false, &mut units);

    let mut parts = Vec::new();
    for unit in units {
        for seg in unit.child_elements_mut() {
            if seg.local_name() != SEGMENT {
                continue;
            }
            parts.extend(seg.child_elements_mut().filter(|part| part.local_name() == local_name));
        }
    }
    parts
}

fn gather_units<'a>(element: &'a mut Element, in_text: bool, in_body: bool, out: &mut Vec<&'a mut Element>) {
    let (is_unit, in_text, in_body) = {
        let name = element.local_name();
        (
            (name == PARAGRAPH && in_text) || (name == SPEECH && in_body),
            in_text || name == "text",
            in_body || name == "body",
        )
    };

    if is_unit {
        out.push(element);
        return;
    }

    for child in element.child_elements_mut() {
        gather_units(child, in_text, in_body, out);
    }
}

/// Qualified name for `local` using the namespace prefix of `sibling`
pub(crate) fn name_like(sibling: &str, local: &str) -> String {
    match sibling.rsplit_once(':') {
        Some((prefix, _)) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}
