/*!
 * Structural cleanup of segmentable units.
 *
 * Segmentation works on plain text, so every unit is flattened before it
 * is segmented: inline markup is unwrapped, editorial apparatus without
 * running text is dropped and line breaks are resolved. Words split by a
 * `<lb break="no"/>` are joined back together. The pass is idempotent and
 * does not touch anything outside the units.
 */

use log::debug;

use super::model::{Document, Element, Node};
use super::visit_units_mut;

/// Elements removed together with their content
const DROPPED_ELEMENTS: &[&str] = &["note", "fw", "pb", "cb", "figure", "gap"];

/// Preferred readings inside `<choice>`, in order
const CHOICE_READINGS: &[&str] = &["orig", "sic", "abbr"];

/// Flatten every segmentable unit of the document to a single text node.
///
/// Returns the number of units whose content changed.
pub fn clean_document(doc: &mut Document) -> usize {
    let mut changed = 0;
    visit_units_mut(&mut doc.root, &mut |unit| {
        if clean_unit(unit) {
            changed += 1;
        }
    });
    if changed > 0 {
        debug!("Cleaned markup in {} units", changed);
    }
    changed
}

/// Flatten one unit, returning whether its content changed
pub fn clean_unit(unit: &mut Element) -> bool {
    let already_flat = match unit.children.as_slice() {
        [] | [Node::Text(_)] => true,
        _ => false,
    };
    if already_flat {
        return false;
    }

    let mut flattener = Flattener::default();
    flattener.visit(&unit.children);

    let children = if flattener.found_text {
        vec![Node::Text(flattener.out)]
    } else {
        Vec::new()
    };
    unit.replace_children(children);
    true
}

#[derive(Default)]
struct Flattener {
    out: String,
    found_text: bool,
    /// Set after `<lb break="no"/>` until the next non-blank text
    join_next: bool,
}

impl Flattener {
    fn visit(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Text(text) => self.push_text(text),
                Node::Element(element) => self.visit_element(element),
                Node::Comment(_) | Node::Instruction(_) => {}
            }
        }
    }

    fn visit_element(&mut self, element: &Element) {
        let name = element.local_name();
        if name == "lb" {
            if element.attribute("break") == Some("no") {
                let kept = self.out.trim_end().len();
                self.out.truncate(kept);
                self.join_next = true;
            } else if !self.join_next {
                self.out.push(' ');
            }
            return;
        }
        if DROPPED_ELEMENTS.contains(&name) {
            return;
        }
        if name == "choice" {
            match preferred_reading(element) {
                Some(reading) => self.visit(&reading.children),
                None => self.visit(&element.children),
            }
            return;
        }
        self.visit(&element.children);
    }

    fn push_text(&mut self, text: &str) {
        self.found_text = true;
        let text = if self.join_next { text.trim_start() } else { text };
        if !text.is_empty() {
            self.join_next = false;
        }
        self.out.push_str(text);
    }
}

fn preferred_reading(choice: &Element) -> Option<&Element> {
    CHOICE_READINGS.iter().find_map(|reading| {
        choice
            .child_elements()
            .find(|child| child.local_name() == *reading)
    })
}
