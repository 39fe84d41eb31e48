/*!
 * Owned XML tree for TEI documents.
 *
 * Documents are parsed with quick-xml into a tree of `Element`s that own
 * their children. Whitespace-only text is dropped from element-only
 * content so that the serializer can re-indent the tree; mixed content is
 * kept verbatim and written inline.
 */

use std::borrow::Cow;
use std::fmt::Write as _;

use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::Reader;

use crate::errors::DocumentError;

/// XML declaration written at the top of every serialized document
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Indentation unit for element-only content
const INDENT: &str = "  ";

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Child element
    Element(Element),
    /// Character data (unescaped)
    Text(String),
    /// Comment body, without the delimiters
    Comment(String),
    /// Processing instruction body, without the delimiters
    Instruction(String),
}

impl Node {
    /// Borrow the element if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutably borrow the element if this node is one
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An XML element with its attributes in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Qualified name as written in the source (`p`, `tei:p`, ...)
    pub name: String,
    /// Attributes as (qualified name, unescaped value)
    pub attributes: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder: add a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Builder: add an element child
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Look up an attribute by qualified name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Iterate mutably over child elements
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// Concatenated text of all descendant text nodes.
    ///
    /// Returns `None` when the element holds no text node at all, which is
    /// different from holding an empty or whitespace-only string.
    pub fn text_content(&self) -> Option<String> {
        let mut text = String::new();
        let mut found = false;
        self.append_text(&mut text, &mut found);
        found.then_some(text)
    }

    fn append_text(&self, out: &mut String, found: &mut bool) {
        for child in &self.children {
            match child {
                Node::Text(text) => {
                    *found = true;
                    out.push_str(text);
                }
                Node::Element(element) => element.append_text(out, found),
                Node::Comment(_) | Node::Instruction(_) => {}
            }
        }
    }

    /// Replace all children at once and return the previous ones
    pub fn replace_children(&mut self, children: Vec<Node>) -> Vec<Node> {
        std::mem::replace(&mut self.children, children)
    }

    /// Mutable access to the element text, collapsing the content into a
    /// single text node first when needed
    pub fn text_mut(&mut self) -> &mut String {
        if !matches!(self.children.as_slice(), [Node::Text(_)]) {
            let text = self.text_content().unwrap_or_default();
            self.children = vec![Node::Text(text)];
        }
        match self.children.first_mut() {
            Some(Node::Text(text)) => text,
            _ => unreachable!("content was collapsed into one text node"),
        }
    }

    /// Collect all descendants-or-self with the given local name, in
    /// document order. Matching elements are not searched further.
    pub fn collect_named_mut<'a>(&'a mut self, local_name: &str, out: &mut Vec<&'a mut Element>) {
        if self.local_name() == local_name {
            out.push(self);
            return;
        }
        for child in self.children.iter_mut() {
            if let Node::Element(element) = child {
                element.collect_named_mut(local_name, out);
            }
        }
    }

    /// Count descendants-or-self with the given local name
    pub fn count_named(&self, local_name: &str) -> usize {
        let own = usize::from(self.local_name() == local_name);
        own + self
            .child_elements()
            .map(|child| child.count_named(local_name))
            .sum::<usize>()
    }

    fn has_text_child(&self) -> bool {
        self.children.iter().any(|child| matches!(child, Node::Text(_)))
    }

    /// Drop whitespace-only text children used as indentation between child nodes.
    /// A lone blank text (`<hi> </hi>`) is content and stays.
    fn prune_blank_text(&mut self) {
        let has_real_text = self.children.iter().any(|child| match child {
            Node::Text(text) => !text.trim().is_empty(),
            _ => false,
        });
        let has_nodes = self.children.iter().any(|child| !matches!(child, Node::Text(_)));
        if !has_real_text && has_nodes {
            self.children.retain(|child| !matches!(child, Node::Text(_)));
        }
    }
}

/// Strip a namespace prefix from a qualified name
pub fn local_part(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Raw markup before the root element (doctype, comments, PIs)
    pub prolog: Vec<String>,
    /// Root element
    pub root: Element,
    /// Raw markup after the root element
    pub epilog: Vec<String>,
}

impl Document {
    /// Wrap a root element into a document without prolog
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse a document from a string
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader.read_event().map_err(|e| DocumentError::Parse {
                position,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start, position)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, position)?;
                    attach(Node::Element(element), &mut stack, &mut root);
                }
                Event::End(end) => {
                    let name = decode(end.name().as_ref()).into_owned();
                    let mut element = stack.pop().ok_or_else(|| DocumentError::MismatchedTag {
                        expected: String::new(),
                        found: name.clone(),
                    })?;
                    if element.name != name {
                        return Err(DocumentError::MismatchedTag {
                            expected: element.name,
                            found: name,
                        });
                    }
                    element.prune_blank_text();
                    attach(Node::Element(element), &mut stack, &mut root);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| DocumentError::Parse {
                        position,
                        message: e.to_string(),
                    })?;
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, &text);
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, &decode(&data.into_inner()));
                    }
                }
                Event::Comment(comment) => {
                    let body = decode(&comment).into_owned();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Comment(body)),
                        None => outside_root(&root, &mut prolog, &mut epilog, format!("<!--{}-->", body)),
                    }
                }
                Event::PI(instruction) => {
                    let body = decode(&instruction).into_owned();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Instruction(body)),
                        None => outside_root(&root, &mut prolog, &mut epilog, format!("<?{}?>", body)),
                    }
                }
                Event::DocType(doctype) => {
                    prolog.push(format!("<!DOCTYPE {}>", decode(&doctype).trim()));
                }
                // The declaration is rewritten on output
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Parse {
                position: reader.buffer_position() as u64,
                message: format!("unclosed element <{}>", open.name),
            });
        }

        let root = root.ok_or(DocumentError::MissingRoot)?;
        Ok(Self { prolog, root, epilog })
    }

    /// Serialize the document with indentation for element-only content
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        for markup in &self.prolog {
            out.push_str(markup);
            out.push('\n');
        }
        write_element(&mut out, &self.root, 0, true);
        out.push('\n');
        for markup in &self.epilog {
            out.push_str(markup);
            out.push('\n');
        }
        out
    }
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> Result<Element, DocumentError> {
    let mut element = Element::new(decode(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| DocumentError::Parse {
            position,
            message: e.to_string(),
        })?;
        let key = decode(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| DocumentError::Parse {
            position,
            message: e.to_string(),
        })?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(node: Node, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if let Node::Element(element) = node {
                *root = Some(element);
            }
        }
    }
}

fn push_text(parent: &mut Element, text: &str) {
    // Adjacent text and CDATA sections merge into one node
    if let Some(Node::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}

fn outside_root(root: &Option<Element>, prolog: &mut Vec<String>, epilog: &mut Vec<String>, markup: String) {
    if root.is_some() {
        epilog.push(markup);
    } else {
        prolog.push(markup);
    }
}

fn write_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_start_tag(out: &mut String, element: &Element, self_closing: bool) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        let _ = write!(out, " {}=\"{}\"", key, escape(value.as_str()));
    }
    out.push_str(if self_closing { "/>" } else { ">" });
}

fn write_element(out: &mut String, element: &Element, depth: usize, pretty: bool) {
    if element.children.is_empty() {
        write_start_tag(out, element, true);
        return;
    }

    write_start_tag(out, element, false);

    // Mixed content is written inline so no whitespace is added to the text
    let indent_children = pretty && !element.has_text_child();
    for child in &element.children {
        if indent_children {
            out.push('\n');
            write_indent(out, depth + 1);
        }
        match child {
            Node::Element(child) => write_element(out, child, depth + 1, indent_children),
            Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
            Node::Comment(body) => {
                let _ = write!(out, "<!--{}-->", body);
            }
            Node::Instruction(body) => {
                let _ = write!(out, "<?{}?>", body);
            }
        }
    }
    if indent_children {
        out.push('\n');
        write_indent(out, depth);
    }

    let _ = write!(out, "</{}>", element.name);
}
