//! Owned XML element tree built from quick-xml events.
//!
//! Lookups use a small path syntax modelled on ElementTree: `a/b` walks
//! children, a leading `.//` (or `//` anywhere) switches the next step to the
//! descendant axis, and `prefix:name` resolves `prefix` through the
//! [`Namespaces`] passed to the lookup. Unprefixed steps only match elements
//! without a namespace.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::errors::ParseError;
use super::text::{non_empty, normalize_whitespace};

pub const AKN_NAMESPACE: &str = "http://docs.oasis-open.org/legaldocml/ns/akn/3.0";
pub const FMX_NAMESPACE: &str = "http://formex.publications.europa.eu/schema/formex-05.56-20160701.xd";

/// Prefix to namespace URI mapping used to resolve lookup paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces(BTreeMap<String, String>);

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: &str, uri: &str) -> Self {
        self.0.insert(prefix.to_string(), uri.to_string());
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    pub fn formex() -> Self {
        Self::new().with("fmx", FMX_NAMESPACE)
    }

    pub fn akoma_ntoso() -> Self {
        Self::new().with("akn", AKN_NAMESPACE).with("fmx", FMX_NAMESPACE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub namespace: Option<String>,
    pub name: String,
    /// Attributes keyed by their name as written (`eId`, `xml:lang`)
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Read and parse an XML file.
pub fn load(path: &Path) -> Result<Element, ParseError> {
    let bytes = std::fs::read(path)?;
    let source = String::from_utf8(bytes)?;
    parse_str(&source)
}

/// Parse an XML document and return its root element.
pub fn parse_str(source: &str) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_str(source);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(start)) => {
                let element = open_element(ns, &start)?;
                stack.push(element);
            }
            (ns, Event::Empty(start)) => {
                let element = open_element(ns, &start)?;
                attach(&mut stack, &mut root, element);
            }
            (_, Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            (_, Event::Text(text)) => {
                if let Some(parent) = stack.last_mut() {
                    let content = match text.unescape() {
                        Ok(content) => content.into_owned(),
                        Err(e) => {
                            debug!("Keeping raw text after unescape failure: {}", e);
                            String::from_utf8_lossy(&text).into_owned()
                        }
                    };
                    parent.children.push(Node::Text(content));
                }
            }
            (_, Event::CData(cdata)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(String::from_utf8_lossy(&cdata).into_owned()));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(ParseError::UnclosedElement(unclosed.name));
    }

    root.ok_or(ParseError::EmptyDocument)
}

fn open_element(ns: ResolveResult, start: &BytesStart) -> Result<Element, ParseError> {
    let namespace = match ns {
        ResolveResult::Bound(namespace) => Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
        _ => None,
    };
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        namespace,
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

#[derive(Debug)]
struct Step {
    descendant: bool,
    namespace: Option<String>,
    name: String,
}

fn compile(path: &str, namespaces: &Namespaces) -> Vec<Step> {
    let path = path.strip_prefix('.').unwrap_or(path);
    let mut steps = Vec::new();
    let mut descendant = false;

    for token in path.split('/') {
        if token.is_empty() {
            descendant = true;
            continue;
        }
        let (namespace, name) = match token.split_once(':') {
            Some((prefix, name)) => {
                let uri = namespaces
                    .resolve(prefix)
                    .map(str::to_string)
                    // never matches a real element
                    .unwrap_or_else(|| format!("unresolved:{}", prefix));
                (Some(uri), name.to_string())
            }
            None => (None, token.to_string()),
        };
        steps.push(Step { descendant, namespace, name });
        descendant = false;
    }

    steps
}

impl Step {
    fn matches(&self, element: &Element) -> bool {
        element.name == self.name && element.namespace == self.namespace
    }
}

impl Element {
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.child_elements().collect::<Vec<_>>().into_iter().rev().collect(),
        }
    }

    /// Descendants matching `predicate` in document order. Subtrees whose
    /// root satisfies `skip` are not entered.
    pub fn descendants_outside<P, S>(&self, predicate: P, skip: S) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
        S: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        collect_outside(self, &predicate, &skip, &mut found);
        found
    }

    pub fn find_all(&self, path: &str, namespaces: &Namespaces) -> Vec<&Element> {
        let mut current: Vec<&Element> = vec![self];

        for step in compile(path, namespaces) {
            let mut next: Vec<&Element> = Vec::new();
            for element in current {
                let candidates: Vec<&Element> = if step.descendant {
                    element.descendants().filter(|e| step.matches(e)).collect()
                } else {
                    element.child_elements().filter(|e| step.matches(e)).collect()
                };
                for candidate in candidates {
                    if !next.iter().any(|seen| std::ptr::eq(*seen, candidate)) {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }

        current
    }

    pub fn find(&self, path: &str, namespaces: &Namespaces) -> Option<&Element> {
        self.find_all(path, namespaces).into_iter().next()
    }

    /// Normalized text of the first match, `None` when missing or blank.
    pub fn find_text(&self, path: &str, namespaces: &Namespaces) -> Option<String> {
        self.find(path, namespaces)
            .and_then(|element| non_empty(element.normalized_text()))
    }

    /// Concatenation of every descendant text node in document order.
    pub fn text(&self) -> String {
        self.text_excluding(|_| false)
    }

    /// Like [`Element::text`] but skipping whole subtrees for which `skip` is true.
    pub fn text_excluding<F>(&self, skip: F) -> String
    where
        F: Fn(&Element) -> bool,
    {
        let mut out = String::new();
        collect_text(self, &skip, &mut out);
        out
    }

    pub fn normalized_text(&self) -> String {
        normalize_whitespace(&self.text())
    }

    /// Remove every descendant element matching `predicate`. Text that
    /// followed a removed element stays in place.
    pub fn remove_elements<F>(&mut self, predicate: &F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(element) => !predicate(element),
            Node::Text(_) => true,
        });
        let mut removed = before - self.children.len();

        for node in self.children.iter_mut() {
            if let Node::Element(element) = node {
                removed += element.remove_elements(predicate);
            }
        }

        removed
    }
}

fn collect_text<F>(element: &Element, skip: &F, out: &mut String)
where
    F: Fn(&Element) -> bool,
{
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => {
                if !skip(child) {
                    collect_text(child, skip, out);
                }
            }
        }
    }
}

fn collect_outside<'a, P, S>(element: &'a Element, predicate: &P, skip: &S, found: &mut Vec<&'a Element>)
where
    P: Fn(&Element) -> bool,
    S: Fn(&Element) -> bool,
{
    for child in element.child_elements() {
        if skip(child) {
            continue;
        }
        if predicate(child) {
            found.push(child);
        }
        collect_outside(child, predicate, skip, found);
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        let children: Vec<&Element> = element.child_elements().collect();
        self.stack.extend(children.into_iter().rev());
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<akomaNtoso xmlns="http://docs.oasis-open.org/legaldocml/ns/akn/3.0"
            xmlns:fmx="http://formex.publications.europa.eu/schema/formex-05.56-20160701.xd">
  <act>
    <meta>
      <proprietary><fmx:DOCUMENT.REF FILE="L_1.doc.xml"><fmx:COLL>L</fmx:COLL></fmx:DOCUMENT.REF></proprietary>
    </meta>
    <preamble>
      <recitals>
        <recital eId="rec_1"><p>First<authorialNote><p>OJ C 1</p></authorialNote>, then &amp; more</p></recital>
        <recital eId="rec_2"><p><![CDATA[Second]]></p></recital>
      </recitals>
    </preamble>
  </act>
</akomaNtoso>"#;

    #[test]
    fn test_parse_resolves_namespaces() {
        let root = parse_str(SAMPLE).unwrap();
        assert!(root.is(Some(AKN_NAMESPACE), "akomaNtoso"));

        let ns = Namespaces::akoma_ntoso();
        let reference = root.find(".//akn:proprietary/fmx:DOCUMENT.REF", &ns).unwrap();
        assert_eq!(reference.attr("FILE"), Some("L_1.doc.xml"));
        assert_eq!(reference.find_text("fmx:COLL", &ns).as_deref(), Some("L"));
    }

    #[test]
    fn test_unprefixed_steps_only_match_no_namespace() {
        let root = parse_str(SAMPLE).unwrap();
        let ns = Namespaces::akoma_ntoso();
        assert!(root.find(".//recital", &ns).is_none());
        assert_eq!(root.find_all(".//akn:recital", &ns).len(), 2);
    }

    #[test]
    fn test_child_and_descendant_axes() {
        let root = parse_str("<a><b><c>1</c></b><c>2</c></a>").unwrap();
        let ns = Namespaces::new();
        assert_eq!(root.find_all("c", &ns).len(), 1);
        assert_eq!(root.find_all(".//c", &ns).len(), 2);
        assert_eq!(root.find_text("b/c", &ns).as_deref(), Some("1"));
        assert!(root.find("missing/c", &ns).is_none());
    }

    #[test]
    fn test_text_unescapes_entities_and_cdata() {
        let root = parse_str(SAMPLE).unwrap();
        let ns = Namespaces::akoma_ntoso();
        let recitals = root.find_all(".//akn:recital", &ns);
        assert_eq!(recitals[0].normalized_text(), "FirstOJ C 1, then & more");
        assert_eq!(recitals[1].normalized_text(), "Second");
    }

    #[test]
    fn test_remove_elements_preserves_following_text() {
        let mut root = parse_str(SAMPLE).unwrap();
        let removed = root.remove_elements(&|e: &Element| e.is(Some(AKN_NAMESPACE), "authorialNote"));
        assert_eq!(removed, 1);

        let ns = Namespaces::akoma_ntoso();
        let recital = root.find(".//akn:recital", &ns).unwrap();
        assert_eq!(recital.normalized_text(), "First, then & more");
    }

    #[test]
    fn test_text_excluding_leaves_tree_untouched() {
        let root = parse_str("<p>Text<NOTE>note</NOTE> tail</p>").unwrap();
        assert_eq!(root.text_excluding(|e| e.name == "NOTE"), "Text tail");
        assert_eq!(root.text(), "Textnote tail");
    }

    #[test]
    fn test_descendants_outside_skips_subtrees() {
        let root = parse_str("<a><c id=\"1\"/><q><c id=\"2\"/></q><b><c id=\"3\"/></b></a>").unwrap();
        let ids: Vec<&str> = root
            .descendants_outside(|e| e.name == "c", |e| e.name == "q")
            .into_iter()
            .filter_map(|e| e.attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = parse_str("<a><b><c/></b><d/></a>").unwrap();
        let names: Vec<&str> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(parse_str("<a><b></a>").is_err());
        assert!(matches!(parse_str("<a><b>"), Err(ParseError::UnclosedElement(_))));
        assert!(matches!(parse_str("just text"), Err(ParseError::EmptyDocument)));
    }
}
