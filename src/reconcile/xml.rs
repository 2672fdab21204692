//! Structural Diff Suppressor
//!
//! Decides whether two XML documents are the same configuration even when
//! attribute order, indentation or namespace prefixes differ.

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::escape::escape;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),
    #[error("invalid document: {0}")]
    Structure(String),
}

/// Namespace URI plus local name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ExpandedName {
    namespace: Option<String>,
    local: String,
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, PartialEq, Eq)]
struct Element {
    name: ExpandedName,
    attributes: BTreeMap<ExpandedName, String>,
    children: Vec<Node>,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, escape(value.as_str()))?;
        }
        if self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in &self.children {
            match child {
                Node::Element(el) => write!(f, "{}", el)?,
                Node::Text(text) => f.write_str(&escape(text.as_str()))?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

/// True when `a` and `b` parse to the same canonical document.
///
/// Unparseable input on either side counts as a difference.
pub fn equivalent(a: &str, b: &str) -> bool {
    let old = match parse(a) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("Cannot canonicalize old XML: {}", e);
            return false;
        }
    };
    let new = match parse(b) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("Cannot canonicalize new XML: {}", e);
            return false;
        }
    };
    old == new
}

/// Render the canonical form of a document
pub fn canonicalize(input: &str) -> Result<String, XmlError> {
    Ok(parse(input)?.to_string())
}

fn parse(input: &str) -> Result<Element, XmlError> {
    let mut reader = NsReader::from_str(input);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let namespace = resolved_namespace(ns)?;
        match event {
            Event::Start(e) => {
                close_text_run(&mut stack);
                let el = start_element(&reader, namespace, &e)?;
                stack.push(el);
            }
            Event::Empty(e) => {
                close_text_run(&mut stack);
                let el = start_element(&reader, namespace, &e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                close_text_run(&mut stack);
                let el = stack
                    .pop()
                    .ok_or_else(|| XmlError::Structure("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(t) => push_text(&mut stack, &t.unescape()?)?,
            Event::CData(c) => {
                let text = String::from_utf8(c.into_inner().into_owned())
                    .map_err(|e| XmlError::Structure(e.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Structure(format!("unclosed element {}", open.name)));
    }
    root.ok_or_else(|| XmlError::Structure("no root element".to_string()))
}

fn resolved_namespace(ns: ResolveResult<'_>) -> Result<Option<String>, XmlError> {
    match ns {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(XmlError::Structure(format!(
            "unbound namespace prefix {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn start_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element, XmlError> {
    let name = ExpandedName {
        namespace,
        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
    };

    let mut attributes = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let attr_name = ExpandedName {
            namespace: resolved_namespace(ns)?,
            local: String::from_utf8_lossy(local.as_ref()).into_owned(),
        };
        attributes.insert(attr_name, attr.unescape_value()?.into_owned());
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(el));
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::Structure("multiple root elements".to_string()));
    }
    *root = Some(el);
    Ok(())
}

/// Append raw text to the open run. Comments and CDATA sections do not end
/// a run, so the pieces are joined exactly as written.
fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(XmlError::Structure("text outside root element".to_string()));
    };
    match parent.children.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => parent.children.push(Node::Text(text.to_string())),
    }
    Ok(())
}

/// Normalise the run ending at an element boundary: surrounding whitespace
/// is indentation, a whitespace-only run is dropped.
fn close_text_run(stack: &mut [Element]) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(run)) = parent.children.last_mut() {
        let trimmed = run.trim();
        if trimmed.is_empty() {
            parent.children.pop();
        } else if trimmed.len() != run.len() {
            let trimmed = trimmed.to_string();
            *run = trimmed;
        }
    }
}
