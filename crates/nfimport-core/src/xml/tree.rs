//! Minimal owned XML element tree with namespace-tolerant lookups.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::ExtractionError;

/// An element with its resolved namespace, text content and children.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Resolved namespace URI, if bound.
    pub namespace: Option<String>,
    /// Qualified name as written (`ns:tag` or `tag`).
    pub name: String,
    /// Local name without prefix.
    pub local_name: String,
    /// Attributes keyed by local name.
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content (trimmed per text node).
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element.
    pub fn parse(bytes: &[u8]) -> Result<Self, ExtractionError> {
        let mut reader = NsReader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_resolved_event_into(&mut buf) {
                Ok((ns, Event::Start(e))) => stack.push(Self::from_start(ns, &e)?),
                Ok((ns, Event::Empty(e))) => {
                    let element = Self::from_start(ns, &e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok((_, Event::Text(t))) => {
                    let text = t.unescape().map_err(malformed)?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Ok((_, Event::CData(c))) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok((_, Event::End(_))) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => return Err(malformed(e)),
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ExtractionError::MalformedXml("unclosed elements at end of input".into()));
        }
        root.ok_or_else(|| ExtractionError::MalformedXml("document has no root element".into()))
    }

    fn from_start(ns: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Self, ExtractionError> {
        let namespace = match ns {
            ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
            _ => None,
        };

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            local_name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn is_qualified(&self, namespace: &str, local: &str) -> bool {
        self.local_name == local && self.namespace.as_deref() == Some(namespace)
    }

    fn has_suffix(&self, suffix: &str) -> bool {
        self.name.ends_with(suffix)
    }

    /// This element and every descendant, depth first, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First direct child in `namespace` with local name `local`.
    pub fn child_qualified(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is_qualified(namespace, local))
    }

    /// First direct child whose tag ends with `suffix`.
    pub fn child_by_suffix(&self, suffix: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.has_suffix(suffix))
    }

    /// Resolve `path` inside `namespace`: the first segment anywhere in the
    /// tree, the rest as a chain of direct children.
    pub fn find_qualified(&self, namespace: &str, path: &[&str]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        self.descendants()
            .filter(|el| el.is_qualified(namespace, first))
            .find_map(|start| {
                rest.iter()
                    .try_fold(start, |el, seg| el.child_qualified(namespace, seg))
            })
    }

    /// Namespace-agnostic variant of [`find_qualified`](Self::find_qualified)
    /// matching tag-name suffixes.
    pub fn find_by_suffix(&self, path: &[&str]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        self.descendants()
            .filter(|el| el.has_suffix(first))
            .find_map(|start| rest.iter().try_fold(start, |el, seg| el.child_by_suffix(seg)))
    }

    /// Every element in `namespace` named `local`, falling back to a suffix
    /// scan when the qualified search finds nothing.
    pub fn find_all(&self, namespace: &str, local: &str) -> Vec<&XmlElement> {
        let qualified: Vec<_> = self
            .descendants()
            .filter(|el| el.is_qualified(namespace, local))
            .collect();
        if !qualified.is_empty() {
            return qualified;
        }
        self.descendants().filter(|el| el.has_suffix(local)).collect()
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn malformed(err: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::MalformedXml(err.to_string())
}

/// Pre-order iterator over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
