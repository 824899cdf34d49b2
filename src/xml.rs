//! Minimal namespace-aware element tree over quick-xml.
//!
//! Container and package documents are tiny, so they are read into an owned
//! tree of elements and attributes; text content is not retained. quick-xml
//! never processes DTDs or external entities, so `<!DOCTYPE>` declarations are
//! skipped rather than expanded.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// Malformed XML input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct XmlError(String);

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct XmlElement {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub(crate) fn local_name(&self) -> &str {
        &self.local_name
    }

    pub(crate) fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `true` when this element is `local_name` bound to `namespace`.
    pub(crate) fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace() == Some(namespace) && self.local_name == local_name
    }

    /// Attribute value by qualified name as written (e.g. `full-path`, `xml:lang`).
    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child matching `namespace` and `local_name`.
    pub(crate) fn child(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find(|child| child.is(namespace, local_name))
    }

    /// Direct children matching `namespace` and `local_name`, in document order.
    pub(crate) fn children_named<'a, 'n>(
        &'a self,
        namespace: &'n str,
        local_name: &'n str,
    ) -> impl Iterator<Item = &'a XmlElement> + use<'a, 'n> {
        self.children
            .iter()
            .filter(move |child| child.is(namespace, local_name))
    }
}

/// Maximum element nesting kept in the tree; deeper documents are rejected.
pub(crate) const MAX_DEPTH: usize = 256;

/// Parse `content` into its root element.
///
/// Returns `Ok(None)` for a well-formed document without any element, and an
/// error for documents nested deeper than [`MAX_DEPTH`].
pub(crate) fn parse_document(content: &[u8]) -> Result<Option<XmlElement>, XmlError> {
    let mut reader = NsReader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (namespace, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, event)) => (owned_namespace(&ns), event),
            Err(e) => return Err(XmlError(format!("XML parse error: {:?}", e))),
        };

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError(format!(
                        "elements nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                }
                let element = read_element(&reader, &e, namespace)?;
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError("multiple root elements".to_string()));
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = read_element(&reader, &e, namespace)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError(format!(
            "unexpected end of document inside <{}>",
            stack[stack.len() - 1].local_name
        )));
    }
    Ok(root)
}

fn owned_namespace(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError("multiple root elements".to_string()));
    }
    *root = Some(element);
    Ok(())
}

fn read_element(
    reader: &NsReader<&[u8]>,
    e: &BytesStart<'_>,
    namespace: Option<String>,
) -> Result<XmlElement, XmlError> {
    let local_name = reader
        .decoder()
        .decode(e.local_name().as_ref())
        .map_err(|e| XmlError(format!("decode error: {:?}", e)))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlError(format!("attr error: {:?}", e)))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| XmlError(format!("decode error: {:?}", e)))?
            .to_string();
        let raw = reader
            .decoder()
            .decode(&attr.value)
            .map_err(|e| XmlError(format!("decode error: {:?}", e)))?;
        let value = unescape(&raw)
            .map_err(|e| XmlError(format!("escape error: {:?}", e)))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        namespace,
        local_name,
        attributes,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:example";

    #[test]
    fn test_builds_tree_with_namespaces() {
        let doc = br#"<?xml version="1.0"?>
<a xmlns="urn:example" x="1"><b/><c><b y="&amp;"/></c><b/></a>"#;
        let root = parse_document(doc).unwrap().unwrap();
        assert!(root.is(NS, "a"));
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.children_named(NS, "b").count(), 2);
        let nested = root.child(NS, "c").unwrap().child(NS, "b").unwrap();
        assert_eq!(nested.attribute("y"), Some("&"));
    }

    #[test]
    fn test_prefixed_and_unbound_elements() {
        let doc = br#"<p:a xmlns:p="urn:example"><b/></p:a>"#;
        let root = parse_document(doc).unwrap().unwrap();
        assert!(root.is(NS, "a"));
        assert_eq!(root.children_named(NS, "b").count(), 0);
        assert_eq!(root.children[0].namespace(), None);
    }

    #[test]
    fn test_doctype_is_not_processed() {
        let doc = br#"<!DOCTYPE a SYSTEM "http://example.invalid/a.dtd"><a/>"#;
        let root = parse_document(doc).unwrap().unwrap();
        assert_eq!(root.local_name(), "a");
    }

    #[test]
    fn test_empty_document_has_no_root() {
        assert_eq!(parse_document(b"<?xml version=\"1.0\"?>").unwrap(), None);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| {
            let mut doc = "<x>".repeat(depth);
            doc.push_str(&"</x>".repeat(depth));
            doc
        };
        assert!(parse_document(nested(MAX_DEPTH).as_bytes()).is_ok());

        let err = parse_document(nested(60_000).as_bytes()).unwrap_err();
        assert!(err.to_string().contains("nested deeper than 256"));
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(parse_document(b"<a><b></a>").is_err());
        assert!(parse_document(b"<a>").is_err());
        assert!(parse_document(b"<a/><b/>").is_err());
    }
}
