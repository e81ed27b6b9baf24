//! A small owned element tree with resolved namespaces, built on `quick-xml`.

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("invalid XML at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("document has no root element")]
    NoRoot,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Resolved namespace URI, `None` for unqualified elements.
    pub namespace: Option<String>,
    pub local_name: String,
    /// Text directly inside the element, trimmed.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Parses `xml` into its root element. Attributes, comments and
    /// processing instructions are dropped.
    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let (namespace, event) = match reader.read_resolved_event() {
                Ok(resolved) => resolved,
                Err(e) => return Err(syntax_error(&reader, e)),
            };
            match event {
                Event::Start(start) => {
                    stack.push(Element::named(&namespace, start.local_name().as_ref()));
                }
                Event::Empty(start) => {
                    let element = Element::named(&namespace, start.local_name().as_ref());
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    let text = match text.unescape() {
                        Ok(text) => text,
                        Err(e) => return Err(syntax_error(&reader, e)),
                    };
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(text.trim());
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(String::from_utf8_lossy(&data).trim());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.local_name));
        }
        root.ok_or(XmlError::NoRoot)
    }

    fn named(namespace: &ResolveResult, local_name: &[u8]) -> Element {
        let namespace = match namespace {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            _ => None,
        };
        Element {
            namespace,
            local_name: String::from_utf8_lossy(local_name).into_owned(),
            ..Default::default()
        }
    }

    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    /// All elements below this one, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

fn syntax_error(reader: &NsReader<&[u8]>, source: quick_xml::Error) -> XmlError {
    XmlError::Syntax {
        position: reader.buffer_position() as u64,
        source,
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
