//! A small owned XML tree over `quick-xml` events.
//!
//! Everything the merge does not rewrite is kept as the original event (raw attribute bytes,
//! escaped text, comments, declarations), so an untouched tree serializes back to its source bytes.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::DocxError;

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Element(Element),
    /// Text, CDATA, comments, processing instructions and declarations, as read.
    Other(Event<'static>),
}

#[derive(Clone, Debug)]
pub(crate) struct Element {
    start: BytesStart<'static>,
    pub(crate) children: Vec<Node>,
    /// Written as `<x/>` while it has no children.
    empty: bool,
}

impl Element {
    pub(crate) fn new(name: String) -> Self {
        Self {
            start: BytesStart::new(name),
            children: Vec::new(),
            empty: true,
        }
    }

    pub(crate) fn is(&self, local: &[u8]) -> bool {
        self.start.local_name().as_ref() == local
    }

    /// Qualified name for a sibling element in this element's namespace prefix.
    pub(crate) fn qualified(&self, local: &str) -> String {
        match self.start.name().prefix() {
            Some(prefix) => format!("{}:{local}", String::from_utf8_lossy(prefix.as_ref())),
            None => local.to_string(),
        }
    }

    /// Value of the first attribute with local name `local`.
    pub(crate) fn attr(&self, local: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .with_checks(false)
            .flatten()
            .find(|attr| attr.key.local_name().as_ref() == local)
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    pub(crate) fn push_attribute(&mut self, key: &str, value: &str) {
        self.start.push_attribute((key, value));
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        let escaped = BytesText::from_escaped(partial_escape(text)).into_owned();
        self.children.push(Node::Other(Event::Text(escaped)));
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    /// Concatenated character data of the direct children.
    pub(crate) fn text(&self) -> Result<String, quick_xml::Error> {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Other(Event::Text(t)) => out.push_str(&t.unescape()?),
                Node::Other(Event::CData(c)) => out.push_str(&c.decode()?),
                _ => {}
            }
        }
        Ok(out)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct XmlTree {
    nodes: Vec<Node>,
}

impl XmlTree {
    pub(crate) fn parse(part: &str, xml: &[u8]) -> Result<Self, DocxError> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();

        let mut nodes = Vec::new();
        let mut open: Vec<Element> = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|source| DocxError::Parse {
                    part: part.to_string(),
                    source,
                })?;
            let node = match event {
                Event::Start(e) => {
                    open.push(Element {
                        start: e.into_owned(),
                        children: Vec::new(),
                        empty: false,
                    });
                    buf.clear();
                    continue;
                }
                Event::End(_) => match open.pop() {
                    Some(el) => Node::Element(el),
                    None => {
                        return Err(DocxError::Malformed {
                            part: part.to_string(),
                            message: "unmatched end tag".to_string(),
                        })
                    }
                },
                Event::Empty(e) => Node::Element(Element {
                    start: e.into_owned(),
                    children: Vec::new(),
                    empty: true,
                }),
                Event::Eof => break,
                other => Node::Other(other.into_owned()),
            };
            match open.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
            buf.clear();
        }

        if let Some(el) = open.last() {
            return Err(DocxError::Malformed {
                part: part.to_string(),
                message: format!(
                    "unclosed element <{}>",
                    String::from_utf8_lossy(el.start.name().as_ref())
                ),
            });
        }
        let tree = Self { nodes };
        if tree.root().is_none() {
            return Err(DocxError::Malformed {
                part: part.to_string(),
                message: "no root element".to_string(),
            });
        }
        Ok(tree)
    }

    pub(crate) fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    pub(crate) fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Other(_) => None,
        })
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), DocxError> {
    match node {
        Node::Other(event) => writer.write_event(event.borrow())?,
        Node::Element(el) if el.empty && el.children.is_empty() => {
            writer.write_event(Event::Empty(el.start.borrow()))?
        }
        Node::Element(el) => {
            writer.write_event(Event::Start(el.start.borrow()))?;
            for child in &el.children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(el.start.to_end()))?;
        }
    }
    Ok(())
}
