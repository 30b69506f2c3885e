use crate::xml::{Element, Node};
use crate::DocxError;

/// A `w:p` element. Its style runs are the direct `w:r` children; runs nested in hyperlinks,
/// fields or content controls are not part of the paragraph text.
pub struct Paragraph<'a> {
    element: &'a mut Element,
}

impl<'a> Paragraph<'a> {
    pub(crate) fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    pub fn run_count(&self) -> usize {
        self.element.elements().filter(|el| el.is(b"r")).count()
    }

    pub fn run_texts(&self) -> Result<Vec<String>, DocxError> {
        self.element
            .elements()
            .filter(|el| el.is(b"r"))
            .map(|run| Ok(run_text(run)?))
            .collect()
    }

    /// Text of all runs, in document order.
    pub fn text(&self) -> Result<String, DocxError> {
        paragraph_text(self.element)
    }

    pub(crate) fn runs_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.element.elements_mut().filter(|el| el.is(b"r"))
    }
}

pub(crate) fn paragraph_text(paragraph: &Element) -> Result<String, DocxError> {
    let mut out = String::new();
    for run in paragraph.elements().filter(|el| el.is(b"r")) {
        out.push_str(&run_text(run)?);
    }
    Ok(out)
}

pub(crate) fn run_text(run: &Element) -> Result<String, quick_xml::Error> {
    let mut out = String::new();
    for child in run.elements() {
        if child.is(b"t") {
            out.push_str(&child.text()?);
        } else if child.is(b"tab") || child.is(b"ptab") {
            out.push('\t');
        } else if child.is(b"br") {
            // Page and column breaks carry no text.
            if matches!(child.attr(b"type").as_deref(), None | Some("textWrapping")) {
                out.push('\n');
            }
        } else if child.is(b"cr") {
            out.push('\n');
        } else if child.is(b"noBreakHyphen") {
            out.push('-');
        }
    }
    Ok(out)
}

/// Replace the content of a run with `text`, keeping its `w:rPr`.
///
/// `\t` becomes `w:tab`, `\n` and `\r` become `w:br`, everything else goes into `w:t`.
pub(crate) fn set_run_text(run: &mut Element, text: &str) {
    run.children.retain(|node| match node {
        Node::Element(el) => el.is(b"rPr"),
        Node::Other(_) => false,
    });

    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush_text(run, &mut pending);
                let tab = Element::new(run.qualified("tab"));
                run.children.push(Node::Element(tab));
            }
            '\n' | '\r' => {
                flush_text(run, &mut pending);
                let br = Element::new(run.qualified("br"));
                run.children.push(Node::Element(br));
            }
            _ => pending.push(ch),
        }
    }
    flush_text(run, &mut pending);
}

fn flush_text(run: &mut Element, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let mut t = Element::new(run.qualified("t"));
    if pending.trim() != pending.as_str() {
        t.push_attribute("xml:space", "preserve");
    }
    t.push_text(pending);
    run.children.push(Node::Element(t));
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlTree;
    use pretty_assertions::assert_eq;

    fn paragraph_tree(inner: &str) -> XmlTree {
        let xml = format!(
            r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{inner}</w:p>"#
        );
        XmlTree::parse("word/document.xml", xml.as_bytes()).unwrap()
    }

    #[test]
    fn run_text_maps_tabs_and_breaks() {
        let mut tree = paragraph_tree(
            r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:br w:type="page"/><w:cr/></w:r>"#,
        );
        let paragraph = Paragraph::new(tree.root_mut().unwrap());
        assert_eq!(paragraph.text().unwrap(), "a\tb\nc\n");
    }

    #[test]
    fn only_direct_runs_count() {
        let mut tree = paragraph_tree(
            r#"<w:r><w:t>Visit </w:t></w:r><w:hyperlink r:id="rId4" xmlns:r="urn:r"><w:r><w:t>us</w:t></w:r></w:hyperlink><w:bookmarkStart w:id="0"/><w:r><w:t>!</w:t></w:r>"#,
        );
        let paragraph = Paragraph::new(tree.root_mut().unwrap());
        assert_eq!(paragraph.run_count(), 2);
        assert_eq!(paragraph.run_texts().unwrap(), vec!["Visit ", "!"]);
    }

    #[test]
    fn setting_text_keeps_run_properties_and_splits_specials() {
        let mut tree = paragraph_tree(
            r#"<w:r w:rsidR="1"><w:rPr><w:i/></w:rPr><w:t>old</w:t><w:tab/></w:r>"#,
        );
        let run = tree.root_mut().unwrap().elements_mut().next().unwrap();
        set_run_text(run, " Name:\tZoe\nLine 2");
        let xml = String::from_utf8(tree.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(
            r#"<w:r w:rsidR="1"><w:rPr><w:i/></w:rPr><w:t xml:space="preserve"> Name:</w:t><w:tab/><w:t>Zoe</w:t><w:br/><w:t>Line 2</w:t></w:r>"#
        ));
    }

    #[test]
    fn clearing_a_run_leaves_only_its_properties() {
        let mut tree = paragraph_tree(r#"<w:r><w:rPr><w:b/></w:rPr><w:t>x</w:t></w:r>"#);
        let run = tree.root_mut().unwrap().elements_mut().next().unwrap();
        set_run_text(run, "");
        assert_eq!(run_text(run).unwrap(), "");
        let xml = String::from_utf8(tree.to_bytes().unwrap()).unwrap();
        assert!(xml.contains("<w:r><w:rPr><w:b/></w:rPr></w:r>"));
    }
}
