//! Story traversal: which paragraphs a merge visits, and in what order.
//!
//! A story's top-level paragraphs come first, in document order. Then its top-level tables, row by
//! row and cell by cell, each cell's paragraphs in order. Tables nested inside cells are not
//! visited.

use mailmerge_model::FieldMapping;

use crate::paragraph::{paragraph_text, Paragraph};
use crate::replace::{replace_paragraph, RewritePolicy};
use crate::xml::Element;
use crate::DocxError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub paragraphs: usize,
    pub substituted: usize,
}

impl std::ops::AddAssign for WalkStats {
    fn add_assign(&mut self, rhs: Self) {
        self.paragraphs += rhs.paragraphs;
        self.substituted += rhs.substituted;
    }
}

/// Run the replacer over every paragraph of one story container (`w:body`, `w:hdr` or `w:ftr`).
pub(crate) fn walk_story(
    container: &mut Element,
    mapping: &FieldMapping,
    policy: RewritePolicy,
) -> Result<WalkStats, DocxError> {
    let mut stats = WalkStats::default();
    for element in story_paragraphs_mut(container) {
        stats.paragraphs += 1;
        if replace_paragraph(&mut Paragraph::new(element), mapping, policy)? {
            stats.substituted += 1;
        }
    }
    Ok(stats)
}

pub(crate) fn story_texts(container: &Element) -> Result<Vec<String>, DocxError> {
    story_paragraphs(container)
        .into_iter()
        .map(paragraph_text)
        .collect()
}

fn story_paragraphs(container: &Element) -> Vec<&Element> {
    let mut paragraphs: Vec<&Element> = container.elements().filter(|el| el.is(b"p")).collect();
    for table in container.elements().filter(|el| el.is(b"tbl")) {
        for row in table.elements().filter(|el| el.is(b"tr")) {
            for cell in row.elements().filter(|el| el.is(b"tc")) {
                paragraphs.extend(cell.elements().filter(|el| el.is(b"p")));
            }
        }
    }
    paragraphs
}

fn story_paragraphs_mut(container: &mut Element) -> Vec<&mut Element> {
    let mut paragraphs = Vec::new();
    let mut tables = Vec::new();
    for el in container.elements_mut() {
        if el.is(b"p") {
            paragraphs.push(el);
        } else if el.is(b"tbl") {
            tables.push(el);
        }
    }
    for table in tables {
        for row in table.elements_mut().filter(|el| el.is(b"tr")) {
            for cell in row.elements_mut().filter(|el| el.is(b"tc")) {
                paragraphs.extend(cell.elements_mut().filter(|el| el.is(b"p")));
            }
        }
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlTree;
    use pretty_assertions::assert_eq;

    fn p(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    fn cell(inner: &str) -> String {
        format!("<w:tc><w:tcPr/>{inner}</w:tc>")
    }

    fn body_tree() -> XmlTree {
        let nested = format!("<w:tbl><w:tr>{}</w:tr></w:tbl>", cell(&p("nested {Name}")));
        let table = format!(
            "<w:tbl><w:tblPr/><w:tr>{}{}</w:tr><w:tr>{}</w:tr></w:tbl>",
            cell(&p("r1c1 {Name}")),
            cell(&format!("{}{}", p("r1c2 a"), p("r1c2 b"))),
            cell(&format!("{}{nested}", p("r2c1"))),
        );
        let xml = format!(
            r#"<w:body xmlns:w="urn:w">{}{table}{}<w:p/><w:sectPr/></w:body>"#,
            p("first {Name}"),
            p("after table"),
        );
        XmlTree::parse("word/document.xml", xml.as_bytes()).unwrap()
    }

    #[test]
    fn paragraphs_come_before_tables_and_nested_tables_are_skipped() {
        let tree = body_tree();
        assert_eq!(
            story_texts(tree.root().unwrap()).unwrap(),
            vec![
                "first {Name}",
                "after table",
                "",
                "r1c1 {Name}",
                "r1c2 a",
                "r1c2 b",
                "r2c1",
            ]
        );
    }

    #[test]
    fn walk_counts_visited_and_substituted_paragraphs() {
        let mut tree = body_tree();
        let mapping: FieldMapping = [("Name", "Ann")].into_iter().collect();
        let stats = walk_story(tree.root_mut().unwrap(), &mapping, RewritePolicy::default()).unwrap();
        assert_eq!(
            stats,
            WalkStats {
                paragraphs: 7,
                substituted: 2
            }
        );

        let xml = String::from_utf8(tree.to_bytes().unwrap()).unwrap();
        assert!(xml.contains("first Ann"));
        assert!(xml.contains("r1c1 Ann"));
        assert!(xml.contains("nested {Name}"));
    }
}
