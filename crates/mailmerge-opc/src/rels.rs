use roxmltree::Document;

use crate::OpcError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub type_uri: String,
    pub target: String,
    pub target_mode: Option<String>,
}

impl Relationship {
    /// External targets are URIs, not part names.
    pub fn is_external(&self) -> bool {
        self.target_mode
            .as_deref()
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("External"))
    }

    /// Whether the relationship type ends with `/{kind}` (e.g. `worksheet`, `header`).
    ///
    /// Strict OOXML uses a different namespace prefix than transitional, so types are compared
    /// by their last path segment.
    pub fn has_kind(&self, kind: &str) -> bool {
        self.type_uri
            .rsplit_once('/')
            .is_some_and(|(_, last)| last == kind)
    }
}

pub fn parse_relationships(xml: &[u8], part_name: &str) -> Result<Vec<Relationship>, OpcError> {
    let xml = std::str::from_utf8(xml).map_err(|source| OpcError::Utf8 {
        part: part_name.to_string(),
        source,
    })?;
    let doc = Document::parse(xml).map_err(|source| OpcError::Xml {
        part: part_name.to_string(),
        source,
    })?;

    let mut rels = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.tag_name().name() != "Relationship" {
            continue;
        }

        let Some(id) = node.attribute("Id") else {
            log::warn!("{part_name}: ignoring relationship without an Id");
            continue;
        };
        rels.push(Relationship {
            id: id.to_string(),
            type_uri: node.attribute("Type").unwrap_or_default().to_string(),
            target: node.attribute("Target").unwrap_or_default().to_string(),
            target_mode: node.attribute("TargetMode").map(str::to_string),
        });
    }

    Ok(rels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
  <Relationship Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    #[test]
    fn parses_relationships_and_skips_ones_without_id() {
        let rels = parse_relationships(RELS.as_bytes(), "xl/_rels/workbook.xml.rels").unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].id, "rId1");
        assert!(rels[0].has_kind("worksheet"));
        assert!(!rels[0].is_external());
        assert!(rels[1].is_external());
    }

    #[test]
    fn malformed_xml_names_the_part() {
        let err = parse_relationships(b"<Relationships>", "word/_rels/document.xml.rels")
            .unwrap_err();
        assert!(err.to_string().contains("word/_rels/document.xml.rels"));
    }
}
