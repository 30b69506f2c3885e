use std::io::{Cursor, Seek, Write};
use std::path::Path;

use mailmerge_model::FieldMapping;
use mailmerge_opc::Package;

use crate::replace::RewritePolicy;
use crate::walk::{story_texts, walk_story, WalkStats};
use crate::xml::{Element, XmlTree};
use crate::DocxError;

const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Which stories an instantiated document exposes to the walker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stories {
    /// Only the main document body.
    #[default]
    Body,
    /// The body, then every header and footer the document references.
    BodyAndHeadersFooters,
}

/// A validated DOCX template.
///
/// The package is read once and never mutated; each call to [`TemplatePackage::instantiate`]
/// parses a fresh [`Document`] from the original part bytes.
#[derive(Debug)]
pub struct TemplatePackage {
    package: Package,
    document_part: String,
    header_footer_parts: Vec<String>,
}

impl TemplatePackage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocxError> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Locate the main document part and check that it, and every header and footer it
    /// references, parses.
    pub fn from_package(package: Package) -> Result<Self, DocxError> {
        let document_part = package
            .related_parts("", "officeDocument")?
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string());
        validate_story(&document_part, package.require_part(&document_part)?)?;

        let mut header_footer_parts = Vec::new();
        for kind in ["header", "footer"] {
            for part in package.related_parts(&document_part, kind)? {
                let Some(bytes) = package.part(&part) else {
                    log::warn!("{document_part} references missing {kind} part {part}");
                    continue;
                };
                if header_footer_parts.contains(&part) {
                    continue;
                }
                validate_story(&part, bytes)?;
                header_footer_parts.push(part);
            }
        }

        Ok(Self {
            package,
            document_part,
            header_footer_parts,
        })
    }

    /// Name of the main document part, e.g. `word/document.xml`.
    pub fn document_part(&self) -> &str {
        &self.document_part
    }

    pub fn header_footer_parts(&self) -> &[String] {
        &self.header_footer_parts
    }

    /// Parse a fresh, independent copy of the template.
    pub fn instantiate(&self, stories: Stories) -> Result<Document, DocxError> {
        let mut parts = vec![self.document_part.clone()];
        if stories == Stories::BodyAndHeadersFooters {
            parts.extend(self.header_footer_parts.iter().cloned());
        }

        let mut trees = Vec::with_capacity(parts.len());
        for part in parts {
            let tree = XmlTree::parse(&part, self.package.require_part(&part)?)?;
            trees.push(Story { part, tree });
        }
        Ok(Document {
            package: self.package.clone(),
            stories: trees,
        })
    }
}

#[derive(Debug)]
struct Story {
    part: String,
    tree: XmlTree,
}

impl Story {
    fn container(&self) -> Result<&Element, DocxError> {
        self.tree
            .root()
            .and_then(container_of)
            .ok_or_else(|| DocxError::MissingBody {
                part: self.part.clone(),
            })
    }

    fn container_mut(&mut self) -> Result<&mut Element, DocxError> {
        let part = &self.part;
        let root = self
            .tree
            .root_mut()
            .ok_or_else(|| DocxError::MissingBody { part: part.clone() })?;
        if !root.is(b"document") {
            return Ok(root);
        }
        root.elements_mut()
            .find(|el| el.is(b"body"))
            .ok_or_else(|| DocxError::MissingBody { part: part.clone() })
    }
}

/// `w:body` for the main document, the root itself for headers and footers.
fn container_of(root: &Element) -> Option<&Element> {
    if root.is(b"document") {
        root.elements().find(|el| el.is(b"body"))
    } else {
        Some(root)
    }
}

fn validate_story(part: &str, bytes: &[u8]) -> Result<(), DocxError> {
    let tree = XmlTree::parse(part, bytes)?;
    let container = tree
        .root()
        .and_then(container_of)
        .ok_or_else(|| DocxError::MissingBody {
            part: part.to_string(),
        })?;
    // Surfaces bad character references before any record is merged.
    story_texts(container)?;
    Ok(())
}

/// One template instance, owned by a single record.
#[derive(Debug)]
pub struct Document {
    package: Package,
    stories: Vec<Story>,
}

impl Document {
    /// Substitute `mapping` into every paragraph of every story.
    pub fn merge(
        &mut self,
        mapping: &FieldMapping,
        policy: RewritePolicy,
    ) -> Result<WalkStats, DocxError> {
        let mut total = WalkStats::default();
        for story in &mut self.stories {
            let stats = walk_story(story.container_mut()?, mapping, policy)?;
            log::trace!(
                "{}: {} paragraphs, {} substituted",
                story.part,
                stats.paragraphs,
                stats.substituted
            );
            total += stats;
        }
        Ok(total)
    }

    /// Paragraph texts of every story, in walk order.
    pub fn paragraph_texts(&self) -> Result<Vec<String>, DocxError> {
        let mut texts = Vec::new();
        for story in &self.stories {
            texts.extend(story_texts(story.container()?)?);
        }
        Ok(texts)
    }

    /// Serialize the document as a DOCX package. Parts keep the template's entry order.
    pub fn write_to<W: Write + Seek>(mut self, writer: W) -> Result<W, DocxError> {
        for story in &self.stories {
            let bytes = story.tree.to_bytes()?;
            self.package.set_part(&story.part, bytes);
        }
        Ok(self.package.write_to(writer)?)
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, DocxError> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}
