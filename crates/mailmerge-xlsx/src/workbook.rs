use std::path::Path;

use mailmerge_opc::{resolve_target, Package};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::date::DateSystem;
use crate::records::{ReaderOptions, Records};
use crate::shared_strings::parse_shared_strings;
use crate::styles::{parse_styles, CellStyles};
use crate::worksheet::{attr, parse_worksheet, CellContext, SheetGrid};
use crate::ReadError;

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// A worksheet listed in `xl/workbook.xml`, in tab order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    /// Resolved worksheet part name, e.g. `xl/worksheets/sheet1.xml`.
    pub part: String,
}

/// An opened XLSX workbook.
///
/// Opening reads the workbook, relationship, shared string and style parts; worksheets are
/// parsed on demand, one at a time, while records are pulled.
#[derive(Debug)]
pub struct Workbook {
    package: Package,
    sheets: Vec<SheetInfo>,
    shared_strings: Vec<String>,
    styles: CellStyles,
    date_system: DateSystem,
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReadError> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self, ReadError> {
        let workbook_part = package
            .related_parts("", "officeDocument")?
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());
        let workbook_xml = package.require_part(&workbook_part)?;
        let rels = package.relationships(&workbook_part)?;

        let (entries, date_system) = parse_workbook_xml(workbook_xml)?;
        let mut sheets = Vec::with_capacity(entries.len());
        for (name, rel_id) in entries {
            let Some(rel) = rels.iter().find(|rel| rel.id == rel_id) else {
                return Err(ReadError::Invalid(format!(
                    "sheet {name:?} references missing relationship {rel_id}"
                )));
            };
            if !rel.has_kind("worksheet") {
                log::debug!("skipping non-worksheet sheet {name:?} ({})", rel.type_uri);
                continue;
            }
            sheets.push(SheetInfo {
                name,
                part: resolve_target(&workbook_part, &rel.target),
            });
        }

        let shared_strings = match package
            .related_parts(&workbook_part, "sharedStrings")?
            .first()
            .and_then(|part| package.part(part))
        {
            Some(xml) => parse_shared_strings(xml)?,
            None => Vec::new(),
        };
        let styles = match package
            .related_parts(&workbook_part, "styles")?
            .first()
            .and_then(|part| package.part(part))
        {
            Some(xml) => parse_styles(xml)?,
            None => CellStyles::default(),
        };

        Ok(Self {
            package,
            sheets,
            shared_strings,
            styles,
            date_system,
        })
    }

    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Parse the worksheet at `index` (tab order).
    pub fn read_sheet(&self, index: usize) -> Result<SheetGrid, ReadError> {
        let sheet = self
            .sheets
            .get(index)
            .ok_or_else(|| ReadError::Invalid(format!("sheet index {index} out of range")))?;
        let xml = self.package.require_part(&sheet.part)?;
        let ctx = CellContext {
            shared_strings: &self.shared_strings,
            styles: &self.styles,
            date_system: self.date_system,
        };
        parse_worksheet(xml, &ctx)
    }

    /// Lazily yield the qualifying records of every sheet.
    pub fn records(&self, options: ReaderOptions) -> Records<'_> {
        Records::new(self, options)
    }
}

/// `(sheet name, relationship id)` pairs in tab order, plus the date system.
fn parse_workbook_xml(xml: &[u8]) -> Result<(Vec<(String, String)>, DateSystem), ReadError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut sheets = Vec::new();
    let mut date_system = DateSystem::Excel1900;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"workbookPr" => {
                if let Some(val) = attr(&e, b"date1904")? {
                    if val == "1" || val.eq_ignore_ascii_case("true") {
                        date_system = DateSystem::Excel1904;
                    }
                }
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(&e, b"name")?
                    .ok_or_else(|| ReadError::Invalid("<sheet> without name".to_string()))?;
                // `r:id`; the local name is `id`, distinct from `sheetId`.
                let rel_id = attr(&e, b"id")?.ok_or_else(|| {
                    ReadError::Invalid(format!("sheet {name:?} has no relationship id"))
                })?;
                sheets.push((name, rel_id));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date_system))
}
