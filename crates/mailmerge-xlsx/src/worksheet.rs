use std::collections::BTreeMap;

use mailmerge_model::FieldValue;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cell_ref::{parse_a1, parse_row_number, MAX_COL, MAX_ROW};
use crate::date::{parse_iso_datetime, serial_to_datetime, serial_to_time, DateSystem};
use crate::shared_strings::read_text;
use crate::styles::{CellStyles, NumberKind};
use crate::ReadError;

/// Cell values of one worksheet, keyed by 1-based row then 1-based column.
///
/// Only non-empty values are stored; `last_row` still accounts for rows that merely contain
/// empty (e.g. styled) cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetGrid {
    rows: BTreeMap<u32, BTreeMap<u32, FieldValue>>,
    last_row: u32,
}

impl SheetGrid {
    pub fn value(&self, row: u32, col: u32) -> Option<&FieldValue> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    /// Non-empty cells of `row` in column order.
    pub fn row(&self, row: u32) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cells| cells.iter().map(|(col, value)| (*col, value)))
    }

    /// Highest row number that contains a cell, or 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.last_row
    }

    fn set(&mut self, row: u32, col: u32, value: FieldValue) {
        self.last_row = self.last_row.max(row);
        if !value.is_empty() {
            self.rows.entry(row).or_default().insert(col, value);
        }
    }
}

/// Lookup tables a worksheet needs to turn raw `<c>` payloads into values.
pub(crate) struct CellContext<'a> {
    pub(crate) shared_strings: &'a [String],
    pub(crate) styles: &'a CellStyles,
    pub(crate) date_system: DateSystem,
}

pub(crate) fn parse_worksheet(xml: &[u8], ctx: &CellContext<'_>) -> Result<SheetGrid, ReadError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut grid = SheetGrid::default();
    let mut in_sheet_data = false;
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = true,
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = false,

            Event::Start(e) | Event::Empty(e)
                if in_sheet_data && e.local_name().as_ref() == b"row" =>
            {
                current_row = match attr(&e, b"r")? {
                    Some(r) => parse_row_number(&r)?,
                    None if current_row < MAX_ROW => current_row + 1,
                    None => {
                        return Err(ReadError::InvalidCellRef(format!(
                            "row after {MAX_ROW}"
                        )))
                    }
                };
                next_col = 1;
            }

            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                let (row, col) = cell_position(&e, current_row, next_col)?;
                next_col = col + 1;
                grid.set(row, col, FieldValue::Empty);
            }
            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                let (row, col) = cell_position(&e, current_row, next_col)?;
                next_col = col + 1;
                let t = attr(&e, b"t")?;
                let style: u32 = attr(&e, b"s")?
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0);
                let payload = read_cell_payload(&mut reader)?;
                let value = interpret_cell_value(t.as_deref(), payload, style, ctx);
                grid.set(row, col, value);
            }

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

fn cell_position(
    e: &BytesStart<'_>,
    current_row: u32,
    next_col: u32,
) -> Result<(u32, u32), ReadError> {
    match attr(e, b"r")? {
        Some(r) => parse_a1(&r),
        // Producers may omit `r` and rely on document order.
        None if next_col <= MAX_COL => Ok((current_row.max(1), next_col)),
        None => Err(ReadError::InvalidCellRef(format!(
            "column {next_col} of row {current_row}"
        ))),
    }
}

#[derive(Default)]
struct CellPayload {
    value: Option<String>,
    inline: Option<String>,
}

fn read_cell_payload(reader: &mut Reader<&[u8]>) -> Result<CellPayload, ReadError> {
    let mut buf = Vec::new();
    let mut payload = CellPayload::default();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                payload.value = Some(read_text(reader, b"v")?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"is" => {
                payload.inline = Some(read_inline_string(reader)?);
            }
            Event::Start(e) => {
                // Formulas and extensions: the cached `<v>` is what the merge uses.
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => return Err(ReadError::Invalid("unexpected eof in <c>".to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(payload)
}

fn read_inline_string(reader: &mut Reader<&[u8]>) -> Result<String, ReadError> {
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                out.push_str(&read_text(reader, b"t")?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"r" => depth += 1,
            Event::End(e) if e.local_name().as_ref() == b"r" => depth = depth.saturating_sub(1),
            Event::Start(e) => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if depth == 0 && e.local_name().as_ref() == b"is" => break,
            Event::Eof => return Err(ReadError::Invalid("unexpected eof in <is>".to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn interpret_cell_value(
    t: Option<&str>,
    payload: CellPayload,
    style: u32,
    ctx: &CellContext<'_>,
) -> FieldValue {
    let CellPayload { value, inline } = payload;
    match t {
        Some("s") => {
            let idx: usize = value.as_deref().unwrap_or_default().trim().parse().unwrap_or(0);
            match ctx.shared_strings.get(idx) {
                Some(text) => FieldValue::Text(text.clone()),
                None => {
                    log::warn!("shared string index {idx} out of range");
                    FieldValue::Empty
                }
            }
        }
        Some("b") => match value.as_deref().map(str::trim) {
            Some(raw) => FieldValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
            None => FieldValue::Empty,
        },
        Some("inlineStr") => inline.map(FieldValue::Text).unwrap_or(FieldValue::Empty),
        Some("d") => match value {
            Some(raw) => parse_iso_datetime(&raw)
                .map(FieldValue::DateTime)
                .unwrap_or(FieldValue::Text(raw)),
            None => FieldValue::Empty,
        },
        Some("n") | None => match value {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(n) => number_with_style(n, ctx.styles.kind(style), ctx.date_system),
                // Invalid SpreadsheetML, but keep the payload rather than dropping it.
                Err(_) => FieldValue::Text(raw),
            },
            None => FieldValue::Empty,
        },
        // `str` (formula string), `e` (error literal) and unknown types keep their text.
        Some(_) => value.map(FieldValue::Text).unwrap_or(FieldValue::Empty),
    }
}

fn number_with_style(n: f64, kind: NumberKind, date_system: DateSystem) -> FieldValue {
    match kind {
        NumberKind::Plain => FieldValue::Number(n),
        NumberKind::Time if (0.0..1.0).contains(&n) => serial_to_time(n)
            .map(FieldValue::Time)
            .unwrap_or(FieldValue::Number(n)),
        NumberKind::Date | NumberKind::Time => serial_to_datetime(n, date_system)
            .map(FieldValue::DateTime)
            .unwrap_or(FieldValue::Number(n)),
    }
}

pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ReadError> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
