use mailmerge_model::{FieldMapping, FieldValue, OrdinalPolicy, Record, RequiredFields};

use crate::worksheet::SheetGrid;
use crate::{ReadError, Workbook};

/// 1-based row holding the field names; data starts on the next row.
pub const DEFAULT_HEADER_ROW: u32 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderOptions {
    pub header_row: u32,
    pub required_fields: RequiredFields,
    pub ordinal_policy: OrdinalPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            header_row: DEFAULT_HEADER_ROW,
            required_fields: RequiredFields::default(),
            ordinal_policy: OrdinalPolicy::default(),
        }
    }
}

/// `(column, field name)` pairs of a header row, in column order.
type HeaderRow = Vec<(u32, String)>;

struct SheetCursor {
    name: String,
    headers: HeaderRow,
    grid: SheetGrid,
    next_row: u32,
    yielded: u32,
}

/// Lazy iterator over the qualifying records of a workbook, sheet by sheet.
///
/// A worksheet is parsed when the iterator reaches it. After an error the iterator is exhausted.
pub struct Records<'a> {
    workbook: &'a Workbook,
    options: ReaderOptions,
    next_sheet: usize,
    current: Option<SheetCursor>,
    skipped: usize,
    done: bool,
}

impl<'a> Records<'a> {
    pub(crate) fn new(workbook: &'a Workbook, options: ReaderOptions) -> Self {
        Self {
            workbook,
            options,
            next_sheet: 0,
            current: None,
            skipped: 0,
            done: false,
        }
    }

    /// Rows rejected by the required-field policy so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn open_sheet(&self, index: usize) -> Result<SheetCursor, ReadError> {
        let name = self.workbook.sheets()[index].name.clone();
        let grid = self.workbook.read_sheet(index)?;
        let headers: HeaderRow = grid
            .row(self.options.header_row)
            .filter(|(_, value)| !value.is_blank())
            .map(|(col, value)| (col, value.to_string()))
            .collect();
        if headers.is_empty() {
            log::warn!(
                "sheet {name:?} has no header row at row {}; all of its rows will be skipped",
                self.options.header_row
            );
        }
        Ok(SheetCursor {
            name,
            headers,
            grid,
            next_row: self.options.header_row.saturating_add(1),
            yielded: 0,
        })
    }
}

fn build_mapping(headers: &HeaderRow, grid: &SheetGrid, row: u32) -> FieldMapping {
    let mut mapping = FieldMapping::new();
    for (col, name) in headers {
        let value = grid.value(row, *col).cloned().unwrap_or(FieldValue::Empty);
        mapping.insert(name.as_str(), value);
    }
    mapping
}

impl Iterator for Records<'_> {
    type Item = Result<Record, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let Some(cursor) = self.current.as_mut() else {
                if self.next_sheet >= self.workbook.sheets().len() {
                    self.done = true;
                    return None;
                }
                let index = self.next_sheet;
                self.next_sheet += 1;
                match self.open_sheet(index) {
                    Ok(cursor) => self.current = Some(cursor),
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                continue;
            };

            if cursor.next_row > cursor.grid.last_row() {
                self.current = None;
                continue;
            }
            let row = cursor.next_row;
            cursor.next_row += 1;

            let fields = build_mapping(&cursor.headers, &cursor.grid, row);
            if let Some(missing) = self.options.required_fields.first_missing(&fields) {
                log::debug!("{}!row {row}: skipped, {missing:?} is empty", cursor.name);
                self.skipped += 1;
                continue;
            }

            cursor.yielded += 1;
            let ordinal = match self.options.ordinal_policy {
                OrdinalPolicy::Yielded => cursor.yielded,
                OrdinalPolicy::SourceRow => row.saturating_sub(self.options.header_row),
            };
            return Some(Ok(Record {
                sheet: cursor.name.clone(),
                ordinal,
                row,
                fields,
            }));
        }
    }
}
