use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::ReadError;

/// What a numeric cell's number format says it represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NumberKind {
    Plain,
    Date,
    Time,
}

/// Number-format classification of every `cellXfs` entry, indexed by the cell `s` attribute.
#[derive(Clone, Debug, Default)]
pub(crate) struct CellStyles {
    kinds: Vec<NumberKind>,
}

impl CellStyles {
    pub(crate) fn kind(&self, style_index: u32) -> NumberKind {
        self.kinds
            .get(style_index as usize)
            .copied()
            .unwrap_or(NumberKind::Plain)
    }
}

pub(crate) fn parse_styles(xml: &[u8]) -> Result<CellStyles, ReadError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut custom_formats: HashMap<u32, String> = HashMap::new();
    let mut xf_format_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"numFmt" => {
                let mut id = None;
                let mut code = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"numFmtId" => id = attr.unescape_value()?.trim().parse::<u32>().ok(),
                        b"formatCode" => code = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(code)) = (id, code) {
                    custom_formats.insert(id, code);
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e)
                if in_cell_xfs && e.local_name().as_ref() == b"xf" =>
            {
                let mut num_fmt_id = 0;
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.local_name().as_ref() == b"numFmtId" {
                        num_fmt_id = attr.unescape_value()?.trim().parse().unwrap_or(0);
                    }
                }
                xf_format_ids.push(num_fmt_id);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let kinds = xf_format_ids
        .into_iter()
        .map(|id| match custom_formats.get(&id) {
            Some(code) => classify_format_code(code),
            None => builtin_kind(id),
        })
        .collect();
    Ok(CellStyles { kinds })
}

fn builtin_kind(id: u32) -> NumberKind {
    match id {
        18..=21 | 45..=47 => NumberKind::Time,
        14..=17 | 22 | 27..=36 | 50..=58 => NumberKind::Date,
        _ => NumberKind::Plain,
    }
}

/// Classify a custom number format by the date/time tokens in its first section.
///
/// Quoted literals, backslash escapes, `_x` padding, `*x` fills and bracketed sections (colors,
/// locales, conditions) are ignored; elapsed-time brackets like `[h]` count as time.
pub(crate) fn classify_format_code(code: &str) -> NumberKind {
    let section = first_section(code);
    let mut has_date = false;
    let mut has_time = false;
    let mut has_month_or_minute = false;

    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|&b| b != ']').collect();
                let inner = inner.to_ascii_lowercase();
                if !inner.is_empty() && inner.chars().all(|ch| matches!(ch, 'h' | 'm' | 's')) {
                    has_time = true;
                }
            }
            _ => match c.to_ascii_lowercase() {
                'y' | 'd' => has_date = true,
                'h' | 's' => has_time = true,
                'm' => has_month_or_minute = true,
                _ => {}
            },
        }
    }

    if section.to_ascii_lowercase().contains("am/pm") {
        has_time = true;
    }
    // A lone `m` is a month unless the format also has hours or seconds.
    if has_month_or_minute && !has_time {
        has_date = true;
    }

    if has_date {
        NumberKind::Date
    } else if has_time {
        NumberKind::Time
    } else {
        NumberKind::Plain
    }
}

fn first_section(code: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &code[..idx],
            _ => {}
        }
    }
    code
}
