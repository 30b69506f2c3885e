use crate::ReadError;

/// Last row a worksheet can address (`XFD1048576`).
pub const MAX_ROW: u32 = 1_048_576;
/// Last column a worksheet can address (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// Parse an A1-style reference (`B5`, `$AA$10`) into 1-based `(row, col)`.
///
/// References outside `A1:XFD1048576` are rejected.
pub(crate) fn parse_a1(a1: &str) -> Result<(u32, u32), ReadError> {
    let invalid = || ReadError::InvalidCellRef(a1.to_string());
    let s = a1.trim().replace('$', "");
    let split = s
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = s.split_at(split);
    let col = column_index(letters).ok_or_else(invalid)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if !(1..=MAX_ROW).contains(&row) || col > MAX_COL {
        return Err(invalid());
    }
    Ok((row, col))
}

/// Parse a `<row r="..">` number.
pub(crate) fn parse_row_number(raw: &str) -> Result<u32, ReadError> {
    match raw.trim().parse::<u32>() {
        Ok(row) if (1..=MAX_ROW).contains(&row) => Ok(row),
        _ => Err(ReadError::InvalidCellRef(format!("row {raw}"))),
    }
}

/// `A` -> 1, `Z` -> 26, `AA` -> 27.
pub(crate) fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1);
    }
    Some(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_absolute_refs() {
        assert_eq!(parse_a1("A1").unwrap(), (1, 1));
        assert_eq!(parse_a1("B5").unwrap(), (5, 2));
        assert_eq!(parse_a1("$AA$10").unwrap(), (10, 27));
        assert_eq!(parse_a1("xfd1048576").unwrap(), (1_048_576, 16_384));
    }

    #[test]
    fn rejects_malformed_refs() {
        for bad in ["", "A", "5", "A0", "1A", "ABCD1", "A-1", "A1048577", "XFE1", "A4000000000"] {
            assert!(parse_a1(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn row_numbers_stay_within_the_sheet() {
        assert_eq!(parse_row_number("7").unwrap(), 7);
        assert_eq!(parse_row_number("1048576").unwrap(), MAX_ROW);
        for bad in ["0", "1048577", "4000000000", "x", "-1"] {
            assert!(parse_row_number(bad).is_err(), "{bad} should be rejected");
        }
    }
}
