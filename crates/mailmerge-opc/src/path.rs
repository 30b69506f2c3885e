/// Split a part name into its folder (empty at the package root) and file name.
fn split_part(part: &str) -> (&str, &str) {
    match part.rfind('/') {
        Some(idx) => (&part[..idx], &part[idx + 1..]),
        None => ("", part),
    }
}

/// Name of the relationships part describing `part`.
///
/// `word/document.xml` is described by `word/_rels/document.xml.rels`, a root-level part by
/// `_rels/<name>.rels`.
pub fn rels_for_part(part: &str) -> String {
    let (folder, file_name) = split_part(part);
    if folder.is_empty() {
        format!("_rels/{file_name}.rels")
    } else {
        format!("{folder}/_rels/{file_name}.rels")
    }
}

/// Part name that a relationship `target` of `source_part` points at.
///
/// A leading `/` anchors the target at the package root; otherwise it is relative to the folder
/// of `source_part`. `.` and `..` segments collapse, never above the root, and any `#fragment`
/// is dropped. A target that is empty once the fragment is gone names `source_part` itself.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = match target.find('#') {
        Some(idx) => &target[..idx],
        None => target,
    };
    let (base, relative) = if target.is_empty() {
        ("", source_part)
    } else if let Some(absolute) = target.strip_prefix('/') {
        ("", absolute)
    } else {
        (split_part(source_part).0, target)
    };

    let mut segments = Vec::new();
    push_segments(&mut segments, base);
    push_segments(&mut segments, relative);
    segments.join("/")
}

fn push_segments<'a>(segments: &mut Vec<&'a str>, path: &'a str) {
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }
}

/// Canonical lookup key for a ZIP entry name.
///
/// Producers disagree on leading `/`, Windows separators, ASCII case and percent-encoding, so
/// part lookups compare this key instead of the raw name:
/// - valid `%xx` sequences are decoded
/// - leading `/` or `\` separators are stripped
/// - `\` becomes `/`
/// - ASCII letters are lowercased
pub fn normalize_part_name(name: &str) -> String {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let mut bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_leading_separators = true;
    while let Some(&b) = bytes.first() {
        let decoded = match (b, bytes.get(1), bytes.get(2)) {
            (b'%', Some(&hi), Some(&lo)) => match (hex_val(hi), hex_val(lo)) {
                (Some(hi), Some(lo)) => {
                    bytes = &bytes[3..];
                    (hi << 4) | lo
                }
                _ => {
                    bytes = &bytes[1..];
                    b
                }
            },
            _ => {
                bytes = &bytes[1..];
                b
            }
        };

        if in_leading_separators && matches!(decoded, b'/' | b'\\') {
            continue;
        }
        in_leading_separators = false;

        out.push(if decoded == b'\\' {
            b'/'
        } else {
            decoded.to_ascii_lowercase()
        });
    }
    String::from_utf8_lossy(&out).into_owned()
}
