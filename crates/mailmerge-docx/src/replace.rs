//! Placeholder substitution within one paragraph.
//!
//! The paragraph's run texts are concatenated, every `{field}` present in the mapping is replaced
//! with the field's display text, and the result is written back into the first run while every
//! other run is emptied. Placeholders split across runs are therefore found, at the cost of
//! collapsing the paragraph's formatting to that of its first run.

use mailmerge_model::FieldMapping;
use serde::{Deserialize, Serialize};

use crate::paragraph::{set_run_text, Paragraph};
use crate::DocxError;

/// Which paragraphs get their runs collapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewritePolicy {
    /// Every paragraph with at least one run is rewritten, matched or not.
    #[default]
    CollapseAll,
    /// Paragraphs without a matching placeholder keep their runs untouched.
    OnlyWhenSubstituted,
}

/// Replace `{name}` for every field in `mapping`, in mapping order.
///
/// Returns the new text and whether any placeholder matched. Placeholders without a field are
/// left as they are.
pub fn substitute(text: &str, mapping: &FieldMapping) -> (String, bool) {
    let mut out = text.to_string();
    let mut matched = false;
    for (name, value) in mapping.iter() {
        let token = format!("{{{name}}}");
        if out.contains(&token) {
            out = out.replace(&token, &value.to_string());
            matched = true;
        }
    }
    (out, matched)
}

/// Substitute placeholders in `paragraph`, collapsing its text into the first run.
///
/// A paragraph without runs is left alone. Returns whether any placeholder was substituted.
pub fn replace_paragraph(
    paragraph: &mut Paragraph<'_>,
    mapping: &FieldMapping,
    policy: RewritePolicy,
) -> Result<bool, DocxError> {
    if paragraph.run_count() == 0 {
        return Ok(false);
    }

    let (text, matched) = substitute(&paragraph.text()?, mapping);
    if !matched && policy == RewritePolicy::OnlyWhenSubstituted {
        return Ok(false);
    }

    for (idx, run) in paragraph.runs_mut().enumerate() {
        set_run_text(run, if idx == 0 { &text } else { "" });
    }
    Ok(matched)
}
