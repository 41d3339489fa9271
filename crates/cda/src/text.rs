//! Line-break marker replacement in section narrative.

use crate::model::ClinicalDocument;

/// Literal line-break escape some producers embed in narrative text.
pub const LINE_BREAK_SENTINEL: &str = r"\.br\";

impl ClinicalDocument {
    /// Replace every [`LINE_BREAK_SENTINEL`] in section text and accredited text.
    ///
    /// Other fields are untouched. Running it twice with a replacement that does not itself
    /// contain the sentinel changes nothing the second time.
    pub fn replace_line_breaks(&mut self, replace_with: &str) {
        let mut replaced = 0usize;

        for section in &mut self.sections {
            for narrative in [&mut section.text, &mut section.accredited_text] {
                if narrative.contains(LINE_BREAK_SENTINEL) {
                    replaced += narrative.matches(LINE_BREAK_SENTINEL).count();
                    *narrative = narrative.replace(LINE_BREAK_SENTINEL, replace_with);
                }
            }
        }

        tracing::debug!(replaced, "replaced line-break markers");
    }
}
