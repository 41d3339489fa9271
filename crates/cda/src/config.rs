//! Pipeline configuration.
//!
//! A [`ReportConfig`] is resolved once by the caller (for example from CLI flags and
//! environment variables) and passed to [`crate::generate_report`]. The library does not read
//! the environment itself.

use crate::report::ReportOptions;
use crate::temporal::DateFormats;

/// Settings for one run of the parse, normalise and render pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportConfig {
    /// Date output patterns. Dates are left in their source encoding when `None`.
    pub date_formats: Option<DateFormats>,
    /// Replacement for line-break markers in section narrative. Markers are kept when `None`.
    pub line_break: Option<String>,
    pub options: ReportOptions,
    /// Reject documents that lack elements the report reads.
    pub strict: bool,
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_formats(mut self, formats: DateFormats) -> Self {
        self.date_formats = Some(formats);
        self
    }

    pub fn with_line_break(mut self, replacement: impl Into<String>) -> Self {
        self.line_break = Some(replacement.into());
        self
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CdaError;

    const MINIMAL: &str = r#"<ClinicalDocument>
  <title>Discharge Summary</title>
  <effectiveTime value="20200315093000+1000"/>
  <component><structuredBody><component><section>
    <title>Notes</title>
    <text>First\.br\Second</text>
  </section></component></structuredBody></component>
</ClinicalDocument>"#;

    #[test]
    fn default_config_renders_values_as_parsed() {
        let html = crate::generate_report(MINIMAL, &ReportConfig::default()).expect("render");
        assert!(html.contains("Published 20200315093000+1000"));
        assert!(html.contains(r"First\.br\Second"));
    }

    #[test]
    fn builder_settings_are_applied() {
        let config = ReportConfig::new()
            .with_date_formats(DateFormats::default())
            .with_line_break("<br />")
            .with_options(ReportOptions::new().with_logo_url("logo.png"));

        let html = crate::generate_report(MINIMAL, &config).expect("render");

        assert!(html.contains("Published 15/03/2020 09:30"));
        assert!(html.contains("First<br />Second"));
        assert!(html.contains(r#"<img src="logo.png""#));
    }

    #[test]
    fn strict_mode_rejects_incomplete_documents() {
        let config = ReportConfig::new().strict(true);
        let err = crate::generate_report(MINIMAL, &config).expect_err("should be incomplete");
        assert!(matches!(err, CdaError::Incomplete("recordTarget")));
    }
}
