//! Date and date-time normalisation.
//!
//! CDA timestamps arrive in compact HL7 encodings. This module reparses the document effective
//! time, each section organizer's effective time and the patient's birth date, then rewrites
//! them in place using caller-supplied chrono patterns.
//!
//! Patterns travel with each call in a [`DateFormats`] value; there is no process-wide
//! formatting state.

use crate::model::ClinicalDocument;
use crate::{CdaError, CdaResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate};
use std::fmt::{Display, Write};

/// Source encoding of date-time values, e.g. `20200315093000+1000`.
pub const DATE_TIME_SOURCE_FORMAT: &str = "%Y%m%d%H%M%S%z";

/// Source encoding of date values, e.g. `19800102`.
pub const DATE_SOURCE_FORMAT: &str = "%Y%m%d";

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Output patterns for dates (birth date) and date-times (effective times).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormats {
    date: String,
    date_time: String,
}

impl DateFormats {
    /// Create a validated pair of output patterns.
    ///
    /// Both patterns are trial-formatted against a sample value of their kind, so a pattern
    /// that chrono cannot parse, or that asks for a field the value kind lacks (such as `%H` in
    /// a date pattern), is rejected here rather than during normalisation.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::InvalidFormatPattern`] naming the offending pattern.
    pub fn new(date: impl Into<String>, date_time: impl Into<String>) -> CdaResult<Self> {
        let formats = Self {
            date: date.into(),
            date_time: date_time.into(),
        };

        check_pattern(&formats.date)?;
        check_pattern(&formats.date_time)?;

        let sample_date = NaiveDate::from_ymd_opt(2000, 1, 31)
            .ok_or_else(|| CdaError::InvalidFormatPattern(formats.date.clone()))?;
        render(sample_date.format(&formats.date), &formats.date)?;

        let sample_date_time = DateTime::parse_from_str("20000131235959+0000", DATE_TIME_SOURCE_FORMAT)
            .map_err(|_| CdaError::InvalidFormatPattern(formats.date_time.clone()))?;
        render(sample_date_time.format(&formats.date_time), &formats.date_time)?;

        Ok(formats)
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn date_time(&self) -> &str {
        &self.date_time
    }

    /// Reformat a compact `YYYYMMDD` date.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::Temporal`] if `value` is not in the date source encoding.
    pub fn format_date(&self, field: &'static str, value: &str) -> CdaResult<String> {
        let date = NaiveDate::parse_from_str(exact(field, value)?, DATE_SOURCE_FORMAT)
            .map_err(|source| temporal_error(field, value, source))?;
        render(date.format(&self.date), &self.date)
    }

    /// Reformat a compact `YYYYMMDDHHMMSS±ZZZZ` date-time, keeping its own offset.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::Temporal`] if `value` is not in the date-time source encoding.
    pub fn format_date_time(&self, field: &'static str, value: &str) -> CdaResult<String> {
        let instant = DateTime::parse_from_str(exact(field, value)?, DATE_TIME_SOURCE_FORMAT)
            .map_err(|source| temporal_error(field, value, source))?;
        render(instant.format(&self.date_time), &self.date_time)
    }
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            date: DEFAULT_DATE_FORMAT.to_string(),
            date_time: DEFAULT_DATE_TIME_FORMAT.to_string(),
        }
    }
}

/// chrono skips whitespace before numeric fields; the source encodings allow none.
fn exact<'v>(field: &'static str, value: &'v str) -> CdaResult<&'v str> {
    if value.chars().any(char::is_whitespace) {
        return Err(CdaError::Temporal {
            field,
            value: value.to_string(),
            reason: "whitespace is not allowed".into(),
            source: None,
        });
    }
    Ok(value)
}

fn temporal_error(field: &'static str, value: &str, source: chrono::ParseError) -> CdaError {
    CdaError::Temporal {
        field,
        value: value.to_string(),
        reason: source.to_string(),
        source: Some(source),
    }
}

fn check_pattern(pattern: &str) -> CdaResult<()> {
    if pattern.trim().is_empty() || StrftimeItems::new(pattern).any(|i| matches!(i, Item::Error)) {
        return Err(CdaError::InvalidFormatPattern(pattern.to_string()));
    }
    Ok(())
}

fn render(formatted: impl Display, pattern: &str) -> CdaResult<String> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| CdaError::InvalidFormatPattern(pattern.to_string()))?;
    Ok(out)
}

/// Overwrite `value` with its reformatted form; empty values are left as they are.
fn reformat(
    value: &mut String,
    apply: impl FnOnce(&str) -> CdaResult<String>,
) -> CdaResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    *value = apply(value)?;
    Ok(())
}

impl ClinicalDocument {
    /// Rewrite the document's date and date-time fields using `formats`.
    ///
    /// Fields are processed in order: document effective time, each section's first organizer
    /// effective time, then the patient's birth date. Absent elements and empty values are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::Temporal`] at the first value that does not match its source
    /// encoding. Fields rewritten before the failure keep their new value.
    pub fn reformat_date_time_fields(&mut self, formats: &DateFormats) -> CdaResult<()> {
        if let Some(time) = self.effective_times.first_mut() {
            reformat(&mut time.value, |v| formats.format_date_time("effectiveTime", v))?;
        }

        for section in &mut self.sections {
            let organizer_time = section
                .organizers
                .first_mut()
                .and_then(|o| o.effective_times.first_mut());
            if let Some(time) = organizer_time {
                reformat(&mut time.value, |v| {
                    formats.format_date_time("organizer effectiveTime", v)
                })?;
            }
        }

        let birth_time = self
            .record_targets
            .first_mut()
            .and_then(|r| r.patient_role.birth_times.first_mut());
        if let Some(time) = birth_time {
            reformat(&mut time.value, |v| formats.format_date("birthTime", v))?;
        }

        tracing::debug!(
            date = formats.date(),
            date_time = formats.date_time(),
            "reformatted date/time fields"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Organizer, RecordTarget, StructuredBodySection, Timestamp};

    fn stamp(value: &str) -> Timestamp {
        Timestamp {
            value: value.to_string(),
        }
    }

    fn document(effective: &str, organizer: &str, birth: &str) -> ClinicalDocument {
        let mut target = RecordTarget::default();
        target.patient_role.birth_times.push(stamp(birth));

        ClinicalDocument {
            effective_times: vec![stamp(effective)],
            record_targets: vec![target],
            sections: vec![StructuredBodySection {
                organizers: vec![Organizer {
                    effective_times: vec![stamp(organizer)],
                    ..Organizer::default()
                }],
                ..StructuredBodySection::default()
            }],
            ..ClinicalDocument::default()
        }
    }

    fn birth_value(doc: &ClinicalDocument) -> &str {
        doc.patient_role()
            .and_then(|r| r.birth_time())
            .expect("birth time present")
    }

    #[test]
    fn reformats_all_supported_fields() {
        let formats = DateFormats::new("%d %B %Y", "%d/%m/%Y %H:%M").expect("valid formats");
        let mut doc = document("20200315093000+1000", "20200314180500+1000", "19800102");

        doc.reformat_date_time_fields(&formats).expect("normalise");

        assert_eq!(doc.effective_time(), "15/03/2020 09:30");
        assert_eq!(doc.sections[0].organizers[0].effective_time(), "14/03/2020 18:05");
        assert_eq!(birth_value(&doc), "02 January 1980");
    }

    #[test]
    fn keeps_source_offset() {
        let formats = DateFormats::new("%Y-%m-%d", "%Y-%m-%dT%H:%M:%S%:z").expect("valid formats");
        let mut doc = document("20200315093000-0500", "", "19800102");

        doc.reformat_date_time_fields(&formats).expect("normalise");

        assert_eq!(doc.effective_time(), "2020-03-15T09:30:00-05:00");
        assert_eq!(birth_value(&doc), "1980-01-02");
    }

    #[test]
    fn malformed_birth_date_fails_after_earlier_updates() {
        let formats = DateFormats::default();
        let mut doc = document("20200315093000+1000", "", "1980-01-02");

        let err = doc
            .reformat_date_time_fields(&formats)
            .expect_err("should reject malformed birth date");

        assert!(matches!(
            err,
            CdaError::Temporal { field: "birthTime", ref value, .. } if value == "1980-01-02"
        ));
        assert_eq!(doc.effective_time(), "15/03/2020 09:30");
        assert_eq!(birth_value(&doc), "1980-01-02");
    }

    #[test]
    fn malformed_effective_time_stops_before_birth_date() {
        let formats = DateFormats::default();
        let mut doc = document("2020-03-15", "", "19800102");

        let err = doc
            .reformat_date_time_fields(&formats)
            .expect_err("should reject malformed effective time");

        assert!(matches!(err, CdaError::Temporal { field: "effectiveTime", .. }));
        assert_eq!(birth_value(&doc), "19800102");
    }

    #[test]
    fn malformed_organizer_time_fails_between_document_and_birth_dates() {
        let formats = DateFormats::default();
        let mut doc = document("20200315093000+1000", "2020-03-14 18:05", "19800102");

        let err = doc
            .reformat_date_time_fields(&formats)
            .expect_err("should reject malformed organizer time");

        assert!(matches!(
            err,
            CdaError::Temporal { field: "organizer effectiveTime", ref value, .. }
                if value == "2020-03-14 18:05"
        ));
        assert_eq!(doc.effective_time(), "15/03/2020 09:30");
        assert_eq!(doc.sections[0].organizers[0].effective_time(), "2020-03-14 18:05");
        assert_eq!(birth_value(&doc), "19800102");
    }

    #[test]
    fn rejects_whitespace_in_source_values() {
        let formats = DateFormats::default();

        let err = formats
            .format_date("birthTime", " 19800102")
            .expect_err("should reject leading whitespace");
        assert!(matches!(err, CdaError::Temporal { source: None, .. }));

        formats
            .format_date("birthTime", "19800102 ")
            .expect_err("should reject trailing whitespace");
        formats
            .format_date_time("effectiveTime", "20200315 093000+1000")
            .expect_err("should reject inner whitespace");
    }

    #[test]
    fn parse_failures_keep_the_chrono_source() {
        let err = DateFormats::default()
            .format_date("birthTime", "1980-01-02")
            .expect_err("should reject dashed date");
        assert!(matches!(err, CdaError::Temporal { source: Some(_), .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn skips_absent_and_empty_values() {
        let formats = DateFormats::default();

        let mut empty = ClinicalDocument::default();
        empty
            .reformat_date_time_fields(&formats)
            .expect("nothing to normalise");

        let mut blank = document("", "", "");
        blank
            .reformat_date_time_fields(&formats)
            .expect("blank values are skipped");
        assert_eq!(blank.effective_time(), "");
    }

    #[test]
    fn rejects_unknown_specifiers() {
        let err = DateFormats::new("%Q", "%d/%m/%Y").expect_err("should reject %Q");
        assert!(matches!(err, CdaError::InvalidFormatPattern(p) if p == "%Q"));
    }

    #[test]
    fn rejects_time_fields_in_date_pattern() {
        let err = DateFormats::new("%d/%m/%Y %H:%M", "%d/%m/%Y").expect_err("should reject %H");
        assert!(matches!(err, CdaError::InvalidFormatPattern(_)));
    }

    #[test]
    fn rejects_empty_pattern() {
        let err = DateFormats::new("", "%d/%m/%Y").expect_err("should reject empty pattern");
        assert!(matches!(err, CdaError::InvalidFormatPattern(_)));
    }

    #[test]
    fn separate_documents_use_their_own_formats() {
        let us = DateFormats::new("%m/%d/%Y", "%m/%d/%Y %I:%M %p").expect("valid formats");
        let iso = DateFormats::new("%Y-%m-%d", "%Y-%m-%d %H:%M").expect("valid formats");

        let mut first = document("20200315133000+1000", "", "19800102");
        let mut second = first.clone();

        first.reformat_date_time_fields(&us).expect("normalise");
        second.reformat_date_time_fields(&iso).expect("normalise");

        assert_eq!(first.effective_time(), "03/15/2020 01:30 PM");
        assert_eq!(second.effective_time(), "2020-03-15 13:30");
        assert_eq!(birth_value(&first), "01/02/1980");
        assert_eq!(birth_value(&second), "1980-01-02");
    }
}
