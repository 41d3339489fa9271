//! HL7 CDA R2 document support.
//!
//! This crate reads a Clinical Document Architecture (CDA) XML document into a typed model and
//! renders that model as a printable HTML report.
//!
//! Pipeline:
//! - [`preprocess`] protects narrative `<text>` markup from the XML parser
//! - [`mapping`] binds element paths to model fields via explicit tables
//! - [`model`] holds the parsed entity graph
//! - [`temporal`] and [`text`] optionally rewrite dates and line-break markers in place
//! - [`report`] assembles the HTML document
//!
//! The crate performs no I/O: callers supply the raw document text and receive the HTML string.

pub mod config;
pub mod mapping;
pub mod model;
pub mod preprocess;
pub mod report;
pub mod temporal;
pub mod text;

mod xml;

// Re-export the document model
pub use model::{
    Address, Author, ClinicalDocument, Code, Custodian, Device, EncompassingEncounter,
    HealthCareFacility, Identifier, IntendedRecipient, Organization, Organizer, PatientRole,
    PersonName, RecordTarget, StructuredBodySection, Telecom, Timestamp, VersionNumber,
};

// Re-export configuration carriers
pub use config::ReportConfig;
pub use report::ReportOptions;
pub use temporal::DateFormats;

/// Errors returned by the `cda` crate.
#[derive(Debug, thiserror::Error)]
pub enum CdaError {
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid mapping for {entity}.{field}: {reason}")]
    Mapping {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("invalid {field} value '{value}': {reason}")]
    Temporal {
        field: &'static str,
        value: String,
        reason: String,
        #[source]
        source: Option<chrono::ParseError>,
    },

    #[error("invalid date format pattern '{0}'")]
    InvalidFormatPattern(String),

    #[error("incomplete document: missing {0}")]
    Incomplete(&'static str),
}

/// Type alias for Results that can fail with a [`CdaError`].
pub type CdaResult<T> = Result<T, CdaError>;

/// Run the full pipeline over a raw CDA document.
///
/// Parses `raw`, applies the optional date normalisation and line-break replacement carried by
/// `config`, then renders the HTML report.
///
/// # Errors
///
/// Returns [`CdaError`] if the document cannot be parsed, a date does not match its source
/// encoding, or `config.strict` is set and the document is incomplete.
pub fn generate_report(raw: &str, config: &ReportConfig) -> CdaResult<String> {
    let mut document = ClinicalDocument::parse(raw)?;

    if config.strict {
        document.check_complete()?;
    }

    if let Some(formats) = &config.date_formats {
        document.reformat_date_time_fields(formats)?;
    }

    if let Some(replacement) = &config.line_break {
        document.replace_line_breaks(replacement);
    }

    Ok(document.generate_report(&config.options))
}
