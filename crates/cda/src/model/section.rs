//! Structured body sections (`component/structuredBody/component/section`).

use super::{Code, Identifier, Timestamp};
use crate::mapping::{Binding, FieldTable, Fields, FromElement};
use serde::Serialize;

/// One section of the structured body.
///
/// `text` and `accredited_text` hold narrative markup verbatim; they are protected from the XML
/// parser by [`crate::preprocess`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredBodySection {
    pub title: String,
    pub codes: Vec<Code>,
    pub text: String,
    pub accredited_text: String,
    pub organizers: Vec<Organizer>,
}

impl FromElement for StructuredBodySection {
    const ENTITY: &'static str = "StructuredBodySection";
    const BINDINGS: FieldTable = &[
        Binding::scalar("title", "section>title"),
        Binding::sequence("codes", "section>code"),
        Binding::scalar("text", "section>text"),
        Binding::scalar("accreditedText", "section>entry>organizer>component>act>text"),
        Binding::sequence("organizers", "section>entry>act>entryRelationship>organizer"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            title: fields.scalar("title"),
            codes: fields.sequence("codes"),
            text: fields.scalar("text"),
            accredited_text: fields.scalar("accreditedText"),
            organizers: fields.sequence("organizers"),
        }
    }
}

impl StructuredBodySection {
    pub fn organizer(&self) -> Option<&Organizer> {
        self.organizers.first()
    }
}

/// Lab-style grouping of results with accession, status and collection time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    pub ids: Vec<Identifier>,
    pub codes: Vec<Code>,
    pub status_codes: Vec<Code>,
    pub effective_times: Vec<Timestamp>,
}

impl FromElement for Organizer {
    const ENTITY: &'static str = "Organizer";
    const BINDINGS: FieldTable = &[
        Binding::sequence("ids", "id"),
        Binding::sequence("codes", "code"),
        Binding::sequence("statusCodes", "statusCode"),
        Binding::sequence("effectiveTimes", "effectiveTime"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            ids: fields.sequence("ids"),
            codes: fields.sequence("codes"),
            status_codes: fields.sequence("statusCodes"),
            effective_times: fields.sequence("effectiveTimes"),
        }
    }
}

impl Organizer {
    /// Accession number: the extension of the first identifier.
    pub fn accession_number(&self) -> &str {
        self.ids
            .first()
            .map(|id| id.extension.as_str())
            .unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        self.status_codes
            .first()
            .map(|c| c.code.as_str())
            .unwrap_or_default()
    }

    pub fn effective_time(&self) -> &str {
        self.effective_times
            .first()
            .map(|t| t.value.as_str())
            .unwrap_or_default()
    }
}
