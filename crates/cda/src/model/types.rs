//! Leaf value types shared across CDA entities.

use crate::mapping::{Binding, FieldTable, Fields, FromElement};
use serde::Serialize;

/// Placeholder the source systems write for an unknown address segment.
pub const NOT_AVAILABLE: &str = "NA";

/// Postal address (`addr`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub use_code: String,
    pub street_address_line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl FromElement for Address {
    const ENTITY: &'static str = "Address";
    const BINDINGS: FieldTable = &[
        Binding::scalar("use", "@use"),
        Binding::scalar("streetAddressLine", "streetAddressLine"),
        Binding::scalar("city", "city"),
        Binding::scalar("state", "state"),
        Binding::scalar("postalCode", "postalCode"),
        Binding::scalar("country", "country"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            use_code: fields.scalar("use"),
            street_address_line: fields.scalar("streetAddressLine"),
            city: fields.scalar("city"),
            state: fields.scalar("state"),
            postal_code: fields.scalar("postalCode"),
            country: fields.scalar("country"),
        }
    }
}

impl Address {
    /// Address as an HTML fragment for the report.
    ///
    /// Street, city, country and state are each followed by `<br />`; the postcode comes last.
    /// Segments that are empty or hold the `NA` placeholder are left out.
    pub fn display_address(&self) -> String {
        let present = |segment: &str| !segment.is_empty() && segment != NOT_AVAILABLE;

        let mut out = String::new();
        for segment in [
            &self.street_address_line,
            &self.city,
            &self.country,
            &self.state,
        ] {
            if present(segment) {
                out.push_str(&quick_xml::escape::escape(segment.as_str()));
                out.push_str("<br />");
            }
        }
        if present(&self.postal_code) {
            out.push_str(&quick_xml::escape::escape(self.postal_code.as_str()));
        }
        out
    }
}

/// Instance identifier (`id`): an OID root with an optional extension.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub root: String,
    pub extension: String,
    pub assigning_authority_name: String,
}

impl FromElement for Identifier {
    const ENTITY: &'static str = "Identifier";
    const BINDINGS: FieldTable = &[
        Binding::scalar("root", "@root"),
        Binding::scalar("extension", "@extension"),
        Binding::scalar("assigningAuthorityName", "@assigningAuthorityName"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            root: fields.scalar("root"),
            extension: fields.scalar("extension"),
            assigning_authority_name: fields.scalar("assigningAuthorityName"),
        }
    }
}

/// Telecommunication address (`telecom`), e.g. `tel:+61 2 9999 0000`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telecom {
    pub value: String,
    pub use_code: String,
}

impl FromElement for Telecom {
    const ENTITY: &'static str = "Telecom";
    const BINDINGS: FieldTable = &[
        Binding::scalar("value", "@value"),
        Binding::scalar("use", "@use"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            value: fields.scalar("value"),
            use_code: fields.scalar("use"),
        }
    }
}

/// Coded value: any element carrying the `code`/`codeSystem` attribute quadruple.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    pub code: String,
    pub code_system: String,
    pub code_system_name: String,
    pub display_name: String,
}

impl FromElement for Code {
    const ENTITY: &'static str = "Code";
    const BINDINGS: FieldTable = &[
        Binding::scalar("code", "@code"),
        Binding::scalar("codeSystem", "@codeSystem"),
        Binding::scalar("codeSystemName", "@codeSystemName"),
        Binding::scalar("displayName", "@displayName"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            code: fields.scalar("code"),
            code_system: fields.scalar("codeSystem"),
            code_system_name: fields.scalar("codeSystemName"),
            display_name: fields.scalar("displayName"),
        }
    }
}

/// Person name (`name`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub prefix: String,
    pub given: String,
    pub family: String,
    pub suffix: String,
}

impl FromElement for PersonName {
    const ENTITY: &'static str = "PersonName";
    const BINDINGS: FieldTable = &[
        Binding::scalar("prefix", "prefix"),
        Binding::scalar("given", "given"),
        Binding::scalar("family", "family"),
        Binding::scalar("suffix", "suffix"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            prefix: fields.scalar("prefix"),
            given: fields.scalar("given"),
            family: fields.scalar("family"),
            suffix: fields.scalar("suffix"),
        }
    }
}

impl PersonName {
    /// Non-empty name parts joined by single spaces.
    pub fn display_name(&self) -> String {
        [&self.prefix, &self.given, &self.family, &self.suffix]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Point in time (`effectiveTime`, `birthTime`, `time`) held in its `value` attribute.
///
/// The value stays a string: it holds the compact HL7 encoding as parsed and the display
/// form after [`ClinicalDocument::reformat_date_time_fields`](crate::ClinicalDocument::reformat_date_time_fields).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub value: String,
}

impl FromElement for Timestamp {
    const ENTITY: &'static str = "Timestamp";
    const BINDINGS: FieldTable = &[Binding::scalar("value", "@value")];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            value: fields.scalar("value"),
        }
    }
}

/// Document version (`versionNumber`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VersionNumber {
    pub value: String,
}

impl FromElement for VersionNumber {
    const ENTITY: &'static str = "VersionNumber";
    const BINDINGS: FieldTable = &[Binding::scalar("value", "@value")];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            value: fields.scalar("value"),
        }
    }
}
