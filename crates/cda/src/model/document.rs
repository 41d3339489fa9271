//! The `ClinicalDocument` aggregate and its parse entry point.

use super::{
    Author, Code, Custodian, EncompassingEncounter, Identifier, IntendedRecipient, PatientRole,
    RecordTarget, StructuredBodySection, Timestamp, VersionNumber,
};
use crate::mapping::{self, Binding, FieldTable, Fields, FromElement};
use crate::{preprocess, xml, CdaError, CdaResult};
use serde::Serialize;

/// Expected local name of the document root.
pub const ROOT_ELEMENT: &str = "ClinicalDocument";

/// Parsed CDA document.
///
/// Every repeatable element is kept as an ordered `Vec` and every absent scalar as an empty
/// string, so a partial document still parses. Use the accessor methods for the "first"
/// element of a sequence instead of indexing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalDocument {
    /// Inner markup of the root element after narrative protection.
    #[serde(skip)]
    pub raw_xml: String,
    pub title: String,

    // Header items carried as attributes
    pub ids: Vec<Identifier>,
    pub set_ids: Vec<Identifier>,
    pub codes: Vec<Code>,
    pub confidentiality_codes: Vec<Code>,
    pub effective_times: Vec<Timestamp>,
    pub language_codes: Vec<Code>,
    pub realm_codes: Vec<Code>,
    pub version_numbers: Vec<VersionNumber>,

    // Participants
    pub record_targets: Vec<RecordTarget>,
    pub custodians: Vec<Custodian>,
    pub authors: Vec<Author>,
    pub intended_recipients: Vec<IntendedRecipient>,
    pub encompassing_encounters: Vec<EncompassingEncounter>,

    pub sections: Vec<StructuredBodySection>,
}

impl FromElement for ClinicalDocument {
    const ENTITY: &'static str = "ClinicalDocument";
    const BINDINGS: FieldTable = &[
        Binding::inner_xml("rawXml"),
        Binding::scalar("title", "title"),
        Binding::sequence("ids", "id"),
        Binding::sequence("setIds", "setId"),
        Binding::sequence("codes", "code"),
        Binding::sequence("confidentialityCodes", "confidentialityCode"),
        Binding::sequence("effectiveTimes", "effectiveTime"),
        Binding::sequence("languageCodes", "languageCode"),
        Binding::sequence("realmCodes", "realmCode"),
        Binding::sequence("versionNumbers", "versionNumber"),
        Binding::sequence("recordTargets", "recordTarget"),
        Binding::sequence(
            "custodians",
            "custodian>assignedCustodian>representedCustodianOrganization",
        ),
        Binding::sequence("authors", "author"),
        Binding::sequence(
            "intendedRecipients",
            "informationRecipient>intendedRecipient",
        ),
        Binding::sequence(
            "encompassingEncounters",
            "componentOf>encompassingEncounter",
        ),
        Binding::sequence("sections", "component>structuredBody>component"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            raw_xml: fields.inner_xml("rawXml"),
            title: fields.scalar("title"),
            ids: fields.sequence("ids"),
            set_ids: fields.sequence("setIds"),
            codes: fields.sequence("codes"),
            confidentiality_codes: fields.sequence("confidentialityCodes"),
            effective_times: fields.sequence("effectiveTimes"),
            language_codes: fields.sequence("languageCodes"),
            realm_codes: fields.sequence("realmCodes"),
            version_numbers: fields.sequence("versionNumbers"),
            record_targets: fields.sequence("recordTargets"),
            custodians: fields.sequence("custodians"),
            authors: fields.sequence("authors"),
            intended_recipients: fields.sequence("intendedRecipients"),
            encompassing_encounters: fields.sequence("encompassingEncounters"),
            sections: fields.sequence("sections"),
        }
    }
}

impl ClinicalDocument {
    /// Parse a CDA document from XML text.
    ///
    /// Narrative `<text>` content is protected before parsing so embedded markup reaches the
    /// model unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError`] if:
    /// - the text is not well-formed XML ([`CdaError::MalformedXml`]),
    /// - the root element is not `ClinicalDocument` ([`CdaError::InvalidInput`]),
    /// - a mapping table fails validation ([`CdaError::Mapping`]).
    pub fn parse(xml_text: &str) -> CdaResult<Self> {
        mapping::ensure_schema_valid()?;

        let protected = preprocess::protect_narrative_text(xml_text);
        let parsed = xml::parse(&protected)?;

        if parsed.root.name != ROOT_ELEMENT {
            return Err(CdaError::InvalidInput(format!(
                "expected root element '{ROOT_ELEMENT}', got '{}'",
                parsed.root.name
            )));
        }

        let fields = Fields::new(
            &parsed.root,
            Self::ENTITY,
            Self::BINDINGS,
            Some(parsed.inner_xml.as_str()),
        );
        let document = Self::from_fields(&fields);

        tracing::debug!(
            record_targets = document.record_targets.len(),
            authors = document.authors.len(),
            sections = document.sections.len(),
            "parsed clinical document"
        );

        Ok(document)
    }

    pub fn record_target(&self) -> Option<&RecordTarget> {
        self.record_targets.first()
    }

    pub fn patient_role(&self) -> Option<&PatientRole> {
        self.record_target().map(|r| &r.patient_role)
    }

    pub fn custodian(&self) -> Option<&Custodian> {
        self.custodians.first()
    }

    /// Custodian organisation name, empty when there is no custodian.
    pub fn custodian_name(&self) -> &str {
        self.custodian().map(|c| c.name.as_str()).unwrap_or_default()
    }

    /// Document effective time, empty when absent.
    pub fn effective_time(&self) -> &str {
        self.effective_times
            .first()
            .map(|t| t.value.as_str())
            .unwrap_or_default()
    }

    pub fn encompassing_encounter(&self) -> Option<&EncompassingEncounter> {
        self.encompassing_encounters.first()
    }

    /// Confirm the document carries every element the report reads as a "first" element.
    ///
    /// # Errors
    ///
    /// Returns [`CdaError::Incomplete`] naming the first missing element.
    pub fn check_complete(&self) -> CdaResult<()> {
        let role = self
            .patient_role()
            .ok_or(CdaError::Incomplete("recordTarget"))?;

        if role.name().is_none() {
            return Err(CdaError::Incomplete("recordTarget/patientRole/patient/name"));
        }
        if role.address().is_none() {
            return Err(CdaError::Incomplete("recordTarget/patientRole/addr"));
        }
        if role.birth_time().is_none() {
            return Err(CdaError::Incomplete("recordTarget/patientRole/patient/birthTime"));
        }
        if role.gender().is_none() {
            return Err(CdaError::Incomplete(
                "recordTarget/patientRole/patient/administrativeGenderCode",
            ));
        }
        if self.custodian().is_none() {
            return Err(CdaError::Incomplete(
                "custodian/assignedCustodian/representedCustodianOrganization",
            ));
        }
        if self.effective_times.is_empty() {
            return Err(CdaError::Incomplete("effectiveTime"));
        }

        Ok(())
    }
}
