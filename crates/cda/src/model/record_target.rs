//! Patient (`recordTarget/patientRole`).

use super::{Address, Code, Identifier, PersonName, Telecom, Timestamp};
use crate::mapping::{Binding, FieldTable, Fields, FromElement};
use serde::Serialize;

/// The patient the document is about.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTarget {
    pub type_code: String,
    pub patient_role: PatientRole,
}

impl FromElement for RecordTarget {
    const ENTITY: &'static str = "RecordTarget";
    const BINDINGS: FieldTable = &[
        Binding::scalar("typeCode", "@typeCode"),
        Binding::nested("patientRole", "patientRole"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            type_code: fields.scalar("typeCode"),
            patient_role: fields.nested("patientRole"),
        }
    }
}

/// Patient role: identifiers and contact details of the role plus the patient's demographics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRole {
    pub ids: Vec<Identifier>,
    pub addresses: Vec<Address>,
    pub telecoms: Vec<Telecom>,
    pub names: Vec<PersonName>,
    pub birth_times: Vec<Timestamp>,
    pub administrative_gender_codes: Vec<Code>,
    pub marital_status_codes: Vec<Code>,
    pub religious_affiliation_codes: Vec<Code>,
}

impl FromElement for PatientRole {
    const ENTITY: &'static str = "PatientRole";
    const BINDINGS: FieldTable = &[
        Binding::sequence("ids", "id"),
        Binding::sequence("addresses", "addr"),
        Binding::sequence("telecoms", "telecom"),
        Binding::sequence("names", "patient>name"),
        Binding::sequence("birthTimes", "patient>birthTime"),
        Binding::sequence("administrativeGenderCodes", "patient>administrativeGenderCode"),
        Binding::sequence("maritalStatusCodes", "patient>maritalStatusCode"),
        Binding::sequence("religiousAffiliationCodes", "patient>religiousAffiliationCode"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            ids: fields.sequence("ids"),
            addresses: fields.sequence("addresses"),
            telecoms: fields.sequence("telecoms"),
            names: fields.sequence("names"),
            birth_times: fields.sequence("birthTimes"),
            administrative_gender_codes: fields.sequence("administrativeGenderCodes"),
            marital_status_codes: fields.sequence("maritalStatusCodes"),
            religious_affiliation_codes: fields.sequence("religiousAffiliationCodes"),
        }
    }
}

impl PatientRole {
    pub fn name(&self) -> Option<&PersonName> {
        self.names.first()
    }

    pub fn address(&self) -> Option<&Address> {
        self.addresses.first()
    }

    pub fn birth_time(&self) -> Option<&str> {
        self.birth_times.first().map(|t| t.value.as_str())
    }

    pub fn gender(&self) -> Option<&Code> {
        self.administrative_gender_codes.first()
    }
}
