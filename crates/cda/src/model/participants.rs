//! Recipients and encounter context.

use super::{Address, Code, Organization, PersonName, Telecom};
use crate::mapping::{Binding, FieldTable, Fields, FromElement};
use serde::Serialize;

/// Intended recipient of the document (`informationRecipient/intendedRecipient`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntendedRecipient {
    pub addresses: Vec<Address>,
    pub recipient_names: Vec<PersonName>,
    pub received_organizations: Vec<Organization>,
    pub telecoms: Vec<Telecom>,
}

impl FromElement for IntendedRecipient {
    const ENTITY: &'static str = "IntendedRecipient";
    const BINDINGS: FieldTable = &[
        Binding::sequence("addresses", "addr"),
        Binding::sequence("recipientNames", "informationRecipient>name"),
        Binding::sequence("receivedOrganizations", "receivedOrganization"),
        Binding::sequence("telecoms", "telecom"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            addresses: fields.sequence("addresses"),
            recipient_names: fields.sequence("recipientNames"),
            received_organizations: fields.sequence("receivedOrganizations"),
            telecoms: fields.sequence("telecoms"),
        }
    }
}

/// Encounter the document belongs to (`componentOf/encompassingEncounter`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncompassingEncounter {
    pub codes: Vec<Code>,
    pub assigned_person_names: Vec<PersonName>,
    pub health_care_facilities: Vec<HealthCareFacility>,
}

impl FromElement for EncompassingEncounter {
    const ENTITY: &'static str = "EncompassingEncounter";
    const BINDINGS: FieldTable = &[
        Binding::sequence("codes", "code"),
        Binding::sequence(
            "assignedPersonNames",
            "encounterParticipant>assignedEntity>assignedPerson>name",
        ),
        Binding::sequence("healthCareFacilities", "location>healthCareFacility"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            codes: fields.sequence("codes"),
            assigned_person_names: fields.sequence("assignedPersonNames"),
            health_care_facilities: fields.sequence("healthCareFacilities"),
        }
    }
}

impl EncompassingEncounter {
    /// Display name of the encounter type.
    pub fn encounter_type(&self) -> &str {
        self.codes
            .first()
            .map(|c| c.display_name.as_str())
            .unwrap_or_default()
    }

    pub fn assigned_person(&self) -> Option<&PersonName> {
        self.assigned_person_names.first()
    }

    pub fn facility_name(&self) -> &str {
        self.health_care_facilities
            .first()
            .map(|f| f.name.as_str())
            .unwrap_or_default()
    }
}

/// Where the encounter took place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCareFacility {
    pub codes: Vec<Code>,
    pub name: String,
    pub addresses: Vec<Address>,
}

impl FromElement for HealthCareFacility {
    const ENTITY: &'static str = "HealthCareFacility";
    const BINDINGS: FieldTable = &[
        Binding::sequence("codes", "code"),
        Binding::scalar("name", "location>name"),
        Binding::sequence("addresses", "location>addr"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            codes: fields.sequence("codes"),
            name: fields.scalar("name"),
            addresses: fields.sequence("addresses"),
        }
    }
}
