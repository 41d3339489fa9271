//! Document authors (`author/assignedAuthor`) and the organisations around them.

use super::{Address, Identifier, PersonName, Telecom, Timestamp};
use crate::mapping::{Binding, FieldTable, Fields, FromElement};
use serde::Serialize;

/// A person or device that authored the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub times: Vec<Timestamp>,
    pub ids: Vec<Identifier>,
    pub telecoms: Vec<Telecom>,
    pub addresses: Vec<Address>,
    pub assigned_person_names: Vec<PersonName>,
    pub represented_organizations: Vec<Organization>,
    pub authoring_device: Device,
}

impl FromElement for Author {
    const ENTITY: &'static str = "Author";
    const BINDINGS: FieldTable = &[
        Binding::sequence("times", "time"),
        Binding::sequence("ids", "assignedAuthor>id"),
        Binding::sequence("telecoms", "assignedAuthor>telecom"),
        Binding::sequence("addresses", "assignedAuthor>addr"),
        Binding::sequence("assignedPersonNames", "assignedAuthor>assignedPerson>name"),
        Binding::sequence(
            "representedOrganizations",
            "assignedAuthor>representedOrganization",
        ),
        Binding::nested("authoringDevice", "assignedAuthor>assignedAuthoringDevice"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            times: fields.sequence("times"),
            ids: fields.sequence("ids"),
            telecoms: fields.sequence("telecoms"),
            addresses: fields.sequence("addresses"),
            assigned_person_names: fields.sequence("assignedPersonNames"),
            represented_organizations: fields.sequence("representedOrganizations"),
            authoring_device: fields.nested("authoringDevice"),
        }
    }
}

impl Author {
    /// Whether the entry was produced by a system rather than a person.
    pub fn is_device(&self) -> bool {
        self.assigned_person_names.is_empty() && !self.authoring_device.is_empty()
    }
}

/// Software or hardware that produced an authored entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub manufacturer_model_name: String,
    pub software_name: String,
}

impl FromElement for Device {
    const ENTITY: &'static str = "Device";
    const BINDINGS: FieldTable = &[
        Binding::scalar("manufacturerModelName", "manufacturerModelName"),
        Binding::scalar("softwareName", "softwareName"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            manufacturer_model_name: fields.scalar("manufacturerModelName"),
            software_name: fields.scalar("softwareName"),
        }
    }
}

impl Device {
    pub fn is_empty(&self) -> bool {
        self.manufacturer_model_name.is_empty() && self.software_name.is_empty()
    }
}

/// An organisation: represented, received or custodian.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub ids: Vec<Identifier>,
    pub name: String,
    pub addresses: Vec<Address>,
    pub telecoms: Vec<Telecom>,
}

impl FromElement for Organization {
    const ENTITY: &'static str = "Organization";
    const BINDINGS: FieldTable = &[
        Binding::sequence("ids", "id"),
        Binding::scalar("name", "name"),
        Binding::sequence("addresses", "addr"),
        Binding::sequence("telecoms", "telecom"),
    ];

    fn from_fields(fields: &Fields<'_>) -> Self {
        Self {
            ids: fields.sequence("ids"),
            name: fields.scalar("name"),
            addresses: fields.sequence("addresses"),
            telecoms: fields.sequence("telecoms"),
        }
    }
}

/// The organisation responsible for maintaining the document.
pub type Custodian = Organization;
