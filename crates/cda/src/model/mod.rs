//! CDA document model.
//!
//! The [`ClinicalDocument`] aggregate owns every nested entity. Each entity implements
//! [`FromElement`](crate::mapping::FromElement) and publishes the mapping table it is read with.

mod author;
mod document;
mod participants;
mod record_target;
mod section;
mod types;

pub use author::{Author, Custodian, Device, Organization};
pub use document::{ClinicalDocument, ROOT_ELEMENT};
pub use participants::{EncompassingEncounter, HealthCareFacility, IntendedRecipient};
pub use record_target::{PatientRole, RecordTarget};
pub use section::{Organizer, StructuredBodySection};
pub use types::{
    Address, Code, Identifier, PersonName, Telecom, Timestamp, VersionNumber, NOT_AVAILABLE,
};
