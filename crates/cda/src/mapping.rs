//! Declarative element-path bindings for the document model.
//!
//! Every model entity publishes a mapping table: one [`Binding`] per field naming the XML path
//! it is read from and its [`Cardinality`]. Entities read their fields through [`Fields`],
//! which resolves each field by name against the table, so the table is the single source of
//! truth for where data comes from.
//!
//! Path grammar:
//! - `a>b>c` follows child elements by local name
//! - a trailing `@name` reads an attribute of the matched element (`@code`, `location>addr@use`)
//! - the empty path is reserved for [`Cardinality::InnerXml`]
//!
//! Tables are checked once per process by [`validate_schema`] before the first parse.

use crate::model;
use crate::xml::Element;
use crate::{CdaError, CdaResult};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// How many values a binding produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// Text or attribute of the first match; empty string when absent.
    Scalar,
    /// First match mapped to a nested entity; the entity's default when absent.
    Nested,
    /// Every match mapped to a nested entity, in document order.
    Sequence,
    /// Verbatim inner markup of the root element.
    InnerXml,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Cardinality::Scalar => "scalar",
            Cardinality::Nested => "nested",
            Cardinality::Sequence => "sequence",
            Cardinality::InnerXml => "inner-xml",
        };
        f.pad(label)
    }
}

/// One row of a mapping table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub field: &'static str,
    pub path: &'static str,
    pub cardinality: Cardinality,
}

impl Binding {
    pub const fn scalar(field: &'static str, path: &'static str) -> Self {
        Self {
            field,
            path,
            cardinality: Cardinality::Scalar,
        }
    }

    pub const fn nested(field: &'static str, path: &'static str) -> Self {
        Self {
            field,
            path,
            cardinality: Cardinality::Nested,
        }
    }

    pub const fn sequence(field: &'static str, path: &'static str) -> Self {
        Self {
            field,
            path,
            cardinality: Cardinality::Sequence,
        }
    }

    pub const fn inner_xml(field: &'static str) -> Self {
        Self {
            field,
            path: "",
            cardinality: Cardinality::InnerXml,
        }
    }

    /// Element segments and optional trailing attribute of the path.
    fn split(&self) -> (Vec<&'static str>, Option<&'static str>) {
        let (elements, attribute) = match self.path.split_once('@') {
            Some((elements, attribute)) => (elements, Some(attribute)),
            None => (self.path, None),
        };
        let segments = if elements.is_empty() {
            Vec::new()
        } else {
            elements.split('>').collect()
        };
        (segments, attribute)
    }
}

/// An entity's complete mapping table.
pub type FieldTable = &'static [Binding];

/// A model entity that can be read from an element through its mapping table.
pub trait FromElement: Sized {
    /// Entity name used in diagnostics.
    const ENTITY: &'static str;

    /// Field bindings for this entity.
    const BINDINGS: FieldTable;

    /// Build the entity from resolved fields.
    fn from_fields(fields: &Fields<'_>) -> Self;
}

/// Map `element` into `T` using `T`'s mapping table.
pub(crate) fn map_element<T: FromElement>(element: &Element) -> T {
    T::from_fields(&Fields::new(element, T::ENTITY, T::BINDINGS, None))
}

/// Field accessor over one element, driven by an entity's mapping table.
pub struct Fields<'a> {
    element: &'a Element,
    entity: &'static str,
    bindings: FieldTable,
    inner_xml: Option<&'a str>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(
        element: &'a Element,
        entity: &'static str,
        bindings: FieldTable,
        inner_xml: Option<&'a str>,
    ) -> Self {
        Self {
            element,
            entity,
            bindings,
            inner_xml,
        }
    }

    fn binding(&self, field: &str, expected: Cardinality) -> Option<&'static Binding> {
        match self.bindings.iter().find(|b| b.field == field) {
            Some(binding) if binding.cardinality == expected => Some(binding),
            Some(binding) => {
                tracing::warn!(
                    entity = self.entity,
                    field,
                    declared = %binding.cardinality,
                    requested = %expected,
                    "mapping cardinality mismatch"
                );
                None
            }
            None => {
                tracing::warn!(entity = self.entity, field, "field missing from mapping table");
                None
            }
        }
    }

    /// Text (or attribute, for `@` paths) of the first element matching the field's path.
    pub fn scalar(&self, field: &str) -> String {
        let Some(binding) = self.binding(field, Cardinality::Scalar) else {
            return String::new();
        };
        let (segments, attribute) = binding.split();
        let Some(element) = self.element.first(&segments) else {
            return String::new();
        };
        match attribute {
            Some(name) => element.attribute(name).unwrap_or_default().to_string(),
            None => element.text.clone(),
        }
    }

    /// First element matching the field's path, mapped to `T`.
    pub fn nested<T: FromElement + Default>(&self, field: &str) -> T {
        self.binding(field, Cardinality::Nested)
            .and_then(|binding| self.element.first(&binding.split().0))
            .map(map_element::<T>)
            .unwrap_or_default()
    }

    /// Every element matching the field's path, each mapped to `T`.
    pub fn sequence<T: FromElement>(&self, field: &str) -> Vec<T> {
        let Some(binding) = self.binding(field, Cardinality::Sequence) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        self.element.select(&binding.split().0, &mut found);
        found.into_iter().map(map_element::<T>).collect()
    }

    /// Verbatim inner markup of the root element.
    pub fn inner_xml(&self, field: &str) -> String {
        match self.binding(field, Cardinality::InnerXml) {
            Some(_) => self.inner_xml.unwrap_or_default().to_string(),
            None => String::new(),
        }
    }
}

/// One entity's mapping table.
#[derive(Clone, Copy, Debug)]
pub struct EntityTable {
    pub entity: &'static str,
    pub bindings: FieldTable,
}

const fn table<T: FromElement>() -> EntityTable {
    EntityTable {
        entity: T::ENTITY,
        bindings: T::BINDINGS,
    }
}

/// Every mapping table in the document model.
pub fn schema() -> [EntityTable; 18] {
    [
        table::<model::ClinicalDocument>(),
        table::<model::RecordTarget>(),
        table::<model::PatientRole>(),
        table::<model::Author>(),
        table::<model::Organization>(),
        table::<model::IntendedRecipient>(),
        table::<model::EncompassingEncounter>(),
        table::<model::HealthCareFacility>(),
        table::<model::StructuredBodySection>(),
        table::<model::Organizer>(),
        table::<model::Address>(),
        table::<model::Identifier>(),
        table::<model::Telecom>(),
        table::<model::Code>(),
        table::<model::PersonName>(),
        table::<model::Timestamp>(),
        table::<model::VersionNumber>(),
        table::<model::Device>(),
    ]
}

/// Validate every mapping table in the model.
///
/// # Errors
///
/// Returns [`CdaError::Mapping`] for the first table defect found.
pub fn validate_schema() -> CdaResult<()> {
    schema()
        .iter()
        .try_for_each(|table| validate_table(table.entity, table.bindings))
}

/// Validate the model's mapping tables once per process, caching the outcome.
pub(crate) fn ensure_schema_valid() -> CdaResult<()> {
    static CHECKED: OnceLock<Result<(), (&'static str, &'static str, String)>> = OnceLock::new();

    let outcome = CHECKED.get_or_init(|| {
        validate_schema().map_err(|err| match err {
            CdaError::Mapping {
                entity,
                field,
                reason,
            } => (entity, field, reason),
            other => ("<schema>", "<schema>", other.to_string()),
        })
    });

    outcome
        .clone()
        .map_err(|(entity, field, reason)| CdaError::Mapping {
            entity,
            field,
            reason,
        })
}

/// Validate one entity's mapping table.
///
/// # Errors
///
/// Returns [`CdaError::Mapping`] if a field name is empty or repeated, a path is malformed,
/// an attribute path is bound to a nested or sequence field, or an inner-XML binding has a path.
pub fn validate_table(entity: &'static str, bindings: FieldTable) -> CdaResult<()> {
    let mut seen = HashSet::new();

    for binding in bindings {
        let fail = |reason: String| CdaError::Mapping {
            entity,
            field: binding.field,
            reason,
        };

        if binding.field.is_empty() {
            return Err(fail("field name cannot be empty".into()));
        }
        if !seen.insert(binding.field) {
            return Err(fail("field is bound more than once".into()));
        }

        if binding.cardinality == Cardinality::InnerXml {
            if !binding.path.is_empty() {
                return Err(fail("inner-xml bindings take the empty path".into()));
            }
            continue;
        }

        if binding.path.is_empty() {
            return Err(fail("path cannot be empty".into()));
        }
        if binding.path.matches('@').count() > 1 {
            return Err(fail(format!("path '{}' names more than one attribute", binding.path)));
        }

        let (segments, attribute) = binding.split();
        if let Some(bad) = segments.iter().find(|s| !is_xml_name(s)) {
            return Err(fail(format!(
                "path '{}' has invalid element segment '{bad}'",
                binding.path
            )));
        }

        match attribute {
            Some(name) if !is_xml_name(name) => {
                return Err(fail(format!(
                    "path '{}' has invalid attribute name '{name}'",
                    binding.path
                )));
            }
            Some(_) if binding.cardinality != Cardinality::Scalar => {
                return Err(fail(format!(
                    "{} bindings cannot target an attribute",
                    binding.cardinality
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
