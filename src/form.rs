//! Form values for the add and edit views.

use crate::error::{Error, Result};
use crate::record::{ChemicalRecord, Field};

/// Notice shown when a new record fails the creation checks.
pub const VALIDATION_MESSAGE: &str = "Please fill in all fields correctly.";

/// Raw text typed into the add or edit view, one string per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForm {
    /// The record id, carried as a hidden field.
    pub id: u64,
    values: [String; Field::ALL.len()],
    /// Index into [`Field::ALL`] of the field being typed into.
    pub active_field: usize,
}

impl RecordForm {
    /// Pre-fills the form from a record.
    #[must_use]
    pub fn from_record(record: &ChemicalRecord) -> Self {
        Self {
            id: record.id,
            values: Field::ALL.map(|field| record.value(field).to_string()),
            active_field: 0,
        }
    }

    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        &self.values[Self::slot(field)]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[Self::slot(field)] = value.into();
    }

    /// Builder-style [`RecordForm::set`].
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    #[must_use]
    pub const fn active(&self) -> Field {
        Field::ALL[self.active_field % Field::ALL.len()]
    }

    pub const fn active_value_mut(&mut self) -> &mut String {
        &mut self.values[self.active_field % Field::ALL.len()]
    }

    pub const fn next_field(&mut self) {
        self.active_field = (self.active_field + 1) % Field::ALL.len();
    }

    pub const fn prev_field(&mut self) {
        self.active_field = if self.active_field == 0 {
            Field::ALL.len() - 1
        } else {
            self.active_field - 1
        };
    }

    /// Builds a new record, enforcing the creation checks: text fields
    /// non-empty, density, viscosity and pack size above zero, quantity zero
    /// or more.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any check fails.
    pub fn validate_new(&self, id: u64) -> Result<ChemicalRecord> {
        let record = self.to_record_with_id(id);
        let texts_present = [
            &record.chemical_name,
            &record.vendor,
            &record.packaging,
            &record.unit,
        ]
        .iter()
        .all(|s| !s.is_empty());

        // NaN fails every comparison, so unparseable input is rejected here.
        let numbers_valid = record.density > 0.0
            && record.viscosity > 0.0
            && record.pack_size > 0.0
            && record.quantity >= 0.0;

        if texts_present && numbers_valid {
            Ok(record)
        } else {
            Err(Error::Validation(VALIDATION_MESSAGE.to_string()))
        }
    }

    /// Converts the form to a record without any checks, keeping its own id.
    #[must_use]
    pub fn to_record(&self) -> ChemicalRecord {
        self.to_record_with_id(self.id)
    }

    fn to_record_with_id(&self, id: u64) -> ChemicalRecord {
        let text = |field| self.get(field).to_string();
        let number = |field| parse_number(self.get(field));
        ChemicalRecord {
            id,
            chemical_name: text(Field::ChemicalName),
            vendor: text(Field::Vendor),
            density: number(Field::Density),
            viscosity: number(Field::Viscosity),
            packaging: text(Field::Packaging),
            pack_size: number(Field::PackSize),
            unit: text(Field::Unit),
            quantity: number(Field::Quantity),
        }
    }

    fn slot(field: Field) -> usize {
        Field::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default()
    }
}

/// Lenient numeric parse: blank input is zero, anything unparseable is NaN.
/// Only finite values count as parseable, so `inf` and `nan` are NaN too.
#[must_use]
pub fn parse_number(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(f64::NAN)
}
