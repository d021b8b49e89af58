//! The chemical-supply record and the column layout of the table.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One row of chemical-supply data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalRecord {
    pub id: u64,
    pub chemical_name: String,
    pub vendor: String,
    pub density: f64,
    pub viscosity: f64,
    pub packaging: String,
    pub pack_size: f64,
    pub unit: String,
    pub quantity: f64,
}

impl ChemicalRecord {
    /// A record with the given id and every other field empty or zero.
    #[must_use]
    pub fn blank(id: u64) -> Self {
        Self {
            id,
            chemical_name: String::new(),
            vendor: String::new(),
            density: 0.0,
            viscosity: 0.0,
            packaging: String::new(),
            pack_size: 0.0,
            unit: String::new(),
            quantity: 0.0,
        }
    }

    /// The value shown in `field`'s cell.
    #[must_use]
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::ChemicalName => FieldValue::Text(&self.chemical_name),
            Field::Vendor => FieldValue::Text(&self.vendor),
            Field::Density => FieldValue::Number(self.density),
            Field::Viscosity => FieldValue::Number(self.viscosity),
            Field::Packaging => FieldValue::Text(&self.packaging),
            Field::PackSize => FieldValue::Number(self.pack_size),
            Field::Unit => FieldValue::Text(&self.unit),
            Field::Quantity => FieldValue::Number(self.quantity),
        }
    }
}

/// An editable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ChemicalName,
    Vendor,
    Density,
    Viscosity,
    Packaging,
    PackSize,
    Unit,
    Quantity,
}

impl Field {
    /// Every editable field in display order.
    pub const ALL: [Self; 8] = [
        Self::ChemicalName,
        Self::Vendor,
        Self::Density,
        Self::Viscosity,
        Self::Packaging,
        Self::PackSize,
        Self::Unit,
        Self::Quantity,
    ];

    /// Column header and form label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ChemicalName => "Chemical Name",
            Self::Vendor => "Vendor",
            Self::Density => "Density",
            Self::Viscosity => "Viscosity",
            Self::Packaging => "Packaging",
            Self::PackSize => "Pack Size",
            Self::Unit => "Unit",
            Self::Quantity => "Quantity",
        }
    }

    /// Field name in the JSON document.
    #[must_use]
    pub const fn json_name(self) -> &'static str {
        match self {
            Self::ChemicalName => "chemicalName",
            Self::Vendor => "vendor",
            Self::Density => "density",
            Self::Viscosity => "viscosity",
            Self::Packaging => "packaging",
            Self::PackSize => "packSize",
            Self::Unit => "unit",
            Self::Quantity => "quantity",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Density | Self::Viscosity | Self::PackSize | Self::Quantity
        )
    }
}

/// A table column: the selection checkbox or one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Select,
    Field(Field),
}

impl Column {
    /// Column position to column, declared once. Position 0 is the checkbox.
    pub const ALL: [Self; 9] = [
        Self::Select,
        Self::Field(Field::ChemicalName),
        Self::Field(Field::Vendor),
        Self::Field(Field::Density),
        Self::Field(Field::Viscosity),
        Self::Field(Field::Packaging),
        Self::Field(Field::PackSize),
        Self::Field(Field::Unit),
        Self::Field(Field::Quantity),
    ];

    /// Number of table columns, selection column included.
    pub const COUNT: usize = Self::ALL.len();

    /// Looks up the column at `index`.
    #[must_use]
    pub fn at(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The record field behind this column, `None` for the checkbox column.
    #[must_use]
    pub const fn field(self) -> Option<Field> {
        match self {
            Self::Select => None,
            Self::Field(field) => Some(field),
        }
    }

    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Select => "",
            Self::Field(field) => field.label(),
        }
    }
}

/// A borrowed cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl FieldValue<'_> {
    /// Total order over cell values. Numbers use IEEE total ordering so a NaN
    /// left behind by an edit sorts after every number instead of breaking
    /// the sort.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}
