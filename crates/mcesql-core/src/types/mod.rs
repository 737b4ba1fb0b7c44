//! Data extension field types

use serde::{Deserialize, Serialize};

/// Field types a data extension column can carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Decimal,
    Date,
    Boolean,
    EmailAddress,
    Phone,
    Locale,
    /// Anything the metadata service reports that we do not model
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Get a human-readable name for this type
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Decimal => "Decimal",
            FieldType::Date => "Date",
            FieldType::Boolean => "Boolean",
            FieldType::EmailAddress => "EmailAddress",
            FieldType::Phone => "Phone",
            FieldType::Locale => "Locale",
            FieldType::Unknown => "Unknown",
        }
    }
}
