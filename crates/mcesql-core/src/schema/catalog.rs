//! Schema catalog - data extensions and their fields

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::types::FieldType;

/// Known data extensions, looked up case-insensitively by name or customer key
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    /// Lowercased name -> table
    tables: IndexMap<String, SchemaTable>,
    /// Lowercased customer key -> lowercased name
    keys: IndexMap<String, String>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from an ordered list of tables
    pub fn from_tables(tables: impl IntoIterator<Item = SchemaTable>) -> Result<Self, SchemaError> {
        let mut catalog = Self::new();
        for table in tables {
            catalog.add_table(table)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of data extensions
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let tables: Vec<SchemaTable> = serde_json::from_str(json)?;
        Self::from_tables(tables)
    }

    /// Add a table to the catalog
    pub fn add_table(&mut self, table: SchemaTable) -> Result<(), SchemaError> {
        let name = table.name.to_lowercase();
        if self.tables.contains_key(&name) {
            return Err(SchemaError::DuplicateTable(table.name));
        }
        if !table.customer_key.is_empty() {
            self.keys
                .insert(table.customer_key.to_lowercase(), name.clone());
        }
        self.tables.insert(name, table);
        Ok(())
    }

    /// Look up a table by name or customer key
    ///
    /// Accepts the raw reference text, so `[My DE]` and `ENT.[My DE]` both
    /// resolve to the `My DE` data extension.
    pub fn find(&self, reference: &str) -> Option<&SchemaTable> {
        let name = QualifiedName::parse(reference);
        let needle = name.name.to_lowercase();
        self.tables.get(&needle).or_else(|| {
            self.keys
                .get(&needle)
                .and_then(|table_name| self.tables.get(table_name))
        })
    }

    /// Check if a table exists
    pub fn table_exists(&self, reference: &str) -> bool {
        self.find(reference).is_some()
    }

    pub fn tables(&self) -> impl Iterator<Item = &SchemaTable> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Data extension reference, optionally prefixed with `ENT.` for shared extensions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
        }
    }

    /// Parse a reference like `ENT.[Shared DE]`, `[My DE]` or `Contacts`
    pub fn parse(s: &str) -> Self {
        let parts = split_dotted(s.trim());
        match parts.as_slice() {
            [] => Self::new(""),
            [name] => Self::new(unquote(name)),
            [.., prefix, name] => Self {
                prefix: Some(unquote(prefix)),
                name: unquote(name),
            },
        }
    }

    /// Lowercased name without prefix, used for comparisons
    pub fn normalized(&self) -> String {
        self.name.to_lowercase()
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}.{}", prefix, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Split on dots that are not inside `[...]` or `"..."`
fn split_dotted(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_bracket = false;
    let mut in_quote = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            '"' if !in_bracket => in_quote = !in_quote,
            '.' if !in_bracket && !in_quote => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

/// Strip `[...]` or `"..."` and undo `]]` / `""` escaping
pub fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('[') && s.ends_with(']') {
        s[1..s.len() - 1].replace("]]", "]")
    } else if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\"\"", "\"")
    } else {
        s.to_string()
    }
}

/// Data extension definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTable {
    pub name: String,
    #[serde(default)]
    pub customer_key: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl SchemaTable {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            customer_key: name.clone(),
            name,
            folder_id: None,
            is_shared: false,
            fields: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.customer_key = key.into();
        self
    }

    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        // Case-insensitive lookup
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Check if a field exists
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

fn default_nullable() -> bool {
    true
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_primary_key: false,
            is_nullable: true,
            max_length: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_parse() {
        let name = QualifiedName::parse("Contacts");
        assert_eq!(name.prefix, None);
        assert_eq!(name.name, "Contacts");

        let name = QualifiedName::parse("ENT.[Shared Subscribers]");
        assert_eq!(name.prefix, Some("ENT".to_string()));
        assert_eq!(name.name, "Shared Subscribers");

        let name = QualifiedName::parse("[odd.name]");
        assert_eq!(name.prefix, None);
        assert_eq!(name.name, "odd.name");
    }

    #[test]
    fn test_find_by_name_or_key() {
        let catalog = SchemaCatalog::from_tables([
            SchemaTable::new("Master Subscribers").with_key("MASTER_SUBS"),
            SchemaTable::new("Orders"),
        ])
        .unwrap();

        assert!(catalog.table_exists("[master subscribers]"));
        assert!(catalog.table_exists("master_subs"));
        assert!(catalog.table_exists("ENT.Orders"));
        assert!(!catalog.table_exists("Customers"));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let result = SchemaCatalog::from_tables([SchemaTable::new("A"), SchemaTable::new("a")]);
        assert!(matches!(result, Err(SchemaError::DuplicateTable(_))));
    }

    #[test]
    fn test_from_json() {
        let catalog = SchemaCatalog::from_json(
            r#"[{"name":"Contacts","customerKey":"CK","isShared":true,
                 "fields":[{"name":"Id","type":"Number","isPrimaryKey":true,"isNullable":false},
                           {"name":"Email","type":"EmailAddress"}]}]"#,
        )
        .unwrap();
        let table = catalog.find("ck").unwrap();
        assert!(table.is_shared);
        assert_eq!(table.field("email").unwrap().field_type, FieldType::EmailAddress);
        assert!(table.field("EMAIL").unwrap().is_nullable);
        assert!(table.field("id").unwrap().is_primary_key);
    }
}
