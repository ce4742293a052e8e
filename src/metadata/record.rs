//! Per-column metadata records.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const DESCRIPTION: &str = "Description";
pub const UNIT: &str = "Unit";
pub const SYMBOL: &str = "Symbol";

/// Fields returned by [`get_metadata`](super::get_metadata) unless the
/// caller asks for others. Also the leading order in auto-discovered
/// summaries.
pub const DEFAULT_FIELDS: &[&str] = &[DESCRIPTION, UNIT, SYMBOL];

/// Field values attached to a single column.
///
/// Keys are case-sensitive and kept in first-insertion order. Setting a
/// field that already exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMetadata {
    entries: Vec<(String, String)>,
}

impl ColumnMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == field) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Merges a record field by field. Missing values leave the current
    /// value untouched; nothing is ever cleared.
    pub fn merge(&mut self, record: &MetadataRecord) {
        for (field, value) in record.iter() {
            if let Some(value) = value {
                self.set(field, value);
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Projects onto `fields`, in that order, with unset fields as `None`.
    pub fn project(&self, fields: &[&str]) -> MetadataRecord {
        fields
            .iter()
            .map(|f| ((*f).to_owned(), self.get(f).map(str::to_owned)))
            .collect()
    }
}

// Serialized as a JSON object; field order survives a round-trip.
impl Serialize for ColumnMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ColumnMetadata;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of metadata field names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut metadata = ColumnMetadata::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    metadata.set(k, v);
                }
                Ok(metadata)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// An ordered set of fields where each value may be missing.
///
/// This is what reads produce (requested fields that are unset come back as
/// `None`) and what writes consume (`None` means "leave as is").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    fields: Vec<(String, Option<String>)>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert) for a present value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    /// Sets `field`, replacing an earlier value for the same name.
    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        let field = field.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Value of `field`; `None` when the field is absent or missing.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == field)
    }

    /// The Description, if present and not blank.
    pub fn description(&self) -> Option<&str> {
        self.get(DESCRIPTION).filter(|d| !d.trim().is_empty())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overlays `other`: its present values win, its missing values only
    /// add the field name if it was not there yet.
    pub fn merge(&mut self, other: Self) {
        for (field, value) in other.fields {
            match value {
                Some(v) => self.insert(field, Some(v)),
                None if !self.contains_field(&field) => self.fields.push((field, None)),
                None => {}
            }
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for MetadataRecord {
    fn from_iter<T: IntoIterator<Item = (K, Option<String>)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Records keyed by target column name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecords {
    entries: Vec<(String, MetadataRecord)>,
}

impl MetadataRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record. A second record for the same column is merged into
    /// the first, later values winning.
    pub fn insert(&mut self, column: impl Into<String>, record: MetadataRecord) {
        let column = column.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => existing.merge(record),
            None => self.entries.push((column, record)),
        }
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, record: MetadataRecord) -> Self {
        self.insert(column, record);
        self
    }

    pub fn get(&self, column: &str) -> Option<&MetadataRecord> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, r)| r)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataRecord)> {
        self.entries.iter().map(|(c, r)| (c.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for MetadataRecords {
    type Item = (String, MetadataRecord);
    type IntoIter = std::vec::IntoIter<(String, MetadataRecord)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataRecord)> for MetadataRecords {
    fn from_iter<T: IntoIterator<Item = (K, MetadataRecord)>>(iter: T) -> Self {
        let mut records = Self::new();
        for (k, r) in iter {
            records.insert(k, r);
        }
        records
    }
}
