//! Compiled query representation.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, StructDef};

/// Extension syntax changing how a selected field's value is extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Customizer {
    /// `field~N`: take the N-th `~`-separated part of a resource name.
    /// Negative indices are kept as written; their meaning is up to the reader.
    ResourceIndex(i64),
    /// `field:a.b`: read a nested field of a struct value.
    NestedField(String),
}

/// The `FROM` target of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceInfo {
    /// Resource name as written in the query.
    pub name: String,
    /// Name of the resource's schema type.
    pub type_name: String,
    /// The resource's schema node.
    pub type_meta: StructDef,
}

/// A fully compiled query.
///
/// All per-column vectors share the selection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    query_text: String,
    fields: Vec<String>,
    column_names: Vec<String>,
    customizers: Vec<Option<Customizer>>,
    resource: ResourceInfo,
    column_types: Vec<FieldType>,
}

impl CompiledQuery {
    pub(crate) fn new(
        query_text: String,
        fields: Vec<String>,
        column_names: Vec<String>,
        customizers: Vec<Option<Customizer>>,
        resource: ResourceInfo,
        column_types: Vec<FieldType>,
    ) -> Self {
        Self {
            query_text,
            fields,
            column_names,
            customizers,
            resource,
            column_types,
        }
    }

    /// Normalized query text, ready to send to the reporting service.
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn customizers(&self) -> &[Option<Customizer>] {
        &self.customizers
    }

    pub fn resource(&self) -> &ResourceInfo {
        &self.resource
    }

    pub fn column_types(&self) -> &[FieldType] {
        &self.column_types
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the columns in selection order.
    pub fn columns(&self) -> impl Iterator<Item = Column<'_>> {
        (0..self.len()).map(move |index| self.column_at(index))
    }

    /// Find a column by its output name.
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        self.column_names
            .iter()
            .position(|n| n == name)
            .map(|index| self.column_at(index))
    }

    fn column_at(&self, index: usize) -> Column<'_> {
        Column {
            index,
            field: &self.fields[index],
            name: &self.column_names[index],
            customizer: self.customizers[index].as_ref(),
            field_type: &self.column_types[index],
        }
    }
}

/// A borrowed view of one compiled column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column<'a> {
    pub index: usize,
    pub field: &'a str,
    pub name: &'a str,
    pub customizer: Option<&'a Customizer>,
    pub field_type: &'a FieldType,
}
