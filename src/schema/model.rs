//! Schema descriptor types.
//!
//! A schema is a static tree of named types split across namespaces, the same
//! way the reporting API's protobuf definitions are:
//!
//! ```text
//! row        resource name -> type reference   (what FROM / first segments see)
//! resources  Campaign, AdGroup, ...            (structs with fields and nested types)
//! common     Metrics, Segments, ...            (shared structs)
//! enums      CampaignStatusEnum.CampaignStatus (enum values)
//! ```
//!
//! Field types are plain strings: a primitive name (`int64`), a fully
//! qualified reference (`<namespace>.enums.X.Y`, `<namespace>.common.X`) or a
//! short name resolved through [`Schema::resolve_type`](super::Schema::resolve_type).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{SchemaError, SchemaResult};

/// Scalar types that can only appear at the end of a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Int64,
    Int32,
    Float,
    Double,
    Bool,
}

impl PrimitiveType {
    /// Parse a primitive type name as it appears in the schema.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(PrimitiveType::String),
            "int64" => Some(PrimitiveType::Int64),
            "int32" => Some(PrimitiveType::Int32),
            "float" => Some(PrimitiveType::Float),
            "double" => Some(PrimitiveType::Double),
            "bool" => Some(PrimitiveType::Bool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Bool => "bool",
        }
    }
}

/// A field declaration inside a struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Type reference (primitive name, qualified or short type name).
    #[serde(rename = "type")]
    pub type_ref: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,

    /// Protobuf-style label; `"repeated"` is equivalent to `repeated: true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl FieldDef {
    /// A singular field of the given type.
    pub fn new(type_ref: impl Into<String>) -> Self {
        Self {
            type_ref: type_ref.into(),
            repeated: false,
            rule: None,
        }
    }

    /// A repeated field of the given type.
    pub fn repeated(type_ref: impl Into<String>) -> Self {
        Self {
            type_ref: type_ref.into(),
            repeated: true,
            rule: None,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated || self.rule.as_deref() == Some("repeated")
    }
}

/// A struct-like type: a resource, a common type or a nested message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    /// Short type name. Filled from the registry key when loaded from JSON.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,

    /// Types declared inside this one, visible by short name to its fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, StructDef>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a field declaration.
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDef) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Add a nested type. Its name is taken from the map key.
    pub fn with_nested(mut self, name: impl Into<String>, mut nested: StructDef) -> Self {
        let name = name.into();
        nested.name = name.clone();
        self.nested.insert(name, nested);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    fn fill_names(&mut self, name: &str) {
        if self.name.is_empty() {
            self.name = name.to_string();
        }
        for (nested_name, nested) in self.nested.iter_mut() {
            nested.fill_names(nested_name);
        }
    }
}

/// An enum type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,
}

impl EnumDef {
    pub fn new<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// The complete, immutable schema consulted by the query compiler.
///
/// Compilation only ever borrows the schema, so one instance can serve any
/// number of concurrent compile calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Package prefix of fully qualified references, e.g. `google.ads.googleads.v14`.
    pub(crate) namespace: String,

    /// Selectable top-level resources (the fields of a result row).
    #[serde(default)]
    pub(crate) row: BTreeMap<String, FieldDef>,

    #[serde(default)]
    pub(crate) resources: BTreeMap<String, StructDef>,

    #[serde(default)]
    pub(crate) common: BTreeMap<String, StructDef>,

    /// Enum wrappers, each holding one or more enums.
    #[serde(default)]
    pub(crate) enums: BTreeMap<String, BTreeMap<String, EnumDef>>,
}

impl Schema {
    /// Start building a schema in code.
    pub fn builder(namespace: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                namespace: namespace.into(),
                ..Default::default()
            },
        }
    }

    /// Parse a schema descriptor from JSON.
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let mut schema: Schema = serde_json::from_str(json)?;
        schema.fill_names();
        Ok(schema)
    }

    /// Load a schema descriptor from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Names of all selectable resources.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.row.keys().map(String::as_str)
    }

    pub(crate) fn resources_prefix(&self) -> String {
        format!("{}.resources.", self.namespace)
    }

    pub(crate) fn common_prefix(&self) -> String {
        format!("{}.common.", self.namespace)
    }

    pub(crate) fn enums_prefix(&self) -> String {
        format!("{}.enums.", self.namespace)
    }

    fn fill_names(&mut self) {
        for (name, def) in self.resources.iter_mut().chain(self.common.iter_mut()) {
            def.fill_names(name);
        }
        for group in self.enums.values_mut() {
            for (name, def) in group.iter_mut() {
                if def.name.is_empty() {
                    def.name = name.clone();
                }
            }
        }
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Register a resource type.
    pub fn resource(mut self, name: impl Into<String>, def: StructDef) -> Self {
        let name = name.into();
        self.schema.resources.insert(name.clone(), named(name, def));
        self
    }

    /// Register a common type.
    pub fn common(mut self, name: impl Into<String>, def: StructDef) -> Self {
        let name = name.into();
        self.schema.common.insert(name.clone(), named(name, def));
        self
    }

    /// Register an enum inside a wrapper (`<wrapper>.<name>` in references).
    pub fn enumeration<S: Into<String>>(
        mut self,
        wrapper: impl Into<String>,
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let name = name.into();
        self.schema
            .enums
            .entry(wrapper.into())
            .or_default()
            .insert(name.clone(), EnumDef::new(name, values));
        self
    }

    /// Expose a resource type as a selectable top-level resource.
    pub fn row_resource(mut self, name: impl Into<String>, type_name: &str) -> Self {
        let type_ref = format!("{}{}", self.schema.resources_prefix(), type_name);
        self.schema.row.insert(name.into(), FieldDef::new(type_ref));
        self
    }

    /// Expose a common type as a selectable top-level resource.
    pub fn row_common(mut self, name: impl Into<String>, type_name: &str) -> Self {
        let type_ref = format!("{}{}", self.schema.common_prefix(), type_name);
        self.schema.row.insert(name.into(), FieldDef::new(type_ref));
        self
    }

    pub fn build(mut self) -> Schema {
        self.schema.fill_names();
        self.schema
    }
}

fn named(name: String, mut def: StructDef) -> StructDef {
    def.name = name;
    def
}
