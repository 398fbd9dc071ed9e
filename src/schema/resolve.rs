//! Type resolution over the schema.
//!
//! References are resolved in a fixed order:
//!
//! 1. primitive type names
//! 2. fully qualified enum references (`<ns>.enums.Wrapper.Enum`)
//! 3. fully qualified common/resource references (`<ns>.common.X`, `<ns>.resources.X`)
//! 4. short names: nested type of the current struct, then resources, then common types

use serde::{Deserialize, Serialize};

use super::error::{SchemaError, SchemaResult};
use super::model::{EnumDef, PrimitiveType, Schema, StructDef};

/// A resolved schema type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeRef<'a> {
    Primitive(PrimitiveType),
    Enum(&'a EnumDef),
    /// A common type or a nested type.
    Struct(&'a StructDef),
    /// A type from the resource registry.
    Resource(&'a StructDef),
}

impl<'a> TypeRef<'a> {
    pub fn kind(&self) -> FieldTypeKind {
        match self {
            TypeRef::Primitive(_) => FieldTypeKind::Primitive,
            TypeRef::Enum(_) => FieldTypeKind::Enum,
            TypeRef::Struct(_) | TypeRef::Resource(_) => FieldTypeKind::Struct,
        }
    }

    pub fn type_name(&self) -> &'a str {
        match self {
            TypeRef::Primitive(p) => p.as_str(),
            TypeRef::Enum(e) => &e.name,
            TypeRef::Struct(s) | TypeRef::Resource(s) => &s.name,
        }
    }

    /// The struct node, if this type can be descended into.
    pub fn as_struct(&self) -> Option<&'a StructDef> {
        match self {
            TypeRef::Struct(s) | TypeRef::Resource(s) => Some(s),
            _ => None,
        }
    }
}

/// Coarse classification of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldTypeKind {
    Primitive,
    Enum,
    Struct,
}

impl std::fmt::Display for FieldTypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldTypeKind::Primitive => write!(f, "primitive"),
            FieldTypeKind::Enum => write!(f, "enum"),
            FieldTypeKind::Struct => write!(f, "struct"),
        }
    }
}

/// Owned type descriptor of a compiled column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub kind: FieldTypeKind,
    pub type_name: String,
    pub repeated: bool,
}

/// Result of walking a field path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedField<'a> {
    pub ty: TypeRef<'a>,
    pub repeated: bool,
}

impl ResolvedField<'_> {
    pub fn to_field_type(&self) -> FieldType {
        FieldType {
            kind: self.ty.kind(),
            type_name: self.ty.type_name().to_string(),
            repeated: self.repeated,
        }
    }
}

impl Schema {
    /// Look up a selectable top-level resource by name.
    pub fn resource(&self, name: &str) -> SchemaResult<&StructDef> {
        let field = self
            .row
            .get(name)
            .ok_or_else(|| SchemaError::UnknownResource(name.to_string()))?;

        let type_ref = field.type_ref.as_str();
        let type_name = type_ref.rsplit('.').next().unwrap_or(type_ref);

        let found = if type_ref.starts_with(&self.resources_prefix()) {
            self.resources.get(type_name)
        } else if type_ref.starts_with(&self.common_prefix()) {
            self.common.get(type_name)
        } else {
            None
        };

        found.ok_or_else(|| SchemaError::UnknownResourceType {
            resource: name.to_string(),
            type_ref: type_ref.to_string(),
        })
    }

    /// Resolve a type reference as seen from a field of `scope`.
    pub fn resolve_type<'a>(&'a self, scope: &'a StructDef, type_ref: &str) -> SchemaResult<TypeRef<'a>> {
        if let Some(primitive) = PrimitiveType::from_str(type_ref) {
            return Ok(TypeRef::Primitive(primitive));
        }

        if let Some(rest) = type_ref.strip_prefix(&self.enums_prefix()) {
            let mut parts = rest.split('.');
            let (Some(wrapper), Some(name)) = (parts.next(), parts.next()) else {
                return Err(SchemaError::InvalidReference(type_ref.to_string()));
            };
            return self
                .enums
                .get(wrapper)
                .and_then(|group| group.get(name))
                .map(TypeRef::Enum)
                .ok_or_else(|| SchemaError::UnknownEnum(type_ref.to_string()));
        }

        if let Some(rest) = type_ref.strip_prefix(&self.common_prefix()) {
            let name = first_segment(rest, type_ref)?;
            return self
                .common
                .get(name)
                .map(TypeRef::Struct)
                .ok_or_else(|| unknown_type(type_ref, scope));
        }

        if let Some(rest) = type_ref.strip_prefix(&self.resources_prefix()) {
            let name = first_segment(rest, type_ref)?;
            return self
                .resources
                .get(name)
                .map(TypeRef::Resource)
                .ok_or_else(|| unknown_type(type_ref, scope));
        }

        // Some fields refer to common types by their short name only.
        if let Some(nested) = scope.nested.get(type_ref) {
            Ok(TypeRef::Struct(nested))
        } else if let Some(resource) = self.resources.get(type_ref) {
            Ok(TypeRef::Resource(resource))
        } else if let Some(common) = self.common.get(type_ref) {
            Ok(TypeRef::Struct(common))
        } else {
            Err(unknown_type(type_ref, scope))
        }
    }

    /// Walk `path` starting at `root` and resolve the type of its last segment.
    ///
    /// Primitive and enum types, as well as repeated fields, may only occur at
    /// the last segment. Once any segment is repeated the result is repeated.
    pub fn field_type<'a>(&'a self, root: &'a StructDef, path: &[&str]) -> SchemaResult<ResolvedField<'a>> {
        let Some((last, init)) = path.split_last() else {
            return Err(SchemaError::EmptyPath(root.name.clone()));
        };

        let mut current = root;
        let mut repeated = false;

        for segment in init {
            let step = self.step(current, segment, path, false)?;
            repeated |= step.repeated;
            current = step
                .ty
                .as_struct()
                .ok_or_else(|| SchemaError::EmptyPath(current.name.clone()))?;
        }

        let step = self.step(current, last, path, true)?;
        Ok(ResolvedField {
            ty: step.ty,
            repeated: repeated || step.repeated,
        })
    }

    fn step<'a>(
        &'a self,
        current: &'a StructDef,
        segment: &str,
        path: &[&str],
        is_last: bool,
    ) -> SchemaResult<ResolvedField<'a>> {
        let field = current
            .field(segment)
            .ok_or_else(|| SchemaError::UnknownField {
                type_name: current.name.clone(),
                field: segment.to_string(),
                path: path.join("."),
            })?;

        let repeated = field.is_repeated();
        if repeated && !is_last {
            return Err(SchemaError::RepeatedInMiddle {
                field: segment.to_string(),
                path: path.join("."),
            });
        }

        let ty = self.resolve_type(current, &field.type_ref)?;
        if !is_last {
            match ty {
                TypeRef::Primitive(p) => {
                    return Err(SchemaError::NonTerminalPrimitive {
                        field: segment.to_string(),
                        path: path.join("."),
                        type_name: p.as_str().to_string(),
                    })
                }
                TypeRef::Enum(e) => {
                    return Err(SchemaError::NonTerminalEnum {
                        field: segment.to_string(),
                        path: path.join("."),
                        type_name: e.name.clone(),
                    })
                }
                TypeRef::Struct(_) | TypeRef::Resource(_) => {}
            }
        }

        Ok(ResolvedField { ty, repeated })
    }
}

fn first_segment<'r>(rest: &'r str, type_ref: &str) -> SchemaResult<&'r str> {
    match rest.split('.').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(SchemaError::InvalidReference(type_ref.to_string())),
    }
}

fn unknown_type(type_ref: &str, scope: &StructDef) -> SchemaError {
    SchemaError::UnknownType {
        type_ref: type_ref.to_string(),
        scope: scope.name.clone(),
    }
}
