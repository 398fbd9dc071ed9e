//! Query compiler: query text + schema → [`CompiledQuery`].
//!
//! ```text
//! text → strip comments → select list → expressions → column names
//!                       → FROM resource ─┐
//!                       → field paths ───┴→ schema resolution → column types
//! ```

use tracing::debug;

use super::error::{CompileError, CompileResult};
use super::expr::{parse_select_item, SelectExpression};
use super::normalize::{normalize_query, QueryParams};
use super::text::{from_resource, select_span, split_select_list, strip_comments};
use super::types::{CompiledQuery, Customizer, ResourceInfo};
use crate::schema::{FieldType, Schema, TypeRef};

/// Compiles queries against one schema.
///
/// The compiler only borrows the schema, so it is cheap to create and can be
/// shared freely.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'s> {
    schema: &'s Schema,
}

impl<'s> QueryCompiler<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Compile a query. `params` fill `{name}` placeholders that are still
    /// present in the text; any missing one is an error.
    pub fn compile(&self, query: &str, params: &QueryParams) -> CompileResult<CompiledQuery> {
        let query = strip_comments(query);
        let normalized = normalize_query(&query, params)?;

        let expressions = parse_select_list(&query)?;

        let mut fields = Vec::with_capacity(expressions.len());
        let mut column_names: Vec<String> = Vec::with_capacity(expressions.len());
        let mut customizers = Vec::with_capacity(expressions.len());

        for (index, expr) in expressions.into_iter().enumerate() {
            let column_name = expr.column_name();
            if column_names.contains(&column_name) {
                return Err(CompileError::DuplicateColumn {
                    name: column_name,
                    index,
                });
            }
            column_names.push(column_name);
            fields.push(expr.field);
            customizers.push(expr.customizer);
        }

        let resource = self.resolve_resource(&query)?;

        let column_types = fields
            .iter()
            .zip(&customizers)
            .map(|(field, customizer)| self.column_type(field, customizer.as_ref()))
            .collect::<CompileResult<Vec<_>>>()?;

        debug!(
            resource = %resource.name,
            columns = fields.len(),
            "compiled query"
        );

        Ok(CompiledQuery::new(
            normalized,
            fields,
            column_names,
            customizers,
            resource,
            column_types,
        ))
    }

    fn resolve_resource(&self, query: &str) -> CompileResult<ResourceInfo> {
        let name = from_resource(query).ok_or(CompileError::MissingResource)?;
        let resource = self.schema.resource(name)?;
        Ok(ResourceInfo {
            name: name.to_string(),
            type_name: resource.name.clone(),
            type_meta: resource.clone(),
        })
    }

    /// Resolve the type of one selected field.
    ///
    /// The first path segment names the field's own resource, which may
    /// differ from the `FROM` resource (e.g. `metrics.clicks FROM campaign`).
    pub fn column_type(&self, field: &str, customizer: Option<&Customizer>) -> CompileResult<FieldType> {
        let mut parts = field.split('.');
        let root_name = parts.next().unwrap_or_default();
        let path: Vec<&str> = parts.collect();

        let root = self.schema.resource(root_name)?;
        let resolved = self.schema.field_type(root, &path)?;

        let Some(Customizer::NestedField(nested_path)) = customizer else {
            return Ok(resolved.to_field_type());
        };

        let base = match resolved.ty {
            TypeRef::Struct(s) | TypeRef::Resource(s) => s,
            TypeRef::Primitive(_) | TypeRef::Enum(_) => {
                return Err(CompileError::NestedFieldOnScalar {
                    field: field.to_string(),
                    kind: resolved.ty.kind(),
                    type_name: resolved.ty.type_name().to_string(),
                })
            }
        };

        let nested_parts: Vec<&str> = nested_path.split('.').collect();
        let nested = self.schema.field_type(base, &nested_parts)?;
        let mut field_type = nested.to_field_type();
        field_type.repeated |= resolved.repeated;
        Ok(field_type)
    }
}

/// Compile `query` against `schema`.
pub fn compile(query: &str, params: &QueryParams, schema: &Schema) -> CompileResult<CompiledQuery> {
    QueryCompiler::new(schema).compile(query, params)
}

fn parse_select_list(query: &str) -> CompileResult<Vec<SelectExpression>> {
    let span = select_span(query).ok_or(CompileError::MissingSelect)?;
    let items = split_select_list(&query[span]);
    if items.is_empty() {
        return Err(CompileError::NoFields);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_select_item(item, index))
        .collect()
}
