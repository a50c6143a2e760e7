//! The attribute set a template receives for one class.
//!
//! This is the only view of the class graph templates get, so everything language specific
//! (type spelling, identifier casing) is settled here through the [`Backend`] and the graph
//! itself stays free of formatting concerns.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use super::{literal_text, Backend};
use crate::config::Config;
use crate::naming::make_unique;
use crate::parser::{ClassDescriptor, FieldDescriptor, PrimitiveKind, TypeDescriptor};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    /// Class name without prefix.
    pub name: String,
    pub prefixed_name: String,
    pub prefix: String,
    pub description: Option<String>,
    pub fields: Vec<FieldContext>,
    /// Enums declared by this class's fields, by name.
    pub enums: Vec<EnumContext>,
    pub super_classes: Vec<String>,
    pub interfaces: Vec<String>,
    pub imports: Vec<String>,
    /// Other classes this class refers to, by name.
    pub dependencies: Vec<String>,
    pub supports_additional_properties: bool,
    /// Declared type of the values in the additional properties bag, if constrained.
    pub additional_properties_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldContext {
    pub name: String,
    pub json_key: String,
    pub type_name: String,
    /// One of `primitive`, `wrapped`, `array`, `enum`, `class`.
    pub kind: &'static str,
    pub optional: bool,
    pub description: Option<String>,
    /// Class held by the field, directly or as array element.
    pub class_ref: Option<String>,
    pub item_type: Option<String>,
    pub item_kind: Option<&'static str>,
    pub enum_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumContext {
    pub name: String,
    pub base: PrimitiveKind,
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumCase {
    pub ordinal: usize,
    pub name: String,
    /// Literal as written in JSON, e.g. `"north"` or `3`.
    pub literal: String,
    /// Literal without JSON quoting.
    pub text: String,
}

impl RenderContext {
    /// The context as an ordered JSON object, for engines that work on plain JSON data.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Flattens one class into the attributes its templates need. Pure: the same inputs always
/// give the same context.
pub fn to_context(class: &ClassDescriptor, backend: &dyn Backend, config: &Config) -> RenderContext {
    let mut fields = class
        .fields
        .iter()
        .map(|field| field_context(field, backend))
        .collect::<Vec<_>>();
    // Distinct model names can still meet after backend casing, `first_name` and `firstName`.
    make_unique(fields.iter_mut().map(|f| &mut f.name));

    let mut enums: Vec<EnumContext> = vec![];
    for field in &class.fields {
        if let Some(enum_context) = enum_context(&field.field_type, backend) {
            if !enums.iter().any(|e| e.name == enum_context.name) {
                enums.push(enum_context);
            }
        }
    }
    enums.sort_by(|a, b| a.name.cmp(&b.name));

    let dependencies = class
        .fields
        .iter()
        .filter_map(|field| field.field_type.referenced_class())
        .chain(
            class
                .additional_properties_type
                .as_ref()
                .and_then(TypeDescriptor::referenced_class),
        )
        .filter(|name| *name != class.name)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    RenderContext {
        name: class.base_name.clone(),
        prefixed_name: class.name.clone(),
        prefix: config.prefix.clone(),
        description: class.description.clone(),
        fields,
        enums,
        super_classes: or_defaults(&class.super_classes, backend.default_super_classes()),
        interfaces: or_defaults(&class.interfaces, backend.default_interfaces()),
        imports: config.import_files.clone(),
        dependencies,
        supports_additional_properties: class.supports_additional_properties,
        additional_properties_type: class
            .additional_properties_type
            .as_ref()
            .map(|t| backend.type_name(t)),
    }
}

fn field_context(field: &FieldDescriptor, backend: &dyn Backend) -> FieldContext {
    let item = match &field.field_type {
        TypeDescriptor::ArrayOf(item) => Some(item.as_ref()),
        _ => None,
    };
    let enum_name = match item.unwrap_or(&field.field_type) {
        TypeDescriptor::EnumOf { name, .. } => Some(name.clone()),
        _ => None,
    };
    FieldContext {
        name: backend.field_name(&field.name),
        json_key: field.source_name.clone(),
        type_name: backend.type_name(&field.field_type),
        kind: field.field_type.kind_tag(),
        optional: field.optional,
        description: field.description.clone(),
        class_ref: field.field_type.referenced_class().map(str::to_string),
        item_type: item.map(|t| backend.type_name(t)),
        item_kind: item.map(TypeDescriptor::kind_tag),
        enum_name,
    }
}

fn enum_context(field_type: &TypeDescriptor, backend: &dyn Backend) -> Option<EnumContext> {
    match field_type {
        TypeDescriptor::ArrayOf(item) => enum_context(item, backend),
        TypeDescriptor::EnumOf { name, base, values } => Some(EnumContext {
            name: name.clone(),
            base: *base,
            cases: values
                .iter()
                .enumerate()
                .map(|(ordinal, value)| EnumCase {
                    ordinal,
                    name: backend.enum_case_name(name, value),
                    literal: value.to_string(),
                    text: literal_text(value),
                })
                .collect(),
        }),
        _ => None,
    }
}

fn or_defaults(configured: &[String], defaults: &[&str]) -> Vec<String> {
    if configured.is_empty() {
        defaults.iter().map(|d| d.to_string()).collect()
    } else {
        configured.to_vec()
    }
}
