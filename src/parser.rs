use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::deserializer::AdditionalProperties;
use crate::error::{MappingWarning, ModelBuildError};
use crate::naming::{identifier, make_unique, pascal_case};
use crate::resolver::{RootSchema, SchemaId, SchemaNode};
use crate::type_map::{ClassRegistry, MapOptions, NameHint, TypeMapper};

/// Scalar kinds a target language has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    String,
    /// A string with `format: date-time`.
    DateTime,
    Integer,
    /// An integer with `format: int64`.
    Long,
    Number,
    Boolean,
    /// Untyped JSON data.
    Any,
}

/// The type of a field, independent of any target language.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// An unboxed scalar, e.g. `NSInteger` or `int32_t`.
    Primitive(PrimitiveKind),
    /// A boxed scalar that can also represent "absent", e.g. `NSNumber *`.
    WrappedPrimitive(PrimitiveKind),
    ArrayOf(Box<TypeDescriptor>),
    /// A closed set of literals. `values` keep their declaration order, generated code derives
    /// ordinals from it.
    EnumOf {
        name: String,
        base: PrimitiveKind,
        values: Vec<Value>,
    },
    /// A reference to another class of the graph, by name.
    ClassRef(String),
}

impl TypeDescriptor {
    /// The class this type points at, looking through arrays.
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            TypeDescriptor::ClassRef(name) => Some(name),
            TypeDescriptor::ArrayOf(item) => item.referenced_class(),
            _ => None,
        }
    }

    /// Short tag templates can switch on.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            TypeDescriptor::Primitive(_) => "primitive",
            TypeDescriptor::WrappedPrimitive(_) => "wrapped",
            TypeDescriptor::ArrayOf(_) => "array",
            TypeDescriptor::EnumOf { .. } => "enum",
            TypeDescriptor::ClassRef(_) => "class",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Identifier-safe version of the property name.
    pub name: String,
    /// The JSON key the field is (de)serialized from.
    pub source_name: String,
    pub field_type: TypeDescriptor,
    pub optional: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    /// Name with the configured prefix applied.
    pub name: String,
    /// Name before prefixing.
    pub base_name: String,
    pub schema_id: SchemaId,
    pub description: Option<String>,
    /// Sorted by field name.
    pub fields: Vec<FieldDescriptor>,
    pub interfaces: Vec<String>,
    pub super_classes: Vec<String>,
    pub supports_additional_properties: bool,
    /// Value type of the additional properties bag when the schema constrains it.
    pub additional_properties_type: Option<TypeDescriptor>,
}

/// All classes of one run, keyed by their unique prefixed name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassGraph {
    classes: BTreeMap<String, ClassDescriptor>,
    roots: Vec<String>,
}

impl ClassGraph {
    /// Adds a class. An existing class is never replaced.
    pub fn insert(&mut self, class: ClassDescriptor) -> Result<(), ModelBuildError> {
        if self.classes.contains_key(&class.name) {
            return Err(ModelBuildError::DuplicateClass(class.name));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    /// Classes in name order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    /// Names of the classes generated for root schemas, in input order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Builds one shared [`ClassGraph`] out of any number of resolved root schemas.
pub struct ModelBuilder<'a> {
    config: &'a Config,
    graph: ClassGraph,
    /// Class name per schema location, registered before the class's fields are mapped.
    ids: HashMap<SchemaId, String>,
    enums: HashMap<SchemaId, String>,
    /// Every class and enum name handed out so far.
    reserved: HashSet<String>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(config: &'a Config) -> ModelBuilder<'a> {
        ModelBuilder {
            config,
            graph: ClassGraph::default(),
            ids: HashMap::new(),
            enums: HashMap::new(),
            reserved: HashSet::new(),
        }
    }

    /// Adds the class for a root schema and, transitively, every class it reaches.
    pub fn add_root(
        &mut self,
        root: &RootSchema,
        mapper: &mut TypeMapper,
    ) -> Result<String, ModelBuildError> {
        let schema = &root.schema;
        let node = schema
            .node()
            .filter(|node| node.is_object())
            .ok_or_else(|| ModelBuildError::RootNotObject(schema.id().clone()))?;
        let name = match self.ids.get(&node.id) {
            Some(name) => name.clone(),
            None => {
                let raw = self
                    .config
                    .root_name
                    .clone()
                    .or_else(|| root.source_name())
                    .or_else(|| node.id.file_stem())
                    .ok_or_else(|| ModelBuildError::Unnamed(node.id.clone()))?;
                self.define(node, &raw, None, mapper)?
            }
        };
        if !self.graph.roots.contains(&name) {
            self.graph.roots.push(name.clone());
        }
        Ok(name)
    }

    pub fn finish(self) -> ClassGraph {
        self.graph
    }

    /// Picks a free name: the plain one, then qualified by the enclosing class, then numbered.
    fn allocate_name(
        &mut self,
        id: &SchemaId,
        raw: &str,
        owner: Option<&str>,
    ) -> Result<(String, String), ModelBuildError> {
        let base = pascal_case(raw);
        if base.is_empty() {
            return Err(ModelBuildError::Unnamed(id.clone()));
        }
        let prefix = &self.config.prefix;
        let mut candidates = vec![base.clone()];
        if let Some(owner) = owner.map(pascal_case).filter(|o| !o.is_empty()) {
            candidates.push(format!("{owner}{base}"));
        }
        let free = candidates
            .into_iter()
            .chain((2u32..).map(|n| format!("{base}{n}")))
            .find(|candidate| !self.reserved.contains(&format!("{prefix}{candidate}")));
        let free = free.unwrap_or_else(|| base.clone());
        let name = format!("{prefix}{free}");
        self.reserved.insert(name.clone());
        Ok((free, name))
    }

    fn define(
        &mut self,
        node: &SchemaNode,
        raw: &str,
        owner: Option<&str>,
        mapper: &mut TypeMapper,
    ) -> Result<String, ModelBuildError> {
        let (base_name, name) = self.allocate_name(&node.id, raw, owner)?;
        debug!("registered class {name} for {}", node.id);
        self.ids.insert(node.id.clone(), name.clone());

        let mut fields = Vec::with_capacity(node.properties.len());
        for (property, schema) in &node.properties {
            let hint = NameHint::property(property, &base_name);
            let field_type = mapper.map_type(schema, &hint, self)?;
            fields.push(FieldDescriptor {
                name: identifier(property),
                source_name: property.clone(),
                field_type,
                optional: self.is_optional(node, property),
                description: schema.node().and_then(|n| n.description.clone()),
            });
        }
        let by_name = |a: &FieldDescriptor, b: &FieldDescriptor| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.source_name.cmp(&b.source_name))
        };
        fields.sort_by(by_name);
        make_unique(fields.iter_mut().map(|f| &mut f.name));
        fields.sort_by(by_name);

        let include = self.config.include_additional_properties;
        let supports_additional_properties = include
            && !matches!(
                node.additional_properties,
                Some(AdditionalProperties::Boolean(false))
            );
        let additional_properties_type = match &node.additional_properties {
            Some(AdditionalProperties::Schema(schema)) if include => {
                let hint = NameHint::property(&format!("{base_name}_value"), &base_name);
                Some(mapper.map_type(schema, &hint, self)?)
            }
            _ => None,
        };

        self.graph.insert(ClassDescriptor {
            name: name.clone(),
            base_name,
            schema_id: node.id.clone(),
            description: node.description.clone(),
            fields,
            interfaces: self.config.implements.clone(),
            super_classes: self.config.super_classes.clone(),
            supports_additional_properties,
            additional_properties_type,
        })?;
        Ok(name)
    }

    fn is_optional(&self, node: &SchemaNode, property: &str) -> bool {
        match &node.required {
            Some(required) => !required.iter().any(|r| r == property),
            None => !self.config.required_by_default,
        }
    }
}

impl ClassRegistry for ModelBuilder<'_> {
    fn class_for(
        &mut self,
        node: &SchemaNode,
        hint: &NameHint,
        mapper: &mut TypeMapper,
    ) -> Result<String, ModelBuildError> {
        if let Some(name) = self.ids.get(&node.id) {
            return Ok(name.clone());
        }
        let raw = node
            .title
            .as_deref()
            .or(node.ref_name.as_deref())
            .unwrap_or(&hint.name)
            .to_string();
        self.define(node, &raw, hint.owner.as_deref(), mapper)
    }

    fn class_for_id(&self, id: &SchemaId) -> Option<String> {
        self.ids.get(id).cloned()
    }

    fn enum_name(
        &mut self,
        id: &SchemaId,
        raw: &str,
        owner: Option<&str>,
    ) -> Result<String, ModelBuildError> {
        if let Some(name) = self.enums.get(id) {
            return Ok(name.clone());
        }
        let (_, name) = self.allocate_name(id, raw, owner)?;
        debug!("registered enum {name} for {id}");
        self.enums.insert(id.clone(), name.clone());
        Ok(name)
    }
}

/// Turns resolved root schemas into a class graph, returning the non-fatal mapping warnings
/// alongside it.
pub fn build(
    roots: &[RootSchema],
    config: &Config,
) -> Result<(ClassGraph, Vec<MappingWarning>), ModelBuildError> {
    let mut mapper = TypeMapper::new(MapOptions::from(config));
    let mut builder = ModelBuilder::new(config);
    for root in roots {
        builder.add_root(root, &mut mapper)?;
    }
    Ok((builder.finish(), mapper.into_warnings()))
}
