//! Loads schema documents and replaces every `$ref` with a copy of what it points at.
//!
//! Each node of the resolved tree remembers the location it was copied from ([`SchemaId`]), so
//! two copies of the same definition can later be recognised as one class. A reference back to
//! a node that is still being expanded (a self or mutual recursion) is not expanded again, it
//! becomes a [`ResolvedSchema::Cycle`] naming that ancestor.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::config::is_yaml;
use crate::deserializer::{
    escape_pointer_segment, AdditionalProperties, RawSchema, SchemaRef, SchemaType,
};
use crate::error::ResolutionError;

/// Canonical location of a schema node: the document it lives in and a JSON pointer into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId {
    pub document: PathBuf,
    pub pointer: String,
}

impl SchemaId {
    pub fn new(document: impl Into<PathBuf>, pointer: impl Into<String>) -> SchemaId {
        SchemaId {
            document: document.into(),
            pointer: pointer.into(),
        }
    }

    /// Location of a nested keyword, e.g. `child(&["properties", "street"])`.
    pub fn child(&self, segments: &[&str]) -> SchemaId {
        let mut pointer = self.pointer.clone();
        for segment in segments {
            pointer.push('/');
            pointer.push_str(&escape_pointer_segment(segment));
        }
        SchemaId::new(self.document.clone(), pointer)
    }

    /// The logical name of the document, `address` for `schemas/address.json`.
    pub fn file_stem(&self) -> Option<String> {
        self.document
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document.display(), self.pointer)
    }
}

/// A schema with all references replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSchema {
    Node(Box<SchemaNode>),
    /// Back-reference to an ancestor that is already being expanded.
    Cycle(SchemaId),
}

impl ResolvedSchema {
    pub fn id(&self) -> &SchemaId {
        match self {
            ResolvedSchema::Node(node) => &node.id,
            ResolvedSchema::Cycle(target) => target,
        }
    }

    pub fn node(&self) -> Option<&SchemaNode> {
        match self {
            ResolvedSchema::Node(node) => Some(node),
            ResolvedSchema::Cycle(_) => None,
        }
    }
}

/// A resolved input document together with the path it was read from. The source names the
/// root class even when the document is only a `$ref` to another file.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSchema {
    pub source: PathBuf,
    pub schema: ResolvedSchema,
}

impl RootSchema {
    /// The logical name of the input, `alias` for `schemas/alias.json`.
    pub fn source_name(&self) -> Option<String> {
        self.source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    }
}

impl From<ResolvedSchema> for RootSchema {
    fn from(schema: ResolvedSchema) -> Self {
        RootSchema {
            source: schema.id().document.clone(),
            schema,
        }
    }
}

/// Array `items` in either single-schema or tuple form. Tuple members are not resolved, the
/// model has no tuple type.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    Schema(ResolvedSchema),
    Tuple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub id: SchemaId,
    /// Name taken from the `$ref` this node was reached through, if any.
    pub ref_name: Option<String>,
    pub schema_type: Option<SchemaType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub properties: IndexMap<String, ResolvedSchema>,
    pub required: Option<Vec<String>>,
    pub items: Option<Items>,
    pub enum_values: Option<Vec<Value>>,
    pub additional_properties: Option<AdditionalProperties<ResolvedSchema>>,
}

impl SchemaNode {
    /// Type names with `null` removed.
    pub fn non_null_types(&self) -> Vec<&str> {
        self.schema_type
            .as_ref()
            .map(|t| t.names().into_iter().filter(|n| *n != "null").collect())
            .unwrap_or_default()
    }

    /// Whether this node describes an object and therefore becomes a class.
    pub fn is_object(&self) -> bool {
        match self.non_null_types().as_slice() {
            [] => self.schema_type.is_none() && !self.properties.is_empty(),
            [single] => *single == "object",
            _ => false,
        }
    }
}

/// Loads documents on demand and caches them for the lifetime of the resolver.
#[derive(Debug, Default)]
pub struct Resolver {
    documents: HashMap<PathBuf, Value>,
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver::default()
    }

    /// Resolves several root documents, stopping at the first failure.
    pub fn resolve_all(
        &mut self,
        paths: &[PathBuf],
    ) -> Result<Vec<RootSchema>, ResolutionError> {
        paths
            .iter()
            .map(|path| {
                self.resolve_file(path).map(|schema| RootSchema {
                    source: path.clone(),
                    schema,
                })
            })
            .collect()
    }

    pub fn resolve_file(&mut self, path: &Path) -> Result<ResolvedSchema, ResolutionError> {
        let document = self.load(path)?;
        self.resolve_root(SchemaId::new(document, ""))
    }

    /// Resolves a document that is already in memory. `document` is used for error messages
    /// and as the base for relative external references.
    pub fn resolve_value(
        &mut self,
        document: impl Into<PathBuf>,
        value: Value,
    ) -> Result<ResolvedSchema, ResolutionError> {
        let document = document.into();
        self.documents.insert(document.clone(), value);
        self.resolve_root(SchemaId::new(document, ""))
    }

    fn resolve_root(&mut self, root: SchemaId) -> Result<ResolvedSchema, ResolutionError> {
        let mut ancestors = Vec::new();
        self.resolve_at(root, None, &mut ancestors)
    }

    /// Reads, parses and caches a document, returning the canonical path it is stored under.
    fn load(&mut self, path: &Path) -> Result<PathBuf, ResolutionError> {
        let canonical = std::fs::canonicalize(path).map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if self.documents.contains_key(&canonical) {
            return Ok(canonical);
        }
        debug!("loading schema document {}", canonical.display());
        let content =
            std::fs::read_to_string(&canonical).map_err(|source| ResolutionError::Io {
                path: canonical.clone(),
                source,
            })?;
        let parsed = if is_yaml(&canonical) {
            serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
        };
        let value = parsed.map_err(|message| ResolutionError::Parse {
            path: canonical.clone(),
            message,
        })?;
        self.documents.insert(canonical.clone(), value);
        Ok(canonical)
    }

    fn raw_at(&self, id: &SchemaId) -> Result<Option<RawSchema>, ResolutionError> {
        let Some(value) = self
            .documents
            .get(&id.document)
            .and_then(|document| document.pointer(&id.pointer))
        else {
            return Ok(None);
        };
        RawSchema::from_value(value)
            .map(Some)
            .map_err(|e| ResolutionError::InvalidSchema {
                location: id.clone(),
                message: e.to_string(),
            })
    }

    /// Turns a parsed reference written at `from` into a location, loading its document.
    fn locate(
        &mut self,
        from: &SchemaId,
        schema_ref: &SchemaRef,
    ) -> Result<SchemaId, ResolutionError> {
        let document = match &schema_ref.document {
            None => from.document.clone(),
            Some(relative) => {
                let base = from.document.parent().unwrap_or_else(|| Path::new(""));
                self.load(&base.join(relative))?
            }
        };
        Ok(SchemaId::new(document, schema_ref.pointer.clone()))
    }

    /// Resolves the node at `id`, following any chain of references first.
    fn resolve_at(
        &mut self,
        id: SchemaId,
        ref_name: Option<String>,
        ancestors: &mut Vec<SchemaId>,
    ) -> Result<ResolvedSchema, ResolutionError> {
        let mut current = id;
        let mut ref_name = ref_name;
        let mut chain: Vec<SchemaId> = Vec::new();
        loop {
            let raw = self
                .raw_at(&current)?
                .ok_or_else(|| ResolutionError::InvalidSchema {
                    location: current.clone(),
                    message: "no schema at this location".to_string(),
                })?;
            let Some(reference) = raw.reference.as_deref() else {
                return self.expand(current, raw, ref_name, ancestors);
            };
            let schema_ref =
                SchemaRef::parse(reference).map_err(|reason| ResolutionError::MalformedRef {
                    reference: reference.to_string(),
                    location: current.clone(),
                    reason,
                })?;
            let target = self.locate(&current, &schema_ref)?;
            if self.raw_at(&target)?.is_none() {
                return Err(ResolutionError::MissingTarget {
                    reference: reference.to_string(),
                    location: current,
                });
            }
            if ancestors.contains(&target) {
                return Ok(ResolvedSchema::Cycle(target));
            }
            if target == current || chain.contains(&target) {
                return Err(ResolutionError::MalformedRef {
                    reference: reference.to_string(),
                    location: current,
                    reason: "reference chain loops without reaching a schema".to_string(),
                });
            }
            ref_name = schema_ref.schema_name().or(ref_name);
            chain.push(current);
            current = target;
        }
    }

    fn expand(
        &mut self,
        id: SchemaId,
        raw: RawSchema,
        ref_name: Option<String>,
        ancestors: &mut Vec<SchemaId>,
    ) -> Result<ResolvedSchema, ResolutionError> {
        ancestors.push(id.clone());
        let node = self.expand_children(&id, raw, ref_name, ancestors);
        ancestors.pop();
        node.map(|node| ResolvedSchema::Node(Box::new(node)))
    }

    fn expand_children(
        &mut self,
        id: &SchemaId,
        raw: RawSchema,
        ref_name: Option<String>,
        ancestors: &mut Vec<SchemaId>,
    ) -> Result<SchemaNode, ResolutionError> {
        let mut properties = IndexMap::new();
        for name in raw.properties.unwrap_or_default().into_keys() {
            let child = id.child(&["properties", &name]);
            let resolved = self.resolve_at(child, None, ancestors)?;
            properties.insert(name, resolved);
        }

        let items = match raw.items {
            None => None,
            Some(Value::Array(_)) => Some(Items::Tuple),
            Some(Value::Object(_)) => Some(Items::Schema(self.resolve_at(
                id.child(&["items"]),
                None,
                ancestors,
            )?)),
            Some(other) => {
                return Err(ResolutionError::InvalidSchema {
                    location: id.child(&["items"]),
                    message: format!("`items` must be a schema or an array of schemas, got {other}"),
                })
            }
        };

        let additional_properties = match raw.additional_properties {
            None => None,
            Some(AdditionalProperties::Boolean(flag)) => Some(AdditionalProperties::Boolean(flag)),
            Some(AdditionalProperties::Schema(_)) => {
                let child = id.child(&["additionalProperties"]);
                let resolved = self.resolve_at(child, None, ancestors)?;
                Some(AdditionalProperties::Schema(Box::new(resolved)))
            }
        };

        Ok(SchemaNode {
            id: id.clone(),
            ref_name,
            schema_type: raw.schema_type,
            title: raw.title,
            description: raw.description,
            format: raw.format,
            properties,
            required: raw.required,
            items,
            enum_values: raw.enum_values,
            additional_properties,
        })
    }
}
