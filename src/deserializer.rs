use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `type` keyword, either a single name or a set of names such as `["string", "null"]`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    pub fn names(&self) -> Vec<&str> {
        match self {
            SchemaType::Single(name) => vec![name.as_str()],
            SchemaType::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}

/// `additionalProperties` is either a flag or a schema for the extra values.
/// `S` is `serde_json::Value` before resolution and `ResolvedSchema` after.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AdditionalProperties<S> {
    Boolean(bool),
    Schema(Box<S>),
}

/// One schema object exactly as written in a document. Child schemas are left as raw JSON
/// values, the resolver walks them one level at a time.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawSchema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub properties: Option<IndexMap<String, Value>>,
    pub required: Option<Vec<String>>,
    pub items: Option<Value>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties<Value>>,
}

impl RawSchema {
    pub fn from_value(value: &Value) -> Result<RawSchema, serde_json::Error> {
        RawSchema::deserialize(value)
    }
}

/// A parsed `$ref` value: an optional document path and a decoded JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    pub document: Option<String>,
    pub pointer: String,
}

impl SchemaRef {
    pub fn parse(reference: &str) -> Result<SchemaRef, String> {
        if reference.is_empty() {
            return Err("empty reference".to_string());
        }
        let (document, fragment) = match reference.split_once('#') {
            Some((document, fragment)) => (document, fragment),
            None => (reference, ""),
        };
        if document.contains("://") {
            return Err("remote references are not supported".to_string());
        }
        let document = percent_decode(document)?;
        let pointer = percent_decode(fragment)?;
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(format!(
                "fragment `{fragment}` is not a JSON pointer (anchors are not supported)"
            ));
        }
        Ok(SchemaRef {
            document: (!document.is_empty()).then_some(document),
            pointer,
        })
    }

    /// The name the referenced schema is known by: the last pointer segment, or the document's
    /// file stem for whole-document references.
    pub fn schema_name(&self) -> Option<String> {
        if let Some(segment) = self.pointer.rsplit('/').next().filter(|s| !s.is_empty()) {
            return Some(unescape_pointer_segment(segment));
        }
        self.document.as_deref().and_then(|document| {
            std::path::Path::new(document)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
    }
}

pub(crate) fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn percent_decode(input: &str) -> Result<String, String> {
    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| format!("escape in `{input}` is not valid UTF-8"))
}
