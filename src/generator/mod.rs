//! Target-language backends and the rendering pipeline that drives them.
//!
//! A [`Backend`] knows the template units a language needs per class, how model types are
//! spelled in that language and which support files ship with the generated code. The
//! [`context`] and [`emit`] modules only ever talk to this trait.

pub mod context;
mod cpp_gen;
pub mod emit;
mod objc_gen;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::naming::pascal_case;
use crate::parser::TypeDescriptor;

pub use cpp_gen::CppBackend;
pub use objc_gen::ObjcBackend;

/// One output file per class: the template that renders it and the extension of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateUnit {
    pub template: &'static str,
    pub extension: &'static str,
}

pub trait Backend: Send + Sync {
    /// Language identifier, as given in [`Config::lang`](crate::config::Config::lang).
    fn name(&self) -> &'static str;

    /// Directory below the templates root holding this backend's templates and support files.
    fn template_dir(&self) -> String {
        format!("templates.{}", self.name())
    }

    /// Files rendered for every class, e.g. a declaration and an implementation unit.
    fn units(&self) -> &'static [TemplateUnit];

    /// Subdirectories of [`Backend::template_dir`] copied verbatim into the output.
    fn support_dirs(&self) -> &'static [&'static str] {
        &["static", "dependencies"]
    }

    /// How a field of this type is declared.
    fn type_name(&self, field_type: &TypeDescriptor) -> String;

    /// Turns a model field name into an identifier of the target language.
    fn field_name(&self, name: &str) -> String;

    /// Constant name for one enum literal.
    fn enum_case_name(&self, _enum_name: &str, value: &Value) -> String {
        pascal_case(&literal_text(value))
    }

    /// Used when the configuration names no super class.
    fn default_super_classes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Used when the configuration names no interface.
    fn default_interfaces(&self) -> &'static [&'static str] {
        &[]
    }
}

lazy_static! {
    static ref BACKENDS: Vec<&'static dyn Backend> =
        vec![&ObjcBackend as &dyn Backend, &CppBackend];
}

/// Looks up a built-in backend by language identifier.
pub fn backend(name: &str) -> Option<&'static dyn Backend> {
    BACKENDS.iter().find(|b| b.name() == name).copied()
}

pub fn backend_names() -> Vec<&'static str> {
    BACKENDS.iter().map(|b| b.name()).collect()
}

/// Text of an enum literal without JSON quoting: `"north"` -> `north`, `3` -> `3`.
pub(crate) fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Appends an underscore to identifiers that collide with a reserved word.
pub(crate) fn escape_reserved(name: String, reserved: &std::collections::HashSet<&str>) -> String {
    if reserved.contains(name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}
