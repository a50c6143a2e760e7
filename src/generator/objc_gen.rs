use std::collections::HashSet;

use lazy_static::lazy_static;
use serde_json::Value;

use super::{escape_reserved, literal_text, Backend, TemplateUnit};
use crate::naming::{camel_case, pascal_case};
use crate::parser::{PrimitiveKind, TypeDescriptor};

lazy_static! {
    /// Keywords plus `NSObject` members a property must not shadow.
    static ref RESERVED: HashSet<&'static str> = [
        "id", "self", "super", "class", "description", "hash", "copy", "init", "new", "alloc",
        "retain", "release", "autorelease", "YES", "NO", "nil", "BOOL", "auto", "break", "case",
        "char", "const", "continue", "default", "do", "double", "else", "enum", "extern", "float",
        "for", "goto", "if", "inline", "int", "long", "register", "return", "short", "signed",
        "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
        "volatile", "while",
    ]
    .into_iter()
    .collect();
}

/// Objective-C models: a `.h` interface and a `.m` implementation per class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjcBackend;

const UNITS: &[TemplateUnit] = &[
    TemplateUnit {
        template: "class.h",
        extension: "h",
    },
    TemplateUnit {
        template: "class.m",
        extension: "m",
    },
];

impl ObjcBackend {
    /// The type as it appears inside a collection, where only objects are allowed.
    fn object_type(&self, field_type: &TypeDescriptor) -> String {
        match field_type {
            TypeDescriptor::Primitive(kind) | TypeDescriptor::WrappedPrimitive(kind) => {
                wrapped(*kind).to_string()
            }
            TypeDescriptor::EnumOf { .. } => "NSNumber *".to_string(),
            other => self.type_name(other),
        }
    }
}

fn wrapped(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "NSString *",
        PrimitiveKind::DateTime => "NSDate *",
        PrimitiveKind::Any => "id",
        _ => "NSNumber *",
    }
}

impl Backend for ObjcBackend {
    fn name(&self) -> &'static str {
        "objc"
    }

    fn units(&self) -> &'static [TemplateUnit] {
        UNITS
    }

    fn type_name(&self, field_type: &TypeDescriptor) -> String {
        match field_type {
            TypeDescriptor::Primitive(kind) => match kind {
                PrimitiveKind::Integer => "NSInteger".to_string(),
                PrimitiveKind::Long => "int64_t".to_string(),
                PrimitiveKind::Number => "double".to_string(),
                PrimitiveKind::Boolean => "BOOL".to_string(),
                other => wrapped(*other).to_string(),
            },
            TypeDescriptor::WrappedPrimitive(kind) => wrapped(*kind).to_string(),
            TypeDescriptor::ArrayOf(item) => format!("NSArray<{}> *", self.object_type(item)),
            TypeDescriptor::EnumOf { name, .. } => name.clone(),
            TypeDescriptor::ClassRef(name) => format!("{name} *"),
        }
    }

    fn field_name(&self, name: &str) -> String {
        escape_reserved(camel_case(name), &RESERVED)
    }

    /// `NS_ENUM` style: the enum name followed by the literal, `TRCompassNorth`.
    fn enum_case_name(&self, enum_name: &str, value: &Value) -> String {
        format!("{enum_name}{}", pascal_case(&literal_text(value)))
    }

    fn default_super_classes(&self) -> &'static [&'static str] {
        &["NSObject"]
    }

    fn default_interfaces(&self) -> &'static [&'static str] {
        &["JSONModelSerialize"]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_scalar_type_names() {
        let backend = ObjcBackend;
        let cases = [
            (TypeDescriptor::Primitive(PrimitiveKind::Integer), "NSInteger"),
            (TypeDescriptor::Primitive(PrimitiveKind::Boolean), "BOOL"),
            (TypeDescriptor::Primitive(PrimitiveKind::String), "NSString *"),
            (TypeDescriptor::WrappedPrimitive(PrimitiveKind::Number), "NSNumber *"),
            (TypeDescriptor::WrappedPrimitive(PrimitiveKind::DateTime), "NSDate *"),
            (TypeDescriptor::Primitive(PrimitiveKind::Any), "id"),
        ];
        for (field_type, expected) in cases {
            assert_eq!(backend.type_name(&field_type), expected);
        }
    }

    #[test]
    fn test_collection_type_names() {
        let backend = ObjcBackend;
        let ints = TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::Primitive(
            PrimitiveKind::Integer,
        )));
        assert_eq!(backend.type_name(&ints), "NSArray<NSNumber *> *");
        let people = TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::ClassRef(
            "TRPerson".into(),
        )));
        assert_eq!(backend.type_name(&people), "NSArray<TRPerson *> *");
        let nested = TypeDescriptor::ArrayOf(Box::new(ints));
        assert_eq!(backend.type_name(&nested), "NSArray<NSArray<NSNumber *> *> *");
    }

    #[test]
    fn test_field_names() {
        let backend = ObjcBackend;
        assert_eq!(backend.field_name("first_name"), "firstName");
        assert_eq!(backend.field_name("description"), "description_");
        assert_eq!(backend.field_name("id"), "id_");
    }

    #[test]
    fn test_enum_case_names() {
        let backend = ObjcBackend;
        assert_eq!(backend.enum_case_name("TRCompass", &json!("north")), "TRCompassNorth");
        assert_eq!(backend.enum_case_name("TRLevel", &json!(2)), "TRLevel_2");
    }
}
