use std::collections::HashSet;

use lazy_static::lazy_static;

use super::{escape_reserved, Backend, TemplateUnit};
use crate::naming::snake_case;
use crate::parser::{PrimitiveKind, TypeDescriptor};

lazy_static! {
    static ref KEYWORDS: HashSet<&'static str> = [
        "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
        "class", "const", "constexpr", "continue", "decltype", "default", "delete", "do",
        "double", "else", "enum", "explicit", "export", "extern", "false", "float", "for",
        "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
        "noexcept", "not", "nullptr", "operator", "or", "private", "protected", "public",
        "register", "return", "short", "signed", "sizeof", "static", "struct", "switch",
        "template", "this", "throw", "true", "try", "typedef", "typeid", "typename", "union",
        "unsigned", "using", "virtual", "void", "volatile", "while", "xor",
    ]
    .into_iter()
    .collect();
}

/// C++ models backed by rapidjson: a header and a source file per class.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppBackend;

const UNITS: &[TemplateUnit] = &[
    TemplateUnit {
        template: "class.h",
        extension: "h",
    },
    TemplateUnit {
        template: "class.cpp",
        extension: "cpp",
    },
];

fn scalar(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String | PrimitiveKind::DateTime => "std::string",
        PrimitiveKind::Integer => "int32_t",
        PrimitiveKind::Long => "int64_t",
        PrimitiveKind::Number => "double",
        PrimitiveKind::Boolean => "bool",
        PrimitiveKind::Any => "std::shared_ptr<rapidjson::Document>",
    }
}

impl Backend for CppBackend {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn units(&self) -> &'static [TemplateUnit] {
        UNITS
    }

    fn type_name(&self, field_type: &TypeDescriptor) -> String {
        match field_type {
            TypeDescriptor::Primitive(kind)
            | TypeDescriptor::WrappedPrimitive(kind @ PrimitiveKind::Any) => {
                scalar(*kind).to_string()
            }
            TypeDescriptor::WrappedPrimitive(kind) => format!("std::optional<{}>", scalar(*kind)),
            TypeDescriptor::ArrayOf(item) => format!("std::vector<{}>", self.type_name(item)),
            TypeDescriptor::EnumOf { name, .. } => name.clone(),
            TypeDescriptor::ClassRef(name) => format!("std::shared_ptr<{name}>"),
        }
    }

    fn field_name(&self, name: &str) -> String {
        escape_reserved(snake_case(name), &KEYWORDS)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_names() {
        let backend = CppBackend;
        let cases = [
            (TypeDescriptor::Primitive(PrimitiveKind::Integer), "int32_t"),
            (TypeDescriptor::Primitive(PrimitiveKind::Long), "int64_t"),
            (
                TypeDescriptor::WrappedPrimitive(PrimitiveKind::Boolean),
                "std::optional<bool>",
            ),
            (
                TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::ClassRef("TRTag".into()))),
                "std::vector<std::shared_ptr<TRTag>>",
            ),
            (
                TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Any))),
                "std::vector<std::shared_ptr<rapidjson::Document>>",
            ),
        ];
        for (field_type, expected) in cases {
            assert_eq!(backend.type_name(&field_type), expected);
        }
    }

    #[test]
    fn test_field_names() {
        let backend = CppBackend;
        assert_eq!(backend.field_name("postalCode"), "postal_code");
        assert_eq!(backend.field_name("class"), "class_");
        assert_eq!(backend.field_name("default"), "default_");
    }

    #[test]
    fn test_enum_case_names() {
        let backend = CppBackend;
        assert_eq!(
            backend.enum_case_name("TRCompass", &serde_json::json!("south-east")),
            "SouthEast"
        );
    }
}
