use log::warn;
use serde_json::Value;

use crate::config::Config;
use crate::error::{MappingWarning, ModelBuildError};
use crate::naming::pascal_case;
use crate::parser::{PrimitiveKind, TypeDescriptor};
use crate::resolver::{Items, ResolvedSchema, SchemaId, SchemaNode};

/// The part of the configuration the type mapping policy depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOptions {
    pub primitives_preferred: bool,
}

impl From<&Config> for MapOptions {
    fn from(config: &Config) -> Self {
        MapOptions {
            primitives_preferred: config.primitives_preferred,
        }
    }
}

/// Where the schema being mapped sits, used to name classes and enums it gives rise to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameHint {
    /// Raw name, usually the property name.
    pub name: String,
    /// Unprefixed name of the enclosing class.
    pub owner: Option<String>,
}

impl NameHint {
    pub fn property(name: &str, owner: &str) -> NameHint {
        NameHint {
            name: name.to_string(),
            owner: Some(owner.to_string()),
        }
    }

    /// Hint for the element schema of an array held under this hint.
    pub fn item(&self) -> NameHint {
        NameHint {
            name: format!("{}_item", self.name),
            owner: self.owner.clone(),
        }
    }
}

/// Owner of the class graph and of the type namespace. Object schemas are handed to it so that
/// each resolved node is turned into exactly one class, however many times it is reached, and
/// enums are named through it so that no two types share a name.
pub trait ClassRegistry {
    /// Name of the class for `node`, building and registering it on first sight.
    fn class_for(
        &mut self,
        node: &SchemaNode,
        hint: &NameHint,
        mapper: &mut TypeMapper,
    ) -> Result<String, ModelBuildError>;

    /// Name of a class already registered for `id`.
    fn class_for_id(&self, id: &SchemaId) -> Option<String>;

    /// Prefixed, unique name of the enum declared at `id`. `raw` is the unprefixed wish and
    /// `owner` the enclosing class, used to qualify a taken name.
    fn enum_name(
        &mut self,
        id: &SchemaId,
        raw: &str,
        owner: Option<&str>,
    ) -> Result<String, ModelBuildError>;
}

/// Translates resolved schema nodes into target-neutral [`TypeDescriptor`]s.
#[derive(Debug)]
pub struct TypeMapper {
    options: MapOptions,
    warnings: Vec<MappingWarning>,
}

impl TypeMapper {
    pub fn new(options: MapOptions) -> TypeMapper {
        TypeMapper {
            options,
            warnings: vec![],
        }
    }

    pub fn warnings(&self) -> &[MappingWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<MappingWarning> {
        self.warnings
    }

    pub fn map_type(
        &mut self,
        schema: &ResolvedSchema,
        hint: &NameHint,
        registry: &mut dyn ClassRegistry,
    ) -> Result<TypeDescriptor, ModelBuildError> {
        let node = match schema {
            ResolvedSchema::Cycle(target) => {
                return registry
                    .class_for_id(target)
                    .map(TypeDescriptor::ClassRef)
                    .ok_or_else(|| ModelBuildError::NonObjectCycle(target.clone()))
            }
            ResolvedSchema::Node(node) => node,
        };

        if let Some(values) = &node.enum_values {
            let name = registry.enum_name(
                &node.id,
                &raw_enum_name(node, hint),
                hint.owner.as_deref(),
            )?;
            return Ok(TypeDescriptor::EnumOf {
                name,
                base: enum_base(values),
                values: values.clone(),
            });
        }

        if node.is_object() {
            let name = registry.class_for(node, hint, self)?;
            return Ok(TypeDescriptor::ClassRef(name));
        }

        match node.non_null_types().as_slice() {
            [] => {
                if node.schema_type.is_some() {
                    self.warn(node, "type only allows `null`, mapped to any".to_string());
                }
                Ok(TypeDescriptor::Primitive(PrimitiveKind::Any))
            }
            ["array"] => self.map_array(node, hint, registry),
            [keyword] => Ok(self.map_keyword(node, keyword)),
            several => {
                self.warn(
                    node,
                    format!("union type {several:?} is not supported, mapped to any"),
                );
                Ok(TypeDescriptor::Primitive(PrimitiveKind::Any))
            }
        }
    }

    fn map_array(
        &mut self,
        node: &SchemaNode,
        hint: &NameHint,
        registry: &mut dyn ClassRegistry,
    ) -> Result<TypeDescriptor, ModelBuildError> {
        let item_type = match &node.items {
            Some(Items::Schema(items)) => self.map_type(items, &hint.item(), registry)?,
            Some(Items::Tuple) => {
                self.warn(node, "tuple `items` are not supported, mapped to any".to_string());
                TypeDescriptor::Primitive(PrimitiveKind::Any)
            }
            None => TypeDescriptor::Primitive(PrimitiveKind::Any),
        };
        Ok(TypeDescriptor::ArrayOf(Box::new(item_type)))
    }

    fn map_keyword(&mut self, node: &SchemaNode, keyword: &str) -> TypeDescriptor {
        let format = node.format.as_deref();
        let kind = match (keyword, format) {
            ("string", Some("date-time")) => PrimitiveKind::DateTime,
            ("string", _) => PrimitiveKind::String,
            ("integer", Some("int64")) => PrimitiveKind::Long,
            ("integer", _) => PrimitiveKind::Integer,
            ("number", _) => PrimitiveKind::Number,
            ("boolean", _) => PrimitiveKind::Boolean,
            (other, _) => {
                self.warn(node, format!("unrecognized type `{other}`, mapped to any"));
                return TypeDescriptor::Primitive(PrimitiveKind::Any);
            }
        };
        if self.options.primitives_preferred {
            TypeDescriptor::Primitive(kind)
        } else {
            TypeDescriptor::WrappedPrimitive(kind)
        }
    }

    fn warn(&mut self, node: &SchemaNode, message: String) {
        let warning = MappingWarning {
            location: node.id.clone(),
            message,
        };
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Enums named by their schema keep that name, anonymous ones are qualified with the enclosing
/// class so that two `status` properties do not start out with the same wish.
fn raw_enum_name(node: &SchemaNode, hint: &NameHint) -> String {
    match node.title.as_ref().or(node.ref_name.as_ref()) {
        Some(name) => pascal_case(name),
        None => format!(
            "{}{}",
            hint.owner.as_deref().map(pascal_case).unwrap_or_default(),
            pascal_case(&hint.name)
        ),
    }
}

fn enum_base(values: &[Value]) -> PrimitiveKind {
    if values.iter().all(Value::is_string) {
        PrimitiveKind::String
    } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        PrimitiveKind::Integer
    } else if values.iter().all(Value::is_number) {
        PrimitiveKind::Number
    } else if values.iter().all(Value::is_boolean) {
        PrimitiveKind::Boolean
    } else {
        PrimitiveKind::Any
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resolver::Resolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Registry that names every object after its hint and remembers nothing.
    struct NamingRegistry {
        registered: Vec<String>,
    }

    impl ClassRegistry for NamingRegistry {
        fn class_for(
            &mut self,
            _node: &SchemaNode,
            hint: &NameHint,
            _mapper: &mut TypeMapper,
        ) -> Result<String, ModelBuildError> {
            let name = pascal_case(&hint.name);
            self.registered.push(name.clone());
            Ok(name)
        }

        fn class_for_id(&self, _id: &SchemaId) -> Option<String> {
            None
        }

        fn enum_name(
            &mut self,
            _id: &SchemaId,
            raw: &str,
            _owner: Option<&str>,
        ) -> Result<String, ModelBuildError> {
            Ok(format!("TR{raw}"))
        }
    }

    fn map(schema: Value, primitives_preferred: bool) -> (TypeDescriptor, TypeMapper) {
        let resolved = Resolver::new().resolve_value("t.json", schema).unwrap();
        let mut mapper = TypeMapper::new(MapOptions {
            primitives_preferred,
        });
        let mut registry = NamingRegistry { registered: vec![] };
        let hint = NameHint::property("value", "Owner");
        let mapped = mapper.map_type(&resolved, &hint, &mut registry).unwrap();
        (mapped, mapper)
    }

    #[test]
    fn test_scalars_follow_primitive_preference() {
        let (mapped, _) = map(json!({ "type": "integer" }), true);
        assert_eq!(mapped, TypeDescriptor::Primitive(PrimitiveKind::Integer));
        let (mapped, _) = map(json!({ "type": "integer" }), false);
        assert_eq!(mapped, TypeDescriptor::WrappedPrimitive(PrimitiveKind::Integer));
        let (mapped, _) = map(json!({ "type": "boolean" }), false);
        assert_eq!(mapped, TypeDescriptor::WrappedPrimitive(PrimitiveKind::Boolean));
    }

    #[test]
    fn test_formats_refine_kind() {
        let (mapped, _) = map(json!({ "type": "string", "format": "date-time" }), true);
        assert_eq!(mapped, TypeDescriptor::Primitive(PrimitiveKind::DateTime));
        let (mapped, _) = map(json!({ "type": "integer", "format": "int64" }), true);
        assert_eq!(mapped, TypeDescriptor::Primitive(PrimitiveKind::Long));
    }

    #[test]
    fn test_nullable_type_set() {
        let (mapped, mapper) = map(json!({ "type": ["number", "null"] }), true);
        assert_eq!(mapped, TypeDescriptor::Primitive(PrimitiveKind::Number));
        assert!(mapper.warnings().is_empty());
    }

    #[test]
    fn test_arrays() {
        let (mapped, _) = map(json!({ "type": "array" }), true);
        assert_eq!(
            mapped,
            TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Any)))
        );
        let (mapped, _) = map(
            json!({ "type": "array", "items": { "type": "array", "items": { "type": "string" } } }),
            false,
        );
        assert_eq!(
            mapped,
            TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::ArrayOf(Box::new(
                TypeDescriptor::WrappedPrimitive(PrimitiveKind::String)
            ))))
        );
    }

    #[test]
    fn test_array_of_objects_uses_item_hint() {
        let resolved = Resolver::new()
            .resolve_value(
                "t.json",
                json!({ "type": "array", "items": { "type": "object" } }),
            )
            .unwrap();
        let mut mapper = TypeMapper::new(MapOptions {
            primitives_preferred: true,
        });
        let mut registry = NamingRegistry { registered: vec![] };
        let mapped = mapper
            .map_type(&resolved, &NameHint::property("tags", "Post"), &mut registry)
            .unwrap();
        assert_eq!(
            mapped,
            TypeDescriptor::ArrayOf(Box::new(TypeDescriptor::ClassRef("TagsItem".into())))
        );
        assert_eq!(registry.registered, vec!["TagsItem".to_string()]);
    }

    #[test]
    fn test_enum_keeps_declaration_order() {
        let (mapped, _) = map(json!({ "type": "string", "enum": ["zulu", "alpha", "mike"] }), true);
        assert_eq!(
            mapped,
            TypeDescriptor::EnumOf {
                name: "TROwnerValue".to_string(),
                base: PrimitiveKind::String,
                values: vec![json!("zulu"), json!("alpha"), json!("mike")],
            }
        );
    }

    #[test]
    fn test_titled_enum_uses_title() {
        let (mapped, _) = map(json!({ "title": "color", "enum": [1, 2, 3] }), true);
        assert!(matches!(
            mapped,
            TypeDescriptor::EnumOf { ref name, base: PrimitiveKind::Integer, .. } if name == "TRColor"
        ));
    }

    #[test]
    fn test_unrecognized_type_warns() {
        let (mapped, mapper) = map(json!({ "type": "int" }), true);
        assert_eq!(mapped, TypeDescriptor::Primitive(PrimitiveKind::Any));
        assert_eq!(mapper.warnings().len(), 1);
        assert!(mapper.warnings()[0].message.contains("`int`"));
    }

    #[test]
    fn test_untyped_schema_is_any_without_warning() {
        let (mapped, mapper) = map(json!({ "description": "anything" }), false);
        assert_eq!(mapped, TypeDescriptor::Primitive(PrimitiveKind::Any));
        assert!(mapper.warnings().is_empty());
    }

    #[test]
    fn test_cycle_to_unregistered_node_is_an_error() {
        let mut mapper = TypeMapper::new(MapOptions {
            primitives_preferred: true,
        });
        let mut registry = NamingRegistry { registered: vec![] };
        let cycle = ResolvedSchema::Cycle(SchemaId::new("t.json", "/items"));
        let err = mapper
            .map_type(&cycle, &NameHint::property("x", "Y"), &mut registry)
            .unwrap_err();
        assert!(matches!(err, ModelBuildError::NonObjectCycle(_)));
    }
}
