use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Settings for one generation run.
///
/// The value is built once (usually by a command line front end) and then passed by reference
/// through every phase. Keys use camelCase when loaded from a file, e.g.
///
/// ```yaml
/// lang: objc
/// prefix: TR
/// rootName: Address
/// primitivesPreferred: true
/// implements: [NSCopying]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Target language identifier, looked up in the backend registry.
    pub lang: String,
    /// Prepended to every generated class and enum name.
    pub prefix: String,
    /// Name of the class generated for each root schema. Falls back to the file name.
    pub root_name: Option<String>,
    /// Map scalars to unboxed primitives instead of object wrappers.
    pub primitives_preferred: bool,
    /// Emit an open key/value bag on classes whose schema allows extra properties.
    pub include_additional_properties: bool,
    pub output_dir: PathBuf,
    /// Directory holding the `templates.<lang>` template sets.
    pub templates_dir: PathBuf,
    /// Interfaces/protocols every generated class conforms to.
    pub implements: Vec<String>,
    /// Super classes every generated class inherits.
    pub super_classes: Vec<String>,
    /// Files imported by every generated unit.
    pub import_files: Vec<String>,
    /// Whether fields are required when a schema object has no `required` list.
    pub required_by_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            lang: "objc".to_string(),
            prefix: "TR".to_string(),
            root_name: None,
            primitives_preferred: false,
            include_additional_properties: true,
            output_dir: PathBuf::from("output"),
            templates_dir: PathBuf::from("templates"),
            implements: vec![],
            super_classes: vec![],
            import_files: vec![],
            required_by_default: false,
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON or YAML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Config, Error> {
        let config_error = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))
        } else {
            serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))
        }
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "lang: cpp\nprefix: XY\nprimitivesPreferred: true\nsuperClasses: [Base]"
        )
        .unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.lang, "cpp");
        assert_eq!(config.prefix, "XY");
        assert!(config.primitives_preferred);
        assert!(config.include_additional_properties);
        assert_eq!(config.super_classes, vec!["Base".to_string()]);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"rootName": "Address", "includeAdditionalProperties": false}}"#
        )
        .unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.root_name.as_deref(), Some("Address"));
        assert!(!config.include_additional_properties);
        assert_eq!(config.prefix, "TR");
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
