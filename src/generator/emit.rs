use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::WalkDir;

use super::context::{to_context, RenderContext};
use super::{Backend, TemplateUnit};
use crate::config::Config;
use crate::error::EmissionError;
use crate::parser::{ClassDescriptor, ClassGraph};

/// The text substitution engine. Implementations get the raw template source and the
/// context of one class and return the rendered file content.
pub trait TemplateEngine {
    fn render(
        &self,
        template_name: &str,
        template: &str,
        context: &RenderContext,
    ) -> anyhow::Result<String>;
}

/// What an emission pass produced. Errors are per file; everything else was still written.
#[derive(Debug, Default)]
pub struct EmissionReport {
    pub written: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    pub errors: Vec<EmissionError>,
}

impl EmissionReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A template unit as read from disk, or the reason it could not be.
struct LoadedTemplate {
    unit: TemplateUnit,
    path: PathBuf,
    source: io::Result<String>,
}

pub struct Emitter<'a> {
    backend: &'a dyn Backend,
    engine: &'a dyn TemplateEngine,
    config: &'a Config,
}

impl<'a> Emitter<'a> {
    pub fn new(
        backend: &'a dyn Backend,
        engine: &'a dyn TemplateEngine,
        config: &'a Config,
    ) -> Emitter<'a> {
        Emitter {
            backend,
            engine,
            config,
        }
    }

    fn template_root(&self) -> PathBuf {
        self.config.templates_dir.join(self.backend.template_dir())
    }

    /// Renders every class of the graph with every unit of the backend, then copies the
    /// backend's support files next to them.
    pub fn emit(&self, graph: &ClassGraph) -> EmissionReport {
        let mut report = EmissionReport::default();
        let output_dir = &self.config.output_dir;
        if let Err(source) = fs::create_dir_all(output_dir) {
            report.errors.push(EmissionError::Write {
                path: output_dir.clone(),
                source,
            });
            return report;
        }

        let templates = self.load_templates();
        for class in graph.classes() {
            self.emit_class(class, &templates, &mut report);
        }
        self.copy_support_files(&mut report);
        debug!(
            "emitted {} files and {} support files into {}",
            report.written.len(),
            report.copied.len(),
            output_dir.display()
        );
        report
    }

    fn load_templates(&self) -> Vec<LoadedTemplate> {
        let root = self.template_root();
        self.backend
            .units()
            .iter()
            .map(|unit| {
                let path = root.join(unit.template);
                let source = fs::read_to_string(&path);
                LoadedTemplate {
                    unit: *unit,
                    path,
                    source,
                }
            })
            .collect()
    }

    fn emit_class(
        &self,
        class: &ClassDescriptor,
        templates: &[LoadedTemplate],
        report: &mut EmissionReport,
    ) {
        let context = to_context(class, self.backend, self.config);
        for loaded in templates {
            let template = match &loaded.source {
                Ok(template) => template,
                Err(e) => {
                    report.errors.push(EmissionError::TemplateNotFound {
                        lang: self.backend.name().to_string(),
                        template: loaded.unit.template.to_string(),
                        path: loaded.path.clone(),
                        source: io::Error::new(e.kind(), e.to_string()),
                    });
                    continue;
                }
            };
            let rendered = match self.engine.render(loaded.unit.template, template, &context) {
                Ok(rendered) => rendered,
                Err(source) => {
                    report.errors.push(EmissionError::Render {
                        template: loaded.unit.template.to_string(),
                        class: class.name.clone(),
                        source,
                    });
                    continue;
                }
            };
            let path = self
                .config
                .output_dir
                .join(format!("{}.{}", class.name, loaded.unit.extension));
            match fs::write(&path, rendered) {
                Ok(()) => {
                    trace!("wrote {}", path.display());
                    report.written.push(path);
                }
                Err(source) => report.errors.push(EmissionError::Write { path, source }),
            }
        }
    }

    fn copy_support_files(&self, report: &mut EmissionReport) {
        let root = self.template_root();
        for dir in self.backend.support_dirs() {
            let support_root = root.join(dir);
            if !support_root.is_dir() {
                continue;
            }
            let files = match collect_files(&support_root) {
                Ok(files) => files,
                Err(e) => {
                    report.errors.push(EmissionError::Copy {
                        from: e.path().unwrap_or(&support_root).to_path_buf(),
                        to: self.config.output_dir.clone(),
                        source: e.into(),
                    });
                    continue;
                }
            };
            for from in files {
                let relative = from.strip_prefix(&support_root).unwrap_or(&from);
                let to = self.config.output_dir.join(relative);
                match copy_file(&from, &to) {
                    Ok(()) => {
                        trace!("copied {} to {}", from.display(), to.display());
                        report.copied.push(to);
                    }
                    Err(source) => report.errors.push(EmissionError::Copy { from, to, source }),
                }
            }
        }
    }
}

/// Every regular file below `dir`, in file name order so copies happen in a stable order.
fn collect_files(dir: &Path) -> walkdir::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::generator::ObjcBackend;
    use crate::parser::{FieldDescriptor, PrimitiveKind, TypeDescriptor};
    use crate::resolver::SchemaId;
    use pretty_assertions::assert_eq;
    use test_log::test;

    /// Replaces `{{name}}` with the prefixed class name and lists the fields.
    struct FakeEngine;

    impl TemplateEngine for FakeEngine {
        fn render(
            &self,
            template_name: &str,
            template: &str,
            context: &RenderContext,
        ) -> anyhow::Result<String> {
            if template.contains("{{fail}}") {
                anyhow::bail!("unknown tag `fail` in {template_name}");
            }
            let fields = context
                .fields
                .iter()
                .map(|f| format!("{} {};", f.type_name, f.name))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(template
                .replace("{{name}}", &context.prefixed_name)
                .replace("{{fields}}", &fields))
        }
    }

    fn graph() -> ClassGraph {
        let mut graph = ClassGraph::default();
        for name in ["TRAddress", "TRPerson"] {
            graph
                .insert(ClassDescriptor {
                    name: name.to_string(),
                    base_name: name.trim_start_matches("TR").to_string(),
                    schema_id: SchemaId::new(format!("{name}.json"), ""),
                    description: None,
                    fields: vec![FieldDescriptor {
                        name: "zip".to_string(),
                        source_name: "zip".to_string(),
                        field_type: TypeDescriptor::WrappedPrimitive(PrimitiveKind::String),
                        optional: true,
                        description: None,
                    }],
                    interfaces: vec![],
                    super_classes: vec![],
                    supports_additional_properties: false,
                    additional_properties_type: None,
                })
                .unwrap();
        }
        graph
    }

    fn write_templates(templates: &Path, header: &str) {
        let dir = templates.join("templates.objc");
        fs::create_dir_all(dir.join("static/Support")).unwrap();
        fs::write(dir.join("class.h"), header).unwrap();
        fs::write(dir.join("class.m"), "@implementation {{name}}\n@end\n").unwrap();
        fs::write(dir.join("static/Support/JSONModel.h"), "// support\n").unwrap();
    }

    fn config(root: &Path) -> Config {
        Config {
            output_dir: root.join("out"),
            templates_dir: root.join("templates"),
            ..Config::default()
        }
    }

    #[test]
    fn test_emit_writes_units_and_support_files() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(&dir.path().join("templates"), "@interface {{name}}\n{{fields}}\n");
        let config = config(dir.path());

        let report = Emitter::new(&ObjcBackend, &FakeEngine, &config).emit(&graph());
        assert!(report.is_success(), "{:?}", report.errors);
        let out = dir.path().join("out");
        assert_eq!(
            report.written,
            vec![
                out.join("TRAddress.h"),
                out.join("TRAddress.m"),
                out.join("TRPerson.h"),
                out.join("TRPerson.m"),
            ]
        );
        assert_eq!(report.copied, vec![out.join("Support/JSONModel.h")]);
        assert_eq!(
            fs::read_to_string(out.join("TRPerson.h")).unwrap(),
            "@interface TRPerson\nNSString * zip;\n"
        );
        assert_eq!(
            fs::read_to_string(out.join("Support/JSONModel.h")).unwrap(),
            "// support\n"
        );
    }

    #[test]
    fn test_emit_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(&dir.path().join("templates"), "@interface {{name}}\n{{fields}}\n");
        let config = config(dir.path());
        let emitter = Emitter::new(&ObjcBackend, &FakeEngine, &config);

        let first = emitter.emit(&graph());
        let before = first
            .written
            .iter()
            .map(|p| fs::read(p).unwrap())
            .collect::<Vec<_>>();
        let second = emitter.emit(&graph());
        let after = second
            .written
            .iter()
            .map(|p| fs::read(p).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(first.written, second.written);
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_template_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(&dir.path().join("templates"), "@interface {{name}}\n");
        fs::remove_file(dir.path().join("templates/templates.objc/class.m")).unwrap();
        let config = config(dir.path());

        let report = Emitter::new(&ObjcBackend, &FakeEngine, &config).emit(&graph());
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, EmissionError::TemplateNotFound { template, .. } if template == "class.m")));
        assert_eq!(report.copied.len(), 1);
    }

    #[test]
    fn test_render_failure_does_not_stop_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(&dir.path().join("templates"), "{{fail}}");
        let config = config(dir.path());

        let report = Emitter::new(&ObjcBackend, &FakeEngine, &config).emit(&graph());
        assert_eq!(report.errors.len(), 2);
        let message = report.errors[0].to_string();
        assert!(message.contains("TRAddress"), "{message}");
        assert!(message.contains("unknown tag"), "{message}");
        assert_eq!(
            report.written,
            vec![
                dir.path().join("out/TRAddress.m"),
                dir.path().join("out/TRPerson.m")
            ]
        );
    }

    #[test]
    fn test_support_files_keep_layout_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(&dir.path().join("templates"), "@interface {{name}}\n");
        let deps = dir.path().join("templates/templates.objc/dependencies");
        fs::create_dir_all(deps.join("c/d")).unwrap();
        fs::create_dir_all(deps.join("a")).unwrap();
        fs::write(deps.join("c/d/e.h"), "e").unwrap();
        fs::write(deps.join("b.h"), "b").unwrap();
        fs::write(deps.join("a/z.h"), "z").unwrap();
        let config = config(dir.path());

        let report = Emitter::new(&ObjcBackend, &FakeEngine, &config).emit(&graph());
        assert!(report.is_success(), "{:?}", report.errors);
        let out = dir.path().join("out");
        assert_eq!(
            report.copied,
            vec![
                out.join("Support/JSONModel.h"),
                out.join("a/z.h"),
                out.join("b.h"),
                out.join("c/d/e.h"),
            ]
        );
        assert_eq!(fs::read_to_string(out.join("c/d/e.h")).unwrap(), "e");
    }
}
