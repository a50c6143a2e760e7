//! Generates typed model classes from JSON Schema documents.
//!
//! The pipeline resolves every `$ref` into one tree per root document ([`resolver`]), turns the
//! trees into a language independent class graph ([`parser`], [`type_map`]) and finally renders
//! each class through a [`TemplateEngine`] with the templates of one [`Backend`] ([`generator`]).

use std::path::PathBuf;

use log::{info, warn};

pub mod config;
pub mod deserializer;
pub mod error;
pub mod generator;
pub mod naming;
pub mod parser;
pub mod resolver;
pub mod type_map;

pub use config::Config;
pub use error::{EmissionError, Error, MappingWarning, ModelBuildError, ResolutionError};
pub use generator::context::RenderContext;
pub use generator::emit::{EmissionReport, Emitter, TemplateEngine};
pub use generator::{backend, backend_names, Backend};
pub use parser::ClassGraph;

/// Outcome of a run that got as far as emission.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Generated class names, in emission order.
    pub classes: Vec<String>,
    pub written: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    pub warnings: Vec<MappingWarning>,
    pub emission_errors: Vec<EmissionError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.emission_errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "generated {} classes into {} files ({} support files), {} warnings, {} errors",
            self.classes.len(),
            self.written.len(),
            self.copied.len(),
            self.warnings.len(),
            self.emission_errors.len()
        )
    }

    /// Reports every warning and emission error, then the summary line.
    pub fn log(&self) {
        for warning in &self.warnings {
            warn!("{warning}");
        }
        for error in &self.emission_errors {
            warn!("{error}");
        }
        info!("{}", self.summary());
    }
}

/// Runs the whole pipeline for the backend named by [`Config::lang`].
///
/// Nothing is written unless every input resolves and the class graph builds.
pub fn generate(
    inputs: &[PathBuf],
    config: &Config,
    engine: &dyn TemplateEngine,
) -> Result<RunReport, Error> {
    let backend = backend(&config.lang).ok_or_else(|| Error::UnknownLanguage {
        lang: config.lang.clone(),
        available: backend_names().join(", "),
    })?;
    generate_with(inputs, config, backend, engine)
}

/// Like [`generate`], with a caller supplied backend.
pub fn generate_with(
    inputs: &[PathBuf],
    config: &Config,
    backend: &dyn Backend,
    engine: &dyn TemplateEngine,
) -> Result<RunReport, Error> {
    let roots = resolver::Resolver::new().resolve_all(inputs)?;
    let (graph, warnings) = parser::build(&roots, config)?;
    info!(
        "built {} classes from {} schemas, emitting {}",
        graph.len(),
        inputs.len(),
        backend.name()
    );

    let emission = Emitter::new(backend, engine, config).emit(&graph);
    Ok(RunReport {
        classes: graph.names(),
        written: emission.written,
        copied: emission.copied,
        warnings,
        emission_errors: emission.errors,
    })
}
