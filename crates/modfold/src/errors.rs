use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid version format: {version}")]
    #[diagnostic(
        code(version::invalid),
        help("Versions are 1-3 dot-separated components, each a number or `*` (e.g., 1.4.0, 1.2.*)")
    )]
    InvalidVersion { version: String, reason: String },

    #[error("Mod root not found: {path}")]
    #[diagnostic(
        code(root::not_found),
        help("Pass --root pointing at the directory that contains your mod directories")
    )]
    RootNotFound { path: PathBuf },

    #[error("Mod directory not found: {path}")]
    #[diagnostic(
        code(mod_dir::not_found),
        help("The directory must exist and contain a mod.json manifest")
    )]
    ModDirNotFound { path: PathBuf },

    #[error("Manifest error in {path}")]
    #[diagnostic(
        code(manifest::invalid),
        help("Check the mod.json for syntax errors and make sure api_version and mod_version are present")
    )]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: modfold_manifest::ManifestError,
    },

    #[error("Rules file error: {path}")]
    #[diagnostic(
        code(rules::invalid),
        help("Rules files are JSON arrays of {{\"kind\": \"merge|append|override|ignore\", \"pattern\": \"...\"}} objects")
    )]
    RulesFileInvalid {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unknown content class: {class}")]
    #[diagnostic(
        code(list::unknown_class),
        help("Valid classes: structured, text, image, audio, binary")
    )]
    UnknownContentClass { class: String },

    #[error("No layer resolves virtual path: {path}")]
    #[diagnostic(
        code(resolve::no_content),
        help("The path is ignored, reserved, or not contributed by any loaded mod")
    )]
    PathNotResolved { path: String },

    #[error("Engine error")]
    #[diagnostic(code(engine::failed))]
    Engine {
        #[from]
        source: modfold_engine::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}
