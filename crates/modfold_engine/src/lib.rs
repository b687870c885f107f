//! Layered mod scanning and content resolution.
//!
//! This crate lets a host application compose a base content set with an
//! ordered list of mod directories and query one authoritative view of
//! "which bytes does virtual path P currently resolve to". It provides:
//!
//! - **Directory scanning**: targeted loads and discovery scans that parse
//!   each mod's reserved manifest and score version compatibility
//! - **Layered resolution**: priority-ordered Override/Merge/Append/Ignore
//!   semantics per path, with a per-path content cache
//! - **Advisory diagnostics**: a single-subscriber sink that never aborts
//!   in-progress work
//! - **Pluggable storage**: a file-system boundary trait with disk and
//!   in-memory backends behind a keyed registry
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use modfold_engine::{BackendRegistry, ModSession, SessionConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = BackendRegistry::new();
//! let mut session = ModSession::new(SessionConfig::default(), &registry)?;
//! session.subscribe(|diagnostic| eprintln!("{diagnostic}"));
//!
//! let mods = session.init(
//!     Utf8Path::new("/data/mods"),
//!     &["harbor_overhaul".to_string(), "winter_pack".to_string()],
//!     Some(&"1.4.0".parse()?),
//!     &[],
//! );
//! println!("loaded {} mods", mods.len());
//!
//! if let Some(bytes) = session.resolve(Utf8Path::new("maps/harbor.json")) {
//!     println!("resolved {} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod diag;
pub mod error;
pub mod fs;
pub mod resolver;
pub mod rules;
pub mod scanner;
pub mod session;

// Re-export main types
pub use diag::{DiagCode, Diagnostic, ErrorSink, Severity};
pub use error::{Error, Result};
pub use fs::{BackendRegistry, DiskFileSystem, FileSystem, MemoryFileSystem, DISK_BACKEND};
pub use resolver::{ContentClass, Layer, OverlayResolver};
pub use rules::{MergeRule, RuleKind, RuleSet};
pub use scanner::ScanOptions;
pub use session::{ModSession, SessionConfig};

// Re-export the manifest and version vocabulary so hosts only need this crate.
pub use modfold_manifest::{
    Contributor, ManifestError, ModMetadata, ICON_FILE_NAME, MANIFEST_FILE_NAME,
};
pub use modfold_version::{CompatScore, SemVersion, VersionParseError, VersionPart};
