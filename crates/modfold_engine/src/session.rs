//! Public session facade.
//!
//! A [`ModSession`] ties the pieces together for a host: it owns the
//! file-system backend, the advisory [`ErrorSink`], and — once a load or
//! scan has run — the [`OverlayResolver`] that serves content queries.
//!
//! Construction is the only fallible step: resolving the backend from the
//! registry can fail, and that failure is fatal. Everything after that
//! degrades through the sink to a safe default (`None`, empty list, no-op).
//! Re-running [`init`](ModSession::init) or [`scan`](ModSession::scan)
//! starts a fresh resolution session; mod lists are re-derived from scratch
//! and never merged with a prior session's.
//!
//! Sessions are single-threaded and synchronous. One session must not be
//! shared across threads without external synchronization: loading and
//! resolving mutate the layer index and the content cache.

use crate::diag::{DiagCode, Diagnostic, ErrorSink};
use crate::error::Result;
use crate::fs::{BackendRegistry, FileSystem, DISK_BACKEND};
use crate::resolver::{ContentClass, Layer, OverlayResolver};
use crate::rules::{MergeRule, RuleSet};
use crate::scanner::{load_targeted, scan_discovery, ScanOptions};
use camino::{Utf8Path, Utf8PathBuf};
use modfold_manifest::ModMetadata;
use modfold_version::SemVersion;
use std::collections::BTreeMap;

/// Configuration for a [`ModSession`].
pub struct SessionConfig {
    /// Backend registry key; defaults to [`DISK_BACKEND`].
    pub backend: String,
    /// Root of the un-modded base asset set, if the session should merge
    /// against one.
    pub base_root: Option<Utf8PathBuf>,
    /// Per-path resolution rules, matched in declaration order.
    pub rules: Vec<MergeRule>,
    pub scan: ScanOptions,
    /// Caller-supplied extension-to-class overrides for path enumeration.
    pub class_overrides: BTreeMap<String, ContentClass>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: DISK_BACKEND.to_string(),
            base_root: None,
            rules: Vec::new(),
            scan: ScanOptions::default(),
            class_overrides: BTreeMap::new(),
        }
    }
}

/// The engine a host embeds: targeted load or discovery scan, then
/// `resolve`/`list_paths` queries against the layered view.
pub struct ModSession {
    fs: Box<dyn FileSystem>,
    sink: ErrorSink,
    base_root: Option<Utf8PathBuf>,
    rules: RuleSet,
    scan_options: ScanOptions,
    class_overrides: BTreeMap<String, ContentClass>,
    resolver: Option<OverlayResolver>,
}

impl ModSession {
    /// Construct a session, resolving the backend from the registry.
    ///
    /// An unknown backend key or a failing factory is fatal; no partial
    /// session is created.
    pub fn new(config: SessionConfig, registry: &BackendRegistry) -> Result<Self> {
        let fs = registry.create(&config.backend)?;
        Ok(Self::with_backend(config, fs))
    }

    /// Construct a session around an already-built backend.
    pub fn with_backend(config: SessionConfig, fs: Box<dyn FileSystem>) -> Self {
        Self {
            fs,
            sink: ErrorSink::new(),
            base_root: config.base_root,
            rules: RuleSet::new(config.rules),
            scan_options: config.scan,
            class_overrides: config.class_overrides,
            resolver: None,
        }
    }

    /// Register the advisory diagnostic handler, replacing any prior one.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: FnMut(&Diagnostic) + Send + 'static,
    {
        self.sink.subscribe(handler);
    }

    /// Targeted load: resolve `aliases` under `root` in priority order
    /// (index 0 lowest) and become the query surface for them.
    ///
    /// `required_api` defaults to fully wildcarded when absent.
    /// `slot_versions` is aligned with `aliases` and may be shorter.
    pub fn init(
        &mut self,
        root: &Utf8Path,
        aliases: &[String],
        required_api: Option<&SemVersion>,
        slot_versions: &[Option<SemVersion>],
    ) -> Vec<ModMetadata> {
        let required = required_api.copied().unwrap_or_else(SemVersion::wildcard);
        tracing::info!(
            root = %root,
            mods = aliases.len(),
            required_api = %required,
            "Loading mod set"
        );
        let mods = load_targeted(
            self.fs.as_ref(),
            &mut self.sink,
            &self.scan_options,
            root,
            aliases,
            &required,
            slot_versions,
        );
        self.install_resolver(root, &mods);
        mods
    }

    /// Discovery scan: parse every subdirectory of `root` and become the
    /// query surface for them, in enumeration order.
    pub fn scan(&mut self, root: &Utf8Path, required_api: Option<&SemVersion>) -> Vec<ModMetadata> {
        let required = required_api.copied().unwrap_or_else(SemVersion::wildcard);
        tracing::info!(root = %root, required_api = %required, "Scanning for mods");
        let mods = scan_discovery(
            self.fs.as_ref(),
            &mut self.sink,
            &self.scan_options,
            root,
            &required,
        );
        self.install_resolver(root, &mods);
        mods
    }

    /// Replace any previous resolver with one over the freshly loaded mods.
    fn install_resolver(&mut self, root: &Utf8Path, mods: &[ModMetadata]) {
        let layers = mods
            .iter()
            .map(|metadata| Layer {
                id: metadata.id.clone(),
                root: root.join(&metadata.id),
            })
            .collect();
        self.resolver = Some(OverlayResolver::new(
            self.fs.as_ref(),
            self.base_root.clone(),
            layers,
            self.rules.clone(),
            self.class_overrides.clone(),
        ));
    }

    /// Effective content for a virtual path, or `None` when no layer (or
    /// the base set) supplies it — the host then falls back to its own
    /// default source.
    pub fn resolve(&mut self, path: &Utf8Path) -> Option<Vec<u8>> {
        let Some(resolver) = self.resolver.as_mut() else {
            self.sink.emit(Diagnostic::warning(
                DiagCode::NoSession,
                path.as_str(),
                "resolve called before any load or scan",
            ));
            return None;
        };
        resolver.resolve(self.fs.as_ref(), &mut self.sink, path)
    }

    /// Every virtual path contributed by any mod layer, optionally filtered
    /// by content class.
    pub fn list_paths(&mut self, filter: Option<ContentClass>) -> Vec<Utf8PathBuf> {
        match &self.resolver {
            Some(resolver) => resolver.list_paths(filter),
            None => {
                self.sink.emit(Diagnostic::warning(
                    DiagCode::NoSession,
                    "",
                    "list_paths called before any load or scan",
                ));
                Vec::new()
            }
        }
    }

    /// Invalidate all memoized content. Safe to call at any time, including
    /// before any session exists (warns, never faults).
    pub fn clear_cache(&mut self) {
        match &mut self.resolver {
            Some(resolver) => resolver.clear_cache(),
            None => self.sink.emit(Diagnostic::warning(
                DiagCode::NoSession,
                "",
                "clear_cache called before any load or scan",
            )),
        }
    }
}
