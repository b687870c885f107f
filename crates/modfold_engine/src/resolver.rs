//! Layered content resolution.
//!
//! The [`OverlayResolver`] is the live query surface the host asset backend
//! talks to after a scan. It indexes every file contributed by any mod
//! layer, and for each virtual path computes the single effective content:
//!
//! 1. Collect contributors in ascending priority: the base asset set first
//!    (if the path exists there), then each mod layer that contains the
//!    path, lowest priority to highest.
//! 2. A path matching an Ignore rule, or a reserved manifest/icon filename,
//!    never appears in the virtual set.
//! 3. With no matching rule, or an Override rule, the highest-priority
//!    contributor wins outright.
//! 4. A Merge rule folds JSON contributors in ascending order: scalars
//!    replace, objects recurse, arrays replace wholesale unless the rule
//!    declares a key field for element-wise merging.
//! 5. An Append rule joins text contributors in ascending order with the
//!    rule's separator.
//!
//! Failures are advisory and path-local: a malformed Merge contributor
//! falls the path back to Override semantics, an unreadable contributor is
//! skipped, and other paths are never affected. Resolved content is
//! memoized per path until [`clear_cache`](OverlayResolver::clear_cache).

use crate::diag::{DiagCode, Diagnostic, ErrorSink};
use crate::fs::FileSystem;
use crate::rules::{RuleKind, RuleSet};
use camino::{Utf8Path, Utf8PathBuf};
use modfold_manifest::{ICON_FILE_NAME, MANIFEST_FILE_NAME};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Coarse content classification used by path enumeration filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContentClass {
    /// Tree-shaped documents (JSON and friends).
    Structured,
    /// Line-oriented text.
    Text,
    Image,
    Audio,
    /// Everything else.
    Binary,
}

impl ContentClass {
    /// Built-in extension mapping. Callers can override per extension via
    /// [`OverlayResolver`]'s class overrides.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "json" | "yaml" | "yml" | "toml" | "xml" => ContentClass::Structured,
            "txt" | "md" | "csv" | "ini" | "cfg" | "log" => ContentClass::Text,
            "png" | "jpg" | "jpeg" | "webp" | "dds" | "bmp" | "tga" => ContentClass::Image,
            "ogg" | "wav" | "mp3" | "flac" => ContentClass::Audio,
            _ => ContentClass::Binary,
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentClass::Structured => "structured",
            ContentClass::Text => "text",
            ContentClass::Image => "image",
            ContentClass::Audio => "audio",
            ContentClass::Binary => "binary",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structured" => Ok(ContentClass::Structured),
            "text" => Ok(ContentClass::Text),
            "image" => Ok(ContentClass::Image),
            "audio" => Ok(ContentClass::Audio),
            "binary" => Ok(ContentClass::Binary),
            other => Err(format!("unknown content class `{other}`")),
        }
    }
}

/// One mod layer: its session id and the directory that backs it.
///
/// Layer order is priority order; index 0 is the lowest priority and the
/// last index the highest. Order is caller-specified and never re-sorted.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: String,
    pub root: Utf8PathBuf,
}

/// One contributor to a virtual path.
#[derive(Debug, Clone)]
struct Source {
    /// Index into the layer list (ascending priority).
    layer: usize,
    /// Physical path inside the layer directory.
    physical: Utf8PathBuf,
}

/// Contributors for one virtual path, ascending priority.
#[derive(Debug, Default)]
struct OverlayEntry {
    sources: Vec<Source>,
}

/// Priority-ordered override/merge/append resolver with a per-path memo.
pub struct OverlayResolver {
    base_root: Option<Utf8PathBuf>,
    layers: Vec<Layer>,
    rules: RuleSet,
    class_overrides: BTreeMap<String, ContentClass>,
    entries: BTreeMap<Utf8PathBuf, OverlayEntry>,
    cache: HashMap<Utf8PathBuf, Option<Vec<u8>>>,
}

fn is_reserved(path: &Utf8Path) -> bool {
    path.as_str() == MANIFEST_FILE_NAME || path.as_str() == ICON_FILE_NAME
}

impl OverlayResolver {
    /// Index the given layers and become the query surface for them.
    ///
    /// Walks every layer directory once. Reserved filenames and paths
    /// matching an Ignore rule are left out of the virtual set entirely.
    pub fn new(
        fs: &dyn FileSystem,
        base_root: Option<Utf8PathBuf>,
        layers: Vec<Layer>,
        rules: RuleSet,
        class_overrides: BTreeMap<String, ContentClass>,
    ) -> Self {
        let mut entries: BTreeMap<Utf8PathBuf, OverlayEntry> = BTreeMap::new();

        for (index, layer) in layers.iter().enumerate() {
            for relative in walk_layer(fs, &layer.root) {
                if is_reserved(&relative) {
                    continue;
                }
                if matches!(rules.match_path(&relative), Some(RuleKind::Ignore)) {
                    continue;
                }
                let physical = layer.root.join(&relative);
                entries
                    .entry(relative)
                    .or_default()
                    .sources
                    .push(Source {
                        layer: index,
                        physical,
                    });
            }
        }

        tracing::debug!(
            layers = layers.len(),
            paths = entries.len(),
            "Indexed overlay layers"
        );

        Self {
            base_root,
            layers,
            rules,
            class_overrides,
            entries,
            cache: HashMap::new(),
        }
    }

    /// The layers backing this resolver, in ascending priority order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Resolve the effective content for a virtual path.
    ///
    /// Returns `None` for ignored, reserved and unknown paths; the host
    /// falls back to its own default source in that case.
    pub fn resolve(
        &mut self,
        fs: &dyn FileSystem,
        sink: &mut ErrorSink,
        path: &Utf8Path,
    ) -> Option<Vec<u8>> {
        if let Some(cached) = self.cache.get(path) {
            return cached.clone();
        }
        let resolved = self.resolve_uncached(fs, sink, path);
        self.cache.insert(path.to_owned(), resolved.clone());
        resolved
    }

    fn resolve_uncached(
        &self,
        fs: &dyn FileSystem,
        sink: &mut ErrorSink,
        path: &Utf8Path,
    ) -> Option<Vec<u8>> {
        if is_reserved(path) {
            return None;
        }
        let rule = self.rules.match_path(path);
        if matches!(rule, Some(RuleKind::Ignore)) {
            return None;
        }

        let contributors = self.collect_contributors(fs, path);
        if contributors.is_empty() {
            return None;
        }

        match rule {
            None | Some(RuleKind::Override) => resolve_override(fs, &contributors),
            Some(RuleKind::Merge { array_key }) => {
                resolve_merge(fs, sink, path, &contributors, array_key.as_deref())
            }
            Some(RuleKind::Append { separator }) => {
                resolve_append(fs, sink, path, &contributors, separator)
            }
            Some(RuleKind::Ignore) => None,
        }
    }

    /// Physical contributor paths for a virtual path, ascending priority:
    /// base asset first, then each layer that contains it.
    fn collect_contributors(&self, fs: &dyn FileSystem, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut contributors = Vec::new();

        if let Some(base_root) = &self.base_root {
            let physical = base_root.join(path);
            if fs.exists(&physical) && !fs.is_directory(&physical) {
                contributors.push(physical);
            }
        }

        if let Some(entry) = self.entries.get(path) {
            // Sources were pushed layer by layer, so they are already in
            // ascending priority order.
            contributors.extend(entry.sources.iter().map(|s| s.physical.clone()));
        }

        contributors
    }

    /// The `(priority, physical source)` contributor list recorded for a
    /// virtual path, ascending priority. Does not include the base asset
    /// set, which is checked per resolve.
    pub fn contributors_of(&self, path: &Utf8Path) -> Vec<(usize, &Utf8Path)> {
        self.entries
            .get(path)
            .map(|entry| {
                entry
                    .sources
                    .iter()
                    .map(|source| (source.layer, source.physical.as_path()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every virtual path contributed by any mod layer, optionally filtered
    /// by content class. Base-only paths are not part of the virtual set.
    pub fn list_paths(&self, filter: Option<ContentClass>) -> Vec<Utf8PathBuf> {
        self.entries
            .keys()
            .filter(|path| match filter {
                None => true,
                Some(class) => self.classify(path) == class,
            })
            .cloned()
            .collect()
    }

    /// Classification of one virtual path, honoring caller overrides.
    pub fn classify(&self, path: &Utf8Path) -> ContentClass {
        let Some(extension) = path.extension() else {
            return ContentClass::Binary;
        };
        let extension = extension.to_ascii_lowercase();
        self.class_overrides
            .get(&extension)
            .copied()
            .unwrap_or_else(|| ContentClass::from_extension(&extension))
    }

    /// Drop the entire memo set. Always safe to call.
    pub fn clear_cache(&mut self) {
        tracing::debug!(entries = self.cache.len(), "Clearing resolved-content cache");
        self.cache.clear();
    }
}

/// Walk a layer directory, returning file paths relative to its root.
fn walk_layer(fs: &dyn FileSystem, root: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_owned()];

    while let Some(dir) = stack.pop() {
        let Some(names) = fs.read_directory(&dir) else {
            continue;
        };
        for name in names {
            let path = dir.join(&name);
            if fs.is_directory(&path) {
                stack.push(path);
                continue;
            }
            match path.strip_prefix(root) {
                Ok(relative) => files.push(relative.to_owned()),
                Err(_) => tracing::warn!("Walked path escapes layer root: {}", path),
            }
        }
    }

    files
}

/// Override semantics: highest-priority readable contributor wins.
fn resolve_override(fs: &dyn FileSystem, contributors: &[Utf8PathBuf]) -> Option<Vec<u8>> {
    for physical in contributors.iter().rev() {
        if let Some(bytes) = fs.read(physical) {
            return Some(bytes);
        }
        tracing::warn!("Contributor unreadable, trying next: {}", physical);
    }
    None
}

/// Merge semantics: fold JSON documents in ascending priority order.
///
/// Unreadable contributors are skipped with a `merge-failure`; a malformed
/// document degrades the whole path to Override semantics.
fn resolve_merge(
    fs: &dyn FileSystem,
    sink: &mut ErrorSink,
    path: &Utf8Path,
    contributors: &[Utf8PathBuf],
    array_key: Option<&str>,
) -> Option<Vec<u8>> {
    let mut documents = Vec::new();

    for physical in contributors {
        let Some(bytes) = fs.read(physical) else {
            sink.emit(Diagnostic::error(
                DiagCode::MergeFailure,
                path.as_str(),
                format!("contributor unreadable, skipped: {physical}"),
            ));
            continue;
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(document) => documents.push(document),
            Err(err) => {
                sink.emit(Diagnostic::error(
                    DiagCode::MergeFailure,
                    path.as_str(),
                    format!("malformed contributor {physical}, falling back to override: {err}"),
                ));
                return resolve_override(fs, contributors);
            }
        }
    }

    let mut documents = documents.into_iter();
    let first = documents.next()?;
    let merged = documents.fold(first, |acc, next| merge_value(acc, next, array_key));

    serde_json::to_vec_pretty(&merged).ok()
}

/// Recursive JSON merge: `overlay` wins at every scalar, objects recurse,
/// arrays replace wholesale unless `array_key` enables keyed merging.
fn merge_value(base: Value, overlay: Value, array_key: Option<&str>) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_value(base_value, overlay_value, array_key),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(base_items), Value::Array(overlay_items)) if array_key.is_some() => {
            merge_keyed_array(base_items, overlay_items, array_key)
        }
        (_, overlay) => overlay,
    }
}

/// Element-wise array merge: overlay elements whose key field matches an
/// existing element merge into it; the rest are appended in order.
fn merge_keyed_array(
    mut base_items: Vec<Value>,
    overlay_items: Vec<Value>,
    array_key: Option<&str>,
) -> Value {
    // Guarded by the caller; Option is threaded for recursion only.
    let key = match array_key {
        Some(key) => key,
        None => return Value::Array(overlay_items),
    };

    for overlay_item in overlay_items {
        let position = overlay_item
            .get(key)
            .and_then(|key_value| base_items.iter().position(|e| e.get(key) == Some(key_value)));
        match position {
            Some(index) => {
                let base_item = base_items[index].take();
                base_items[index] = merge_value(base_item, overlay_item, array_key);
            }
            None => base_items.push(overlay_item),
        }
    }

    Value::Array(base_items)
}

/// Append semantics: join text bodies ascending with the rule's separator.
/// Unreadable or non-text contributors are skipped with an `append-failure`.
fn resolve_append(
    fs: &dyn FileSystem,
    sink: &mut ErrorSink,
    path: &Utf8Path,
    contributors: &[Utf8PathBuf],
    separator: &str,
) -> Option<Vec<u8>> {
    let mut bodies = Vec::new();

    for physical in contributors {
        let Some(bytes) = fs.read(physical) else {
            sink.emit(Diagnostic::error(
                DiagCode::AppendFailure,
                path.as_str(),
                format!("contributor unreadable, skipped: {physical}"),
            ));
            continue;
        };
        match String::from_utf8(bytes) {
            Ok(body) => bodies.push(body),
            Err(_) => sink.emit(Diagnostic::error(
                DiagCode::AppendFailure,
                path.as_str(),
                format!("contributor is not valid text, skipped: {physical}"),
            )),
        }
    }

    if bodies.is_empty() {
        return None;
    }
    Some(bodies.join(separator).into_bytes())
}
