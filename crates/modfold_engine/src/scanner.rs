//! Mod directory scanning.
//!
//! Two entry points share one per-directory core:
//!
//! - [`load_targeted`] — resolve an ordered list of directory aliases under
//!   a root. Input order is priority order and is preserved; entries whose
//!   directory is missing or whose manifest fails to parse are skipped
//!   without placeholders.
//! - [`scan_discovery`] — enumerate a root's subdirectories and parse each
//!   one, returning results in the backend's original enumeration order.
//!
//! All version checks are advisory: a conflicting mod is still returned,
//! with the conflict reported through the [`ErrorSink`]. Only a missing or
//! unparseable manifest excludes a directory from the result.

use crate::diag::{DiagCode, Diagnostic, ErrorSink};
use crate::fs::FileSystem;
use camino::Utf8Path;
use modfold_manifest::{parse_manifest_bytes, ManifestError, ModMetadata, ICON_FILE_NAME, MANIFEST_FILE_NAME};
use modfold_version::{CompatScore, SemVersion, VersionPart};

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Minimum API compatibility score a mod must reach before an
    /// `api-conflict` error is reported.
    pub min_api_score: CompatScore,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_api_score: CompatScore::Minor,
        }
    }
}

/// Targeted load: resolve each alias under `root` in order.
///
/// `slot_versions` is aligned with `aliases`; a `Some` entry requires the
/// mod's own version to score at least [`CompatScore::Patch`] against it.
/// A shorter slice means no requirement for the remaining slots.
pub fn load_targeted(
    fs: &dyn FileSystem,
    sink: &mut ErrorSink,
    options: &ScanOptions,
    root: &Utf8Path,
    aliases: &[String],
    required_api: &SemVersion,
    slot_versions: &[Option<SemVersion>],
) -> Vec<ModMetadata> {
    let mut mods = Vec::new();

    for (index, alias) in aliases.iter().enumerate() {
        let dir = root.join(alias);
        if !fs.is_directory(&dir) {
            tracing::debug!("Mod directory does not resolve, skipping: {}", dir);
            continue;
        }

        let Some(metadata) = read_mod_directory(fs, sink, options, &dir, alias, required_api)
        else {
            continue;
        };

        if let Some(required_mod) = slot_versions.get(index).and_then(Option::as_ref) {
            let score = metadata.mod_version.compatibility(required_mod);
            if score < CompatScore::Patch {
                sink.emit(Diagnostic::error(
                    DiagCode::ModVersionConflict,
                    alias.clone(),
                    format!(
                        "mod version {} does not satisfy required {} (scored {})",
                        metadata.mod_version, required_mod, score
                    ),
                ));
            }
        }

        mods.push(metadata);
    }

    mods
}

/// Discovery scan: parse every subdirectory of `root`.
///
/// Non-directories are filtered out in place; the surviving entries keep
/// the backend's enumeration order. Only the API check runs here, since no
/// per-mod version requirement exists for discovered mods.
pub fn scan_discovery(
    fs: &dyn FileSystem,
    sink: &mut ErrorSink,
    options: &ScanOptions,
    root: &Utf8Path,
    required_api: &SemVersion,
) -> Vec<ModMetadata> {
    let Some(names) = fs.read_directory(root) else {
        tracing::warn!("Scan root is not a readable directory: {}", root);
        return Vec::new();
    };

    let mut mods = Vec::new();
    for name in names {
        let dir = root.join(&name);
        if !fs.is_directory(&dir) {
            continue;
        }
        if let Some(metadata) = read_mod_directory(fs, sink, options, &dir, &name, required_api) {
            mods.push(metadata);
        }
    }

    mods
}

/// Shared per-directory core: read the reserved manifest, attach the icon,
/// assign the id from the alias, and run the API compatibility check.
fn read_mod_directory(
    fs: &dyn FileSystem,
    sink: &mut ErrorSink,
    options: &ScanOptions,
    dir: &Utf8Path,
    alias: &str,
    required_api: &SemVersion,
) -> Option<ModMetadata> {
    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    let Some(bytes) = fs.read(&manifest_path) else {
        sink.emit(Diagnostic::error(
            DiagCode::MissingMetadata,
            alias,
            format!("mod directory has no {MANIFEST_FILE_NAME}: {dir}"),
        ));
        return None;
    };

    let mut metadata = match parse_manifest_bytes(&bytes) {
        Ok(metadata) => metadata,
        Err(err) => {
            let code = match &err {
                ManifestError::InvalidApiVersion { .. } => DiagCode::InvalidApiVersion,
                ManifestError::InvalidModVersion { .. } => DiagCode::InvalidModVersion,
                ManifestError::Empty | ManifestError::Malformed(_) => DiagCode::MetadataParse,
            };
            sink.emit(Diagnostic::error(code, alias, err.to_string()));
            return None;
        }
    };

    metadata.id = alias.to_string();

    match fs.read(&dir.join(ICON_FILE_NAME)) {
        Some(icon) => metadata.icon = Some(icon),
        None => sink.emit(Diagnostic::notice(
            DiagCode::MissingIcon,
            alias,
            format!("mod has no {ICON_FILE_NAME}"),
        )),
    }

    check_api_compatibility(sink, options, &metadata, required_api);

    Some(metadata)
}

/// Score a mod's API version against the host requirement.
///
/// A required API with major 0 is unstable-but-advisory: a minor mismatch
/// downgrades whatever the threshold check would have said to a
/// `prerelease-api` warning instead of a hard conflict.
fn check_api_compatibility(
    sink: &mut ErrorSink,
    options: &ScanOptions,
    metadata: &ModMetadata,
    required_api: &SemVersion,
) {
    let candidate = &metadata.api_version;

    if required_api.major == VersionPart::Number(0) {
        if let (VersionPart::Number(required_minor), VersionPart::Number(candidate_minor)) =
            (required_api.minor, candidate.minor)
        {
            if required_minor != candidate_minor {
                sink.emit(Diagnostic::warning(
                    DiagCode::PrereleaseApi,
                    metadata.id.clone(),
                    format!(
                        "mod targets pre-release API {} while {} is required",
                        candidate, required_api
                    ),
                ));
                return;
            }
        }
    }

    let score = candidate.compatibility(required_api);
    if score < options.min_api_score {
        sink.emit(Diagnostic::error(
            DiagCode::ApiConflict,
            metadata.id.clone(),
            format!(
                "mod API version {} does not satisfy required {} (scored {}, need at least {})",
                candidate, required_api, score, options.min_api_score
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use std::sync::{Arc, Mutex};

    fn manifest(api: &str, version: &str) -> String {
        format!(
            r#"{{ "title": "t", "api_version": "{api}", "mod_version": "{version}" }}"#
        )
    }

    fn collecting_sink() -> (ErrorSink, Arc<Mutex<Vec<Diagnostic>>>) {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut sink = ErrorSink::new();
        let inner = Arc::clone(&collected);
        sink.subscribe(move |d| inner.lock().unwrap().push(d.clone()));
        (sink, collected)
    }

    fn codes(collected: &Arc<Mutex<Vec<Diagnostic>>>) -> Vec<DiagCode> {
        collected.lock().unwrap().iter().map(|d| d.code).collect()
    }

    fn fixture() -> MemoryFileSystem {
        let mut fs = MemoryFileSystem::new();
        fs.add_text("mods/alpha/mod.json", &manifest("1.2.0", "1.0.0"));
        fs.add_file("mods/alpha/icon.png", vec![0x89, 0x50]);
        fs.add_text("mods/beta/mod.json", &manifest("1.2.3", "2.1.0"));
        fs.add_text("mods/broken/mod.json", "{ not json");
        fs.add_text("mods/empty/placeholder.txt", "");
        fs
    }

    #[test]
    fn test_targeted_preserves_input_order() {
        let fs = fixture();
        let (mut sink, _) = collecting_sink();
        let mods = load_targeted(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &["beta".to_string(), "alpha".to_string()],
            &"1.2.0".parse().unwrap(),
            &[],
        );
        let ids: Vec<&str> = mods.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["beta", "alpha"]);
    }

    #[test]
    fn test_targeted_skips_unresolved_and_unparsed() {
        let fs = fixture();
        let (mut sink, collected) = collecting_sink();
        let mods = load_targeted(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &[
                "alpha".to_string(),
                "nowhere".to_string(),
                "broken".to_string(),
                "empty".to_string(),
            ],
            &"1.2.0".parse().unwrap(),
            &[],
        );
        // No placeholders: only alpha survives, order preserved.
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].id, "alpha");
        // "nowhere" is silent; "broken" reports a parse error, "empty"
        // reports a missing manifest.
        let codes = codes(&collected);
        assert!(codes.contains(&DiagCode::MetadataParse));
        assert!(codes.contains(&DiagCode::MissingMetadata));
    }

    #[test]
    fn test_icon_attached_or_noticed() {
        let fs = fixture();
        let (mut sink, collected) = collecting_sink();
        let mods = load_targeted(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &["alpha".to_string(), "beta".to_string()],
            &"1.2.0".parse().unwrap(),
            &[],
        );
        assert_eq!(mods[0].icon.as_deref(), Some(&[0x89u8, 0x50][..]));
        assert!(mods[1].icon.is_none());

        let notices: Vec<_> = collected
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.code == DiagCode::MissingIcon)
            .map(|d| d.origin.clone())
            .collect();
        assert_eq!(notices, vec!["beta".to_string()]);
    }

    #[test]
    fn test_api_conflict_is_advisory_not_exclusionary() {
        let fs = fixture();
        let (mut sink, collected) = collecting_sink();
        let mods = load_targeted(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &["alpha".to_string()],
            &"2.0.0".parse().unwrap(),
            &[],
        );
        assert_eq!(mods.len(), 1);
        assert!(codes(&collected).contains(&DiagCode::ApiConflict));
    }

    #[test]
    fn test_prerelease_api_downgrades_to_warning() {
        let mut fs = MemoryFileSystem::new();
        fs.add_text("mods/pre/mod.json", &manifest("0.6.0", "1.0.0"));
        let (mut sink, collected) = collecting_sink();
        let mods = load_targeted(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &["pre".to_string()],
            &"0.5.0".parse().unwrap(),
            &[],
        );
        assert_eq!(mods.len(), 1);
        let codes = codes(&collected);
        assert!(codes.contains(&DiagCode::PrereleaseApi));
        assert!(!codes.contains(&DiagCode::ApiConflict));
        let severities: Vec<_> = collected
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.code == DiagCode::PrereleaseApi)
            .map(|d| d.severity)
            .collect();
        assert_eq!(severities, vec![crate::diag::Severity::Warning]);
    }

    #[test]
    fn test_slot_mod_version_conflict() {
        let fs = fixture();
        let (mut sink, collected) = collecting_sink();
        let mods = load_targeted(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &["alpha".to_string(), "beta".to_string()],
            &"1.2.0".parse().unwrap(),
            &[
                Some("2.0.0".parse().unwrap()), // alpha is 1.0.0 -> conflict
                Some("2.1.0".parse().unwrap()), // beta matches exactly
            ],
        );
        assert_eq!(mods.len(), 2);
        let conflicted: Vec<_> = collected
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.code == DiagCode::ModVersionConflict)
            .map(|d| d.origin.clone())
            .collect();
        assert_eq!(conflicted, vec!["alpha".to_string()]);
    }

    #[test]
    fn test_discovery_keeps_enumeration_order_and_filters_files() {
        let mut fs = fixture();
        fs.add_text("mods/stray.txt", "not a mod");
        let (mut sink, _) = collecting_sink();
        let mods = scan_discovery(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("mods"),
            &SemVersion::wildcard(),
        );
        // MemoryFileSystem enumerates sorted; broken/empty fail to parse.
        let ids: Vec<&str> = mods.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_discovery_on_unreadable_root_is_empty() {
        let fs = MemoryFileSystem::new();
        let (mut sink, collected) = collecting_sink();
        let mods = scan_discovery(
            &fs,
            &mut sink,
            &ScanOptions::default(),
            Utf8Path::new("nope"),
            &SemVersion::wildcard(),
        );
        assert!(mods.is_empty());
        assert!(collected.lock().unwrap().is_empty());
    }
}
