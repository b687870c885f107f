//! Mod manifest documents.
//!
//! Every mod directory carries a reserved `mod.json` describing the mod and
//! an optional `icon.png` next to it. Parsing is deliberately lopsided:
//!
//! - String fields, contributor lists and the free-form metadata map are
//!   **lenient** — absent values default to empty.
//! - `api_version` and `mod_version` are **strict** — an absent or malformed
//!   value aborts parsing of the whole document, with a distinct error per
//!   field. A [`ModMetadata`] is therefore guaranteed to carry both versions.
//!
//! The legacy single-string `author` field predates the `contributors` list.
//! It is retained verbatim and re-emitted on serialization; when contributors
//! exist, readers should treat `contributors[0].name` as the effective
//! author (see [`ModMetadata::effective_author`]).

use modfold_version::SemVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved manifest filename inside every mod directory.
pub const MANIFEST_FILE_NAME: &str = "mod.json";

/// Reserved optional icon filename adjacent to the manifest.
pub const ICON_FILE_NAME: &str = "icon.png";

/// Errors produced while parsing a manifest document.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The document was empty or blank.
    #[error("manifest document is empty")]
    Empty,

    /// The document is not well-formed JSON.
    #[error("malformed manifest document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `api_version` was absent or failed to parse.
    #[error("invalid or missing `api_version`: {reason}")]
    InvalidApiVersion { reason: String },

    /// `mod_version` was absent or failed to parse.
    #[error("invalid or missing `mod_version`: {reason}")]
    InvalidModVersion { reason: String },
}

/// One entry in a manifest's `contributors` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contributor {
    pub name: String,
    pub role: String,
    pub email: String,
    pub url: String,
}

/// A validated mod descriptor.
///
/// Created once per successfully parsed directory. The `id` is not part of
/// the document; the scanner derives it from the directory alias after
/// parsing. Everything else is immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModMetadata {
    /// Unique id within one resolution session, derived from the directory
    /// alias. Empty until the scanner assigns it.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Legacy single-author string, kept verbatim for serialization.
    pub author: String,
    pub contributors: Vec<Contributor>,
    pub homepage: String,
    pub api_version: SemVersion,
    pub mod_version: SemVersion,
    pub license: String,
    pub license_ref: String,
    /// Free-form string map from the document's nested `metadata` object.
    pub extra: BTreeMap<String, String>,
    /// Raw icon bytes, if an icon file was present.
    pub icon: Option<Vec<u8>>,
}

impl ModMetadata {
    /// The author readers should display: the first contributor's name when
    /// contributors exist, otherwise the legacy `author` string.
    pub fn effective_author(&self) -> &str {
        self.contributors
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or(&self.author)
    }
}

/// The on-disk document shape. All fields except the two versions default
/// on absence; the versions stay `Option` so validation can distinguish
/// absent from malformed.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ManifestDoc {
    title: String,
    description: String,
    author: String,
    contributors: Vec<Contributor>,
    homepage: String,
    api_version: Option<String>,
    mod_version: Option<String>,
    license: String,
    license_ref: String,
    metadata: BTreeMap<String, String>,
}

/// Parse a manifest document into a [`ModMetadata`].
///
/// The returned metadata has an empty `id` and no icon; both are filled in
/// by the scanner. See the module docs for the lenient/strict field split.
pub fn parse_manifest(text: &str) -> Result<ModMetadata, ManifestError> {
    parse_manifest_bytes(text.as_bytes())
}

/// Parse manifest bytes. Non-UTF-8 input is reported as malformed.
pub fn parse_manifest_bytes(bytes: &[u8]) -> Result<ModMetadata, ManifestError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ManifestError::Empty);
    }
    let doc: ManifestDoc = serde_json::from_slice(bytes)?;

    let api_version: SemVersion = match &doc.api_version {
        None => {
            return Err(ManifestError::InvalidApiVersion {
                reason: "field is missing".to_string(),
            })
        }
        Some(raw) => raw.parse().map_err(|e| ManifestError::InvalidApiVersion {
            reason: format!("{e}"),
        })?,
    };
    let mod_version: SemVersion = match &doc.mod_version {
        None => {
            return Err(ManifestError::InvalidModVersion {
                reason: "field is missing".to_string(),
            })
        }
        Some(raw) => raw.parse().map_err(|e| ManifestError::InvalidModVersion {
            reason: format!("{e}"),
        })?,
    };

    Ok(ModMetadata {
        id: String::new(),
        title: doc.title,
        description: doc.description,
        author: doc.author,
        contributors: doc.contributors,
        homepage: doc.homepage,
        api_version,
        mod_version,
        license: doc.license,
        license_ref: doc.license_ref,
        extra: doc.metadata,
        icon: None,
    })
}

/// Serialize a [`ModMetadata`] back into its document form.
///
/// Re-emits both the legacy `author` field and the `contributors` list, and
/// the flat metadata map as a nested object. `parse_manifest` of the output
/// reproduces the input (minus `id` and icon, which are not document
/// fields; versions re-emit with explicit wildcards).
pub fn to_document(metadata: &ModMetadata) -> String {
    let doc = ManifestDoc {
        title: metadata.title.clone(),
        description: metadata.description.clone(),
        author: metadata.author.clone(),
        contributors: metadata.contributors.clone(),
        homepage: metadata.homepage.clone(),
        api_version: Some(metadata.api_version.to_string()),
        mod_version: Some(metadata.mod_version.to_string()),
        license: metadata.license.clone(),
        license_ref: metadata.license_ref.clone(),
        metadata: metadata.extra.clone(),
    };
    // ManifestDoc serialization cannot fail: it is a tree of strings and maps.
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOC: &str = r#"
    {
        "title": "Old Harbor Overhaul",
        "description": "Reworks the harbor district",
        "author": "rivermouth",
        "contributors": [
            { "name": "rivermouth", "role": "author", "email": "r@example.com", "url": "https://example.com" },
            { "name": "kelp", "role": "textures", "email": "", "url": "" }
        ],
        "homepage": "https://mods.example.com/old-harbor",
        "api_version": "1.4.0",
        "mod_version": "2.0.1",
        "license": "MIT",
        "license_ref": "LICENSE.txt",
        "metadata": { "category": "map", "loader": "native" }
    }
    "#;

    #[test]
    fn test_parse_full_document() {
        let meta = parse_manifest(FULL_DOC).unwrap();
        assert_eq!(meta.title, "Old Harbor Overhaul");
        assert_eq!(meta.author, "rivermouth");
        assert_eq!(meta.contributors.len(), 2);
        assert_eq!(meta.api_version, "1.4.0".parse().unwrap());
        assert_eq!(meta.mod_version, "2.0.1".parse().unwrap());
        assert_eq!(meta.extra.get("category").map(String::as_str), Some("map"));
        assert!(meta.id.is_empty());
        assert!(meta.icon.is_none());
    }

    #[test]
    fn test_lenient_string_fields() {
        let meta =
            parse_manifest(r#"{ "api_version": "1.0.0", "mod_version": "0.1.0" }"#).unwrap();
        assert_eq!(meta.title, "");
        assert_eq!(meta.description, "");
        assert_eq!(meta.author, "");
        assert!(meta.contributors.is_empty());
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_missing_api_version_aborts() {
        let err = parse_manifest(r#"{ "mod_version": "0.1.0" }"#).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidApiVersion { .. }));
    }

    #[test]
    fn test_malformed_mod_version_aborts() {
        let err = parse_manifest(r#"{ "api_version": "1.0.0", "mod_version": "one" }"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidModVersion { .. }));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse_manifest(""), Err(ManifestError::Empty)));
        assert!(matches!(parse_manifest("   \n"), Err(ManifestError::Empty)));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_manifest("{ not json"),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn test_effective_author_prefers_contributors() {
        let meta = parse_manifest(FULL_DOC).unwrap();
        assert_eq!(meta.effective_author(), "rivermouth");

        let legacy_only = parse_manifest(
            r#"{ "author": "solo", "api_version": "1.0.0", "mod_version": "1.0.0" }"#,
        )
        .unwrap();
        assert_eq!(legacy_only.effective_author(), "solo");
    }

    #[test]
    fn test_document_roundtrip() {
        let meta = parse_manifest(FULL_DOC).unwrap();
        let emitted = to_document(&meta);
        let reparsed = parse_manifest(&emitted).unwrap();
        assert_eq!(reparsed, meta);

        // Both author representations survive serialization.
        let value: serde_json::Value = serde_json::from_str(&emitted).unwrap();
        assert_eq!(value["author"], "rivermouth");
        assert_eq!(value["contributors"][1]["name"], "kelp");
        assert_eq!(value["metadata"]["loader"], "native");
    }

    #[test]
    fn test_roundtrip_defaults_omitted_version_components() {
        let meta = parse_manifest(r#"{ "api_version": "1.2", "mod_version": "3" }"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&to_document(&meta)).unwrap();
        assert_eq!(value["api_version"], "1.2.*");
        assert_eq!(value["mod_version"], "3.*.*");
    }
}
