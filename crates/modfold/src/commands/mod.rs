mod info;
mod list;
mod resolve;
mod scan;

pub use info::{info_mod_dir, InfoArgs};
pub use list::{list_paths, ListArgs};
pub use resolve::{resolve_path, ResolveArgs};
pub use scan::{scan_mods, ScanArgs};

use crate::errors::CliError;
use camino::Utf8PathBuf;
use colored::Colorize;
use modfold_engine::{
    BackendRegistry, Diagnostic, MergeRule, ModSession, RuleKind, SessionConfig, Severity,
};
use modfold_version::SemVersion;
use serde::Deserialize;
use std::path::PathBuf;

/// One entry of a JSON rules file.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RuleSpec {
    Override {
        pattern: String,
    },
    Merge {
        pattern: String,
        #[serde(default)]
        array_key: Option<String>,
    },
    Append {
        pattern: String,
        #[serde(default)]
        separator: Option<String>,
    },
    Ignore {
        pattern: String,
    },
}

pub(crate) fn parse_api_version(arg: Option<&str>) -> Result<Option<SemVersion>, CliError> {
    match arg {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: modfold_version::VersionParseError| CliError::InvalidVersion {
                version: raw.to_string(),
                reason: e.to_string(),
            }),
    }
}

pub(crate) fn load_rules(path: Option<&str>) -> Result<Vec<MergeRule>, CliError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents = std::fs::read_to_string(path)?;
    let specs: Vec<RuleSpec> =
        serde_json::from_str(&contents).map_err(|e| CliError::RulesFileInvalid {
            path: PathBuf::from(path),
            source: Box::new(e),
        })?;

    let mut rules = Vec::with_capacity(specs.len());
    for spec in specs {
        let (pattern, kind) = match spec {
            RuleSpec::Override { pattern } => (pattern, RuleKind::Override),
            RuleSpec::Merge { pattern, array_key } => (pattern, RuleKind::Merge { array_key }),
            RuleSpec::Append { pattern, separator } => (
                pattern,
                RuleKind::Append {
                    separator: separator.unwrap_or_else(|| "\n".to_string()),
                },
            ),
            RuleSpec::Ignore { pattern } => (pattern, RuleKind::Ignore),
        };
        rules.push(MergeRule::new(&pattern, kind)?);
    }
    Ok(rules)
}

/// Build a disk-backed session that prints diagnostics to stderr.
pub(crate) fn open_session(rules: Vec<MergeRule>) -> Result<ModSession, CliError> {
    let registry = BackendRegistry::new();
    let config = SessionConfig {
        rules,
        ..SessionConfig::default()
    };
    let mut session = ModSession::new(config, &registry)?;
    session.subscribe(print_diagnostic);
    Ok(session)
}

pub(crate) fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic.severity {
        Severity::Notice => "notice".bright_blue(),
        Severity::Warning => "warning".bright_yellow().bold(),
        Severity::Error => "error".bright_red().bold(),
    };
    eprintln!(
        "{label} [{}] {}: {}",
        diagnostic.code.to_string().dimmed(),
        diagnostic.origin.bright_cyan(),
        diagnostic.message
    );
}

pub(crate) fn require_root(root: &str) -> Result<Utf8PathBuf, CliError> {
    let path = Utf8PathBuf::from(root);
    if !path.as_std_path().is_dir() {
        return Err(CliError::RootNotFound {
            path: path.into_std_path_buf(),
        });
    }
    Ok(path)
}

pub(crate) fn split_mod_list(mods: &str) -> Vec<String> {
    mods.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
