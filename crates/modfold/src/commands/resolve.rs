use super::{load_rules, open_session, parse_api_version, require_root, split_mod_list};
use crate::errors::CliError;
use camino::Utf8Path;
use std::io::Write;

pub struct ResolveArgs {
    pub root: String,
    pub mods: String,
    pub api_version: Option<String>,
    pub rules: Option<String>,
    pub path: String,
    pub output: Option<String>,
}

pub fn resolve_path(args: ResolveArgs) -> miette::Result<()> {
    let root = require_root(&args.root)?;
    let required_api = parse_api_version(args.api_version.as_deref())?;
    let rules = load_rules(args.rules.as_deref())?;
    let aliases = split_mod_list(&args.mods);

    let mut session = open_session(rules)?;
    session.init(&root, &aliases, required_api.as_ref(), &[]);

    let Some(bytes) = session.resolve(Utf8Path::new(&args.path)) else {
        return Err(CliError::PathNotResolved { path: args.path }.into());
    };

    match args.output {
        Some(output) => std::fs::write(&output, &bytes).map_err(CliError::from)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).map_err(CliError::from)?;
        }
    }

    Ok(())
}
