use super::{load_rules, open_session, parse_api_version, require_root, split_mod_list};
use crate::errors::CliError;
use colored::Colorize;
use modfold_engine::ContentClass;

pub struct ListArgs {
    pub root: String,
    pub mods: String,
    pub api_version: Option<String>,
    pub rules: Option<String>,
    pub class: Option<String>,
}

pub fn list_paths(args: ListArgs) -> miette::Result<()> {
    let root = require_root(&args.root)?;
    let required_api = parse_api_version(args.api_version.as_deref())?;
    let rules = load_rules(args.rules.as_deref())?;
    let aliases = split_mod_list(&args.mods);

    let filter = match &args.class {
        None => None,
        Some(raw) => Some(raw.parse::<ContentClass>().map_err(|_| {
            CliError::UnknownContentClass { class: raw.clone() }
        })?),
    };

    let mut session = open_session(rules)?;
    session.init(&root, &aliases, required_api.as_ref(), &[]);

    let paths = session.list_paths(filter);
    if paths.is_empty() {
        println!("{}", "No virtual paths.".dimmed());
        return Ok(());
    }
    for path in paths {
        println!("{path}");
    }

    Ok(())
}
