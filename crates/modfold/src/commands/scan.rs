use super::{open_session, parse_api_version, require_root};
use colored::Colorize;

pub struct ScanArgs {
    pub root: String,
    pub api_version: Option<String>,
}

pub fn scan_mods(args: ScanArgs) -> miette::Result<()> {
    let root = require_root(&args.root)?;
    let required_api = parse_api_version(args.api_version.as_deref())?;

    let mut session = open_session(Vec::new())?;
    let mods = session.scan(&root, required_api.as_ref());

    if mods.is_empty() {
        println!("{}", "No mods found.".dimmed());
        return Ok(());
    }

    println!(
        "{} {} mod(s) under {}\n",
        "Found".bright_green().bold(),
        mods.len(),
        root.as_str().bright_cyan()
    );
    for metadata in &mods {
        let title = if metadata.title.is_empty() {
            metadata.id.as_str()
        } else {
            metadata.title.as_str()
        };
        println!(
            "  {} {} {} {}",
            "•".bright_cyan(),
            title.bright_white().bold(),
            format!("v{}", metadata.mod_version).bright_green(),
            format!("(api {}, id {})", metadata.api_version, metadata.id).dimmed()
        );
        if !metadata.effective_author().is_empty() {
            println!("      by {}", metadata.effective_author().bright_white());
        }
    }

    Ok(())
}
