use crate::errors::CliError;
use camino::Utf8PathBuf;
use colored::Colorize;
use modfold_manifest::{parse_manifest_bytes, to_document, ICON_FILE_NAME, MANIFEST_FILE_NAME};

pub struct InfoArgs {
    pub mod_dir: String,
}

pub fn info_mod_dir(args: InfoArgs) -> miette::Result<()> {
    let dir = Utf8PathBuf::from(&args.mod_dir);
    if !dir.as_std_path().is_dir() {
        return Err(CliError::ModDirNotFound {
            path: dir.into_std_path_buf(),
        }
        .into());
    }

    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    let bytes = std::fs::read(manifest_path.as_std_path()).map_err(CliError::from)?;
    let mut metadata = parse_manifest_bytes(&bytes).map_err(|source| CliError::ManifestInvalid {
        path: manifest_path.clone().into_std_path_buf(),
        source,
    })?;
    metadata.id = dir.file_name().unwrap_or_default().to_string();

    println!(
        "{} {}",
        "Mod:".bright_blue().bold(),
        if metadata.title.is_empty() {
            metadata.id.as_str()
        } else {
            metadata.title.as_str()
        }
        .bright_cyan()
        .bold()
    );
    println!(
        "{} {}",
        "Version:".bright_green(),
        metadata.mod_version.to_string().bright_white().bold()
    );
    println!(
        "{} {}",
        "API version:".bright_green(),
        metadata.api_version.to_string().bright_white()
    );
    println!(
        "{} {}",
        "Author:".bright_yellow(),
        metadata.effective_author().bright_white()
    );
    if dir.join(ICON_FILE_NAME).as_std_path().exists() {
        println!("{} {}", "Icon:".bright_yellow(), ICON_FILE_NAME);
    }

    println!("\n{}", "Full manifest (JSON):".bright_magenta().bold());
    println!("{}", to_document(&metadata));

    Ok(())
}
