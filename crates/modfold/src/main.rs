use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    info_mod_dir, list_paths, resolve_path, scan_mods, InfoArgs, ListArgs, ResolveArgs, ScanArgs,
};
use miette::Result;

mod commands;
mod errors;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover and list all mods under a root directory
    Scan {
        /// Directory containing mod directories
        #[arg(short, long)]
        root: String,

        /// Host API version to score mods against
        #[arg(short, long)]
        api_version: Option<String>,
    },
    /// Show information about one mod directory
    Info {
        /// Path to the mod directory
        #[arg(short, long)]
        mod_dir: String,
    },
    /// Resolve a virtual path through an ordered mod set
    Resolve {
        /// Directory containing mod directories
        #[arg(short, long)]
        root: String,

        /// Comma-separated mod directory names, lowest priority first
        #[arg(short, long)]
        mods: String,

        /// Host API version to score mods against
        #[arg(short, long)]
        api_version: Option<String>,

        /// JSON rules file (override/merge/append/ignore patterns)
        #[arg(long)]
        rules: Option<String>,

        /// The virtual path to resolve
        path: String,

        /// Write resolved bytes to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List every virtual path contributed by an ordered mod set
    List {
        /// Directory containing mod directories
        #[arg(short, long)]
        root: String,

        /// Comma-separated mod directory names, lowest priority first
        #[arg(short, long)]
        mods: String,

        /// Host API version to score mods against
        #[arg(short, long)]
        api_version: Option<String>,

        /// JSON rules file (override/merge/append/ignore patterns)
        #[arg(long)]
        rules: Option<String>,

        /// Filter by content class (structured, text, image, audio, binary)
        #[arg(short, long)]
        class: Option<String>,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn main() -> Result<()> {
    let args = parse_args();

    match args.command {
        Commands::Scan { root, api_version } => scan_mods(ScanArgs { root, api_version }),
        Commands::Info { mod_dir } => info_mod_dir(InfoArgs { mod_dir }),
        Commands::Resolve {
            root,
            mods,
            api_version,
            rules,
            path,
            output,
        } => resolve_path(ResolveArgs {
            root,
            mods,
            api_version,
            rules,
            path,
            output,
        }),
        Commands::List {
            root,
            mods,
            api_version,
            rules,
            class,
        } => list_paths(ListArgs {
            root,
            mods,
            api_version,
            rules,
            class,
        }),
    }
}
