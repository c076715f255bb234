mod config;
mod find_audio;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::find_audio::AudioFinder;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Find audio files matching keywords and copy them to a results folder"
)]
pub(crate) struct FindAudioArgs {
    /// Comma-separated keywords matched anywhere in the path
    #[arg(short = 's', long, value_name = "SYMBOLS")]
    symbols: Option<String>,

    /// Comma-separated keywords matched as whole words only
    #[arg(short = 'w', long, value_name = "WORDS")]
    words: Option<String>,

    /// Name of the results folder
    #[arg(short = 'n', long, value_name = "NAME")]
    name: Option<String>,

    /// Folder to save results in
    #[arg(short = 'o', long, alias = "output-folder", value_name = "OUTPUT_FOLDER", value_hint = clap::ValueHint::DirPath)]
    output: Option<PathBuf>,

    /// Folder to search, can be given multiple times
    #[arg(short = 'f', long = "folders", num_args = 1, action = clap::ArgAction::Append, value_name = "FOLDER", value_hint = clap::ValueHint::DirPath)]
    folders: Vec<PathBuf>,

    /// Only print what would be copied
    #[arg(short = 'd', long)]
    dry: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = FindAudioArgs::parse();
    if let Some(ref shell) = args.completion {
        audio_tools::generate_shell_completion(*shell, FindAudioArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        AudioFinder::new(args)?.run()
    }
}
