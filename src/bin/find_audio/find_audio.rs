use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use itertools::Itertools;
use walkdir::WalkDir;

use audio_tools::pattern::Pattern;
use audio_tools::placement::Placement;
use audio_tools::{colorize_bool, path_to_string, print_bold, print_warning};

use crate::FindAudioArgs;
use crate::config::Config;

/// Finds audio files matching the search keywords and copies them to the results folder.
#[derive(Debug)]
pub struct AudioFinder {
    config: Config,
    pattern: Pattern,
}

/// Audio files found in the search folders.
#[derive(Debug, Default)]
struct GatheredFiles {
    files: Vec<PathBuf>,
    /// Number of entries that could not be read while walking.
    unreadable: usize,
}

/// Outcome of copying the matched files.
#[derive(Debug, Default)]
struct CopySummary {
    /// Destination paths in processing order.
    destinations: Vec<PathBuf>,
    /// Files that were skipped because of an error.
    failed: Vec<PathBuf>,
}

impl AudioFinder {
    /// Create a new audio finder from command line arguments.
    pub fn new(args: FindAudioArgs) -> Result<Self> {
        let config = Config::from_args(args)?;
        Self::with_config(config)
    }

    fn with_config(config: Config) -> Result<Self> {
        let pattern = config.search.pattern()?;
        if config.verbose {
            Self::print_config(&config);
        }
        Ok(Self { config, pattern })
    }

    /// Run the search and copy the matching files.
    pub fn run(&self) -> Result<()> {
        println!("Searching for {}", self.pattern.to_string().cyan());

        let gathered = self.gather_audio_files();
        println!("All files count: {}", gathered.files.len());
        if gathered.unreadable > 0 {
            print_warning!("Skipped {} unreadable entries", gathered.unreadable);
        }

        let matches = self.filter_matches(gathered.files)?;
        println!("Files found: {}", matches.len().to_string().green());

        if matches.is_empty() {
            print_warning!("No matching audio files found");
            return Ok(());
        }

        let summary = self.copy_files(&matches)?;

        let action = if self.config.dryrun { "planned" } else { "copied" };
        println!(
            "Finished: {} {action}, {} failed",
            summary.destinations.len().to_string().green(),
            summary.failed.len().to_string().red()
        );

        Ok(())
    }

    fn print_config(config: &Config) {
        print_bold!("Options:");
        println!("  symbols: {:?}", config.search.symbols);
        println!("  words: {:?}", config.search.full_words);
        println!("  name: {}", config.name);
        println!("  output: {}", config.output_folder.display());
        println!(
            "  folders: {}",
            config.folders.iter().map(|folder| folder.display()).join(", ")
        );
        println!("  extensions: {}", config.extensions.join(", "));
        println!("  dryrun: {}", colorize_bool(config.dryrun));
    }

    /// Collect audio files from all search folders.
    ///
    /// Hidden files and directories are skipped, as is the results folder of this run
    /// so earlier results are not collected again.
    /// Invalid search folders and unreadable entries only print a warning.
    fn gather_audio_files(&self) -> GatheredFiles {
        let mut gathered = GatheredFiles::default();
        let results_folder = audio_tools::absolute_path(&self.config.results_folder()).ok();

        for folder in &self.config.folders {
            println!("{}", format!("Searching in: {}", folder.display()).magenta());
            if let Some(message) = Self::invalid_search_folder(folder) {
                print_warning!("{message}");
                continue;
            }

            for entry in WalkDir::new(folder)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0
                        || !(audio_tools::is_hidden(e) || Self::is_results_folder(e, results_folder.as_deref()))
                })
            {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        if path.is_file() && audio_tools::has_extension(path, &self.config.extensions) {
                            gathered.files.push(entry.into_path());
                        }
                    }
                    Err(error) => {
                        print_warning!("Skipping unreadable entry: {error}");
                        gathered.unreadable += 1;
                    }
                }
            }
        }

        gathered
    }

    /// Return a warning message if the search folder cannot be walked.
    fn invalid_search_folder(folder: &Path) -> Option<String> {
        if !folder.exists() {
            Some(format!("Search folder does not exist: {}", folder.display()))
        } else if !folder.is_dir() {
            Some(format!("Search folder is not a directory: {}", folder.display()))
        } else {
            None
        }
    }

    fn is_results_folder(entry: &walkdir::DirEntry, results_folder: Option<&Path>) -> bool {
        results_folder.is_some_and(|results| {
            entry.file_type().is_dir()
                && audio_tools::absolute_path(entry.path()).is_ok_and(|path| path == results)
        })
    }

    /// Keep the files whose path matches the pattern, as absolute and unique paths.
    fn filter_matches(&self, files: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        let matches: Vec<PathBuf> = files
            .into_iter()
            .filter(|path| self.pattern.is_match(&path_to_string(path)))
            .map(|path| audio_tools::absolute_path(&path))
            .collect::<Result<_>>()?;

        Ok(matches.into_iter().unique().collect())
    }

    /// Absolute search folders used for building file prefixes.
    fn absolute_roots(&self) -> Result<Vec<PathBuf>> {
        self.config
            .folders
            .iter()
            .map(|folder| audio_tools::absolute_path(folder))
            .collect()
    }

    /// Copy each file to a free destination in the results folder.
    ///
    /// Errors for a single file are printed and the file is skipped.
    fn copy_files(&self, files: &[PathBuf]) -> Result<CopySummary> {
        let output_dir = audio_tools::absolute_path(&self.config.results_folder())?;
        if !self.config.dryrun {
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create output folder: {}", output_dir.display()))?;
        }

        let mut placement = Placement::new(output_dir, self.absolute_roots()?);
        let mut summary = CopySummary::default();

        for file in files {
            match self.copy_file(&mut placement, file) {
                Ok(destination) => summary.destinations.push(destination),
                Err(error) => {
                    println!("{}", format!("Ignoring: {} Error: {error:#}", file.display()).red());
                    summary.failed.push(file.clone());
                }
            }
        }

        Ok(summary)
    }

    fn copy_file(&self, placement: &mut Placement, file: &Path) -> Result<PathBuf> {
        let destination = placement.next_free_destination(file)?;

        if self.config.dryrun {
            println!(
                "{} {} => {}",
                "[DRY]".cyan().bold(),
                file.display(),
                destination.display()
            );
        } else {
            Self::copy_or_remove(file, &destination)?;
            if self.config.verbose {
                println!("{} => {}", file.display(), destination.display());
            }
        }

        placement.reserve(destination.clone());
        Ok(destination)
    }

    /// Copy the file and remove a partially written destination if the copy fails.
    fn copy_or_remove(source: &Path, destination: &Path) -> Result<()> {
        if let Err(error) = fs::copy(source, destination) {
            if destination.exists() {
                let _ = fs::remove_file(destination);
            }
            return Err(error).with_context(|| format!("Failed to copy to {}", destination.display()));
        }
        Ok(())
    }
}
