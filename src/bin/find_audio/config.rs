use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use audio_tools::AUDIO_EXTENSIONS;
use audio_tools::config::expand_home;
use audio_tools::pattern::SearchSpec;

use crate::FindAudioArgs;

/// Default parent folder for results.
pub const DEFAULT_OUTPUT_FOLDER: &str = "./find-results/";

/// Default search folder when none is given.
pub const DEFAULT_SEARCH_FOLDER: &str = ".";

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) dryrun: bool,
    pub(crate) extensions: Vec<String>,
    pub(crate) folders: Vec<PathBuf>,
    pub(crate) name: String,
    pub(crate) output_folder: PathBuf,
    pub(crate) search: SearchSpec,
    pub(crate) verbose: bool,
}

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct FindAudioConfig {
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    folders: Vec<String>,
    #[serde(default)]
    output_folder: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    find_audio: FindAudioConfig,
}

impl FindAudioConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = audio_tools::config::config_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.find_audio)
            .context("Failed to parse find_audio config TOML")
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn from_args(args: FindAudioArgs) -> anyhow::Result<Self> {
        let user_config = FindAudioConfig::get_user_config()?;
        Ok(Self::resolve(args, user_config))
    }

    /// Merge command line args with the user config.
    ///
    /// Command line values win over the config file, which wins over the defaults.
    pub fn resolve(args: FindAudioArgs, user_config: FindAudioConfig) -> Self {
        let search = SearchSpec::new(
            args.words.as_deref().unwrap_or_default(),
            args.symbols.as_deref().unwrap_or_default(),
        );

        let name = args
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| search.result_name());

        let folders = if args.folders.is_empty() {
            if user_config.folders.is_empty() {
                vec![PathBuf::from(DEFAULT_SEARCH_FOLDER)]
            } else {
                user_config.folders.iter().map(|folder| expand_home(folder)).collect()
            }
        } else {
            args.folders
        };

        let output_folder = args
            .output
            .or_else(|| user_config.output_folder.as_deref().map(expand_home))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FOLDER));

        let extensions = if user_config.extensions.is_empty() {
            AUDIO_EXTENSIONS.iter().map(std::string::ToString::to_string).collect()
        } else {
            user_config
                .extensions
                .iter()
                .map(|extension| extension.trim().trim_start_matches('.').to_lowercase())
                .collect()
        };

        Self {
            dryrun: args.dry || user_config.dryrun,
            extensions,
            folders,
            name,
            output_folder,
            search,
            verbose: args.verbose || user_config.verbose,
        }
    }

    /// Results folder: the output folder joined with the result name.
    #[must_use]
    pub fn results_folder(&self) -> PathBuf {
        self.output_folder.join(&self.name)
    }
}


#[cfg(test)]
mod config_resolve_tests {
    use super::*;

    fn default_args() -> FindAudioArgs {
        FindAudioArgs {
            symbols: None,
            words: None,
            name: None,
            output: None,
            folders: Vec::new(),
            dry: false,
            completion: None,
            verbose: false,
        }
    }

    #[test]
    fn resolve_uses_defaults() {
        let config = Config::resolve(default_args(), FindAudioConfig::default());
        assert_eq!(config.folders, vec![PathBuf::from(DEFAULT_SEARCH_FOLDER)]);
        assert_eq!(config.output_folder, PathBuf::from(DEFAULT_OUTPUT_FOLDER));
        assert_eq!(config.extensions.len(), AUDIO_EXTENSIONS.len());
        assert!(config.search.is_empty());
        assert_eq!(config.name, "");
        assert!(!config.dryrun);
        assert!(!config.verbose);
    }

    #[test]
    fn resolve_derives_name_from_keywords() {
        let mut args = default_args();
        args.words = Some("Lead Synth".to_string());
        args.symbols = Some("808, 808".to_string());

        let config = Config::resolve(args, FindAudioConfig::default());
        assert_eq!(config.search.full_words, vec!["lead synth"]);
        assert_eq!(config.search.symbols, vec!["808"]);
        assert_eq!(config.name, "leadsynth808");
    }

    #[test]
    fn resolve_explicit_name_wins() {
        let mut args = default_args();
        args.symbols = Some("guitar".to_string());
        args.name = Some("  riffs ".to_string());

        let config = Config::resolve(args, FindAudioConfig::default());
        assert_eq!(config.name, "riffs");
        assert_eq!(config.results_folder(), PathBuf::from(DEFAULT_OUTPUT_FOLDER).join("riffs"));
    }

    #[test]
    fn resolve_blank_name_falls_back_to_derived() {
        let mut args = default_args();
        args.symbols = Some("guitar".to_string());
        args.name = Some("   ".to_string());

        let config = Config::resolve(args, FindAudioConfig::default());
        assert_eq!(config.name, "guitar");
    }

    #[test]
    fn resolve_cli_folders_override_config() {
        let mut args = default_args();
        args.folders = vec![PathBuf::from("/cli/one"), PathBuf::from("/cli/two")];
        let user_config = FindAudioConfig {
            folders: vec!["/config/folder".to_string()],
            ..Default::default()
        };

        let config = Config::resolve(args, user_config);
        assert_eq!(config.folders, vec![PathBuf::from("/cli/one"), PathBuf::from("/cli/two")]);
    }

    #[test]
    fn resolve_config_folders_used_without_cli() {
        let user_config = FindAudioConfig {
            folders: vec!["/music/rock".to_string(), "/music/jazz".to_string()],
            ..Default::default()
        };

        let config = Config::resolve(default_args(), user_config);
        assert_eq!(
            config.folders,
            vec![PathBuf::from("/music/rock"), PathBuf::from("/music/jazz")]
        );
    }

    #[test]
    fn resolve_output_folder_precedence() {
        let user_config = FindAudioConfig {
            output_folder: Some("/config/out".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(default_args(), user_config);
        assert_eq!(config.output_folder, PathBuf::from("/config/out"));

        let mut args = default_args();
        args.output = Some(PathBuf::from("/cli/out"));
        let user_config = FindAudioConfig {
            output_folder: Some("/config/out".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(args, user_config);
        assert_eq!(config.output_folder, PathBuf::from("/cli/out"));
    }

    #[test]
    fn resolve_flags_from_either_source() {
        let mut args = default_args();
        args.dry = true;
        let config = Config::resolve(args, FindAudioConfig::default());
        assert!(config.dryrun);
        assert!(!config.verbose);

        let user_config = FindAudioConfig {
            verbose: true,
            ..Default::default()
        };
        let config = Config::resolve(default_args(), user_config);
        assert!(config.verbose);
        assert!(!config.dryrun);
    }

    #[test]
    fn resolve_normalizes_config_extensions() {
        let user_config = FindAudioConfig {
            extensions: vec![".WAV".to_string(), " flac ".to_string()],
            ..Default::default()
        };
        let config = Config::resolve(default_args(), user_config);
        assert_eq!(config.extensions, vec!["wav", "flac"]);
    }
}
