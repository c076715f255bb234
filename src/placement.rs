//! Destination naming for copied files.
//!
//! Every copied file gets a short prefix built from the folders it was found in,
//! so files with the same name from different folders stay apart and remain traceable.
//! The final name is probed against the output folder and gets a running index when taken.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::{get_normalized_file_name_and_extension, os_str_to_string};

/// Total length of the folder prefix.
pub const FILE_PREFIX_SIZE: usize = 8;

/// Maximum number of innermost folders used for the prefix.
pub const FILE_PREFIX_MAX_FOLDERS: usize = 3;

/// Resolves free destination paths inside one output folder.
#[derive(Debug)]
pub struct Placement {
    output_dir: PathBuf,
    roots: Vec<PathBuf>,
    reserved: HashSet<PathBuf>,
}

impl Placement {
    /// Create a placement for the given output folder and absolute search roots.
    #[must_use]
    pub fn new(output_dir: PathBuf, roots: Vec<PathBuf>) -> Self {
        Self {
            output_dir,
            roots,
            reserved: HashSet::new(),
        }
    }

    /// Compute the folder prefix for an absolute file path.
    #[must_use]
    pub fn prefix_for(&self, file: &Path) -> String {
        let directory = file.parent().unwrap_or_else(|| Path::new(""));
        file_prefix(directory, &self.roots)
    }

    /// Find the first destination path for the file that is not taken.
    ///
    /// A path is taken if it exists on disk at the time of the check,
    /// or if it was reserved earlier during this run.
    pub fn next_free_destination(&self, file: &Path) -> Result<PathBuf> {
        let prefix = self.prefix_for(file);
        let (stem, extension) = get_normalized_file_name_and_extension(file)?;

        let mut index = 0;
        loop {
            let candidate = self
                .output_dir
                .join(destination_file_name(&prefix, &stem, &extension, index));

            let exists = candidate
                .try_exists()
                .with_context(|| format!("Failed to check if {} exists", candidate.display()))?;

            if !exists && !self.reserved.contains(&candidate) {
                return Ok(candidate);
            }
            index += 1;
        }
    }

    /// Mark a destination as used so later files in the same run skip it.
    pub fn reserve(&mut self, destination: PathBuf) {
        self.reserved.insert(destination);
    }
}

/// Folder names between the search root and the file directory.
///
/// Every root that is a leading part of the directory is stripped, in the given order.
/// Matching is done on whole path components.
#[must_use]
pub fn relative_folders(directory: &Path, roots: &[PathBuf]) -> Vec<String> {
    let mut remainder = directory;
    for root in roots {
        if let Ok(stripped) = remainder.strip_prefix(root) {
            remainder = stripped;
        }
    }

    remainder
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(os_str_to_string(name)),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Split the prefix length between `count` folders.
///
/// Leftover characters go to the innermost folders, one each.
///
/// ```rust
/// use audio_tools::placement::allocate_chars;
///
/// assert_eq!(allocate_chars(3), vec![2, 3, 3]);
/// assert!(allocate_chars(0).is_empty());
/// ```
#[must_use]
pub fn allocate_chars(count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let base = FILE_PREFIX_SIZE / count;
    let remainder = FILE_PREFIX_SIZE % count;
    (0..count)
        .map(|index| if index >= count - remainder { base + 1 } else { base })
        .collect()
}

/// Abbreviate a folder name to at most `length` lowercase ASCII letters and digits.
///
/// The window starts a third of the way into the spare characters.
/// Names shorter than `length` are returned whole.
#[must_use]
pub fn abbreviate(folder: &str, length: usize) -> String {
    let cleaned: Vec<char> = folder
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();

    let offset = cleaned.len().saturating_sub(length) / 3;
    cleaned.iter().skip(offset).take(length).collect()
}

/// Build the prefix for a file directory from at most three innermost folders under the roots.
#[must_use]
pub fn file_prefix(directory: &Path, roots: &[PathBuf]) -> String {
    let folders = relative_folders(directory, roots);
    let included = folders.len().min(FILE_PREFIX_MAX_FOLDERS);

    folders[folders.len() - included..]
        .iter()
        .zip(allocate_chars(included))
        .map(|(folder, length)| abbreviate(folder, length))
        .collect()
}

/// Format a destination file name.
///
/// Index zero keeps the original name, later indices are appended to the stem.
#[must_use]
pub fn destination_file_name(prefix: &str, stem: &str, extension: &str, index: usize) -> String {
    let stem = if index == 0 {
        stem.to_string()
    } else {
        format!("{stem}-{index}")
    };
    let file_name = if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    };
    if prefix.is_empty() {
        file_name
    } else {
        format!("{prefix}-{file_name}")
    }
}
