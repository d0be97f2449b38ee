//! Directory enumeration for `populate_from_file_path`.

use anyhow::{Result, anyhow};
use std::fs;
use std::path::Path;

/// Matching files and descendable subdirectories of one directory, both as
/// bare entry names sorted so scans are reproducible.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DirectoryListing {
    pub files: Vec<String>,
    pub subdirectories: Vec<String>,
}

/// List `dir`, keeping regular files whose name matches `pattern` and every
/// subdirectory not starting with a dot.
pub fn list_directory(dir: &Path, pattern: &str) -> Result<DirectoryListing> {
    let unreadable = || anyhow!("unable to open directory \"{}\"", dir.display());
    let mut listing = DirectoryListing::default();
    for entry in fs::read_dir(dir).map_err(|_| unreadable())? {
        let entry = entry.map_err(|_| unreadable())?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let path = entry.path();
        if path.is_dir() {
            if !name.starts_with('.') {
                listing.subdirectories.push(name);
            }
        } else if path.is_file() && wildcard_match(pattern, &name) {
            listing.files.push(name);
        }
    }
    listing.files.sort();
    listing.subdirectories.sort();
    Ok(listing)
}

/// Shell-style match where `*` spans any run of characters and `?` exactly
/// one; everything else is literal.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}
