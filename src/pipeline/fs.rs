//! Filesystem helpers shared by build and publish.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// All `.sol` files below `dir`, sorted.
pub fn find_sources(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/**/*.sol",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut files: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(|r| r.ok()).filter(|p| p.is_file()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Recursively copy `src` into `dst`, skipping any entry whose canonical path is in `skip`.
pub fn copy_tree(src: &Path, dst: &Path, skip: &[PathBuf]) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    let mut entries: Vec<_> = fs::read_dir(src)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        if let Ok(canonical) = fs::canonicalize(&path) {
            if skip.contains(&canonical) {
                continue;
            }
        }
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&path, &target, skip)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

/// Remove a file or directory tree if present.
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_nested_sources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("B.sol"), "").unwrap();
        fs::write(dir.path().join("lib/A.sol"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        let found = find_sources(dir.path());
        assert_eq!(found, vec![dir.path().join("B.sol"), dir.path().join("lib/A.sol")]);
    }

    #[test]
    fn copies_tree_with_skip() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::create_dir_all(src.join("out")).unwrap();
        fs::write(src.join("nested/a.ts"), "a").unwrap();
        fs::write(src.join("out/stale"), "x").unwrap();
        let skip = vec![fs::canonicalize(src.join("out")).unwrap()];
        let dst = dir.path().join("dst");
        copy_tree(&src, &dst, &skip).unwrap();
        assert_eq!(fs::read_to_string(dst.join("nested/a.ts")).unwrap(), "a");
        assert!(!dst.join("out").exists());
    }

    #[test]
    fn remove_missing_path_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(remove_path(&dir.path().join("nope")).is_ok());
    }
}
