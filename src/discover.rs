use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::PolicySettings;
use crate::error::{Error, Result};

/// Which directories may be processed and which files are never touched.
#[derive(Debug, Clone)]
pub struct FilePolicy {
    safe_markers: Vec<String>,
    protected_dirs: Vec<String>,
    protected_names: Vec<Regex>,
    markup_extensions: Vec<String>,
}

impl FilePolicy {
    pub fn from_settings(policy: &PolicySettings) -> Result<Self> {
        Ok(FilePolicy {
            safe_markers: policy.safe_markers.clone(),
            protected_dirs: policy.protected_dirs.clone(),
            protected_names: policy.compile_protected_names()?,
            markup_extensions: policy
                .markup_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        })
    }

    /// A component of `dir` contains one of the safe marker names.
    pub fn is_safe_directory(&self, dir: &Path) -> bool {
        dir.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            self.safe_markers.iter().any(|m| name.contains(m.as_str()))
        })
    }

    /// Why `path` must be skipped, if it must. Directories are checked
    /// relative to `root` so the run root itself may be named anything.
    pub fn protection_reason(&self, root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                let name = component.as_os_str().to_string_lossy();
                if self.protected_dirs.iter().any(|d| d == name.as_ref()) {
                    return Some(format!("protected directory {name}"));
                }
            }
        }

        let file_name = path.file_name()?.to_string_lossy();
        if self.protected_names.iter().any(|re| re.is_match(&file_name)) {
            return Some("protected file".to_string());
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !self.markup_extensions.contains(&ext) {
            return Some("not a markup file".to_string());
        }
        None
    }
}

/// Files below `dir` whose name matches `pattern`, sorted.
pub fn find_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound(dir.to_path_buf()));
    }
    let root = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{root}/**/{pattern}");
    debug!(pattern = %full, "walking");

    let entries = glob::glob(&full).map_err(|source| Error::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files.dedup();

    info!("Matched {} files in {}", files.len(), dir.display());
    Ok(files)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn policy() -> FilePolicy {
        FilePolicy::from_settings(&PolicySettings::default()).unwrap()
    }

    #[test]
    fn safe_directories() {
        let p = policy();
        assert!(p.is_safe_directory(Path::new("/data/converted/hr")));
        assert!(p.is_safe_directory(Path::new("/data/Conversion_2024")));
        assert!(!p.is_safe_directory(Path::new("/home/user/projects")));
    }

    #[test]
    fn protected_paths() {
        let p = policy();
        let root = Path::new("/data/converted");
        assert!(p.protection_reason(root, &root.join("README.md")).is_some());
        assert!(p.protection_reason(root, &root.join("Changelog.md")).is_some());
        assert!(p.protection_reason(root, &root.join("processing_report_2024.md")).is_some());
        assert_eq!(
            p.protection_reason(root, &root.join(".git/notes.md")).as_deref(),
            Some("protected directory .git")
        );
        assert_eq!(
            p.protection_reason(root, &root.join("a.txt")).as_deref(),
            Some("not a markup file")
        );
        assert_eq!(p.protection_reason(root, &root.join("ПР Юрист.md")), None);
        assert_eq!(p.protection_reason(root, &root.join("sub/doc.MARKDOWN")), None);
    }

    #[test]
    fn root_named_like_protected_dir_is_fine() {
        let p = policy();
        let root = Path::new("/work/target/converted");
        assert_eq!(p.protection_reason(root, &root.join("doc.md")), None);
    }

    #[test]
    fn finds_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("z.md"), "z").unwrap();
        fs::write(dir.path().join("b/c/a.md"), "a").unwrap();
        fs::write(dir.path().join("b/skip.txt"), "t").unwrap();
        fs::create_dir_all(dir.path().join("dir.md")).unwrap();

        let files = find_files(dir.path(), "*.md").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("b/c/a.md"), dir.path().join("z.md")]
        );
    }

    #[test]
    fn missing_directory() {
        let err = find_files(Path::new("/definitely/not/here"), "*.md").unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
    }

    #[test]
    fn bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_files(dir.path(), "[*.md").unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }
}
