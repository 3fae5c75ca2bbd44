use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use spdlog::{debug, warn};

use crate::config::Defaults;
use crate::error::{ConvertError, Result};

/// A directory holding one post: its data file and the media next to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostDir {
    pub root: PathBuf,
    pub data_file: PathBuf,
    pub slug: Option<String>,
    pub dir_id: Option<String>,
}

impl PostDir {
    fn new(root: PathBuf, data_file: PathBuf) -> PostDir {
        let name = match root.file_name() {
            Some(name) => Some(name.to_string_lossy().to_string()),
            None => fs::canonicalize(&root)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string())),
        };
        let (slug, dir_id) = match name {
            Some(name) => split_dir_name(&name),
            None => (None, None),
        };

        PostDir {
            root,
            data_file,
            slug,
            dir_id,
        }
    }

    /// Directory the rendered page is written to: the one holding the data file.
    pub fn output_dir(&self) -> &Path {
        self.data_file.parent().unwrap_or(&self.root)
    }

    /// How many levels the output directory sits below the post root.
    pub fn depth(&self) -> usize {
        self.output_dir()
            .strip_prefix(&self.root)
            .map(|rel| rel.components().count())
            .unwrap_or(0)
    }
}

/// Splits `some-post-title-123` into its slug and numeric id.
fn split_dir_name(name: &str) -> (Option<String>, Option<String>) {
    lazy_static! {
        static ref DIR_NAME_REGEX: Regex = Regex::new(
            r"^(?:(?P<slug>.+?)[-_])?(?P<id>\d+)$"
        ).unwrap();
    }

    match DIR_NAME_REGEX.captures(name) {
        Some(caps) => (
            caps.name("slug").map(|s| s.as_str().to_string()),
            caps.name("id").map(|s| s.as_str().to_string()),
        ),
        None => (Some(name.to_string()), None),
    }
}

fn find_data_file(dir: &Path, data_file: &str, data_subdirs: &[String]) -> Option<PathBuf> {
    let direct = dir.join(data_file);
    if direct.is_file() {
        return Some(direct);
    }

    data_subdirs.iter()
        .map(|sub| dir.join(sub).join(data_file))
        .find(|p| p.is_file())
}

/// Lazily walks the immediate sub-directories of a parent directory, yielding
/// the ones that hold a post.
pub struct BatchDirs {
    entries: fs::ReadDir,
    data_file: String,
    data_subdirs: Vec<String>,
}

impl Iterator for BatchDirs {
    type Item = PostDir;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            // Follows symlinks, so linked post directories count too
            if !entry.path().is_dir() {
                continue;
            }
            let dir = entry.path();
            match find_data_file(&dir, &self.data_file, &self.data_subdirs) {
                Some(data_file) => return Some(PostDir::new(dir, data_file)),
                None => debug!("Skipping {}: no {} inside", dir.display(), self.data_file),
            }
        }
        None
    }
}

pub enum PostDirs {
    Single(std::option::IntoIter<PostDir>),
    Batch(Peekable<BatchDirs>),
}

impl PostDirs {
    pub fn is_batch(&self) -> bool {
        matches!(self, PostDirs::Batch(_))
    }
}

impl Iterator for PostDirs {
    type Item = PostDir;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            PostDirs::Single(it) => it.next(),
            PostDirs::Batch(it) => it.next(),
        }
    }
}

pub struct PostList {
    pub root_dir: PathBuf,
    pub data_file: String,
    pub data_subdirs: Vec<String>,
}

impl PostList {
    pub fn new(root_dir: impl Into<PathBuf>, defaults: &Defaults) -> PostList {
        PostList {
            root_dir: root_dir.into(),
            data_file: defaults.data_file.clone(),
            data_subdirs: defaults.data_subdirs.clone(),
        }
    }

    /// Resolves the root directory into the post directories to convert.
    ///
    /// The root is a single post when its data file is found inside it,
    /// otherwise every immediate sub-directory holding a data file is a post.
    /// Fails when the root does not exist or when no post is found.
    pub fn locate(&self) -> Result<PostDirs> {
        if !self.root_dir.is_dir() {
            return Err(ConvertError::InvalidPath(self.root_dir.clone()));
        }

        if let Some(data_file) = find_data_file(&self.root_dir, &self.data_file, &self.data_subdirs) {
            let post_dir = PostDir::new(self.root_dir.clone(), data_file);
            return Ok(PostDirs::Single(Some(post_dir).into_iter()));
        }

        let entries = fs::read_dir(&self.root_dir)
            .map_err(|_| ConvertError::InvalidPath(self.root_dir.clone()))?;
        let mut dirs = BatchDirs {
            entries,
            data_file: self.data_file.clone(),
            data_subdirs: self.data_subdirs.clone(),
        }.peekable();

        if dirs.peek().is_none() {
            return Err(ConvertError::EmptyInput {
                dir: self.root_dir.clone(),
                data_file: self.data_file.clone(),
            });
        }

        Ok(PostDirs::Batch(dirs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tempfile::TempDir;

    use crate::test_data::{write_post, HELLO_POST};

    use super::*;

    fn post_list(root: &Path) -> PostList {
        PostList::new(root, &Defaults::default())
    }

    #[test]
    fn test_split_dir_name() {
        assert_eq!(split_dir_name("hello-123"), (Some("hello".to_string()), Some("123".to_string())));
        assert_eq!(split_dir_name("my-first-post-98765"), (Some("my-first-post".to_string()), Some("98765".to_string())));
        assert_eq!(split_dir_name("42"), (None, Some("42".to_string())));
        assert_eq!(split_dir_name("no-number"), (Some("no-number".to_string()), None));
    }

    #[test]
    fn test_single_post_dir() {
        let tmp = TempDir::new().unwrap();
        let root = write_post(tmp.path(), "hello-123", HELLO_POST);

        let dirs = post_list(&root).locate().unwrap();
        assert!(!dirs.is_batch());
        let dirs: Vec<PostDir> = dirs.collect();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].root, root);
        assert_eq!(dirs[0].data_file, root.join("post-api.json"));
        assert_eq!(dirs[0].dir_id.as_deref(), Some("123"));
        assert_eq!(dirs[0].depth(), 0);
    }

    #[test]
    fn test_single_post_dir_with_info_subdir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("some-post-77");
        write_post(&root, "post_info", HELLO_POST);

        let dirs: Vec<PostDir> = post_list(&root).locate().unwrap().collect();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].root, root);
        assert_eq!(dirs[0].output_dir(), root.join("post_info"));
        assert_eq!(dirs[0].depth(), 1);
        assert_eq!(dirs[0].slug.as_deref(), Some("some-post"));
    }

    #[test]
    fn test_batch_ignores_non_posts() {
        let tmp = TempDir::new().unwrap();
        let expected: HashSet<PathBuf> = ["first-1", "second-2", "third-3"].iter()
            .map(|name| write_post(tmp.path(), name, HELLO_POST))
            .collect();

        // Non qualifying entries
        fs::create_dir(tmp.path().join("empty-dir")).unwrap();
        fs::create_dir_all(tmp.path().join("images")).unwrap();
        fs::write(tmp.path().join("images").join("a.png"), b"png").unwrap();
        fs::write(tmp.path().join("post-api.json.bak"), b"{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"notes").unwrap();

        let dirs = post_list(tmp.path()).locate().unwrap();
        assert!(dirs.is_batch());
        let found: HashSet<PathBuf> = dirs.map(|d| d.root).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_batch_is_not_recursive() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "top-1", HELLO_POST);
        write_post(&tmp.path().join("nested"), "deep-2", HELLO_POST);

        let found: Vec<PathBuf> = post_list(tmp.path()).locate().unwrap().map(|d| d.root).collect();
        assert_eq!(found, vec![tmp.path().join("top-1")]);
    }

    #[test]
    fn test_missing_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        match post_list(&missing).locate() {
            Err(ConvertError::InvalidPath(p)) => assert_eq!(p, missing),
            _ => panic!("expected InvalidPath"),
        }
    }

    #[test]
    fn test_file_path_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("post-api.json");
        fs::write(&file, HELLO_POST).unwrap();
        assert!(matches!(post_list(&file).locate(), Err(ConvertError::InvalidPath(_))));
    }

    #[test]
    fn test_empty_parent() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("not-a-post")).unwrap();
        match post_list(tmp.path()).locate() {
            Err(ConvertError::EmptyInput { dir, .. }) => assert_eq!(dir, tmp.path()),
            _ => panic!("expected EmptyInput"),
        }
    }
}
