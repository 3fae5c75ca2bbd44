use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

/// The images downloaded next to a post, and how to reach them from the
/// rendered page.
#[derive(Debug, Clone, Default)]
pub struct LocalImages {
    /// Relative location of the images directory, ending with `/`
    prefix: String,
    /// Sorted so lookups are deterministic
    files: Vec<String>,
}

impl LocalImages {
    pub fn empty() -> LocalImages {
        LocalImages::default()
    }

    pub fn new(prefix: &str, mut files: Vec<String>) -> LocalImages {
        files.sort();
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };
        LocalImages { prefix, files }
    }

    /// Lists `images_dir`. A missing directory just means no local images.
    pub fn scan(images_dir: &Path, prefix: &str) -> LocalImages {
        let files = match fs::read_dir(images_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .collect(),
            Err(_) => vec![],
        };
        Self::new(prefix, files)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Relative path of the local copy of a remote image, if there is one.
    pub fn find(&self, src: &str) -> Option<String> {
        let key = image_key(src)?;
        let exact = key.exact;
        self.files.iter()
            .find(|file| if exact { file.as_str() == key.value } else { file.contains(&key.value) })
            .map(|file| format!("{}{}", self.prefix, file))
    }

    /// Relative path of a file in the images directory, if it exists.
    pub fn get(&self, file_name: &str) -> Option<String> {
        self.files.iter()
            .find(|file| file.as_str() == file_name)
            .map(|file| format!("{}{}", self.prefix, file))
    }
}

struct ImageKey {
    value: String,
    exact: bool,
}

/// Downloaded images keep the content hash of their URL in the file name. When
/// the URL carries no hash, the last path segment is the file name.
fn image_key(src: &str) -> Option<ImageKey> {
    lazy_static! {
        static ref HASH_REGEX: Regex = Regex::new(r"([a-f0-9]{32}|[a-f0-9-]{36})~mv2").unwrap();
    }

    if let Some(m) = HASH_REGEX.find(src) {
        return Some(ImageKey { value: m.as_str().to_string(), exact: false });
    }

    let path = src.split(['?', '#']).next().unwrap_or(src);
    let segment = path.rsplit('/').next()?.trim();
    if segment.is_empty() {
        return None;
    }
    Some(ImageKey { value: segment.to_string(), exact: true })
}
