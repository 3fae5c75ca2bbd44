use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

pub const DATA_FILE_NAME: &str = "post-api.json";
pub const OUTPUT_FILE_NAME: &str = "post.html";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Defaults {
    pub data_file: String,
    pub output_file: String,
    /// Sub-directories of a post directory that may hold the data file
    pub data_subdirs: Vec<String>,
    pub images_dir: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            data_file: DATA_FILE_NAME.to_string(),
            output_file: OUTPUT_FILE_NAME.to_string(),
            data_subdirs: vec!["post_info".to_string()],
            images_dir: "images".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Paths {
    pub template: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Batch {
    pub fail_fast: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
    pub max_files: Option<usize>,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
    pub paths: Paths,
    pub batch: Batch,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Some(str_path) = path.to_str() else {
        return path;
    };
    if !str_path.starts_with("${exe_dir}") {
        return path;
    }

    match env::current_exe().ok().as_deref().and_then(Path::parent) {
        Some(exe_dir) => PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())),
        None => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths.template = cfg.paths.template.map(parse_path);
    if let Some(ref mut log) = cfg.log {
        log.location = log.location.take().map(parse_path);
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.defaults.data_file, "post-api.json");
        assert_eq!(cfg.defaults.output_file, "post.html");
        assert_eq!(cfg.defaults.data_subdirs, ["post_info"]);
        assert_eq!(cfg.defaults.images_dir, "images");
        assert!(cfg.paths.template.is_none());
        assert!(!cfg.batch.fail_fast);
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_full_config() {
        let toml_str = r##"
[defaults]
data_file = "record.json"
output_file = "index.html"
data_subdirs = []

[paths]
template = "/etc/post2html/post.html"

[batch]
fail_fast = true

[log]
level = "Debug"
log_to_console = false
location = "/tmp/post2html.log"
"##;
        let cfg = parse_config(toml_str).unwrap();
        assert_eq!(cfg.defaults.data_file, "record.json");
        assert_eq!(cfg.defaults.output_file, "index.html");
        assert!(cfg.defaults.data_subdirs.is_empty());
        // Not overridden
        assert_eq!(cfg.defaults.images_dir, "images");
        assert_eq!(cfg.paths.template, Some(PathBuf::from("/etc/post2html/post.html")));
        assert!(cfg.batch.fail_fast);

        let log = cfg.log.unwrap();
        assert_eq!(log.level, LogLevel::Debug);
        assert!(!log.log_to_console);
        assert_eq!(log.location, Some(PathBuf::from("/tmp/post2html.log")));
        assert_eq!(log.max_files, None);
    }

    #[test]
    fn test_exe_dir_expansion() {
        let cfg = parse_config("[paths]\ntemplate = \"${exe_dir}/post.html\"\n").unwrap();
        let template = cfg.paths.template.unwrap();
        assert!(!template.to_string_lossy().contains("${exe_dir}"));
        assert!(template.ends_with("post.html"));
    }

    #[test]
    fn test_invalid_config() {
        let res = parse_config("[batch]\nfail_fast = \"sometimes\"\n");
        assert_eq!(res.unwrap_err().kind(), ErrorKind::InvalidData);
    }
}
