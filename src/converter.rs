use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use spdlog::{error, info};

use crate::config::{Config, Defaults};
use crate::error::{ConvertError, Result};
use crate::post_list::PostList;
use crate::render_post::Renderer;

/// Outcome of a run over one or many post directories.
#[derive(Debug, Default)]
pub struct Summary {
    pub batch: bool,
    pub converted: Vec<PathBuf>,
    pub failures: Vec<ConvertError>,
    /// Set when the batch stopped at the first failure
    pub aborted: bool,
    pub duration: Duration,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Logs the statistics, and every failure again so they are not lost in
    /// the progress output.
    pub fn log(&self) {
        info!("--- Conversion Statistics ---");
        info!("Successfully converted: {}", self.converted.len());
        info!("Errors: {}", self.failures.len());
        info!("Total posts processed: {}", self.total());
        info!("Total duration: {:.2} seconds", self.duration.as_secs_f64());
        if self.aborted {
            error!("Batch stopped at the first failure");
        }
        for failure in &self.failures {
            error!("Failed: {}", failure);
        }
    }
}

/// Runs the conversion of a post directory, or of every post directory below
/// a parent directory.
pub struct Converter<'a> {
    renderer: Renderer<'a>,
    defaults: Defaults,
    fail_fast: bool,
}

impl Converter<'static> {
    pub fn from_config(config: &Config) -> Result<Converter<'static>> {
        Ok(Converter {
            renderer: Renderer::from_config(config)?,
            defaults: config.defaults.clone(),
            fail_fast: config.batch.fail_fast,
        })
    }
}

impl<'a> Converter<'a> {
    pub fn new(renderer: Renderer<'a>, defaults: Defaults, fail_fast: bool) -> Converter<'a> {
        Converter { renderer, defaults, fail_fast }
    }

    /// Converts everything found at `path`.
    ///
    /// Locating errors are always returned as `Err`. A single post directory
    /// also returns its conversion error as `Err`. In batch mode per-post
    /// errors are logged and collected in the summary, and the remaining
    /// directories are still converted unless `fail_fast` is set.
    pub fn run(&self, path: &Path) -> Result<Summary> {
        let start = Instant::now();
        let post_dirs = PostList::new(path, &self.defaults).locate()?;

        let mut summary = Summary {
            batch: post_dirs.is_batch(),
            ..Summary::default()
        };

        for post_dir in post_dirs {
            match self.renderer.convert(&post_dir) {
                Ok(output) => {
                    info!("Successfully converted {} to {}", post_dir.data_file.display(), output.display());
                    summary.converted.push(output);
                }
                Err(e) if !summary.batch || !e.is_recoverable() => return Err(e),
                Err(e) => {
                    error!("{}", e);
                    summary.failures.push(e);
                    if self.fail_fast {
                        summary.aborted = true;
                        break;
                    }
                }
            }
        }

        summary.duration = start.elapsed();
        Ok(summary)
    }
}
