use std::fs;
use std::path::PathBuf;

use spdlog::{debug, warn};

use crate::config::Config;
use crate::content::attachments::AttachmentResolver;
use crate::content::html_renderer::HtmlRenderer;
use crate::content::local_images::LocalImages;
use crate::content::Body;
use crate::error::{ConvertError, Result};
use crate::post::Post;
use crate::post_list::PostDir;
use crate::view::post_renderer::{PostRenderer, DEFAULT_TEMPLATE};

/// Converts one post directory into its HTML page.
pub struct Renderer<'a> {
    post_renderer: PostRenderer<'a>,
    output_file: String,
    images_dir: String,
}

impl Renderer<'static> {
    /// Uses the configured template file, or the built-in one.
    pub fn from_config(config: &Config) -> Result<Renderer<'static>> {
        let post_renderer = match config.paths.template {
            Some(ref path) => PostRenderer::from_file(path)?,
            None => PostRenderer::new(DEFAULT_TEMPLATE)?,
        };

        Ok(Renderer {
            post_renderer,
            output_file: config.defaults.output_file.clone(),
            images_dir: config.defaults.images_dir.clone(),
        })
    }
}

impl Renderer<'_> {
    pub fn output_path(&self, post_dir: &PostDir) -> PathBuf {
        post_dir.output_dir().join(&self.output_file)
    }

    /// Reads the post data and renders the page, without writing anything.
    pub fn render(&self, post_dir: &PostDir) -> Result<String> {
        let post = Post::from_dir(post_dir)?;
        debug!("Rendering {}: {}", post_dir.root.display(), post);
        if post.dropped_attachments > 0 {
            warn!("Skipping {} unreadable attachment(s) or without path or URL in '{}'", post.dropped_attachments, post_dir.root.display());
        }

        let up = "../".repeat(post_dir.depth());
        let images = LocalImages::scan(
            &post_dir.root.join(&self.images_dir),
            &format!("{}{}", up, self.images_dir),
        );

        let body = Body::prepare(&post.body, &HtmlRenderer::new(images.clone()));
        let attachments = AttachmentResolver::new(post_dir, &images).resolve_all(&post.attachments);

        Ok(self.post_renderer.render(&post, &body, &attachments))
    }

    /// Renders the page and writes it next to the data file, replacing any
    /// previous output. Returns the written path.
    pub fn convert(&self, post_dir: &PostDir) -> Result<PathBuf> {
        let html = self.render(post_dir)?;
        let output_path = self.output_path(post_dir);

        fs::write(&output_path, html).map_err(|source| ConvertError::Write {
            dir: post_dir.root.clone(),
            path: output_path.clone(),
            source,
        })?;

        Ok(output_path)
    }
}
