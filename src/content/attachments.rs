use std::path::{Component, Path};

use spdlog::warn;

use crate::content::local_images::LocalImages;
use crate::content::parsing_utils::safe_href;
use crate::post::{Attachment, AttachmentKind, Source};
use crate::post_list::PostDir;

/// An attachment with a link usable from the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub kind: AttachmentKind,
    pub name: String,
    pub href: String,
    pub local: bool,
}

/// Resolves attachment locations against one post directory.
pub struct AttachmentResolver<'a> {
    post_dir: &'a PostDir,
    images: &'a LocalImages,
    /// `../` once per level between the output directory and the post root
    up: String,
}

impl<'a> AttachmentResolver<'a> {
    pub fn new(post_dir: &'a PostDir, images: &'a LocalImages) -> AttachmentResolver<'a> {
        AttachmentResolver {
            post_dir,
            images,
            up: "../".repeat(post_dir.depth()),
        }
    }

    pub fn resolve_all(&self, attachments: &[Attachment]) -> Vec<ResolvedAttachment> {
        attachments.iter()
            .filter_map(|a| {
                let resolved = self.resolve(a);
                if resolved.is_none() {
                    warn!("Skipping attachment {:?} of post '{}': not found locally and no usable URL",
                        a.name.as_deref().unwrap_or(""), self.post_dir.root.display());
                }
                resolved
            })
            .collect()
    }

    pub fn resolve(&self, attachment: &Attachment) -> Option<ResolvedAttachment> {
        let (href, local) = match &attachment.source {
            Source::Url(url) => (url.clone(), false),
            Source::Path(path) => self.resolve_path(path),
            Source::Download { file_name, url } => match self.find_download(file_name) {
                Some(href) => (href, true),
                None => (url.clone()?, false),
            },
        };
        safe_href(&href)?;

        let name = attachment.name.clone().unwrap_or_else(|| display_name(&href));
        Some(ResolvedAttachment {
            kind: attachment.kind,
            name,
            href,
            local,
        })
    }

    fn resolve_path(&self, path: &str) -> (String, bool) {
        if path.contains("://") {
            return (path.to_string(), false);
        }

        let as_path = Path::new(path);
        let relative = if as_path.is_absolute() {
            match as_path.strip_prefix(&self.post_dir.root) {
                Ok(rel) => rel.to_path_buf(),
                // Outside the post, kept as given
                Err(_) => return (path.to_string(), true),
            }
        } else {
            as_path.to_path_buf()
        };

        let parts: Vec<String> = relative.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        let href = parts.join("/").replace('\\', "/");

        (format!("{}{}", self.up, href), true)
    }

    fn find_download(&self, file_name: &str) -> Option<String> {
        if let Some(href) = self.images.get(file_name) {
            return Some(href);
        }
        if self.post_dir.root.join(file_name).is_file() {
            return Some(format!("{}{}", self.up, file_name));
        }
        None
    }
}

/// Last segment of a link, without query or fragment.
fn display_name(href: &str) -> String {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => href.to_string(),
    }
}
