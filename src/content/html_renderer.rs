use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::content::local_images::LocalImages;
use crate::content::parsing_utils::{attr_value, escape_attr, requote};
use crate::content::sanitize::sanitize;

const DEFAULT_ALT: &str = "Image from post";

/// Turns the HTML body of a post into the HTML placed in the page.
pub struct HtmlRenderer {
    images: LocalImages,
}

impl HtmlRenderer {
    pub fn new(images: LocalImages) -> HtmlRenderer {
        HtmlRenderer { images }
    }

    pub fn render(&self, html: &str) -> String {
        let html = sanitize(html);
        let html = self.change_images(&html);
        Self::remove_empty_paragraphs(&html).trim().to_string()
    }

    /// Points remote images to their downloaded copy. A paragraph holding only
    /// an image is replaced by an `image-container` block, images inside text
    /// stay inline.
    fn change_images(&self, html: &str) -> String {
        lazy_static! {
            static ref IMG_REGEX: Regex = Regex::new(
                r"(?i)(?P<open><p>\s*)?(?P<img><img\b[^>]*>)(?P<close>\s*</p>)?"
            ).unwrap();
        }

        IMG_REGEX.replace_all(html, |caps: &Captures| {
            let img = &caps["img"];
            let Some(src) = attr_value(img, "src") else {
                return caps[0].to_string();
            };
            let alt = attr_value(img, "alt")
                .filter(|alt| !alt.trim().is_empty())
                .unwrap_or(DEFAULT_ALT);

            let local = self.local_copy(src).map(|local| escape_attr(&local));
            let img = format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                local.clone().unwrap_or_else(|| requote(src)),
                requote(alt)
            );

            match (caps.name("open"), caps.name("close"), local) {
                (Some(_), Some(_), Some(local)) => format!(
                    r#"<div class="image-container"><a href="{}" target="_blank" rel="noopener">{}</a></div>"#,
                    local, img
                ),
                (Some(_), Some(_), None) => format!(r#"<div class="image-container">{}</div>"#, img),
                (open, close, _) => format!(
                    "{}{}{}",
                    open.map(|m| m.as_str()).unwrap_or(""),
                    img,
                    close.map(|m| m.as_str()).unwrap_or("")
                ),
            }
        }).to_string()
    }

    fn local_copy(&self, src: &str) -> Option<String> {
        if !src.contains("://") {
            return None;
        }
        self.images.find(src)
    }

    fn remove_empty_paragraphs(html: &str) -> String {
        lazy_static! {
            static ref EMPTY_P_REGEX: Regex = Regex::new(r"(?i)<p>(\s|&nbsp;)*</p>").unwrap();
        }
        EMPTY_P_REGEX.replace_all(html, "").to_string()
    }
}
