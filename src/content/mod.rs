use crate::content::html_renderer::HtmlRenderer;
use crate::content::parsing_utils::{is_markup, split_paragraphs};

pub mod attachments;
pub mod html_renderer;
pub mod local_images;
pub mod parsing_utils;
pub mod sanitize;

/// Post body ready to be placed in the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Paragraphs of lines, still unescaped. The template escapes them.
    Plain(Vec<Vec<String>>),
    /// Sanitized HTML, inserted as is.
    Markup(String),
}

impl Body {
    pub fn prepare(raw: &str, html_renderer: &HtmlRenderer) -> Body {
        if is_markup(raw) {
            Body::Markup(html_renderer.render(raw))
        } else {
            Body::Plain(split_paragraphs(raw))
        }
    }
}
