use std::fs;
use std::path::Path;

use ramhorns::Template;

use crate::content::attachments::ResolvedAttachment;
use crate::content::parsing_utils::safe_href;
use crate::content::Body;
use crate::error::{ConvertError, Result};
use crate::post::{AttachmentKind, Post};

pub const DEFAULT_TEMPLATE: &str = include_str!("../../res/post_template.html");

#[derive(ramhorns::Content)]
struct ViewLine<'a> {
    br: bool,
    text: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewParagraph<'a> {
    lines: Vec<ViewLine<'a>>,
}

#[derive(ramhorns::Content)]
struct ViewAttachment<'a> {
    name: &'a str,
    href: &'a str,
    local: bool,
    is_image: bool,
    is_local_video: bool,
    is_link: bool,
}

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    has_id: bool,
    id: &'a str,
    title: &'a str,
    author: &'a str,
    has_author_url: bool,
    author_url: &'a str,
    has_post_url: bool,
    post_url: &'a str,
    has_published: bool,
    published_iso: String,
    published_human: String,
    has_edited: bool,
    edited_iso: String,
    edited_human: String,
    body_is_markup: bool,
    body_html: &'a str,
    paragraphs: Vec<ViewParagraph<'a>>,
    has_attachments: bool,
    attachments: Vec<ViewAttachment<'a>>,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'static> {
    pub fn from_file(path: &Path) -> Result<PostRenderer<'static>> {
        let src = fs::read_to_string(path).map_err(|e| ConvertError::Template {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_source(path.display().to_string(), src)
    }

    fn from_source(name: String, src: String) -> Result<PostRenderer<'static>> {
        match Template::new(src) {
            Ok(template) => Ok(PostRenderer { template }),
            Err(e) => Err(ConvertError::Template { name, reason: e.to_string() }),
        }
    }
}

impl<'a> PostRenderer<'a> {
    pub fn new(view_tpl_src: &'a str) -> Result<PostRenderer<'a>> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(ConvertError::Template { name: "post view".to_string(), reason: e.to_string() });
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    pub fn render(&self, post: &Post, body: &Body, attachments: &[ResolvedAttachment]) -> String {
        let (body_is_markup, body_html, paragraphs) = match body {
            Body::Markup(html) => (true, html.as_str(), vec![]),
            Body::Plain(paragraphs) => (false, "", paragraphs.iter()
                .map(|lines| ViewParagraph {
                    lines: lines.iter()
                        .enumerate()
                        .map(|(i, text)| ViewLine { br: i > 0, text: text.as_str() })
                        .collect(),
                })
                .collect()),
        };

        let attachments: Vec<ViewAttachment> = attachments.iter()
            .map(|a| {
                let is_image = a.kind == AttachmentKind::Image;
                let is_local_video = a.kind == AttachmentKind::Video && a.local;
                ViewAttachment {
                    name: a.name.as_str(),
                    href: a.href.as_str(),
                    local: a.local,
                    is_image,
                    is_local_video,
                    is_link: !is_image && !is_local_video,
                }
            })
            .collect();

        let author_url = post.author.url.as_deref().and_then(safe_href);
        let post_url = post.url.as_deref().and_then(safe_href);
        let published = post.published_at.as_ref();
        let edited = post.edited_after_publish();

        self.template.render(&ViewItem {
            has_id: !post.id.is_empty(),
            id: post.id.as_str(),
            title: post.title.as_str(),
            author: post.author.name.as_str(),
            has_author_url: author_url.is_some(),
            author_url: author_url.unwrap_or(""),
            has_post_url: post_url.is_some(),
            post_url: post_url.unwrap_or(""),
            has_published: published.is_some(),
            published_iso: published.map(|d| d.iso()).unwrap_or_default(),
            published_human: published.map(|d| d.human()).unwrap_or_default(),
            has_edited: edited.is_some(),
            edited_iso: edited.map(|d| d.iso()).unwrap_or_default(),
            edited_human: edited.map(|d| d.human()).unwrap_or_default(),
            body_is_markup,
            body_html,
            paragraphs,
            has_attachments: !attachments.is_empty(),
            attachments,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::post::{Author, Post};
    use crate::text_utils::PostDate;

    use super::*;

    fn post() -> Post {
        Post {
            id: "42".to_string(),
            title: "<post-title>".to_string(),
            author: Author { name: "<Jane>".to_string(), url: Some("https://example.com/?a=1&b=\"2\"".to_string()) },
            body: String::new(),
            url: None,
            published_at: PostDate::parse("2024-01-02T03:04:05Z"),
            edited_at: PostDate::parse("2024-01-02T03:04:05Z"),
            attachments: vec![],
            dropped_attachments: 0,
        }
    }

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{title}}]
AUTHOR=[{{author}}]URL=[{{author_url}}]
DATE=[{{#has_published}}{{published_human}}{{/has_published}}]
EDITED=[{{#has_edited}}{{edited_human}}{{/has_edited}}]
BODY=[{{#body_is_markup}}{{{body_html}}}{{/body_is_markup}}{{#paragraphs}}({{#lines}}{{#br}}|{{/br}}{{text}}{{/lines}}){{/paragraphs}}]
FILES=[{{#attachments}}{{name}}:{{href}}:{{#is_image}}img{{/is_image}}{{#is_link}}link{{/is_link}};{{/attachments}}]
"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let body = Body::Plain(vec![
            vec!["one <b>".to_string(), "two".to_string()],
            vec!["three".to_string()],
        ]);
        let attachments = vec![
            ResolvedAttachment { kind: AttachmentKind::Image, name: "a&b.png".to_string(), href: "images/a&b.png".to_string(), local: true },
            ResolvedAttachment { kind: AttachmentKind::Video, name: "clip".to_string(), href: "https://v.example.com/clip".to_string(), local: false },
        ];

        let res = post_renderer.render(&post(), &body, &attachments);
        assert!(res.contains("TITLE=[&lt;post-title&gt;]"));
        assert!(res.contains("AUTHOR=[&lt;Jane&gt;]"));
        assert!(!res.contains("b=\"2\""));
        assert!(res.contains("DATE=[02.01.2024 at 03:04 UTC]"));
        assert!(res.contains("EDITED=[]"));
        assert!(res.contains("BODY=[(one &lt;b&gt;|two)(three)]"));
        assert!(res.contains("FILES=[a&amp;b.png:images/a&amp;b.png:img;clip:https://v.example.com/clip:link;]"));
    }

    #[test]
    fn render_markup_body_unescaped() {
        let post_renderer = PostRenderer::new("{{#body_is_markup}}{{{body_html}}}{{/body_is_markup}}").unwrap();
        let res = post_renderer.render(&post(), &Body::Markup("<p>kept</p>".to_string()), &[]);
        assert_eq!(res, "<p>kept</p>");
    }

    #[test]
    fn default_template_sections() {
        let post_renderer = PostRenderer::new(DEFAULT_TEMPLATE).unwrap();
        let res = post_renderer.render(&post(), &Body::Plain(vec![vec!["World".to_string()]]), &[]);
        assert!(res.starts_with("<!DOCTYPE html>"));
        assert!(res.contains("<title>&lt;post-title&gt;</title>"));
        assert!(res.contains("<p>World</p>"));
        assert!(res.contains(r#"<meta name="post-id" content="42">"#));
        assert!(res.contains(r#"<time datetime="2024-01-02T03:04:05+00:00">02.01.2024 at 03:04 UTC</time>"#));
        assert!(!res.contains("class=\"gallery\""));
        assert!(!res.contains("class=\"edited\""));
        assert!(!res.contains("Original post"));
        assert!(!res.contains("<script"));
    }

    #[test]
    fn script_links_are_not_rendered() {
        let mut post = post();
        post.author.url = Some("javascript:alert(1)".to_string());
        post.url = Some(" JAVASCRIPT:alert(2)".to_string());

        let post_renderer = PostRenderer::new(DEFAULT_TEMPLATE).unwrap();
        let res = post_renderer.render(&post, &Body::Plain(vec![]), &[]);
        assert!(!res.to_ascii_lowercase().contains("javascript:"));
        assert!(res.contains("&lt;Jane&gt;"));
        assert!(!res.contains("Original post"));
    }

    #[test]
    fn template_file_errors() {
        let missing = PathBuf::from("/definitely/not/here/post.html");
        match PostRenderer::from_file(&missing) {
            Err(ConvertError::Template { name, .. }) => assert!(name.contains("post.html")),
            _ => panic!("expected a template error"),
        }
        assert!(matches!(PostRenderer::new("{{#open}} never closed"), Err(ConvertError::Template { .. })));
    }
}
