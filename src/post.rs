use std::fmt;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{ConvertError, Result};
use crate::post_list::PostDir;
use crate::text_utils::{non_blank, PostDate};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// The post data file exactly as saved. Both the flat record and the API
/// envelope (`data` / `included`) are accepted, every field is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PostRecord {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub author: Option<RawAuthor>,
    #[serde(alias = "content")]
    pub body: Option<String>,
    #[serde(alias = "created_at", alias = "timestamp")]
    pub published_at: Option<Value>,
    pub edited_at: Option<Value>,
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub attachments: Option<Vec<Option<RawAttachment>>>,
    pub data: Option<ApiData>,
    #[serde(deserialize_with = "lenient_list")]
    pub included: Option<Vec<Option<ApiIncluded>>>,
}

/// Reads a list whose entries may each be unreadable. Those become `None`
/// instead of failing the whole record.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<Option<T>>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values.map(|values| values.into_iter()
        .map(|value| serde_json::from_value(value).ok())
        .collect()))
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawAuthor {
    Name(String),
    Profile {
        #[serde(default, alias = "full_name")]
        name: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawAttachment {
    Path(String),
    Entry {
        #[serde(default, rename = "type", alias = "kind")]
        kind: Option<String>,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default, alias = "file_name")]
        name: Option<String>,
    },
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiData {
    pub id: Option<Value>,
    pub attributes: Option<ApiAttributes>,
    pub relationships: Option<ApiRelationships>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiAttributes {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<Value>,
    pub edited_at: Option<Value>,
    pub url: Option<String>,
    pub embed: Option<ApiEmbed>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiEmbed {
    pub url: Option<String>,
    pub subject: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiRelationships {
    pub user: Option<ApiRelation>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiRelation {
    pub data: Option<ApiRef>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiRef {
    pub id: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApiIncluded {
    pub id: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub attributes: Option<Map<String, Value>>,
}

impl ApiIncluded {
    fn attr(&self, key: &str) -> Option<String> {
        non_blank(self.attributes.as_ref()?.get(key).and_then(Value::as_str))
    }
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s.as_str())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    File,
}

impl AttachmentKind {
    fn from_name(kind: &str) -> Option<AttachmentKind> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "image" | "img" | "photo" | "picture" => Some(AttachmentKind::Image),
            "video" | "embed" | "embedded_video" | "video_embed" => Some(AttachmentKind::Video),
            "file" | "attachment" | "document" | "audio" => Some(AttachmentKind::File),
            _ => None,
        }
    }

    fn from_mimetype(mimetype: &str) -> AttachmentKind {
        if mimetype.starts_with("image/") {
            AttachmentKind::Image
        } else if mimetype.starts_with("video/") {
            AttachmentKind::Video
        } else {
            AttachmentKind::File
        }
    }

    /// Guesses from the extension of a path or URL.
    pub fn guess(location: &str) -> AttachmentKind {
        let location = location.split(['?', '#']).next().unwrap_or(location);
        let ext = match location.rsplit_once('.') {
            Some((_, ext)) if !ext.contains('/') => ext.to_ascii_lowercase(),
            _ => return AttachmentKind::File,
        };
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "avif" | "bmp" | "svg" => AttachmentKind::Image,
            "mp4" | "webm" | "mov" | "m4v" | "ogv" | "mkv" => AttachmentKind::Video,
            _ => AttachmentKind::File,
        }
    }
}

/// Where an attachment lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A path relative to the post directory root
    Path(String),
    Url(String),
    /// A downloaded media file known by name, with its remote origin
    Download { file_name: String, url: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub name: Option<String>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: String,
    pub url: Option<String>,
}

/// A post with every field resolved, either from the data or to its default.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: Author,
    pub body: String,
    pub url: Option<String>,
    pub published_at: Option<PostDate>,
    pub edited_at: Option<PostDate>,
    pub attachments: Vec<Attachment>,
    /// Entries with nothing to point at, skipped while normalizing
    pub dropped_attachments: usize,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "id={}, author={}, title={}, attachments={}",
               self.id,
               self.author.name,
               self.title,
               self.attachments.len()
        )
    }
}

impl Post {
    /// Reads and parses the data file of a post directory.
    pub fn from_dir(post_dir: &PostDir) -> Result<Post> {
        let content = fs::read_to_string(&post_dir.data_file)
            .map_err(|e| ConvertError::parse(&post_dir.root, format!("{}: {}", post_dir.data_file.display(), e)))?;

        let mut post = Self::from_json(&post_dir.root, &content)?;
        if post.id.is_empty() {
            post.id = post_dir.dir_id.clone().unwrap_or_default();
        }
        Ok(post)
    }

    pub fn from_json(dir: &Path, content: &str) -> Result<Post> {
        let record: PostRecord = serde_json::from_str(content)
            .map_err(|e| ConvertError::parse(dir, e))?;
        Ok(Self::from_record(record))
    }

    pub fn from_record(record: PostRecord) -> Post {
        let mut data = record.data.unwrap_or_default();
        let included: Vec<ApiIncluded> = record.included.unwrap_or_default().into_iter().flatten().collect();
        let attrs = data.attributes.take().unwrap_or_default();

        let id = id_string(data.id.as_ref())
            .or_else(|| id_string(record.id.as_ref()))
            .unwrap_or_default();

        let title = non_blank(attrs.title.as_deref())
            .or_else(|| non_blank(record.title.as_deref()))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let author = Self::api_author(&data, &included)
            .or_else(|| record.author.as_ref().and_then(Self::flat_author))
            .unwrap_or_else(|| Author { name: DEFAULT_AUTHOR.to_string(), url: None });

        let body = attrs.content.clone()
            .filter(|c| !c.trim().is_empty())
            .or(record.body)
            .unwrap_or_default();

        let url = non_blank(attrs.url.as_deref()).or_else(|| non_blank(record.url.as_deref()));

        let published_at = attrs.published_at.as_ref()
            .and_then(PostDate::from_value)
            .or_else(|| record.published_at.as_ref().and_then(PostDate::from_value));
        let edited_at = attrs.edited_at.as_ref()
            .and_then(PostDate::from_value)
            .or_else(|| record.edited_at.as_ref().and_then(PostDate::from_value));

        let raw_attachments = record.attachments.unwrap_or_default();
        let raw_count = raw_attachments.len();
        let mut attachments: Vec<Attachment> = raw_attachments.into_iter()
            .flatten()
            .filter_map(Self::flat_attachment)
            .collect();
        let dropped_attachments = raw_count - attachments.len();

        attachments.extend(included.iter().filter_map(Self::api_attachment));
        if let Some(embed) = &attrs.embed {
            if let Some(url) = non_blank(embed.url.as_deref()) {
                attachments.push(Attachment {
                    kind: AttachmentKind::Video,
                    name: non_blank(embed.subject.as_deref()),
                    source: Source::Url(url),
                });
            }
        }

        Post {
            id,
            title,
            author,
            body,
            url,
            published_at,
            edited_at,
            attachments,
            dropped_attachments,
        }
    }

    /// The `edited_at` date, unless it is the publication instant.
    pub fn edited_after_publish(&self) -> Option<&PostDate> {
        let edited = self.edited_at.as_ref()?;
        match &self.published_at {
            Some(published) if published.same_instant(edited) => None,
            _ => Some(edited),
        }
    }

    fn flat_author(author: &RawAuthor) -> Option<Author> {
        match author {
            RawAuthor::Name(name) => non_blank(Some(name.as_str())).map(|name| Author { name, url: None }),
            RawAuthor::Profile { name, url } => non_blank(name.as_deref()).map(|name| Author {
                name,
                url: non_blank(url.as_deref()),
            }),
        }
    }

    fn api_author(data: &ApiData, included: &[ApiIncluded]) -> Option<Author> {
        let user_id = data.relationships.as_ref()
            .and_then(|r| r.user.as_ref())
            .and_then(|u| u.data.as_ref())
            .and_then(|d| id_string(d.id.as_ref()))?;

        let user = included.iter().find(|item| {
            item.kind.as_deref() == Some("user") && id_string(item.id.as_ref()).as_deref() == Some(user_id.as_str())
        })?;

        let name = user.attr("vanity").or_else(|| user.attr("full_name"))?;
        Some(Author {
            name,
            url: user.attr("url"),
        })
    }

    fn flat_attachment(raw: RawAttachment) -> Option<Attachment> {
        let (kind, path, url, name) = match raw {
            RawAttachment::Path(path) => (None, Some(path), None, None),
            RawAttachment::Entry { kind, path, url, name } => (kind, path, url, name),
        };

        let (source, location) = match (non_blank(path.as_deref()), non_blank(url.as_deref())) {
            (Some(path), _) => (Source::Path(path.clone()), path),
            (None, Some(url)) => (Source::Url(url.clone()), url),
            (None, None) => return None,
        };

        let kind = kind.as_deref()
            .and_then(AttachmentKind::from_name)
            .unwrap_or_else(|| AttachmentKind::guess(&location));

        Some(Attachment {
            kind,
            name: non_blank(name.as_deref()),
            source,
        })
    }

    fn api_attachment(item: &ApiIncluded) -> Option<Attachment> {
        match item.kind.as_deref() {
            Some("media") => {
                let url = item.attr("download_url");
                let file_name = item.attr("file_name");
                let kind = match item.attr("mimetype") {
                    Some(mimetype) => AttachmentKind::from_mimetype(&mimetype),
                    None => AttachmentKind::guess(file_name.as_deref().or(url.as_deref())?),
                };
                let source = match (file_name.clone(), url) {
                    (Some(file_name), url) => Source::Download { file_name, url },
                    (None, Some(url)) => Source::Url(url),
                    (None, None) => return None,
                };
                Some(Attachment { kind, name: file_name, source })
            }
            Some("attachment") => {
                let url = item.attr("url")?;
                let name = item.attr("name");
                let kind = AttachmentKind::guess(name.as_deref().unwrap_or(&url));
                let source = match name.clone() {
                    Some(file_name) => Source::Download { file_name, url: Some(url) },
                    None => Source::Url(url),
                };
                Some(Attachment { kind, name, source })
            }
            _ => None,
        }
    }
}
