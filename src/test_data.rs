#[cfg(test)]
use std::fs;
#[cfg(test)]
use std::path::{Path, PathBuf};

#[cfg(test)]
pub const HELLO_POST: &str = r#"{"id":123,"title":"Hello","author":"Jane","body":"World","attachments":[]}"#;

#[cfg(test)]
pub const FLAT_POST: &str = r#"{
  "id": "98765",
  "title": "Trip <notes> & photos",
  "author": {"name": "Jane Doe", "url": "https://example.com/jane"},
  "body": "First day.\nWe walked a lot.\n\nSecond <day>.",
  "published_at": "2024-01-02T03:04:05Z",
  "edited_at": "2024-01-03T10:00:00+00:00",
  "url": "https://example.com/posts/98765",
  "attachments": [
    {"type": "image", "path": "images/beach.jpg", "name": "Beach"},
    {"type": "file", "path": "files/route.gpx"},
    {"type": "video", "url": "https://video.example.com/v/1"},
    "images/sunset.png",
    {"name": "nothing to point at"}
  ]
}"#;

/// Trimmed down response of the platform posts API, as saved by the downloader.
#[cfg(test)]
pub const API_POST: &str = r#"{
  "data": {
    "id": "4455",
    "type": "post",
    "attributes": {
      "title": "Studio update",
      "content": "<p>New pieces this week.</p><p><img src=\"https://cdn.example.com/d23bd2_0123456789abcdef0123456789abcdef~mv2.jpg\" data-media-id=\"9\"></p><p> </p><p><img src=\"https://cdn.example.com/other/remote.png\"></p><script>alert(1)</script>",
      "published_at": "2023-11-05T18:30:00.000+00:00",
      "edited_at": "2023-11-05T18:30:00.000+00:00",
      "url": "https://www.example.com/posts/studio-update-4455",
      "embed": {"url": "https://youtube.example.com/watch?v=abc", "subject": "Timelapse"}
    },
    "relationships": {
      "user": {"data": {"id": "77", "type": "user"}}
    }
  },
  "included": [
    {"id": "76", "type": "user", "attributes": {"full_name": "Someone Else", "url": "https://www.example.com/else"}},
    {"id": "77", "type": "user", "attributes": {"vanity": "studio", "url": "https://www.example.com/studio"}},
    {"id": "9", "type": "media", "attributes": {"file_name": "sketch.png", "mimetype": "image/png", "download_url": "https://cdn.example.com/sketch.png"}},
    {"id": "10", "type": "attachment", "attributes": {"name": "brushes.zip", "url": "https://cdn.example.com/brushes.zip"}}
  ]
}"#;

/// Creates `parent/name/post-api.json` and returns `parent/name`.
#[cfg(test)]
pub fn write_post(parent: &Path, name: &str, json: &str) -> PathBuf {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("post-api.json"), json).unwrap();
    dir
}
