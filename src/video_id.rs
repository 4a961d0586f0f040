/*!
 * Video identifier extraction from caller-supplied URLs.
 *
 * Recognized shapes:
 * - `https://youtu.be/<id>`
 * - `https://www.youtube.com/watch?v=<id>`
 * - `https://www.youtube.com/embed/<id>` and `/v/<id>`
 * - `https://www.youtube.com/shorts/<id>`
 *
 * The privacy-enhanced `youtube-nocookie.com` host is accepted wherever the
 * canonical host is.
 */

use serde::Serialize;
use std::fmt;
use url::Url;

const SHORT_LINK_HOST: &str = "youtu.be";
const CANONICAL_HOSTS: &[&str] = &["youtube.com", "youtube-nocookie.com"];

/// Opaque identifier of a remote video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video identifier from a URL
///
/// Returns `None` when the string is not a URL or its shape is not one of the
/// recognized ones. Callers treat that as bad input, not a retrieval failure.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;

    let id = if host == SHORT_LINK_HOST {
        parsed.path().trim_start_matches('/').to_string()
    } else if CANONICAL_HOSTS.iter().any(|canonical| host.contains(canonical)) {
        if parsed.path().starts_with("/watch") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?
        } else {
            let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
            match segments.as_slice() {
                ["embed" | "v" | "shorts", id, ..] => id.to_string(),
                _ => return None,
            }
        }
    } else {
        return None;
    };

    (!id.is_empty()).then(|| VideoId(id))
}
