/*!
 * Public caption directory (timed-text `type=list`).
 *
 * The endpoint answers with a small XML fragment of `<track .../>` elements.
 * Only attributes are read, so a pair of regexes is enough; a track without a
 * language code is dropped.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::app_config::UpstreamConfig;
use crate::video_id::VideoId;

use super::http::HttpFetcher;
use super::models::CaptionTrack;

// @const: Self-closing track element, capturing its attribute list
static TRACK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<track\s+([^>]+?)/>").unwrap()
});

// @const: key="value" or key='value'
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)=["']([^"']+)["']"#).unwrap()
});

/// Build the track-list URL for a video
pub fn track_list_url(upstream: &UpstreamConfig, video_id: &VideoId) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &upstream.timedtext_url,
        &[("type", "list"), ("v", video_id.as_str()), ("client", "yt")],
    )
}

/// Fetch the public track list; any failure yields an empty list
pub async fn fetch_track_list(
    http: &dyn HttpFetcher,
    upstream: &UpstreamConfig,
    video_id: &VideoId,
) -> Vec<CaptionTrack> {
    let url = match track_list_url(upstream, video_id) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot build track list URL from '{}': {}", upstream.timedtext_url, e);
            return Vec::new();
        }
    };

    let response = match http.get(url.as_str(), &[]).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Track list request failed for {}: {}", video_id, e);
            return Vec::new();
        }
    };

    if !response.is_success() {
        debug!("Track list for {} returned status {}", video_id, response.status);
        return Vec::new();
    }

    if response.body.trim().is_empty() {
        debug!("Track list for {} is empty", video_id);
        return Vec::new();
    }

    let tracks = parse_track_list(&response.body);
    debug!("Track list for {} has {} track(s)", video_id, tracks.len());
    tracks
}

/// Parse `<track .../>` elements into descriptors
pub fn parse_track_list(xml: &str) -> Vec<CaptionTrack> {
    TRACK_REGEX
        .captures_iter(xml)
        .filter_map(|track_caps| {
            let mut track = CaptionTrack::default();

            for attr in ATTRIBUTE_REGEX.captures_iter(&track_caps[1]) {
                let value = attr[2].to_string();
                match &attr[1] {
                    "lang_code" => track.lang_code = value,
                    "kind" => track.kind = Some(value),
                    "name" => track.name = Some(value),
                    "lang_original" => track.lang_original = Some(value),
                    "lang_translated" => track.lang_translated = Some(value),
                    "lang_default" => track.lang_default = value == "true",
                    "vss_id" => track.vss_id = Some(value),
                    _ => {}
                }
            }

            (!track.lang_code.is_empty()).then_some(track)
        })
        .collect()
}
