/*!
 * Embedded-player caption metadata.
 *
 * Resolves the player response for a video (watch page → InnerTube API key →
 * player endpoint, or the `ytInitialPlayerResponse` blob embedded in the page
 * when no key is present) and reads the caption track list out of it. Every
 * failure here is soft: the caller only ever sees an empty list.
 */

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

use crate::app_config::UpstreamConfig;
use crate::errors::FetchError;
use crate::video_id::VideoId;

use super::http::HttpFetcher;
use super::models::CaptionTrack;

static API_KEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).unwrap(),
    ]
});

static INITIAL_PLAYER_RESPONSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ytInitialPlayerResponse\s*=\s*(\{.+?\})\s*;").unwrap()
});

/// Source of caption tracks from the embedded player
#[async_trait]
pub trait PlayerTrackSource: Send + Sync + Debug {
    /// Return the player's caption tracks, or an empty list on any failure
    async fn fetch_tracks(&self, video_id: &VideoId) -> Vec<CaptionTrack>;
}

/// Player metadata resolved through the InnerTube API
#[derive(Debug, Clone)]
pub struct InnertubePlayerSource {
    http: Arc<dyn HttpFetcher>,
    upstream: UpstreamConfig,
}

impl InnertubePlayerSource {
    pub fn new(http: Arc<dyn HttpFetcher>, upstream: UpstreamConfig) -> Self {
        Self { http, upstream }
    }

    /// Resolve the raw player response
    pub async fn player_response(&self, video_id: &VideoId) -> Result<Value, FetchError> {
        let watch_url = Url::parse_with_params(&self.upstream.watch_url, &[("v", video_id.as_str())])?;
        let page = self.http.get(watch_url.as_str(), &[]).await?.error_for_status()?;

        match extract_api_key(&page.body) {
            Some(api_key) => {
                debug!("Resolving player response for {} through InnerTube", video_id);
                let player_url = Url::parse_with_params(
                    &self.upstream.player_api_url,
                    &[("key", api_key.as_str()), ("prettyPrint", "false")],
                )?;
                let body = json!({
                    "context": {
                        "client": {
                            "hl": "en",
                            "gl": "US",
                            "clientName": "WEB",
                            "clientVersion": self.upstream.innertube_client_version,
                        }
                    },
                    "videoId": video_id.as_str(),
                });

                let response = self.http.post_json(player_url.as_str(), &body).await?.error_for_status()?;
                response.json().map_err(|e| FetchError::ParseError(e.to_string()))
            }
            None => {
                debug!("No InnerTube key on watch page for {}, reading embedded player response", video_id);
                extract_initial_player_response(&page.body)
            }
        }
    }
}

#[async_trait]
impl PlayerTrackSource for InnertubePlayerSource {
    async fn fetch_tracks(&self, video_id: &VideoId) -> Vec<CaptionTrack> {
        match self.player_response(video_id).await {
            Ok(response) => {
                let tracks = parse_player_caption_tracks(&response);
                debug!("Player metadata for {} lists {} caption track(s)", video_id, tracks.len());
                tracks
            }
            Err(e) => {
                warn!("Falling back to timedtext list: unable to fetch player captions for {}: {}", video_id, e);
                Vec::new()
            }
        }
    }
}

fn extract_api_key(html: &str) -> Option<String> {
    API_KEY_PATTERNS
        .iter()
        .find_map(|re| re.captures(html).map(|caps| caps[1].to_string()))
}

fn extract_initial_player_response(html: &str) -> Result<Value, FetchError> {
    let caps = INITIAL_PLAYER_RESPONSE_REGEX
        .captures(html)
        .ok_or_else(|| FetchError::ParseError("Could not find ytInitialPlayerResponse in watch page".to_string()))?;

    serde_json::from_str(&caps[1]).map_err(|e| FetchError::ParseError(e.to_string()))
}

/// Text of a `{simpleText}` or `{runs:[{text}]}` label
fn label_text(label: &Value) -> Option<String> {
    if let Some(text) = label.get("simpleText").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let runs = label.get("runs")?.as_array()?;
    let text: String = runs
        .iter()
        .filter_map(|run| run.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Read `captions.playerCaptionsTracklistRenderer.captionTracks`
pub fn parse_player_caption_tracks(player_response: &Value) -> Vec<CaptionTrack> {
    let Some(caption_tracks) = player_response
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    caption_tracks
        .iter()
        .map(|entry| {
            let name = entry.get("name").and_then(label_text);
            let lang_original = entry.get("languageName").and_then(label_text).or_else(|| name.clone());

            CaptionTrack {
                lang_code: string_field(entry, "languageCode").unwrap_or_default(),
                kind: string_field(entry, "kind"),
                name,
                lang_original,
                lang_translated: None,
                lang_default: entry.get("isDefault").and_then(Value::as_bool).unwrap_or(false),
                vss_id: string_field(entry, "vssId"),
                base_url: string_field(entry, "baseUrl"),
                is_player_track: true,
            }
        })
        .collect()
}
