/*!
 * Library-style whole-pipeline resolution.
 *
 * Scrapes the caption track list straight out of the watch page, picks the
 * track for the requested language and reads its timed-text XML. Neither the
 * InnerTube API nor the public track list is involved.
 */

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::app_config::UpstreamConfig;
use crate::errors::{FetchError, PipelineError};
use crate::video_id::VideoId;

use super::http::HttpFetcher;
use super::models::{CaptionTrack, FallbackSource, TranscriptAttempt, TranscriptResult};
use super::orchestrator::TranscriptStrategy;
use super::text::{decode_html_entities, join_segments};

/// Marker name reported for library results
pub const LIBRARY_TRACK_NAME: &str = "youtube-transcript";

// @const: One timed-text cue; attribute order varies between responses
static TEXT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<text\b[^>]*>([^<]*)</text>").unwrap()
});

const CAPTIONS_MARKER: &str = "\"captions\":";
const VIDEO_DETAILS_MARKER: &str = ",\"videoDetails";

/// Read the caption track list embedded in a watch page
pub fn extract_caption_tracks(html: &str) -> Result<Vec<Value>, FetchError> {
    let Some((_, after)) = html.split_once(CAPTIONS_MARKER) else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(FetchError::Status {
                status_code: 429,
                message: "YouTube is receiving too many requests from this IP and now requires solving a captcha".to_string(),
            });
        }
        if !html.contains("\"playabilityStatus\":") {
            return Err(FetchError::ParseError("The video is no longer available".to_string()));
        }
        return Err(FetchError::ParseError("Transcript is disabled on this video".to_string()));
    };

    let captions_json = after.split_once(VIDEO_DETAILS_MARKER).map_or(after, |(head, _)| head);
    let captions: Value = serde_json::from_str(captions_json)
        .map_err(|e| FetchError::ParseError(format!("Unreadable captions block: {}", e)))?;

    captions
        .pointer("/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| FetchError::ParseError("Transcript is disabled on this video".to_string()))
}

/// Pick the track for `language`, or the first one when no language is set
pub fn select_track_url(tracks: &[Value], language: &str) -> Result<String, FetchError> {
    let track = if language.is_empty() {
        tracks.first()
    } else {
        tracks
            .iter()
            .find(|track| track.get("languageCode").and_then(Value::as_str) == Some(language))
    };

    let track = track.ok_or_else(|| {
        let available: Vec<&str> = tracks
            .iter()
            .filter_map(|track| track.get("languageCode").and_then(Value::as_str))
            .collect();
        FetchError::ParseError(format!(
            "No transcripts are available in {} for this video (available: {})",
            language,
            available.join(", ")
        ))
    })?;

    track
        .get("baseUrl")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FetchError::ParseError("Caption track has no URL".to_string()))
}

/// Extract the cue texts of a timed-text XML document
///
/// The XML layer is unescaped here; caption-level entities are decoded later
/// with the rest of the normalization.
pub fn parse_timedtext_xml(xml: &str) -> Vec<String> {
    TEXT_REGEX
        .captures_iter(xml)
        .map(|caps| decode_html_entities(&caps[1]))
        .collect()
}

/// Whole-pipeline strategy backed by the watch page
#[derive(Debug, Clone)]
pub struct LibraryStrategy {
    http: Arc<dyn HttpFetcher>,
    upstream: UpstreamConfig,
}

impl LibraryStrategy {
    pub fn new(http: Arc<dyn HttpFetcher>, upstream: UpstreamConfig) -> Self {
        Self { http, upstream }
    }

    /// Fetch the raw segment texts for a video
    pub async fn fetch_segments(&self, video_id: &VideoId, language: &str) -> Result<Vec<String>, FetchError> {
        let watch_url = Url::parse_with_params(&self.upstream.watch_url, &[("v", video_id.as_str())])?;
        let headers: Vec<(&str, &str)> = if language.is_empty() {
            Vec::new()
        } else {
            vec![("Accept-Language", language)]
        };

        let page = self.http.get(watch_url.as_str(), &headers).await?.error_for_status()?;
        let tracks = extract_caption_tracks(&page.body)?;
        let track_url = select_track_url(&tracks, language)?;

        let captions = self.http.get(&track_url, &headers).await?.error_for_status()?;
        Ok(parse_timedtext_xml(&captions.body))
    }
}

#[async_trait]
impl TranscriptStrategy for LibraryStrategy {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn attempt(
        &self,
        video_id: &VideoId,
        language: &str,
        _attempts: &mut Vec<TranscriptAttempt>,
    ) -> Result<Option<TranscriptResult>, PipelineError> {
        let segments = match self.fetch_segments(video_id, language).await {
            Ok(segments) => segments,
            Err(e) => {
                debug!("Library resolution failed for {}: {}", video_id, e);
                return Ok(None);
            }
        };

        let transcript = join_segments(&segments);
        if transcript.is_empty() {
            debug!("Library resolution for {} returned no text", video_id);
            return Ok(None);
        }

        info!("Library resolution produced {} segment(s) for {}", segments.len(), video_id);
        let marker = CaptionTrack::new(language)
            .with_kind("library")
            .with_name(LIBRARY_TRACK_NAME);
        Ok(Some(TranscriptResult::from_fallback(transcript, marker, FallbackSource::Library)))
    }
}
