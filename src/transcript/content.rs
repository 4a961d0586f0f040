/*!
 * Caption content retrieval for a single track.
 *
 * Two mutually exclusive paths:
 * - the track carries a direct content URL (player metadata): fetch it,
 *   forcing the `json3` format when no format is set;
 * - otherwise build a timed-text query from the descriptor.
 *
 * Both return the same `events[].segs[].utf8` payload. A failed fetch never
 * raises: it is recorded as a `TranscriptAttempt` and yields `None` so the
 * caller can move on to the next candidate.
 */

use log::debug;
use serde_json::Value;
use url::Url;

use crate::app_config::UpstreamConfig;
use crate::errors::FetchError;
use crate::video_id::VideoId;

use super::http::HttpFetcher;
use super::models::{AttemptSource, CaptionTrack, TranscriptAttempt};
use super::text::normalize_transcript;

const JSON3_FORMAT: &str = "json3";

/// Why a caption payload yielded no text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// `events` is missing or not an array
    Malformed,
    /// No event carried any text segment
    Empty,
}

impl PayloadError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Malformed => "Malformed caption payload returned by YouTube.",
            Self::Empty => "Received empty caption segments.",
        }
    }
}

/// Join the caption segments of a `json3` payload
///
/// Segments within one event are concatenated without a separator; events
/// are joined with newlines. Events without string segments are skipped.
pub fn assemble_caption_events(payload: &Value) -> Result<String, PayloadError> {
    let events = payload
        .get("events")
        .and_then(Value::as_array)
        .ok_or(PayloadError::Malformed)?;

    let lines: Vec<String> = events
        .iter()
        .filter_map(|event| event.get("segs").and_then(Value::as_array))
        .filter_map(|segs| {
            let texts: Vec<&str> = segs
                .iter()
                .filter_map(|seg| seg.get("utf8").and_then(Value::as_str))
                .collect();
            (!texts.is_empty()).then(|| texts.concat())
        })
        .collect();

    if lines.is_empty() {
        return Err(PayloadError::Empty);
    }

    Ok(lines.join("\n"))
}

/// Force `fmt=json3` on a direct content URL unless a format is already set
pub fn with_json3_format(base_url: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    if !url.query_pairs().any(|(key, _)| key == "fmt") {
        url.query_pairs_mut().append_pair("fmt", JSON3_FORMAT);
    }
    Ok(url)
}

/// Query parameters for a timed-text content request
///
/// `lang` is dropped when the descriptor has a source track id but no
/// language code.
pub fn timedtext_query(video_id: &VideoId, track: &CaptionTrack) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("fmt", JSON3_FORMAT.to_string()),
        ("v", video_id.to_string()),
        ("lang", track.lang_code.clone()),
    ];

    if let Some(kind) = track.kind.as_deref().filter(|k| !k.is_empty()) {
        params.push(("kind", kind.to_string()));
    }

    if let Some(name) = track.name.as_deref().filter(|n| !n.is_empty()) {
        params.push(("name", name.to_string()));
    }

    params.push(("client", "yt".to_string()));

    if let Some(vss_id) = track.vss_id.as_deref().filter(|v| !v.is_empty()) {
        params.push(("vss_id", vss_id.to_string()));
        if track.lang_code.is_empty() {
            params.retain(|(key, _)| *key != "lang");
        }
    }

    params
}

/// Build the timed-text content URL for a descriptor
pub fn timedtext_url(upstream: &UpstreamConfig, video_id: &VideoId, track: &CaptionTrack) -> Result<Url, url::ParseError> {
    Url::parse_with_params(&upstream.timedtext_url, timedtext_query(video_id, track))
}

/// Attempt message for a request that never produced a response
fn transport_message(source: AttemptSource, error: &FetchError) -> String {
    let detail = match error {
        FetchError::RequestFailed(reason) => reason.clone(),
        other => other.to_string(),
    };
    match source {
        AttemptSource::Player => format!("Player caption fetch failed: {}", detail),
        _ => format!("Request failed: {}", detail),
    }
}

/// Fetches caption text for one descriptor at a time
#[derive(Debug, Clone, Copy)]
pub struct CaptionContentFetcher<'a> {
    http: &'a dyn HttpFetcher,
    upstream: &'a UpstreamConfig,
}

impl<'a> CaptionContentFetcher<'a> {
    pub fn new(http: &'a dyn HttpFetcher, upstream: &'a UpstreamConfig) -> Self {
        Self { http, upstream }
    }

    /// Fetch and normalize the transcript of one track
    ///
    /// Failures are appended to `attempts` and yield `None`.
    pub async fn fetch(
        &self,
        video_id: &VideoId,
        track: &CaptionTrack,
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> Option<String> {
        match track.base_url.as_deref() {
            Some(base_url) => {
                let url = match with_json3_format(base_url) {
                    Ok(url) => url,
                    Err(e) => {
                        attempts.push(TranscriptAttempt::new(
                            track,
                            None,
                            format!("Player caption fetch failed: {}", e),
                            AttemptSource::Player,
                        ));
                        return None;
                    }
                };
                self.fetch_url(url, track, AttemptSource::Player, attempts).await
            }
            None => {
                let url = match timedtext_url(self.upstream, video_id, track) {
                    Ok(url) => url,
                    Err(e) => {
                        attempts.push(TranscriptAttempt::new(
                            track,
                            None,
                            format!("Request failed: {}", e),
                            AttemptSource::Timedtext,
                        ));
                        return None;
                    }
                };
                self.fetch_url(url, track, AttemptSource::Timedtext, attempts).await
            }
        }
    }

    async fn fetch_url(
        &self,
        url: Url,
        track: &CaptionTrack,
        source: AttemptSource,
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> Option<String> {
        debug!("Fetching {} captions for track {}", source, track);

        let response = match self.http.get(url.as_str(), &[]).await {
            Ok(response) => response,
            Err(e) => {
                attempts.push(TranscriptAttempt::new(track, None, transport_message(source, &e), source));
                return None;
            }
        };

        if !response.is_success() {
            attempts.push(TranscriptAttempt::new(
                track,
                Some(response.status),
                response.status_text.clone(),
                source,
            ));
            return None;
        }

        let payload: Value = match response.json() {
            Ok(payload) => payload,
            Err(e) => {
                attempts.push(TranscriptAttempt::new(
                    track,
                    Some(response.status),
                    format!("Invalid JSON payload: {}", e),
                    source,
                ));
                return None;
            }
        };

        match assemble_caption_events(&payload) {
            Ok(joined) => Some(normalize_transcript(&joined)),
            Err(e) => {
                attempts.push(TranscriptAttempt::new(track, Some(response.status), e.message(), source));
                None
            }
        }
    }
}
