/*!
 * Public proxy transcription service.
 *
 * The service answers with a JSON array of `{text}` segments, either as a
 * plain JSON body or wrapped in an HTML page inside a `<pre>` element.
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

use super::http::{HttpFetcher, HttpResponse};
use super::models::{CaptionTrack, FallbackSource, TranscriptAttempt, TranscriptResult};
use super::orchestrator::TranscriptStrategy;
use super::text::join_segments;

/// Marker name reported for proxy results
pub const PROXY_TRACK_NAME: &str = "youtubetranscript.com";

static PRE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").unwrap()
});

/// Decode either response shape into the segment array
pub fn decode_proxy_payload(response: &HttpResponse) -> Option<Vec<Value>> {
    let is_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"));

    let data: Value = if is_json {
        response.json().ok()?
    } else {
        let caps = PRE_BLOCK_REGEX.captures(&response.body)?;
        serde_json::from_str(&caps[1]).ok()?
    };

    match data {
        Value::Array(segments) if !segments.is_empty() => Some(segments),
        _ => None,
    }
}

/// Whole-pipeline strategy backed by the proxy service
#[derive(Debug, Clone)]
pub struct ProxyStrategy {
    http: Arc<dyn HttpFetcher>,
    upstream: UpstreamConfig,
}

impl ProxyStrategy {
    pub fn new(http: Arc<dyn HttpFetcher>, upstream: UpstreamConfig) -> Self {
        Self { http, upstream }
    }

    /// Build the proxy request URL
    pub fn request_url(&self, video_id: &VideoId, language: &str) -> Result<Url, FetchError> {
        Ok(Url::parse_with_params(
            &self.upstream.proxy_url,
            &[("server_vid2", video_id.as_str()), ("lang", language), ("format", "json")],
        )?)
    }

    async fn fetch_segments(&self, video_id: &VideoId, language: &str) -> Result<Option<Vec<Value>>, FetchError> {
        let url = self.request_url(video_id, language)?;
        let response = self
            .http
            .get(url.as_str(), &[("Accept", "application/json, text/plain, */*")])
            .await?
            .error_for_status()?;

        Ok(decode_proxy_payload(&response))
    }
}

#[async_trait]
impl TranscriptStrategy for ProxyStrategy {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn attempt(
        &self,
        video_id: &VideoId,
        language: &str,
        _attempts: &mut Vec<TranscriptAttempt>,
    ) -> Result<Option<TranscriptResult>, PipelineError> {
        let segments = match self.fetch_segments(video_id, language).await {
            Ok(Some(segments)) => segments,
            Ok(None) => {
                debug!("Proxy returned no usable segments for {}", video_id);
                return Ok(None);
            }
            Err(e) => {
                debug!("Proxy request failed for {}: {}", video_id, e);
                return Ok(None);
            }
        };

        let transcript = join_segments(
            segments
                .iter()
                .map(|segment| segment.get("text").and_then(Value::as_str).unwrap_or_default()),
        );
        if transcript.is_empty() {
            return Ok(None);
        }

        info!("Proxy produced {} segment(s) for {}", segments.len(), video_id);
        let marker = CaptionTrack::new(language)
            .with_kind("proxy")
            .with_name(PROXY_TRACK_NAME);
        Ok(Some(TranscriptResult::from_fallback(transcript, marker, FallbackSource::Proxy)))
    }
}
