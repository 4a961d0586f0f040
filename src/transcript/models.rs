/*!
 * Request-scoped data model shared by every retrieval strategy.
 *
 * None of these values outlive a single request: tracks are built from
 * upstream responses, attempts accumulate while candidates are tried, and a
 * result is handed back to the endpoint once one strategy succeeds.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// `kind` value that marks machine-generated (ASR) captions
pub const ASR_KIND: &str = "asr";

/// Source track ids of auto-generated captions start with this prefix
pub const AUTO_GENERATED_VSS_PREFIX: &str = "a.";

fn is_false(value: &bool) -> bool {
    !*value
}

/// One available caption stream for a video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    /// Language code, empty only for synthetic fallback descriptors
    pub lang_code: String,

    /// Track kind (`asr` for machine-generated captions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Human-readable track name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Original language label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang_original: Option<String>,

    /// Translated language label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang_translated: Option<String>,

    /// Whether the video marks this as its default track
    #[serde(default, skip_serializing_if = "is_false")]
    pub lang_default: bool,

    /// Source-system track identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vss_id: Option<String>,

    /// Direct content URL (player-sourced tracks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Whether the descriptor came from the embedded-player metadata
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_player_track: bool,
}

impl CaptionTrack {
    /// Create a bare descriptor for a language code
    pub fn new(lang_code: impl Into<String>) -> Self {
        Self {
            lang_code: lang_code.into(),
            ..Default::default()
        }
    }

    /// Set the track kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source track id
    pub fn with_vss_id(mut self, vss_id: impl Into<String>) -> Self {
        self.vss_id = Some(vss_id.into());
        self
    }

    /// Set the direct content URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Mark the track as the video's default
    pub fn as_default(mut self) -> Self {
        self.lang_default = true;
        self
    }

    /// Mark the track as coming from the player metadata
    pub fn from_player(mut self) -> Self {
        self.is_player_track = true;
        self
    }

    /// Whether the captions were produced by speech recognition
    pub fn is_asr(&self) -> bool {
        self.kind.as_deref() == Some(ASR_KIND)
    }
}

impl fmt::Display for CaptionTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lang = if self.lang_code.is_empty() { "?" } else { &self.lang_code };
        write!(f, "{}", lang)?;
        if let Some(kind) = &self.kind {
            write!(f, " [{}]", kind)?;
        }
        if let Some(vss_id) = &self.vss_id {
            write!(f, " ({})", vss_id)?;
        }
        Ok(())
    }
}

/// Which fetch path produced a diagnostic attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptSource {
    /// Direct content URL from the player metadata
    Player,
    /// Query against the public timed-text endpoint
    Timedtext,
    /// Library-style whole-pipeline resolution
    Library,
    /// Public proxy service
    Proxy,
}

impl fmt::Display for AttemptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Timedtext => write!(f, "timedtext"),
            Self::Library => write!(f, "library"),
            Self::Proxy => write!(f, "proxy"),
        }
    }
}

/// Record of one failed content fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAttempt {
    /// Track that was tried
    pub track: CaptionTrack,

    /// HTTP status, when a response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// What went wrong
    pub message: String,

    /// Fetch path that produced the failure
    pub source: AttemptSource,
}

impl TranscriptAttempt {
    /// Create a new attempt record
    pub fn new(
        track: &CaptionTrack,
        status: Option<u16>,
        message: impl Into<String>,
        source: AttemptSource,
    ) -> Self {
        Self {
            track: track.clone(),
            status,
            message: message.into(),
            source,
        }
    }
}

/// Whole-pipeline strategy that supplied a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackSource {
    Library,
    Proxy,
}

impl fmt::Display for FallbackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Proxy => write!(f, "proxy"),
        }
    }
}

/// Successful retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    /// Normalized transcript text
    pub transcript: String,

    /// Track (or synthetic marker) that produced the text
    pub track: Option<CaptionTrack>,

    /// Set when a whole-pipeline fallback supplied the text
    pub fallback: Option<FallbackSource>,
}

impl TranscriptResult {
    /// Result produced by the caption pipeline from a concrete track
    pub fn from_track(transcript: String, track: CaptionTrack) -> Self {
        Self {
            transcript,
            track: Some(track),
            fallback: None,
        }
    }

    /// Result produced by a whole-pipeline fallback
    pub fn from_fallback(transcript: String, track: CaptionTrack, fallback: FallbackSource) -> Self {
        Self {
            transcript,
            track: Some(track),
            fallback: Some(fallback),
        }
    }
}
