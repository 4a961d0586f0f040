/*!
 * Fallback orchestration across retrieval strategies.
 *
 * Every way of obtaining a transcript implements `TranscriptStrategy`. The
 * order in which they run, and what runs after each kind of failure, is held
 * as data in a `FallbackPlan` and executed by `TranscriptService`:
 *
 * - primary: library, proxy, caption pipeline;
 * - after a diagnosed pipeline failure: library, proxy;
 * - after a clean empty result: proxy;
 * - after an unexpected pipeline failure: library, proxy.
 *
 * Within a request everything runs sequentially and stops at the first
 * success.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, StrategyTimeouts, UpstreamConfig};
use crate::errors::{FetchError, PipelineError};
use crate::video_id::VideoId;

use super::content::CaptionContentFetcher;
use super::directory::fetch_track_list;
use super::http::{HttpFetcher, ReqwestFetcher};
use super::library::LibraryStrategy;
use super::models::{CaptionTrack, TranscriptAttempt, TranscriptResult, ASR_KIND};
use super::player::{InnertubePlayerSource, PlayerTrackSource};
use super::prioritizer::prioritize_tracks;
use super::proxy::ProxyStrategy;

/// One way of obtaining a transcript
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Try to produce a transcript
    ///
    /// `Ok(None)` means nothing usable was found. Content failures worth
    /// reporting are appended to `attempts`.
    async fn attempt(
        &self,
        video_id: &VideoId,
        language: &str,
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> Result<Option<TranscriptResult>, PipelineError>;
}

/// Descriptors tried when the public directory lists nothing
pub fn fallback_tracks(language: &str) -> Vec<CaptionTrack> {
    let regional = format!("{}-US", language);
    vec![
        CaptionTrack::new(language),
        CaptionTrack::new(regional),
        CaptionTrack::new("en"),
        CaptionTrack::new("en-US"),
        CaptionTrack::new(language).with_kind(ASR_KIND),
        CaptionTrack::new("en").with_kind(ASR_KIND),
    ]
}

/// Player metadata, then the public directory, then synthetic guesses
#[derive(Debug, Clone)]
pub struct CaptionPipeline {
    player: Arc<dyn PlayerTrackSource>,
    http: Arc<dyn HttpFetcher>,
    upstream: UpstreamConfig,
}

impl CaptionPipeline {
    pub fn new(player: Arc<dyn PlayerTrackSource>, http: Arc<dyn HttpFetcher>, upstream: UpstreamConfig) -> Self {
        Self { player, http, upstream }
    }

    // @returns: First non-empty transcript among `tracks`, in order
    async fn first_transcript(
        &self,
        video_id: &VideoId,
        tracks: &[CaptionTrack],
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> Option<TranscriptResult> {
        let fetcher = CaptionContentFetcher::new(self.http.as_ref(), &self.upstream);
        for track in tracks {
            if let Some(transcript) = fetcher.fetch(video_id, track, attempts).await {
                if !transcript.is_empty() {
                    info!("Transcript for {} resolved from track {}", video_id, track);
                    return Some(TranscriptResult::from_track(transcript, track.clone()));
                }
            }
        }
        None
    }
}

#[async_trait]
impl TranscriptStrategy for CaptionPipeline {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    async fn attempt(
        &self,
        video_id: &VideoId,
        language: &str,
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> Result<Option<TranscriptResult>, PipelineError> {
        let player_tracks = self.player.fetch_tracks(video_id).await;
        if !player_tracks.is_empty() {
            let ordered = prioritize_tracks(language, &player_tracks);
            if let Some(result) = self.first_transcript(video_id, &ordered, attempts).await {
                return Ok(Some(result));
            }
        }

        let listed = fetch_track_list(self.http.as_ref(), &self.upstream, video_id).await;
        let candidates = if listed.is_empty() {
            debug!("No listed tracks for {}, trying synthetic descriptors", video_id);
            fallback_tracks(language)
        } else {
            prioritize_tracks(language, &listed)
        };

        if let Some(result) = self.first_transcript(video_id, &candidates, attempts).await {
            return Ok(Some(result));
        }

        if attempts.is_empty() {
            Ok(None)
        } else {
            Err(PipelineError::Diagnosed(std::mem::take(attempts)))
        }
    }
}

/// Identifies a strategy slot in a `FallbackPlan`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Library,
    Proxy,
    Pipeline,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Proxy => write!(f, "proxy"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Strategy order for the first pass and for each failure shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPlan {
    pub primary: Vec<StrategyKind>,
    pub after_diagnosed: Vec<StrategyKind>,
    pub after_empty: Vec<StrategyKind>,
    pub after_unexpected: Vec<StrategyKind>,
}

impl Default for FallbackPlan {
    fn default() -> Self {
        use StrategyKind::*;
        Self {
            primary: vec![Library, Proxy, Pipeline],
            after_diagnosed: vec![Library, Proxy],
            after_empty: vec![Proxy],
            after_unexpected: vec![Library, Proxy],
        }
    }
}

/// Final result of one retrieval
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// A transcript was produced; `attempts` is non-empty only when it came
    /// from an emergency fallback after a diagnosed failure
    Found {
        result: TranscriptResult,
        attempts: Vec<TranscriptAttempt>,
    },
    /// Every caption track failed and the emergency fallbacks found nothing
    Diagnosed { attempts: Vec<TranscriptAttempt> },
    /// No strategy found anything and nothing was diagnosed
    Unavailable,
    /// An unexpected failure that the emergency fallbacks did not recover
    Failed { details: String },
}

enum StageOutcome {
    Found(TranscriptResult),
    Exhausted,
    Failed(PipelineError),
}

/// Time budget of each strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyBudgets {
    pub library: Duration,
    pub proxy: Duration,
    pub pipeline: Duration,
}

impl From<&StrategyTimeouts> for StrategyBudgets {
    fn from(timeouts: &StrategyTimeouts) -> Self {
        Self {
            library: timeouts.library(),
            proxy: timeouts.proxy(),
            pipeline: timeouts.pipeline(),
        }
    }
}

/// Runs the fallback plan for a request
#[derive(Clone)]
pub struct TranscriptService {
    library: Arc<dyn TranscriptStrategy>,
    proxy: Arc<dyn TranscriptStrategy>,
    pipeline: Arc<dyn TranscriptStrategy>,
    budgets: StrategyBudgets,
    plan: FallbackPlan,
}

impl TranscriptService {
    pub fn new(
        library: Arc<dyn TranscriptStrategy>,
        proxy: Arc<dyn TranscriptStrategy>,
        pipeline: Arc<dyn TranscriptStrategy>,
        timeouts: StrategyTimeouts,
    ) -> Self {
        Self {
            library,
            proxy,
            pipeline,
            budgets: StrategyBudgets::from(&timeouts),
            plan: FallbackPlan::default(),
        }
    }

    /// Replace the per-strategy budgets taken from configuration
    pub fn with_budgets(mut self, budgets: StrategyBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Replace the default plan
    pub fn with_plan(mut self, plan: FallbackPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Wire the real strategies from configuration
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(&config.http)?);
        let player = Arc::new(InnertubePlayerSource::new(http.clone(), config.upstream.clone()));

        Ok(Self::new(
            Arc::new(LibraryStrategy::new(http.clone(), config.upstream.clone())),
            Arc::new(ProxyStrategy::new(http.clone(), config.upstream.clone())),
            Arc::new(CaptionPipeline::new(player, http, config.upstream.clone())),
            config.timeouts.clone(),
        ))
    }

    pub fn plan(&self) -> &FallbackPlan {
        &self.plan
    }

    fn strategy(&self, kind: StrategyKind) -> (&dyn TranscriptStrategy, Duration) {
        match kind {
            StrategyKind::Library => (self.library.as_ref(), self.budgets.library),
            StrategyKind::Proxy => (self.proxy.as_ref(), self.budgets.proxy),
            StrategyKind::Pipeline => (self.pipeline.as_ref(), self.budgets.pipeline),
        }
    }

    /// Run one strategy under its time budget
    async fn run_one(
        &self,
        kind: StrategyKind,
        video_id: &VideoId,
        language: &str,
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> Result<Option<TranscriptResult>, PipelineError> {
        let (strategy, budget) = self.strategy(kind);
        debug!("Trying {} strategy for {}", strategy.name(), video_id);

        match tokio::time::timeout(budget, strategy.attempt(video_id, language, attempts)).await {
            Ok(outcome) => outcome,
            Err(_) if kind == StrategyKind::Pipeline => Err(PipelineError::Unexpected(format!(
                "Caption pipeline timed out after {:?}",
                budget
            ))),
            Err(_) => {
                warn!("{} strategy timed out after {:?} for {}", strategy.name(), budget, video_id);
                Ok(None)
            }
        }
    }

    async fn run_stage(
        &self,
        stage: &[StrategyKind],
        video_id: &VideoId,
        language: &str,
        attempts: &mut Vec<TranscriptAttempt>,
    ) -> StageOutcome {
        for &kind in stage {
            match self.run_one(kind, video_id, language, attempts).await {
                Ok(Some(result)) => return StageOutcome::Found(result),
                Ok(None) => continue,
                Err(e) => return StageOutcome::Failed(e),
            }
        }
        StageOutcome::Exhausted
    }

    /// Emergency stage: errors are logged and treated as no result
    async fn run_recovery(&self, stage: &[StrategyKind], video_id: &VideoId, language: &str) -> Option<TranscriptResult> {
        let mut scratch = Vec::new();
        for &kind in stage {
            match self.run_one(kind, video_id, language, &mut scratch).await {
                Ok(Some(result)) => return Some(result),
                Ok(None) => {}
                Err(e) => warn!("{} strategy failed during recovery for {}: {}", kind, video_id, e),
            }
        }
        None
    }

    /// Retrieve a transcript for `video_id` in `language`
    pub async fn retrieve(&self, video_id: &VideoId, language: &str) -> RetrievalOutcome {
        let mut attempts = Vec::new();

        match self.run_stage(&self.plan.primary, video_id, language, &mut attempts).await {
            StageOutcome::Found(result) => RetrievalOutcome::Found {
                result,
                attempts: Vec::new(),
            },
            StageOutcome::Exhausted => {
                debug!("Nothing found for {}, retrying fallbacks", video_id);
                match self.run_recovery(&self.plan.after_empty, video_id, language).await {
                    Some(result) => RetrievalOutcome::Found {
                        result,
                        attempts: Vec::new(),
                    },
                    None => RetrievalOutcome::Unavailable,
                }
            }
            StageOutcome::Failed(PipelineError::Diagnosed(attempts)) => {
                warn!("All {} caption attempt(s) failed for {}", attempts.len(), video_id);
                match self.run_recovery(&self.plan.after_diagnosed, video_id, language).await {
                    Some(result) => RetrievalOutcome::Found { result, attempts },
                    None => RetrievalOutcome::Diagnosed { attempts },
                }
            }
            StageOutcome::Failed(PipelineError::Unexpected(details)) => {
                warn!("Unexpected failure retrieving {}: {}", video_id, details);
                match self.run_recovery(&self.plan.after_unexpected, video_id, language).await {
                    Some(result) => RetrievalOutcome::Found {
                        result,
                        attempts: Vec::new(),
                    },
                    None => RetrievalOutcome::Failed { details },
                }
            }
        }
    }
}
