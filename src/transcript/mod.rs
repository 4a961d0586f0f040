/*!
 * Transcript retrieval.
 *
 * - `models`: caption tracks, attempts and results
 * - `http`: the upstream transport seam
 * - `player` / `directory`: where candidate tracks come from
 * - `prioritizer`: candidate ordering
 * - `content`: fetching and assembling one track's captions
 * - `library` / `proxy`: whole-pipeline fallbacks
 * - `orchestrator`: the fallback plan and the service that runs it
 */

pub mod content;
pub mod directory;
pub mod http;
pub mod library;
pub mod models;
pub mod orchestrator;
pub mod player;
pub mod prioritizer;
pub mod proxy;
pub mod text;

pub use http::{HttpFetcher, HttpResponse, ReqwestFetcher};
pub use models::{AttemptSource, CaptionTrack, FallbackSource, TranscriptAttempt, TranscriptResult};
pub use orchestrator::{
    CaptionPipeline, FallbackPlan, RetrievalOutcome, StrategyBudgets, StrategyKind, TranscriptService,
    TranscriptStrategy,
};
pub use player::{InnertubePlayerSource, PlayerTrackSource};
