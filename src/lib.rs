/*!
 * # ScriptRipper - transcript retrieval for YouTube videos
 *
 * A Rust library and HTTP service that turns a video URL into plain-text
 * transcript, working around missing or failing caption tracks.
 *
 * ## Features
 *
 * - Video id extraction from every common URL shape
 * - Caption tracks from the embedded player and the public directory
 * - Language-aware track prioritization with synthetic fallbacks
 * - Whole-pipeline fallbacks (watch-page scraping, public proxy)
 * - Diagnostic attempt reporting when every caption track fails
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `video_id`: URL parsing
 * - `transcript`: Retrieval strategies and the fallback plan:
 *   - `transcript::player` / `transcript::directory`: track sources
 *   - `transcript::prioritizer`: track ordering
 *   - `transcript::content`: caption content fetching
 *   - `transcript::library` / `transcript::proxy`: whole-pipeline fallbacks
 *   - `transcript::orchestrator`: the service running the plan
 * - `server`: axum router for the HTTP endpoint
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod server;
pub mod transcript;
pub mod video_id;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, FetchError, PipelineError};
pub use server::{router, AppState};
pub use transcript::{RetrievalOutcome, TranscriptService};
pub use video_id::{extract_video_id, VideoId};
