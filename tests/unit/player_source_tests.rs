/*!
 * Tests for player metadata resolution over the network seam
 */

use scriptripper::app_config::UpstreamConfig;
use scriptripper::errors::FetchError;
use scriptripper::transcript::{
    CaptionPipeline, HttpResponse, InnertubePlayerSource, PlayerTrackSource, TranscriptStrategy,
};
use scriptripper::VideoId;

use crate::common::mock_http::ScriptedHttp;
use crate::common::{init_test_logging, json3_response};

const KEYED_PAGE: &str = r#"<html><script>ytcfg.set({"INNERTUBE_API_KEY": "KEY1","INNERTUBE_CONTEXT_CLIENT_NAME":1});</script></html>"#;

const PLAYER_JSON: &str = r#"{"playabilityStatus":{"status":"OK"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=vid&lang=en","name":{"simpleText":"English"},"languageCode":"en","isDefault":true}]}}}"#;

const EMBEDDED_PAGE: &str = r#"<html><script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=vid&lang=fr&kind=asr","languageCode":"fr","kind":"asr"}]}}};var meta = 1;</script></html>"#;

fn player_source(http: std::sync::Arc<ScriptedHttp>) -> InnertubePlayerSource {
    InnertubePlayerSource::new(http, UpstreamConfig::default())
}

fn summary(tracks: &[scriptripper::transcript::CaptionTrack]) -> Vec<(String, bool)> {
    tracks.iter().map(|t| (t.lang_code.clone(), t.lang_default)).collect()
}

#[tokio::test]
async fn test_fetchTracks_pageWithApiKey_shouldQueryPlayerEndpoint() {
    init_test_logging();
    let http = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, KEYED_PAGE))
        .route("youtubei/v1/player", HttpResponse::new(200, PLAYER_JSON))
        .into_arc();

    let tracks = player_source(http.clone()).fetch_tracks(&VideoId::new("vid")).await;

    assert_eq!(summary(&tracks), vec![("en".to_string(), true)]);
    assert!(tracks[0].is_player_track);
    assert_eq!(
        tracks[0].base_url.as_deref(),
        Some("https://www.youtube.com/api/timedtext?v=vid&lang=en")
    );
    assert_eq!(
        http.requests(),
        vec![
            "https://www.youtube.com/watch?v=vid".to_string(),
            "https://www.youtube.com/youtubei/v1/player?key=KEY1&prettyPrint=false".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_fetchTracks_pageWithoutApiKey_shouldReadEmbeddedResponse() {
    let http = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, EMBEDDED_PAGE))
        .into_arc();

    let tracks = player_source(http.clone()).fetch_tracks(&VideoId::new("vid")).await;

    assert_eq!(summary(&tracks), vec![("fr".to_string(), false)]);
    assert!(tracks[0].is_asr());
    // The embedded blob is enough; the player endpoint is never called
    assert_eq!(http.requests().len(), 1);
    assert!(http.requests_matching("youtubei").is_empty());
}

#[tokio::test]
async fn test_fetchTracks_playerEndpointFails_shouldReturnEmpty() {
    let id = VideoId::new("vid");
    let error_status = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, KEYED_PAGE))
        .route("youtubei/v1/player", HttpResponse::new(500, ""))
        .into_arc();
    let unparseable = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, KEYED_PAGE))
        .route("youtubei/v1/player", HttpResponse::new(200, "not json"))
        .into_arc();
    let unreachable = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, KEYED_PAGE))
        .fail("youtubei/v1/player", FetchError::RequestFailed("connection reset".to_string()))
        .into_arc();

    for http in [error_status, unparseable, unreachable] {
        let tracks = player_source(http.clone()).fetch_tracks(&id).await;
        assert!(tracks.is_empty());
        assert_eq!(http.requests_matching("youtubei/v1/player").len(), 1);
    }
}

#[tokio::test]
async fn test_fetchTracks_watchPageRejected_shouldReturnEmptyWithoutPlayerCall() {
    let throttled = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(429, ""))
        .into_arc();
    let bare = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, "<html>no player here</html>"))
        .into_arc();

    for http in [throttled, bare] {
        let tracks = player_source(http.clone()).fetch_tracks(&VideoId::new("vid")).await;
        assert!(tracks.is_empty());
        assert_eq!(http.requests().len(), 1);
    }
}

#[tokio::test]
async fn test_pipeline_realPlayerSource_shouldFetchPlayerTrackContent() {
    let http = ScriptedHttp::new()
        .route("/watch?v=vid", HttpResponse::new(200, KEYED_PAGE))
        .route("youtubei/v1/player", HttpResponse::new(200, PLAYER_JSON))
        .route("timedtext?v=vid&lang=en", json3_response(&["resolved through the player"]))
        .into_arc();
    let player = std::sync::Arc::new(player_source(http.clone()));
    let pipeline = CaptionPipeline::new(player, http.clone(), UpstreamConfig::default());

    let mut attempts = Vec::new();
    let result = pipeline
        .attempt(&VideoId::new("vid"), "en", &mut attempts)
        .await
        .unwrap()
        .expect("pipeline result");

    assert_eq!(result.transcript, "resolved through the player");
    assert!(result.track.unwrap().is_player_track);
    assert!(attempts.is_empty());
    // Content URL gets the json3 format forced onto it
    assert_eq!(http.requests_matching("fmt=json3").len(), 1);
    assert!(http.requests_matching("type=list").is_empty());
}
