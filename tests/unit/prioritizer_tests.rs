/*!
 * Tests for caption track ordering
 */

use scriptripper::transcript::prioritizer::{prioritize_tracks, track_score};
use scriptripper::transcript::CaptionTrack;

fn codes(tracks: &[CaptionTrack]) -> Vec<String> {
    tracks
        .iter()
        .map(|t| match &t.kind {
            Some(kind) => format!("{}:{}", t.lang_code, kind),
            None => t.lang_code.clone(),
        })
        .collect()
}

#[test]
fn test_prioritize_manualBeatsAsrInSameLanguage_shouldOrderManualFirst() {
    let tracks = vec![
        CaptionTrack::new("en").with_kind("asr").with_vss_id("a.en"),
        CaptionTrack::new("en").with_vss_id(".en"),
    ];
    assert_eq!(codes(&prioritize_tracks("en", &tracks)), vec!["en", "en:asr"]);
}

#[test]
fn test_prioritize_requestedLanguageBeatsDefault_shouldPreferLanguage() {
    let tracks = vec![
        CaptionTrack::new("en").as_default().from_player(),
        CaptionTrack::new("de").with_kind("asr"),
    ];
    // de: 100 + 5 = 105, en: 20 + 15 + 10 = 45
    assert_eq!(codes(&prioritize_tracks("de", &tracks)), vec!["de:asr", "en"]);
}

#[test]
fn test_prioritize_regionalVariant_shouldRankBelowExact() {
    let tracks = vec![CaptionTrack::new("pt-BR"), CaptionTrack::new("pt"), CaptionTrack::new("es")];
    assert_eq!(codes(&prioritize_tracks("pt", &tracks)), vec!["pt", "pt-BR", "es"]);
}

#[test]
fn test_prioritize_equalScores_shouldKeepInputOrder() {
    let tracks = vec![CaptionTrack::new("fr"), CaptionTrack::new("it"), CaptionTrack::new("ja")];
    assert_eq!(codes(&prioritize_tracks("en", &tracks)), vec!["fr", "it", "ja"]);
}

#[test]
fn test_prioritize_neverDropsTracks_shouldPreserveLength() {
    let tracks = vec![
        CaptionTrack::new("xx").with_kind("forced"),
        CaptionTrack::new("en"),
        CaptionTrack::new("en").with_kind("asr"),
    ];
    let ranked = prioritize_tracks("en", &tracks);
    assert_eq!(ranked.len(), tracks.len());
    assert_eq!(codes(&ranked).last().map(String::as_str), Some("xx:forced"));
}

#[test]
fn test_trackScore_unknownKind_shouldGetNoKindBonus() {
    assert_eq!(track_score("en", &CaptionTrack::new("fr").with_kind("forced")), 0);
    assert_eq!(track_score("en", &CaptionTrack::new("fr").with_kind("")), 10);
    assert_eq!(track_score("en", &CaptionTrack::new("fr").with_kind("asr").with_vss_id("a.fr")), 0);
}
