/*!
 * Ranking of candidate caption tracks.
 *
 * Exact language matches come first, then default and player-sourced tracks,
 * then manually authored captions over machine-generated ones. No track is
 * ever discarded; the ranking only decides the order they are tried in.
 */

use std::cmp::Reverse;

use super::models::{CaptionTrack, AUTO_GENERATED_VSS_PREFIX};

const EXACT_LANGUAGE: i32 = 100;
const REGIONAL_LANGUAGE: i32 = 80;
const DEFAULT_TRACK: i32 = 20;
const PLAYER_TRACK: i32 = 15;
const MANUAL_TRACK: i32 = 10;
const ASR_TRACK: i32 = 5;
const AUTO_GENERATED_PENALTY: i32 = -5;

/// Score one track against a language that is already lowercased
pub fn track_score(normalized_language: &str, track: &CaptionTrack) -> i32 {
    let mut score = 0;
    let lang_code = track.lang_code.to_lowercase();

    if lang_code == normalized_language {
        score += EXACT_LANGUAGE;
    } else if lang_code.starts_with(&format!("{}-", normalized_language)) {
        score += REGIONAL_LANGUAGE;
    }

    if track.lang_default {
        score += DEFAULT_TRACK;
    }

    if track.is_player_track {
        score += PLAYER_TRACK;
    }

    match track.kind.as_deref() {
        None | Some("") => score += MANUAL_TRACK,
        Some(_) if track.is_asr() => score += ASR_TRACK,
        Some(_) => {}
    }

    if track
        .vss_id
        .as_deref()
        .is_some_and(|id| id.starts_with(AUTO_GENERATED_VSS_PREFIX))
    {
        score += AUTO_GENERATED_PENALTY;
    }

    score
}

/// Sort tracks by descending score; ties keep their input order
pub fn prioritize_tracks(language: &str, tracks: &[CaptionTrack]) -> Vec<CaptionTrack> {
    let normalized = language.to_lowercase();
    let mut ranked = tracks.to_vec();
    ranked.sort_by_key(|track| Reverse(track_score(&normalized, track)));
    ranked
}
