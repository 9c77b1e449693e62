//! Caption track selection.

use crate::types::CaptionTrack;

/// Pick the best track for a target language.
///
/// Preference order: manual track in the target language, any track in the
/// target language, a track whose language code starts with the target
/// prefix, the first track. Returns `None` only for an empty slice; callers
/// guard that case and surface it as "no captions" upstream.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == language && !t.is_auto())
        .or_else(|| tracks.iter().find(|t| t.language_code == language))
        .or_else(|| tracks.iter().find(|t| t.language_code.starts_with(language)))
        .or_else(|| tracks.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            language_code: lang.to_string(),
            kind: kind.map(str::to_string),
            base_url: format!("https://example/{lang}"),
        }
    }

    #[test]
    fn prefers_manual_over_auto_for_same_language() {
        let tracks = vec![track("en", Some("asr")), track("en", None), track("fr", None)];
        let picked = select_track(&tracks, "en").unwrap();
        assert_eq!(picked.language_code, "en");
        assert!(!picked.is_auto());
    }

    #[test]
    fn falls_back_to_auto_when_no_manual() {
        let tracks = vec![track("fr", None), track("en", Some("asr"))];
        let picked = select_track(&tracks, "en").unwrap();
        assert_eq!(picked.language_code, "en");
        assert!(picked.is_auto());
    }

    #[test]
    fn matches_language_prefix() {
        let tracks = vec![track("fr", None), track("en-GB", Some("asr"))];
        let picked = select_track(&tracks, "en").unwrap();
        assert_eq!(picked.language_code, "en-GB");
    }

    #[test]
    fn falls_back_to_first_track() {
        let tracks = vec![track("fr", None), track("de", None)];
        let picked = select_track(&tracks, "en").unwrap();
        assert_eq!(picked.language_code, "fr");
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(select_track(&[], "en").is_none());
    }
}
