//! Dual-track response parsing.
//!
//! Personas are instructed to emit a private-reasoning track and a
//! public-response track behind literal markers. A completion that omits
//! either marker is a recoverable formatting failure: the whole completion
//! becomes the public track and the private track gets a fixed placeholder.

use plenum_core::defaults;

/// A completion split into its private and public tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Reasoning the persona keeps to itself; the placeholder when the
    /// completion carried no markers.
    pub private_thoughts: String,
    /// The response other personas (and readers) see.
    pub public_response: String,
}

/// Split a raw completion into private and public tracks.
///
/// When both markers are present in order, the private track is the text
/// strictly between them and the public track is everything after the
/// public marker, each trimmed. Otherwise the entire completion is the
/// public track and the private track is
/// [`defaults::NO_PRIVATE_THOUGHTS`]. Never fails.
pub fn parse_dual_track(raw: &str) -> ParsedResponse {
    let private_idx = raw.find(defaults::PRIVATE_MARKER);
    let public_idx = raw.find(defaults::PUBLIC_MARKER);

    if let (Some(private_idx), Some(public_idx)) = (private_idx, public_idx) {
        if private_idx < public_idx {
            let private_start = private_idx + defaults::PRIVATE_MARKER.len();
            let public_start = public_idx + defaults::PUBLIC_MARKER.len();
            return ParsedResponse {
                private_thoughts: raw[private_start..public_idx].trim().to_string(),
                public_response: raw[public_start..].trim().to_string(),
            };
        }
    }

    ParsedResponse {
        private_thoughts: defaults::NO_PRIVATE_THOUGHTS.to_string(),
        public_response: raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_markers_split_tracks() {
        let parsed = parse_dual_track("PRIVATE THOUGHTS: x PUBLIC RESPONSE: y");
        assert_eq!(parsed.private_thoughts, "x");
        assert_eq!(parsed.public_response, "y");
    }

    #[test]
    fn test_multiline_tracks() {
        let raw = "PRIVATE THOUGHTS:\nThe claim is weak.\nI should push back.\nPUBLIC RESPONSE:\nI disagree, and here is why.";
        let parsed = parse_dual_track(raw);
        assert_eq!(
            parsed.private_thoughts,
            "The claim is weak.\nI should push back."
        );
        assert_eq!(parsed.public_response, "I disagree, and here is why.");
    }

    #[test]
    fn test_missing_markers_fall_back_to_public() {
        let parsed = parse_dual_track("Just a plain completion.");
        assert_eq!(parsed.public_response, "Just a plain completion.");
        assert_eq!(
            parsed.private_thoughts,
            plenum_core::defaults::NO_PRIVATE_THOUGHTS
        );
    }

    #[test]
    fn test_only_private_marker_falls_back() {
        let parsed = parse_dual_track("PRIVATE THOUGHTS: just musing");
        assert_eq!(parsed.public_response, "PRIVATE THOUGHTS: just musing");
        assert_eq!(
            parsed.private_thoughts,
            plenum_core::defaults::NO_PRIVATE_THOUGHTS
        );
    }

    #[test]
    fn test_only_public_marker_falls_back() {
        let parsed = parse_dual_track("PUBLIC RESPONSE: just the answer");
        assert_eq!(parsed.public_response, "PUBLIC RESPONSE: just the answer");
    }

    #[test]
    fn test_markers_out_of_order_fall_back() {
        let raw = "PUBLIC RESPONSE: first PRIVATE THOUGHTS: second";
        let parsed = parse_dual_track(raw);
        assert_eq!(parsed.public_response, raw);
        assert_eq!(
            parsed.private_thoughts,
            plenum_core::defaults::NO_PRIVATE_THOUGHTS
        );
    }

    #[test]
    fn test_empty_tracks_are_empty_strings() {
        let parsed = parse_dual_track("PRIVATE THOUGHTS: PUBLIC RESPONSE:");
        assert_eq!(parsed.private_thoughts, "");
        assert_eq!(parsed.public_response, "");
    }
}
