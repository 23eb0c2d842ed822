//! WebSocket wire format: inbound frame payloads and outbound analysis results.
//!
//! Self-contained: no imports from other form_coach modules except geometry.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Extract raw image bytes from a data-URI style text frame
/// (`data:image/jpeg;base64,<payload>`).
///
/// Everything up to and including the first comma is stripped; a payload
/// without a comma is decoded as plain base64.
pub fn decode_frame_payload(text: &str) -> Result<Vec<u8>> {
    let b64 = match text.find(',') {
        Some(i) => &text[i + 1..],
        None => text,
    };
    BASE64.decode(b64).context("invalid base64 frame payload")
}

/// Normalized landmark coordinates for the tracked arm, `[x, y]` each.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Landmarks {
    pub shoulder: [f32; 2],
    pub elbow: [f32; 2],
    pub wrist: [f32; 2],
}

impl Landmarks {
    pub fn new(shoulder: Point2D, elbow: Point2D, wrist: Point2D) -> Self {
        Self {
            shoulder: [shoulder.x, shoulder.y],
            elbow: [elbow.x, elbow.y],
            wrist: [wrist.x, wrist.y],
        }
    }
}

/// Per-frame response sent back on the same channel.
///
/// `angle` is 0 whenever it could not be determined. `error` is reserved for
/// decode/detection failures; a visible body with no confidently tracked arm
/// is a normal condition reported through `feedback` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub angle: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub landmarks: Option<Landmarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn decode_failed() -> Self {
        Self {
            angle: 0,
            feedback: None,
            landmarks: None,
            error: Some("Image decode failed".to_string()),
        }
    }

    pub fn inference_failed() -> Self {
        Self {
            angle: 0,
            feedback: None,
            landmarks: None,
            error: Some("Pose inference failed".to_string()),
        }
    }

    pub fn no_person() -> Self {
        Self {
            angle: 0,
            feedback: None,
            landmarks: None,
            error: Some("No person detected".to_string()),
        }
    }

    pub fn body_not_clear() -> Self {
        Self {
            angle: 0,
            feedback: Some("Body not clear".to_string()),
            landmarks: None,
            error: None,
        }
    }

    pub fn classified(angle: i32, feedback: String, landmarks: Landmarks) -> Self {
        Self {
            angle,
            feedback: Some(feedback),
            landmarks: Some(landmarks),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_frame_payload_strips_prefix() {
        // "hello" base64-encoded with a typical canvas.toDataURL prefix
        let text = "data:image/jpeg;base64,aGVsbG8=";
        assert_eq!(decode_frame_payload(text).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_frame_payload_without_prefix() {
        assert_eq!(decode_frame_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_frame_payload_empty_payload() {
        assert_eq!(decode_frame_payload("data:image/jpeg;base64,").unwrap(), b"");
    }

    #[test]
    fn test_decode_frame_payload_invalid_base64() {
        assert!(decode_frame_payload("data:image/jpeg;base64,???").is_err());
    }

    #[test]
    fn test_error_response_omits_feedback() {
        let json = serde_json::to_value(AnalysisResult::no_person()).unwrap();
        assert_eq!(json["error"], "No person detected");
        assert_eq!(json["angle"], 0);
        assert!(json.get("feedback").is_none());
        assert!(json["landmarks"].is_null());
    }

    #[test]
    fn test_body_not_clear_has_null_landmarks_and_no_error() {
        let json = serde_json::to_value(AnalysisResult::body_not_clear()).unwrap();
        assert_eq!(json["feedback"], "Body not clear");
        assert_eq!(json["angle"], 0);
        assert!(json["landmarks"].is_null());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_classified_response_shape() {
        let landmarks = Landmarks::new(
            Point2D::new(0.5, 0.2),
            Point2D::new(0.5, 0.5),
            Point2D::new(0.5, 0.8),
        );
        let result = AnalysisResult::classified(178, "Arm Straight - Down".to_string(), landmarks);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["angle"], 178);
        assert_eq!(json["feedback"], "Arm Straight - Down");
        assert_eq!(json["landmarks"]["shoulder"][1], 0.2);
        assert_eq!(json["landmarks"]["wrist"][0], 0.5);
        assert!(json.get("error").is_none());
    }
}
