//! Per-frame analysis pipeline: decode → detect → select → classify.
//!
//! Every frame is processed independently; no state survives between calls.
//! All expected failures (undecodable payload, no detection, unclear body)
//! resolve to an [`AnalysisResult`] value, never an `Err`, so the session
//! channel keeps running regardless of what a single frame contained.

use opencv::core::Vector;
use opencv::imgcodecs;
use opencv::prelude::*;

use crate::config::AnalysisConfig;
use crate::geometry::angle_at;
use crate::pose::PoseEstimator;
use crate::protocol::{AnalysisResult, Landmarks};
use crate::selector::select_arm;

/// Analyzes one frame at a time with an injected pose-estimation capability.
pub struct FrameAnalyzer<D: PoseEstimator> {
    detector: D,
    config: AnalysisConfig,
}

impl<D: PoseEstimator> FrameAnalyzer<D> {
    pub fn new(detector: D, config: AnalysisConfig) -> Self {
        Self { detector, config }
    }

    /// Analyze one encoded image and produce the per-frame response.
    pub fn analyze(&mut self, image_bytes: &[u8]) -> AnalysisResult {
        // 1. Decode
        let buf = Vector::<u8>::from_slice(image_bytes);
        let mat = match imgcodecs::imdecode(&buf, imgcodecs::IMREAD_COLOR) {
            Ok(m) if !m.empty() => m,
            _ => return AnalysisResult::decode_failed(),
        };
        let width = mat.cols() as f32;
        let height = mat.rows() as f32;

        // 2. Detect
        let pose = match self.detector.detect(&mat) {
            Ok(Some(pose)) => pose,
            Ok(None) => return AnalysisResult::no_person(),
            Err(_) => return AnalysisResult::inference_failed(),
        };

        // 3. Select & normalize
        let arm = match select_arm(&pose, self.config.min_joint_confidence) {
            Some(arm) => arm,
            None => return AnalysisResult::body_not_clear(),
        };
        let shoulder = arm.shoulder.to_normalized(width, height);
        let elbow = arm.elbow.to_normalized(width, height);
        let wrist = arm.wrist.to_normalized(width, height);

        // 4. Classify
        let angle = angle_at(shoulder, elbow, wrist);
        let rounded = angle.round() as i32;
        let feedback = if angle > self.config.straight_angle {
            "Arm Straight - Down".to_string()
        } else if angle < self.config.curl_angle {
            "Arm Curl - Up".to_string()
        } else {
            format!("Moving... {rounded}°")
        };

        AnalysisResult::classified(rounded, feedback, Landmarks::new(shoulder, elbow, wrist))
    }
}
