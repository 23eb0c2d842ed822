use anyhow::{Context, Result};
use ndarray::Array4;
use opencv::core::Mat;
use opencv::prelude::*;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use super::keypoint::{Keypoint, KeypointIndex, Pose};
use super::preprocess::{preprocess_for_movenet, preprocess_for_yolo_pose, YOLO_POSE_INPUT_SIZE};

/// YOLO pose検出のスコア閾値（これ未満は検出なし扱い）
const YOLO_SCORE_THRESHOLD: f32 = 0.25;

/// 姿勢推定のケイパビリティ契約
///
/// デコード済みフレームを受け取り、0または1人分のキーポイント
/// （ピクセル座標 + 信頼度）を返す。
pub trait PoseEstimator {
    fn detect(&mut self, frame: &Mat) -> Result<Option<Pose>>;
}

/// 対応モデル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    YoloV8Pose,
    Yolo11Pose,
    MoveNet,
}

impl ModelType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "yolov8" => Some(Self::YoloV8Pose),
            "yolo11" | "yolov11" => Some(Self::Yolo11Pose),
            "movenet" => Some(Self::MoveNet),
            _ => None,
        }
    }
}

fn build_session(model_path: &str) -> Result<Session> {
    let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "cuda")]
    let builder = {
        eprintln!("[ort] Attempting CUDA execution provider...");
        builder.with_execution_providers([
            ort::execution_providers::CUDAExecutionProvider::default().build()
        ])?
    };

    builder
        .commit_from_file(model_path)
        .context("Failed to load ONNX model")
}

/// ONNXモデルによる姿勢推定器
pub struct OnnxPoseEstimator {
    session: Session,
    model_type: ModelType,
    /// MoveNet用: 平均信頼度がこれ未満なら検出なし扱い
    min_pose_confidence: f32,
}

impl OnnxPoseEstimator {
    pub fn new(model_path: &str, model_type: ModelType, min_pose_confidence: f32) -> Result<Self> {
        let session = build_session(model_path)?;
        Ok(Self {
            session,
            model_type,
            min_pose_confidence,
        })
    }

    /// YOLOv8/YOLO11 pose: 出力レイアウトは両世代で同一
    ///
    /// 出力: [1, 56, N] = bbox(4) + score(1) + 17×(x, y, conf)。
    /// 座標は入力サイズ基準なのでフレーム座標にスケールし直す。
    fn detect_yolo(&mut self, input: Array4<f32>, frame_w: f32, frame_h: f32) -> Result<Option<Pose>> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["images" => input_tensor])
            .context("Inference failed")?;
        let output: ndarray::ArrayViewD<f32> = outputs["output0"]
            .try_extract_array()
            .context("Failed to extract output")?;

        // 最もスコアの高い検出を選択
        let n_detections = output.shape()[2];
        let mut best_score: f32 = 0.0;
        let mut best_idx: Option<usize> = None;
        for i in 0..n_detections {
            let score = output[[0, 4, i]];
            if score > best_score && score >= YOLO_SCORE_THRESHOLD {
                best_score = score;
                best_idx = Some(i);
            }
        }
        let Some(idx) = best_idx else {
            return Ok(None);
        };

        let scale_x = frame_w / YOLO_POSE_INPUT_SIZE as f32;
        let scale_y = frame_h / YOLO_POSE_INPUT_SIZE as f32;

        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for i in 0..KeypointIndex::COUNT {
            let x = output[[0, 5 + i * 3, idx]];
            let y = output[[0, 6 + i * 3, idx]];
            let confidence = output[[0, 7 + i * 3, idx]];
            keypoints[i] = Keypoint::new(x * scale_x, y * scale_y, confidence);
        }
        Ok(Some(Pose::new(keypoints)))
    }

    /// MoveNet: 出力 [1, 1, 17, 3] の (y, x, confidence)、座標は正規化済み
    ///
    /// 常に17点を返すモデルなので、平均信頼度が閾値未満なら
    /// 検出なしとして扱う。
    fn detect_movenet(&mut self, input: Array4<f32>, frame_w: f32, frame_h: f32) -> Result<Option<Pose>> {
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .context("Inference failed")?;
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .context("Failed to extract output")?;

        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for i in 0..KeypointIndex::COUNT {
            let y = output[[0, 0, i, 0]];
            let x = output[[0, 0, i, 1]];
            let confidence = output[[0, 0, i, 2]];
            keypoints[i] = Keypoint::new(x * frame_w, y * frame_h, confidence);
        }

        let pose = Pose::new(keypoints);
        if pose.average_confidence() < self.min_pose_confidence {
            return Ok(None);
        }
        Ok(Some(pose))
    }
}

impl PoseEstimator for OnnxPoseEstimator {
    fn detect(&mut self, frame: &Mat) -> Result<Option<Pose>> {
        let frame_w = frame.cols() as f32;
        let frame_h = frame.rows() as f32;

        match self.model_type {
            ModelType::YoloV8Pose | ModelType::Yolo11Pose => {
                let input = preprocess_for_yolo_pose(frame)?;
                self.detect_yolo(input, frame_w, frame_h)
            }
            ModelType::MoveNet => {
                let input = preprocess_for_movenet(frame)?;
                self.detect_movenet(input, frame_w, frame_h)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_name() {
        assert_eq!(ModelType::from_name("yolov8"), Some(ModelType::YoloV8Pose));
        assert_eq!(ModelType::from_name("yolo11"), Some(ModelType::Yolo11Pose));
        assert_eq!(ModelType::from_name("yolov11"), Some(ModelType::Yolo11Pose));
        assert_eq!(ModelType::from_name("movenet"), Some(ModelType::MoveNet));
        assert_eq!(ModelType::from_name("spinepose"), None);
    }
}
