use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// WebSocket待ち受けアドレス
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// 使用モデル ("yolov8" | "yolo11" | "movenet")
    #[serde(default = "default_model")]
    pub model: String,
    /// ONNXモデルのパス
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_model() -> String {
    "yolov8".to_string()
}
fn default_model_path() -> String {
    "models/yolov8n-pose.onnx".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// この角度（度）を超えたら「伸ばしきり」
    #[serde(default = "default_straight_angle")]
    pub straight_angle: f32,
    /// この角度（度）未満なら「曲げきり」
    #[serde(default = "default_curl_angle")]
    pub curl_angle: f32,
    /// 腕選択に必要な肩・肘・手首の平均信頼度
    #[serde(default = "default_min_joint_confidence")]
    pub min_joint_confidence: f32,
    /// MoveNet用: 姿勢全体の平均信頼度がこれ未満なら検出なし扱い
    #[serde(default = "default_min_pose_confidence")]
    pub min_pose_confidence: f32,
}

fn default_straight_angle() -> f32 {
    160.0
}
fn default_curl_angle() -> f32 {
    45.0
}
fn default_min_joint_confidence() -> f32 {
    0.5
}
fn default_min_pose_confidence() -> f32 {
    0.2
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            straight_angle: default_straight_angle(),
            curl_angle: default_curl_angle(),
            min_joint_confidence: default_min_joint_confidence(),
            min_pose_confidence: default_min_pose_confidence(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            model: default_model(),
            model_path: default_model_path(),
            verbose: false,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが無い・壊れている場合はデフォルト設定を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "[config] {} not loaded ({}), using defaults",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }
}
