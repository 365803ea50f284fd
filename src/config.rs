use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
}

/// 測定パイプラインの閾値設定
///
/// デフォルト値は実機検証済みの最新リビジョンに従う。
#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// キャリブレーション許可の可視性信頼度閾値（全33ランドマーク）
    #[serde(default = "default_visibility_confidence")]
    pub visibility_confidence: f32,
    /// キャリブレーション後のヒップ信頼度閾値（多少のノイズを許容）
    #[serde(default = "default_hip_confidence")]
    pub hip_confidence: f32,
    /// 骨格不在判定の信頼度閾値
    #[serde(default = "default_presence_confidence")]
    pub presence_confidence: f32,
    /// 静止判定の履歴容量（約2秒分）
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,
    /// 静止判定に必要な最小サンプル数
    #[serde(default = "default_stability_eval_samples")]
    pub stability_eval_samples: usize,
    /// 垂直方向の許容偏差（ピクセル）
    #[serde(default = "default_stability_vertical_tolerance_px")]
    pub stability_vertical_tolerance_px: f32,
    /// 奥行き方向の許容偏差（垂直の半分）
    #[serde(default = "default_stability_depth_tolerance_px")]
    pub stability_depth_tolerance_px: f32,
    /// 静止継続時間（ミリ秒）
    #[serde(default = "default_stability_hold_ms")]
    pub stability_hold_ms: u64,
    /// キャリブレーションフレーム数
    #[serde(default = "default_calibration_frames")]
    pub calibration_frames: u32,
    /// 全身スパンサンプルの容量
    #[serde(default = "default_span_window")]
    pub span_window: usize,
    /// 奥行き変動の棄却閾値（ピクセル）
    #[serde(default = "default_depth_threshold_px")]
    pub depth_threshold_px: f32,
    /// 奥行き履歴の容量
    #[serde(default = "default_depth_history_window")]
    pub depth_history_window: usize,
    /// 奥行き履歴平均が有効になる最小サンプル数
    #[serde(default = "default_depth_history_min_samples")]
    pub depth_history_min_samples: usize,
    /// ドリフト対策の厳格チェック係数
    #[serde(default = "default_depth_strict_factor")]
    pub depth_strict_factor: f32,
    /// 位置警告を出す係数（棄却閾値に対する比率）
    #[serde(default = "default_depth_warning_factor")]
    pub depth_warning_factor: f32,
    /// 垂直位置の平滑化ウィンドウ
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// 目〜かかと距離の対身長比率（集団平均）
    #[serde(default = "default_eye_to_heel_ratio")]
    pub eye_to_heel_ratio: f32,
    /// 比率の経験的下限（信頼区間用）
    #[serde(default = "default_eye_to_heel_ratio_low")]
    pub eye_to_heel_ratio_low: f32,
    /// 比率の経験的上限（信頼区間用）
    #[serde(default = "default_eye_to_heel_ratio_high")]
    pub eye_to_heel_ratio_high: f32,
}

fn default_visibility_confidence() -> f32 { 0.96 }
fn default_hip_confidence() -> f32 { 0.5 }
fn default_presence_confidence() -> f32 { 0.1 }
fn default_stability_window() -> usize { 60 }
fn default_stability_eval_samples() -> usize { 30 }
fn default_stability_vertical_tolerance_px() -> f32 { 15.0 }
fn default_stability_depth_tolerance_px() -> f32 { 7.5 }
fn default_stability_hold_ms() -> u64 { 2000 }
fn default_calibration_frames() -> u32 { 60 }
fn default_span_window() -> usize { 30 }
fn default_depth_threshold_px() -> f32 { 50.0 }
fn default_depth_history_window() -> usize { 30 }
fn default_depth_history_min_samples() -> usize { 10 }
fn default_depth_strict_factor() -> f32 { 0.7 }
fn default_depth_warning_factor() -> f32 { 0.7 }
fn default_smoothing_window() -> usize { 10 }
fn default_eye_to_heel_ratio() -> f32 { 0.884 }
fn default_eye_to_heel_ratio_low() -> f32 { 0.877 }
fn default_eye_to_heel_ratio_high() -> f32 { 0.887 }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            visibility_confidence: default_visibility_confidence(),
            hip_confidence: default_hip_confidence(),
            presence_confidence: default_presence_confidence(),
            stability_window: default_stability_window(),
            stability_eval_samples: default_stability_eval_samples(),
            stability_vertical_tolerance_px: default_stability_vertical_tolerance_px(),
            stability_depth_tolerance_px: default_stability_depth_tolerance_px(),
            stability_hold_ms: default_stability_hold_ms(),
            calibration_frames: default_calibration_frames(),
            span_window: default_span_window(),
            depth_threshold_px: default_depth_threshold_px(),
            depth_history_window: default_depth_history_window(),
            depth_history_min_samples: default_depth_history_min_samples(),
            depth_strict_factor: default_depth_strict_factor(),
            depth_warning_factor: default_depth_warning_factor(),
            smoothing_window: default_smoothing_window(),
            eye_to_heel_ratio: default_eye_to_heel_ratio(),
            eye_to_heel_ratio_low: default_eye_to_heel_ratio_low(),
            eye_to_heel_ratio_high: default_eye_to_heel_ratio_high(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが無い／壊れている場合はデフォルトで起動
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("設定ファイルを読めないためデフォルトを使用: {}", e);
                Config::default()
            }
        }
    }
}
