use tracing::{info, warn};

use crate::config::DetectorConfig;
use crate::tracker::window::SampleWindow;

/// 利用者の身体情報
///
/// キャリブレーションのリセットをまたいで保持される（身体は
/// セッション間で変わらない）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnthropometricProfile {
    /// 身長（cm）
    pub user_height_cm: f32,
    /// 目〜頭頂の実測オフセット（cm）。無い場合は集団平均比率で代用
    pub eye_to_vertex_cm: Option<f32>,
    /// かかと〜指先のリーチオフセット（cm）。スパイク到達点の加算分
    pub heel_to_hand_reach_cm: f32,
}

/// スケールの由来
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    /// 身体情報未設定: 1.0 px/cm の恒等プレースホルダ
    Identity,
    /// 集団平均比率（目〜かかと ≈ 身長の88.4%）による換算
    Proxy,
    /// 実測の目〜頭頂オフセットによる換算
    Precise,
}

/// 基準位置キャリブレータ
///
/// 静止確認後に60フレームかけて基準の垂直位置・奥行きを逐次平均で
/// 蓄積し、後半のフレームで全身ピクセルスパンを採取する。完了時点で
/// ピクセル→cm スケールを確定する。
pub struct BaselineCalibrator {
    target_frames: u32,
    frame_count: u32,
    baseline_vertical: f32,
    baseline_depth: f32,
    span_samples: SampleWindow<f32>,
    mean_span: Option<f32>,
    px_per_cm: f32,
    scale_source: ScaleSource,
    is_calibrated: bool,
    eye_to_heel_ratio: f32,
}

impl BaselineCalibrator {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            target_frames: config.calibration_frames,
            frame_count: 0,
            baseline_vertical: 0.0,
            baseline_depth: 0.0,
            span_samples: SampleWindow::new(config.span_window),
            mean_span: None,
            px_per_cm: 1.0,
            scale_source: ScaleSource::Identity,
            is_calibrated: false,
            eye_to_heel_ratio: config.eye_to_heel_ratio,
        }
    }

    /// キャリブレーションを1フレーム進める
    ///
    /// 戻り値はこのフレームで完了したかどうか。完了済みなら何もしない。
    pub fn advance(&mut self, vertical: f32, depth: f32, span: Option<f32>) -> bool {
        if self.is_calibrated {
            return false;
        }

        self.frame_count += 1;
        let n = self.frame_count as f32;

        // 逐次平均: 合計してから割るよりオーバーフローに強い
        self.baseline_vertical = (self.baseline_vertical * (n - 1.0) + vertical) / n;
        self.baseline_depth = (self.baseline_depth * (n - 1.0) + depth) / n;

        // 前半は基準位置の安定待ち。スパン採取は後半のみ
        if self.frame_count > self.target_frames / 2 {
            if let Some(span) = span {
                self.span_samples.push(span);
            }
        }

        if self.frame_count >= self.target_frames {
            self.finalize();
            return true;
        }
        false
    }

    fn finalize(&mut self) {
        self.mean_span = self.span_samples.mean();
        if self.mean_span.is_none() {
            // スパン無しでも完了はする（物理単位の精度は落ちる）
            warn!("全身スパンを採取できないまま完了: cm換算の精度が低下します");
        }
        self.is_calibrated = true;
        info!(
            baseline_vertical = self.baseline_vertical,
            baseline_depth = self.baseline_depth,
            span = ?self.mean_span,
            "キャリブレーション完了"
        );
    }

    /// 身体情報からピクセル→cm スケールを確定する
    ///
    /// スパンサンプルが無ければ何もしない（警告のみ）。キャリブレーション
    /// 完了前でも既に採取済みのサンプルがあれば再計算できる。
    pub fn apply_anthropometry(&mut self, profile: &AnthropometricProfile) {
        let Some(mean_span) = self.mean_span().filter(|s| *s > 0.0) else {
            warn!("スパンサンプル未採取のためスケールを確定できません");
            return;
        };

        let (eye_to_heel_cm, source) = match profile.eye_to_vertex_cm {
            Some(offset) => (profile.user_height_cm - offset, ScaleSource::Precise),
            None => (
                profile.user_height_cm * self.eye_to_heel_ratio,
                ScaleSource::Proxy,
            ),
        };

        if eye_to_heel_cm <= 0.0 {
            warn!(
                user_height_cm = profile.user_height_cm,
                "身長情報が不正なためスケールを確定できません"
            );
            return;
        }

        self.px_per_cm = mean_span / eye_to_heel_cm;
        self.scale_source = source;
        info!(
            px_per_cm = self.px_per_cm,
            precise = matches!(source, ScaleSource::Precise),
            "スケール確定"
        );
    }

    /// 確定済みスパン平均、未確定なら採取中サンプルの平均
    pub fn mean_span(&self) -> Option<f32> {
        self.mean_span.or_else(|| self.span_samples.mean())
    }

    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    pub fn baseline_vertical(&self) -> f32 {
        self.baseline_vertical
    }

    pub fn baseline_depth(&self) -> f32 {
        self.baseline_depth
    }

    /// ピクセル→cm 換算係数（常に正）
    pub fn px_per_cm(&self) -> f32 {
        self.px_per_cm
    }

    pub fn scale_source(&self) -> ScaleSource {
        self.scale_source
    }

    /// 進捗 (0.0〜1.0)
    pub fn progress(&self) -> f32 {
        (self.frame_count as f32 / self.target_frames as f32).min(1.0)
    }

    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.baseline_vertical = 0.0;
        self.baseline_depth = 0.0;
        self.span_samples.clear();
        self.mean_span = None;
        self.px_per_cm = 1.0;
        self.scale_source = ScaleSource::Identity;
        self.is_calibrated = false;
    }
}
