use tracing::debug;

use crate::config::DetectorConfig;
use crate::tracker::window::SampleWindow;

/// 奥行き妥当性の判定結果
#[derive(Debug, Clone, PartialEq)]
pub struct MotionVerdict {
    /// ピークトラッキングに使ってよいフレームか
    pub is_valid: bool,
    /// 基準位置からの奥行き差分（デバッグ表示用）
    pub depth_delta_px: f32,
    /// 立ち位置の警告（非ブロッキング、表示専用）
    pub warning: Option<String>,
}

/// 奥行きベースのフレームフィルタ
///
/// カメラへの接近・後退は腰の見かけの垂直位置も押し上げるため、
/// 誤検出の最大要因になる。奥行きが基準・履歴平均から外れたフレームは
/// ジャンプではなく前後移動とみなして棄却する。
pub struct MotionValidityFilter {
    depth_history: SampleWindow<f32>,
    min_samples: usize,
    depth_threshold_px: f32,
    strict_factor: f32,
    warning_factor: f32,
}

impl MotionValidityFilter {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            depth_history: SampleWindow::new(config.depth_history_window),
            min_samples: config.depth_history_min_samples,
            depth_threshold_px: config.depth_threshold_px,
            strict_factor: config.depth_strict_factor,
            warning_factor: config.depth_warning_factor,
        }
    }

    /// 現在フレームの奥行きを判定し、履歴に追加する
    pub fn evaluate(&mut self, depth: f32, baseline_depth: f32) -> MotionVerdict {
        let history_mean = if self.depth_history.len() >= self.min_samples {
            self.depth_history.mean()
        } else {
            None
        };

        // 1. 直近履歴の平均との比較（履歴が溜まるまでは通す）
        let near_history = match history_mean {
            Some(mean) => (depth - mean).abs() <= self.depth_threshold_px,
            None => true,
        };
        // 2. キャリブレーション時の基準奥行きとの比較
        let depth_delta = depth - baseline_depth;
        let near_baseline = depth_delta.abs() <= self.depth_threshold_px;
        // 3. 緩やかなドリフト対策: 履歴平均に対する厳格チェック
        let near_history_strict = match history_mean {
            Some(mean) => (depth - mean).abs() <= self.depth_threshold_px * self.strict_factor,
            None => true,
        };

        let is_valid = near_history && near_baseline && near_history_strict;
        if !is_valid {
            debug!(
                depth,
                baseline_depth,
                history_mean = ?history_mean,
                "奥行き変動によりフレームを棄却"
            );
        }

        // 警告は棄却とは独立（棄却閾値の70%で発火、追跡には影響しない）
        let warning_threshold = self.depth_threshold_px * self.warning_factor;
        let warning = if depth_delta.abs() > warning_threshold {
            if depth_delta < 0.0 {
                Some("カメラに近づきすぎです。少し下がってください".to_string())
            } else {
                Some("カメラから離れすぎです。少し近づいてください".to_string())
            }
        } else {
            None
        };

        self.depth_history.push(depth);

        MotionVerdict {
            is_valid,
            depth_delta_px: depth_delta,
            warning,
        }
    }

    pub fn reset(&mut self) {
        self.depth_history.clear();
    }
}
