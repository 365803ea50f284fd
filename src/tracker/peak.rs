use crate::config::DetectorConfig;
use crate::tracker::window::SampleWindow;

/// 最高到達点トラッカー
///
/// 垂直位置を直近数サンプルの平均で平滑化してから、基準位置からの
/// 最大上方変位を追跡する。画像座標は下方向が正なので「高い」ほど
/// 値は小さい。ピーク位置はリセットまで単調にしか更新されない。
pub struct PeakHeightTracker {
    smoothing: SampleWindow<f32>,
    baseline_vertical_px: f32,
    peak_vertical_px: Option<f32>,
}

impl PeakHeightTracker {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            smoothing: SampleWindow::new(config.smoothing_window),
            baseline_vertical_px: 0.0,
            peak_vertical_px: None,
        }
    }

    /// キャリブレーション完了時に基準垂直位置を設定する
    pub fn set_baseline(&mut self, baseline_vertical_px: f32) {
        self.baseline_vertical_px = baseline_vertical_px;
    }

    /// 検証済みフレームの垂直位置で更新し、平滑化後の値を返す
    pub fn update(&mut self, vertical_px: f32) -> f32 {
        self.smoothing.push(vertical_px);
        // ウィンドウは直前のpushで必ず非空
        let smoothed = self.smoothing.mean().unwrap_or(vertical_px);

        match self.peak_vertical_px {
            Some(peak) if smoothed >= peak => {}
            _ => self.peak_vertical_px = Some(smoothed),
        }
        smoothed
    }

    /// 最大ジャンプ高（cm）
    ///
    /// ピーク未設定、または基準より下にしか動いていない場合は 0。
    pub fn max_height_cm(&self, px_per_cm: f32) -> f32 {
        match self.peak_vertical_px {
            Some(peak) => ((self.baseline_vertical_px - peak) / px_per_cm).max(0.0),
            None => 0.0,
        }
    }

    pub fn baseline_vertical_px(&self) -> f32 {
        self.baseline_vertical_px
    }

    pub fn peak_vertical_px(&self) -> Option<f32> {
        self.peak_vertical_px
    }

    pub fn reset(&mut self) {
        self.smoothing.clear();
        self.baseline_vertical_px = 0.0;
        self.peak_vertical_px = None;
    }
}
