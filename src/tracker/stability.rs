use tracing::debug;

use crate::config::DetectorConfig;
use crate::tracker::window::SampleWindow;

/// 静止判定の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityReport {
    /// 静止が規定時間継続したか
    pub is_stable_enough: bool,
    /// UI表示用の進捗 (0.0〜1.0)
    ///
    /// サンプル蓄積が 0〜0.5、経過時間が 0.5〜1.0 に対応する。
    /// 表示専用で、静止判定そのものには影響しない。
    pub progress: f32,
}

impl StabilityReport {
    fn not_stable(progress: f32) -> Self {
        Self {
            is_stable_enough: false,
            progress,
        }
    }
}

impl Default for StabilityReport {
    fn default() -> Self {
        Self::not_stable(0.0)
    }
}

/// 静止モニター
///
/// 被写体が一定時間ほぼ静止してからでないとキャリブレーションを
/// 始めない。一時的な姿勢が基準位置になるのを防ぐ。
pub struct StabilityMonitor {
    /// (垂直位置, 奥行き) の履歴
    history: SampleWindow<(f32, f32)>,
    eval_samples: usize,
    vertical_tolerance_px: f32,
    depth_tolerance_px: f32,
    hold_duration_ms: u64,
    /// 静止開始タイムスタンプ（静止が途切れたらクリア）
    stable_since_ms: Option<u64>,
}

impl StabilityMonitor {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            history: SampleWindow::new(config.stability_window),
            eval_samples: config.stability_eval_samples,
            vertical_tolerance_px: config.stability_vertical_tolerance_px,
            depth_tolerance_px: config.stability_depth_tolerance_px,
            hold_duration_ms: config.stability_hold_ms,
            stable_since_ms: None,
        }
    }

    /// 1フレーム分のサンプルで更新する
    ///
    /// sample が None（ランドマーク欠落・可視性不足）の場合は履歴ごと
    /// リセットする。
    pub fn update(&mut self, sample: Option<(f32, f32)>, timestamp_ms: u64) -> StabilityReport {
        let Some((vertical, depth)) = sample else {
            self.reset();
            return StabilityReport::not_stable(0.0);
        };

        self.history.push((vertical, depth));

        if self.history.len() < self.eval_samples {
            let accumulation = self.history.len() as f32 / self.eval_samples as f32;
            return StabilityReport::not_stable(accumulation * 0.5);
        }

        if !self.is_motionless() {
            // 動きを検出: 最初からやり直し
            self.reset();
            return StabilityReport::not_stable(0.0);
        }

        let since = match self.stable_since_ms {
            Some(since) => since,
            None => {
                debug!(timestamp_ms, "静止開始");
                self.stable_since_ms = Some(timestamp_ms);
                timestamp_ms
            }
        };

        let elapsed = timestamp_ms.saturating_sub(since);
        let hold = (elapsed as f32 / self.hold_duration_ms as f32).min(1.0);
        StabilityReport {
            is_stable_enough: elapsed >= self.hold_duration_ms,
            progress: 0.5 + hold * 0.5,
        }
    }

    /// 直近 eval_samples 個の最大偏差が許容内か
    fn is_motionless(&self) -> bool {
        let n = self.eval_samples;
        let count = self.history.recent(n).count() as f32;
        let (sum_v, sum_d) = self
            .history
            .recent(n)
            .fold((0.0_f32, 0.0_f32), |(sv, sd), &(v, d)| (sv + v, sd + d));
        let mean_v = sum_v / count;
        let mean_d = sum_d / count;

        let (max_dev_v, max_dev_d) = self
            .history
            .recent(n)
            .fold((0.0_f32, 0.0_f32), |(mv, md), &(v, d)| {
                (mv.max((v - mean_v).abs()), md.max((d - mean_d).abs()))
            });

        max_dev_v < self.vertical_tolerance_px && max_dev_d < self.depth_tolerance_px
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.stable_since_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> StabilityMonitor {
        StabilityMonitor::from_config(&DetectorConfig::default())
    }

    /// 同一位置のサンプルを n フレーム分流す（33ms間隔）
    fn feed_still(m: &mut StabilityMonitor, n: usize, start_ms: u64) -> (StabilityReport, u64) {
        let mut report = StabilityReport::not_stable(0.0);
        let mut ts = start_ms;
        for i in 0..n {
            ts = start_ms + i as u64 * 33;
            report = m.update(Some((400.0, -5.0)), ts);
        }
        (report, ts)
    }

    #[test]
    fn test_needs_minimum_samples() {
        let mut m = monitor();
        let (report, _) = feed_still(&mut m, 29, 0);
        assert!(!report.is_stable_enough);
        assert!(report.progress < 0.5);
    }

    #[test]
    fn test_stable_after_hold_duration() {
        let mut m = monitor();
        // 30サンプル蓄積 + 2000ms経過 (33ms間隔で約91フレーム)
        let (report, _) = feed_still(&mut m, 95, 0);
        assert!(report.is_stable_enough);
        assert!((report.progress - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_not_stable_before_hold_duration() {
        let mut m = monitor();
        let (report, _) = feed_still(&mut m, 40, 0);
        // サンプルは足りているが2秒経っていない
        assert!(!report.is_stable_enough);
        assert!(report.progress >= 0.5);
        assert!(report.progress < 1.0);
    }

    #[test]
    fn test_movement_resets() {
        let mut m = monitor();
        feed_still(&mut m, 35, 0);
        // 大きく動く → リセット
        let report = m.update(Some((500.0, -5.0)), 2000);
        assert!(!report.is_stable_enough);
        assert_eq!(report.progress, 0.0);
    }

    #[test]
    fn test_depth_movement_resets() {
        let mut m = monitor();
        feed_still(&mut m, 35, 0);
        // 垂直は同じでも奥行きが動けばリセット（許容は垂直の半分）
        let report = m.update(Some((400.0, 5.0)), 2000);
        assert!(!report.is_stable_enough);
        assert_eq!(report.progress, 0.0);
    }

    #[test]
    fn test_none_sample_resets() {
        let mut m = monitor();
        feed_still(&mut m, 35, 0);
        let report = m.update(None, 2000);
        assert!(!report.is_stable_enough);
        assert_eq!(report.progress, 0.0);
        // リセット後は蓄積からやり直し
        let report = m.update(Some((400.0, -5.0)), 2033);
        assert!(report.progress < 0.5);
    }

    #[test]
    fn test_small_jitter_tolerated() {
        let mut m = monitor();
        let mut report = StabilityReport::not_stable(0.0);
        // ±5px のジッタは許容内 (閾値15px)
        for i in 0..95_u64 {
            let jitter = if i % 2 == 0 { 5.0 } else { -5.0 };
            report = m.update(Some((400.0 + jitter, -5.0)), i * 33);
        }
        assert!(report.is_stable_enough);
    }

    #[test]
    fn test_progress_monotone_while_still() {
        let mut m = monitor();
        let mut prev = 0.0_f32;
        for i in 0..95_u64 {
            let report = m.update(Some((400.0, -5.0)), i * 33);
            assert!(report.progress >= prev);
            prev = report.progress;
        }
    }
}
