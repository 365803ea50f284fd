use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::DetectorConfig;
use crate::pose::{geometry, LandmarkSet};
use crate::tracker::calibration::{AnthropometricProfile, BaselineCalibrator, ScaleSource};
use crate::tracker::motion::MotionValidityFilter;
use crate::tracker::peak::PeakHeightTracker;
use crate::tracker::stability::{StabilityMonitor, StabilityReport};
use crate::tracker::visibility::VisibilityGate;

/// フレームごとのデバッグ数値（運用時の診断用）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    /// 平滑化後の現在垂直位置（ピクセル）
    pub current_vertical_px: f32,
    /// 基準垂直位置（ピクセル）
    pub baseline_vertical_px: f32,
    /// 基準奥行きからの差分（ピクセル）
    pub depth_delta_px: f32,
    /// 静止判定の進捗 (0.0〜1.0)
    pub stability_progress: f32,
    /// キャリブレーションの進捗 (0.0〜1.0)
    pub calibration_progress: f32,
    pub is_stable: bool,
    pub is_calibrated: bool,
    pub frames_processed: u64,
    /// 奥行き変動で棄却したフレーム数
    pub frames_rejected: u64,
    /// 立ち位置の警告（非ブロッキング）
    pub position_warning: Option<String>,
}

/// 測定状態のスナップショット
///
/// フレームごとに不変値として差し替え公開される、外部から観測できる
/// 唯一の出力。初回フレーム前はゼロ値。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSnapshot {
    /// 最大ジャンプ高（cm）。リセットまで単調非減少
    pub max_height_cm: f32,
    pub max_height_lower_cm: f32,
    pub max_height_upper_cm: f32,
    /// スパイク到達点 = ジャンプ高 + リーチオフセット
    pub max_spike_reach_cm: f32,
    pub max_spike_reach_lower_cm: f32,
    pub max_spike_reach_upper_cm: f32,
    /// 実測の目〜頭頂オフセットでスケールを確定したか
    pub has_precise_anthropometry: bool,
    pub debug: DebugInfo,
}

/// 最新スナップショットの共有セル
///
/// 書き込みは Arc の差し替えのみ。読み手が途中状態を観測することはない。
#[derive(Clone, Default)]
struct SnapshotCell {
    inner: Arc<Mutex<Arc<MeasurementSnapshot>>>,
}

impl SnapshotCell {
    fn publish(&self, snapshot: MeasurementSnapshot) {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(snapshot);
    }

    fn load(&self) -> Arc<MeasurementSnapshot> {
        let guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }
}

/// UIスレッドからスナップショットをポーリングするためのハンドル
///
/// クローンは安価。プロデューサが処理中でもブロックせず読める。
#[derive(Clone)]
pub struct DetectorHandle {
    cell: SnapshotCell,
}

impl DetectorHandle {
    pub fn snapshot(&self) -> Arc<MeasurementSnapshot> {
        self.cell.load()
    }
}

/// 垂直跳び測定ディテクタ
///
/// フレーム列を受け取り、静止確認 → 基準キャリブレーション →
/// 奥行きフィルタ → ピーク追跡の順に処理する。フレームは到着順に
/// 1本のストリームとして処理する前提。
pub struct JumpHeightDetector {
    config: DetectorConfig,
    gate: VisibilityGate,
    stability: StabilityMonitor,
    calibrator: BaselineCalibrator,
    motion: MotionValidityFilter,
    peak: PeakHeightTracker,
    profile: Option<AnthropometricProfile>,
    cell: SnapshotCell,
    last_stability: StabilityReport,
    current_vertical_px: f32,
    depth_delta_px: f32,
    position_warning: Option<String>,
    frames_processed: u64,
    frames_rejected: u64,
}

impl JumpHeightDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            config: config.clone(),
            gate: VisibilityGate::from_config(config),
            stability: StabilityMonitor::from_config(config),
            calibrator: BaselineCalibrator::from_config(config),
            motion: MotionValidityFilter::from_config(config),
            peak: PeakHeightTracker::from_config(config),
            profile: None,
            cell: SnapshotCell::default(),
            last_stability: StabilityReport::default(),
            current_vertical_px: 0.0,
            depth_delta_px: 0.0,
            position_warning: None,
            frames_processed: 0,
            frames_rejected: 0,
        }
    }

    /// パイプラインを1フレーム進める
    ///
    /// timestamp_ms は呼び出し側の時計によるフレーム時刻。戻り値は無く、
    /// 効果はスナップショット経由で観測する。失敗はフレーム単位の
    /// スキップに縮退し、エラーとしては伝播しない。
    pub fn process_frame(&mut self, set: &LandmarkSet, timestamp_ms: u64) {
        self.frames_processed += 1;

        if !self.calibrator.is_calibrated() {
            self.process_precalibration(set, timestamp_ms);
        } else {
            self.process_tracking(set);
        }

        self.cell.publish(self.build_snapshot());
    }

    fn process_precalibration(&mut self, set: &LandmarkSet, timestamp_ms: u64) {
        // 骨格が完全に消えた: 被写体がフレームから出たとみなして
        // キャリブレーション進捗ごとやり直す
        if set.is_absent(self.config.presence_confidence) {
            self.stability.reset();
            self.calibrator.reset();
            self.last_stability = StabilityReport::default();
            return;
        }

        let depth = geometry::hip_center_depth(set, self.config.hip_confidence);
        // 垂直位置は全身が十分な信頼度で見えているフレームでのみ採用する
        let vertical = if self.gate.is_fully_visible(set) {
            geometry::hip_center_vertical(set, self.config.hip_confidence)
        } else {
            None
        };
        let sample = vertical.zip(depth);

        self.last_stability = self.stability.update(sample, timestamp_ms);
        if !self.last_stability.is_stable_enough {
            return;
        }

        if let Some((v, d)) = sample {
            let span = geometry::full_body_span(set, self.config.hip_confidence);
            if self.calibrator.advance(v, d, span) {
                self.peak.set_baseline(self.calibrator.baseline_vertical());
                self.current_vertical_px = self.calibrator.baseline_vertical();
                if let Some(profile) = self.profile {
                    self.calibrator.apply_anthropometry(&profile);
                }
            }
        }
    }

    fn process_tracking(&mut self, set: &LandmarkSet) {
        // キャリブレーション後は多少のノイズを許容する（ゲート不使用）
        let Some(depth) = geometry::hip_center_depth(set, self.config.hip_confidence) else {
            // 一時的な検出欠落は無視（キャリブレーションは保持）
            self.position_warning = None;
            return;
        };

        let verdict = self.motion.evaluate(depth, self.calibrator.baseline_depth());
        self.depth_delta_px = verdict.depth_delta_px;
        self.position_warning = verdict.warning;

        if !verdict.is_valid {
            self.frames_rejected += 1;
            return;
        }

        let Some(vertical) = geometry::hip_center_vertical(set, self.config.hip_confidence) else {
            return;
        };
        self.current_vertical_px = self.peak.update(vertical);
    }

    /// 利用者の身体情報を設定する
    ///
    /// キャリブレーションの前後どちらで呼んでもよい。スパンサンプルが
    /// 採取済みならその場でスケールを再計算し、未採取なら完了時に適用
    /// される。
    pub fn set_anthropometry(&mut self, profile: AnthropometricProfile) {
        info!(
            user_height_cm = profile.user_height_cm,
            precise = profile.eye_to_vertex_cm.is_some(),
            "身体情報を設定"
        );
        self.profile = Some(profile);
        self.calibrator.apply_anthropometry(&profile);
        self.cell.publish(self.build_snapshot());
    }

    /// 測定状態をクリアする。身体情報は保持される
    pub fn reset(&mut self) {
        self.stability.reset();
        self.calibrator.reset();
        self.motion.reset();
        self.peak.reset();
        self.last_stability = StabilityReport::default();
        self.current_vertical_px = 0.0;
        self.depth_delta_px = 0.0;
        self.position_warning = None;
        self.frames_processed = 0;
        self.frames_rejected = 0;
        self.cell.publish(self.build_snapshot());
    }

    /// 最新スナップショット
    pub fn snapshot(&self) -> Arc<MeasurementSnapshot> {
        self.cell.load()
    }

    /// 読み取り専用ハンドル（別スレッドからのポーリング用）
    pub fn handle(&self) -> DetectorHandle {
        DetectorHandle {
            cell: self.cell.clone(),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    fn build_snapshot(&self) -> MeasurementSnapshot {
        let px_per_cm = self.calibrator.px_per_cm();
        let height = self.peak.max_height_cm(px_per_cm);

        // 集団平均比率で換算した場合のみ、比率の経験的範囲から信頼区間を付ける
        let (lower, upper) = match self.calibrator.scale_source() {
            ScaleSource::Proxy => {
                let ratio = self.config.eye_to_heel_ratio;
                (
                    height * self.config.eye_to_heel_ratio_low / ratio,
                    height * self.config.eye_to_heel_ratio_high / ratio,
                )
            }
            _ => (height, height),
        };

        let reach = self.profile.map_or(0.0, |p| p.heel_to_hand_reach_cm);

        MeasurementSnapshot {
            max_height_cm: height,
            max_height_lower_cm: lower,
            max_height_upper_cm: upper,
            max_spike_reach_cm: height + reach,
            max_spike_reach_lower_cm: lower + reach,
            max_spike_reach_upper_cm: upper + reach,
            has_precise_anthropometry: matches!(
                self.calibrator.scale_source(),
                ScaleSource::Precise
            ),
            debug: DebugInfo {
                current_vertical_px: self.current_vertical_px,
                baseline_vertical_px: self.peak.baseline_vertical_px(),
                depth_delta_px: self.depth_delta_px,
                stability_progress: self.last_stability.progress,
                calibration_progress: self.calibrator.progress(),
                is_stable: self.last_stability.is_stable_enough,
                is_calibrated: self.calibrator.is_calibrated(),
                frames_processed: self.frames_processed,
                frames_rejected: self.frames_rejected,
                position_warning: self.position_warning.clone(),
            },
        }
    }
}
