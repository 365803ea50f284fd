use crate::config::DetectorConfig;
use crate::pose::{LandmarkIndex, LandmarkSet};

/// 可視性ゲート
///
/// キャリブレーションに使ってよいフレームかを判定する。幾何計算に
/// 必要な点だけでなく全33ランドマークの信頼度を要求する。部分的な
/// オクルージョンやモーションブラーは一部のランドマークだけを静かに
/// 壊すため、骨格全体を要求する保守的な基準にしている。
/// キャリブレーション完了後のフレームはこのゲートを通らない。
pub struct VisibilityGate {
    confidence_threshold: f32,
}

impl VisibilityGate {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.visibility_confidence)
    }

    /// 全ランドマークが閾値を超えているか
    pub fn is_fully_visible(&self, set: &LandmarkSet) -> bool {
        LandmarkIndex::ALL
            .iter()
            .all(|&idx| set.get(idx).is_valid(self.confidence_threshold))
    }
}
