//! ランドマーク幾何
//!
//! LandmarkSet から測定に使うスカラー量を導出する純関数群。
//! 必要なランドマークが欠けている場合は None（フレーム単位で計算をスキップ）。

use crate::pose::{LandmarkIndex, LandmarkSet};

/// 腰中点の垂直位置（ピクセル）
///
/// 左右ヒップのY座標平均。どちらかが閾値未満なら None を返す。
/// 不完全な骨格でキャリブレーションを始めないための前提条件。
pub fn hip_center_vertical(set: &LandmarkSet, confidence_threshold: f32) -> Option<f32> {
    let left = set.get(LandmarkIndex::LeftHip);
    let right = set.get(LandmarkIndex::RightHip);

    if !left.is_valid(confidence_threshold) || !right.is_valid(confidence_threshold) {
        return None;
    }

    Some((left.y + right.y) / 2.0)
}

/// 腰中点の奥行き
///
/// 左右ヒップのZ平均。可視性ゲートとは独立（キャリブレーション後の
/// フレームフィルタリングでも使用する）。
pub fn hip_center_depth(set: &LandmarkSet, confidence_threshold: f32) -> Option<f32> {
    let left = set.get(LandmarkIndex::LeftHip);
    let right = set.get(LandmarkIndex::RightHip);

    if !left.is_valid(confidence_threshold) || !right.is_valid(confidence_threshold) {
        return None;
    }

    Some((left.z + right.z) / 2.0)
}

/// 全身ピクセルスパン: 目中点〜かかと中点の垂直ピクセル距離
///
/// 身体スケール（ピクセル/cm）の導出にのみ使用。4点のいずれかが
/// 欠けていれば None。
pub fn full_body_span(set: &LandmarkSet, confidence_threshold: f32) -> Option<f32> {
    let left_eye = set.get(LandmarkIndex::LeftEye);
    let right_eye = set.get(LandmarkIndex::RightEye);
    let left_heel = set.get(LandmarkIndex::LeftHeel);
    let right_heel = set.get(LandmarkIndex::RightHeel);

    if !left_eye.is_valid(confidence_threshold)
        || !right_eye.is_valid(confidence_threshold)
        || !left_heel.is_valid(confidence_threshold)
        || !right_heel.is_valid(confidence_threshold)
    {
        return None;
    }

    let eye_y = (left_eye.y + right_eye.y) / 2.0;
    let heel_y = (left_heel.y + right_heel.y) / 2.0;
    Some((heel_y - eye_y).abs())
}
