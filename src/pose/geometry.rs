//! キーポイント間の幾何判定
//!
//! 画像座標系（yは下向き）。すべて状態を持たない純関数。

use super::keypoint::Keypoint;

/// 角度信頼度が0になるまでの許容幅（度）
const ANGLE_TOLERANCE_DEG: f32 = 90.0;

/// 横方向の距離
pub fn horizontal_distance(a: &Keypoint, b: &Keypoint) -> f32 {
    (a.x - b.x).abs()
}

/// target が other より上にあるか
pub fn is_above(target: &Keypoint, other: &Keypoint) -> bool {
    target.y < other.y
}

/// 左右それぞれ target が other より上にある側の数
///
/// 0: 両側とも下, 1: 片側のみ上, 2: 両側とも上
pub fn bilateral_above_score(
    left_target: &Keypoint,
    right_target: &Keypoint,
    left_other: &Keypoint,
    right_other: &Keypoint,
) -> u8 {
    is_above(left_target, left_other) as u8 + is_above(right_target, right_other) as u8
}

/// 足首の間隔が肩幅より広いか
pub fn legs_are_open(
    left_shoulder: &Keypoint,
    right_shoulder: &Keypoint,
    left_ankle: &Keypoint,
    right_ankle: &Keypoint,
) -> bool {
    horizontal_distance(left_ankle, right_ankle) > horizontal_distance(left_shoulder, right_shoulder)
}

/// mid を頂点とする角度（度, 0〜180）
///
/// どちらかの辺の長さが0、または座標が有限でない場合は None。
pub fn three_point_angle(first: &Keypoint, mid: &Keypoint, last: &Keypoint) -> Option<f32> {
    if !(first.is_finite() && mid.is_finite() && last.is_finite()) {
        return None;
    }
    let (fx, fy) = (first.x - mid.x, first.y - mid.y);
    let (lx, ly) = (last.x - mid.x, last.y - mid.y);
    if (fx == 0.0 && fy == 0.0) || (lx == 0.0 && ly == 0.0) {
        return None;
    }

    let last_bearing = f64::atan2(ly as f64, lx as f64);
    let first_bearing = f64::atan2(fy as f64, fx as f64);
    let mut result = (last_bearing - first_bearing).to_degrees().abs();
    if result > 180.0 {
        result = 360.0 - result;
    }
    Some(result as f32)
}

/// 角度が key_angle にどれだけ近いか (0.0〜1.0)
///
/// key_angle 以下なら 1.0、超過分に比例して減少し、+90度以上で 0.0。
pub fn angle_approach_confidence(
    start: &Keypoint,
    angle: &Keypoint,
    end: &Keypoint,
    key_angle: f32,
) -> Option<f32> {
    let measured = three_point_angle(start, angle, end)?;
    let offset = (measured - key_angle).max(0.0);
    Some((1.0 - offset / ANGLE_TOLERANCE_DEG).max(0.0))
}

/// 左右の角度信頼度の平均
pub fn bilateral_angle_confidence(
    left_start: &Keypoint,
    right_start: &Keypoint,
    left_angle: &Keypoint,
    right_angle: &Keypoint,
    left_end: &Keypoint,
    right_end: &Keypoint,
    key_angle: f32,
) -> Option<f32> {
    let left = angle_approach_confidence(left_start, left_angle, left_end, key_angle)?;
    let right = angle_approach_confidence(right_start, right_angle, right_end, key_angle)?;
    tracing::trace!(left, right, key_angle, "bilateral angle confidence");
    Some((left + right) / 2.0)
}
