use tracing::debug;

use super::{Classification, ExercisePhase, PoseClassifier};
use crate::config::ClassifierConfig;
use crate::pose::geometry::{bilateral_above_score, bilateral_angle_confidence, legs_are_open};
use crate::pose::{BodyPart, Person};

/// 高さ比較と脚判定で常に読む部位
///
/// 鼻・腰は角度計算の分岐でのみ読み、非有限なら角度側で None になる。
const SCORED_PARTS: [BodyPart; 8] = [
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
    BodyPart::LeftElbow,
    BodyPart::RightElbow,
    BodyPart::LeftWrist,
    BodyPart::RightWrist,
    BodyPart::LeftAnkle,
    BodyPart::RightAnkle,
];

/// 画面内判定に使う末端部位
const EXTREMITIES: [BodyPart; 4] = [
    BodyPart::LeftWrist,
    BodyPart::RightWrist,
    BodyPart::LeftAnkle,
    BodyPart::RightAnkle,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmState {
    Open,
    Closed,
    Other,
}

/// 開合跳（スタージャンプ）の姿勢分類器
///
/// 腕の状態（開/閉/その他）と脚の状態（開/閉）を組み合わせてフェーズを決める。
/// 脚が閉じるたびに `legs_reset` が立ち、信頼度1.0の「開」はこれを1回消費する。
pub struct StarJumpClassifier {
    visibility_threshold: f32,
    arm_open_angle: f32,
    arm_close_angle: f32,
    /// 最後に数えた「開」以降に脚が閉じたか
    legs_reset: bool,
}

impl StarJumpClassifier {
    pub fn new() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            visibility_threshold: config.visibility_threshold,
            arm_open_angle: config.arm_open_angle,
            arm_close_angle: config.arm_close_angle,
            legs_reset: false,
        }
    }

    pub fn legs_reset(&self) -> bool {
        self.legs_reset
    }

    /// 手首・足首のいずれかの信頼度が閾値未満なら画面外
    fn is_outside_screen(&self, person: &Person) -> bool {
        EXTREMITIES
            .iter()
            .any(|&part| !person.get(part).is_valid(self.visibility_threshold))
    }

    /// 腕の状態 + 信頼度。角度が計算できなければ None
    fn arm_state(&self, person: &Person) -> Option<(ArmState, f32)> {
        use BodyPart::*;
        let p = move |part: BodyPart| person.get(part);

        let wrist_on_shoulder =
            bilateral_above_score(p(LeftWrist), p(RightWrist), p(LeftShoulder), p(RightShoulder));
        let wrist_on_elbow =
            bilateral_above_score(p(LeftWrist), p(RightWrist), p(LeftElbow), p(RightElbow));
        let elbow_on_shoulder =
            bilateral_above_score(p(LeftElbow), p(RightElbow), p(LeftShoulder), p(RightShoulder));
        debug!(wrist_on_shoulder, wrist_on_elbow, elbow_on_shoulder, "arm above scores");

        if wrist_on_shoulder == 2 && elbow_on_shoulder == 2 {
            if wrist_on_elbow != 2 {
                debug!("arms raised but wrists below elbows");
                return Some((ArmState::Other, 0.0));
            }
            // 鼻-肩-手首: 両手を頭上で合わせるほど角度が小さい
            let confidence = bilateral_angle_confidence(
                p(Nose),
                p(Nose),
                p(LeftShoulder),
                p(RightShoulder),
                p(LeftWrist),
                p(RightWrist),
                self.arm_open_angle,
            )?;
            Some((ArmState::Open, confidence))
        } else if wrist_on_shoulder == 0 && elbow_on_shoulder == 0 {
            // 腰-肩-手首: 腕が体側に沿うほど角度が小さい
            let confidence = bilateral_angle_confidence(
                p(LeftHip),
                p(RightHip),
                p(LeftShoulder),
                p(RightShoulder),
                p(LeftWrist),
                p(RightWrist),
                self.arm_close_angle,
            )?;
            Some((ArmState::Closed, confidence))
        } else {
            Some((ArmState::Other, 0.0))
        }
    }

    fn fuse(&mut self, arm: ArmState, arm_confidence: f32, legs_open: bool) -> Classification {
        if legs_open {
            match arm {
                ArmState::Open if arm_confidence == 1.0 => {
                    // 脚が一度閉じていなければ同じ「開」を再度出さない
                    if self.legs_reset {
                        self.legs_reset = false;
                        Classification::new(ExercisePhase::Open, arm_confidence)
                    } else {
                        Classification::new(ExercisePhase::Other, arm_confidence)
                    }
                }
                ArmState::Open => Classification::new(ExercisePhase::Open, arm_confidence),
                ArmState::Closed => Classification::new(ExercisePhase::ErrorClose, arm_confidence),
                ArmState::Other => Classification::new(ExercisePhase::Other, 1.0),
            }
        } else {
            self.legs_reset = true;
            match arm {
                ArmState::Open => Classification::new(ExercisePhase::ErrorOpen, arm_confidence),
                ArmState::Closed => Classification::new(ExercisePhase::Close, arm_confidence),
                ArmState::Other => Classification::new(ExercisePhase::Other, 1.0),
            }
        }
    }
}

impl Default for StarJumpClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseClassifier for StarJumpClassifier {
    fn classify(&mut self, person: &Person) -> Classification {
        if self.is_outside_screen(person) {
            debug!(
                left_wrist = person.get(BodyPart::LeftWrist).score,
                right_wrist = person.get(BodyPart::RightWrist).score,
                left_ankle = person.get(BodyPart::LeftAnkle).score,
                right_ankle = person.get(BodyPart::RightAnkle).score,
                "outside screen"
            );
            return Classification::outside_screen();
        }

        if !SCORED_PARTS.iter().all(|&part| person.get(part).is_finite()) {
            debug!("non-finite keypoint coordinate");
            return Classification::degenerate();
        }

        let Some((arm, arm_confidence)) = self.arm_state(person) else {
            debug!("degenerate arm angle");
            return Classification::degenerate();
        };

        let legs_open = legs_are_open(
            person.get(BodyPart::LeftShoulder),
            person.get(BodyPart::RightShoulder),
            person.get(BodyPart::LeftAnkle),
            person.get(BodyPart::RightAnkle),
        );

        let result = self.fuse(arm, arm_confidence, legs_open);
        debug!(
            ?arm,
            arm_confidence,
            legs_open,
            phase = ?result.phase,
            confidence = result.confidence,
            "star jump classified"
        );
        result
    }

    fn reset(&mut self) {
        self.legs_reset = false;
    }

    fn name(&self) -> &'static str {
        "star_jump"
    }
}
