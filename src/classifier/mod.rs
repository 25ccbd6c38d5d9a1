pub mod star_jump;

use serde::{Deserialize, Serialize};

use crate::pose::Person;

pub use star_jump::StarJumpClassifier;

/// 1フレームの動作分類結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExercisePhase {
    /// 脚開 + 頭上で手を合わせる
    Open,
    /// 脚閉 + 腕を下ろす
    Close,
    /// 不協調な開（脚閉 + 手が頭上）
    ErrorOpen,
    /// 不協調な閉（脚開 + 腕が下）
    ErrorClose,
    /// 中間・判定不能
    Other,
    /// 画面外（末端キーポイントの信頼度不足）
    OutsideScreen,
}

impl ExercisePhase {
    /// 表示側と共有する固定コード
    pub fn code(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Close => 1,
            Self::ErrorOpen => 2,
            Self::ErrorClose => 3,
            Self::Other => 5,
            Self::OutsideScreen => 99,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::Close),
            2 => Some(Self::ErrorOpen),
            3 => Some(Self::ErrorClose),
            5 => Some(Self::Other),
            99 => Some(Self::OutsideScreen),
            _ => None,
        }
    }

    /// カウント対象の「開」系か
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::ErrorOpen)
    }
}

/// 分類結果: フェーズ + 信頼度 (0.0〜1.0) + 画面外フラグ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub phase: ExercisePhase,
    pub confidence: f32,
    pub outside_screen: bool,
}

impl Classification {
    pub fn new(phase: ExercisePhase, confidence: f32) -> Self {
        Self {
            phase,
            confidence,
            outside_screen: false,
        }
    }

    pub fn outside_screen() -> Self {
        Self {
            phase: ExercisePhase::OutsideScreen,
            confidence: 1.0,
            outside_screen: true,
        }
    }

    /// 幾何計算が成立しないフレーム
    pub fn degenerate() -> Self {
        Self::new(ExercisePhase::Other, 0.0)
    }
}

/// 種目ごとの姿勢分類器
///
/// セッション開始時に1つ選ばれ、処理中のフレームと並行して差し替えられることはない。
pub trait PoseClassifier: Send {
    /// 1フレームを分類する（内部ラッチを更新しうる）
    fn classify(&mut self, person: &Person) -> Classification;

    /// 誤検出の除外（例: 足首が手首より上など）。除外しない種目は true を返す
    fn pose_is_correct(&self, _persons: &[Person]) -> bool {
        true
    }

    /// 内部ラッチを初期状態に戻す
    fn reset(&mut self) {}

    /// 差し替え・停止時に保持リソースを解放する
    fn close(&mut self) {}

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ExercisePhase; 6] = [
        ExercisePhase::Open,
        ExercisePhase::Close,
        ExercisePhase::ErrorOpen,
        ExercisePhase::ErrorClose,
        ExercisePhase::Other,
        ExercisePhase::OutsideScreen,
    ];

    #[test]
    fn test_phase_codes() {
        for phase in ALL {
            assert_eq!(ExercisePhase::from_code(phase.code()), Some(phase));
        }
        assert_eq!(ExercisePhase::OutsideScreen.code(), 99);
        assert_eq!(ExercisePhase::from_code(4), None);
    }

    #[test]
    fn test_is_open() {
        assert!(ExercisePhase::Open.is_open());
        assert!(ExercisePhase::ErrorOpen.is_open());
        assert!(!ExercisePhase::Close.is_open());
        assert!(!ExercisePhase::OutsideScreen.is_open());
    }

    #[test]
    fn test_outside_screen_classification() {
        let c = Classification::outside_screen();
        assert_eq!(c.phase, ExercisePhase::OutsideScreen);
        assert_eq!(c.confidence, 1.0);
        assert!(c.outside_screen);
    }
}
