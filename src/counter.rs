use serde::Serialize;
use tracing::info;

use crate::classifier::ExercisePhase;

/// カウンタのヒステリシス段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStage {
    /// 次の「開」を数えられる
    #[default]
    Armed,
    /// この周期の「開」は数え済み。閉/その他で Armed に戻る
    Counted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterState {
    pub valid_count: u32,
    pub error_count: u32,
    pub stage: CountStage,
}

impl CounterState {
    pub fn is_in_open_phase(&self) -> bool {
        self.stage == CountStage::Counted
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            valid_count: self.valid_count,
            error_count: self.error_count,
        }
    }
}

/// 表示用の回数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    pub valid_count: u32,
    pub error_count: u32,
}

/// 回数カウンタ
///
/// 信頼度がちょうど1.0の Open / ErrorOpen を1周期に1回だけ数える。
/// Close / ErrorClose / Other で再アームされる。OutsideScreen は何もしない。
#[derive(Debug, Default)]
pub struct RepCounter {
    state: CounterState,
}

impl RepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, phase: ExercisePhase, confidence: f32) -> CounterSnapshot {
        use ExercisePhase::*;

        match (self.state.stage, phase) {
            (CountStage::Armed, _) if phase.is_open() && confidence == 1.0 => {
                if phase == Open {
                    self.state.valid_count = self.state.valid_count.saturating_add(1);
                } else {
                    self.state.error_count = self.state.error_count.saturating_add(1);
                }
                self.state.stage = CountStage::Counted;
                info!(
                    ?phase,
                    valid = self.state.valid_count,
                    error = self.state.error_count,
                    "repetition counted"
                );
            }
            (CountStage::Counted, Close | ErrorClose | Other) => {
                self.state.stage = CountStage::Armed;
            }
            _ => {}
        }

        self.state.snapshot()
    }

    /// カウンタのみ初期化する。脚のラッチは分類器側にあるため、
    /// セッション全体の初期化は `TrackingSession::reset` を使う
    pub fn reset(&mut self) {
        self.state = CounterState::default();
    }

    pub fn state(&self) -> &CounterState {
        &self.state
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExercisePhase::*;

    fn run(seq: &[(ExercisePhase, f32)]) -> RepCounter {
        let mut counter = RepCounter::new();
        for &(phase, confidence) in seq {
            counter.observe(phase, confidence);
        }
        counter
    }

    #[test]
    fn test_initial_state() {
        let counter = RepCounter::new();
        assert_eq!(counter.snapshot(), CounterSnapshot::default());
        assert!(!counter.state().is_in_open_phase());
    }

    #[test]
    fn test_round_trip() {
        let counter = run(&[(Close, 1.0), (Open, 1.0), (Close, 1.0), (Open, 1.0)]);
        assert_eq!(counter.snapshot(), CounterSnapshot { valid_count: 2, error_count: 0 });
    }

    #[test]
    fn test_mixed_error() {
        let counter = run(&[(Close, 1.0), (ErrorOpen, 1.0), (Close, 1.0), (Open, 1.0)]);
        assert_eq!(counter.snapshot(), CounterSnapshot { valid_count: 1, error_count: 1 });
    }

    #[test]
    fn test_no_double_count_without_rearm() {
        let counter = run(&[(Close, 1.0), (Open, 1.0), (Open, 1.0), (Open, 1.0)]);
        assert_eq!(counter.snapshot().valid_count, 1);
        assert!(counter.state().is_in_open_phase());
    }

    #[test]
    fn test_held_pose_counts_once() {
        for n in 1..10 {
            let mut seq = vec![(Close, 1.0)];
            seq.extend(std::iter::repeat((Open, 1.0)).take(n));
            assert_eq!(run(&seq).snapshot().valid_count, 1, "n = {n}");
        }
    }

    #[test]
    fn test_open_then_error_open_without_rearm() {
        let counter = run(&[(Open, 1.0), (ErrorOpen, 1.0)]);
        assert_eq!(counter.snapshot(), CounterSnapshot { valid_count: 1, error_count: 0 });
    }

    #[test]
    fn test_error_open_only_counts_errors() {
        let counter = run(&[(ErrorOpen, 1.0), (ErrorClose, 1.0), (ErrorOpen, 1.0)]);
        assert_eq!(counter.snapshot(), CounterSnapshot { valid_count: 0, error_count: 2 });
    }

    #[test]
    fn test_only_open_phases_count() {
        for phase in [Close, ErrorClose, Other, OutsideScreen] {
            let counter = run(&[(phase, 1.0)]);
            assert_eq!(counter.snapshot(), CounterSnapshot::default(), "{phase:?}");
            assert!(!counter.state().is_in_open_phase());
        }
    }

    #[test]
    fn test_partial_confidence_never_counts() {
        let counter = run(&[(Open, 0.99), (Close, 1.0), (ErrorOpen, 0.5), (Open, 0.999_999)]);
        assert_eq!(counter.snapshot(), CounterSnapshot::default());
        assert!(!counter.state().is_in_open_phase());
    }

    #[test]
    fn test_other_rearms() {
        let counter = run(&[(Open, 1.0), (Other, 1.0), (Open, 1.0)]);
        assert_eq!(counter.snapshot().valid_count, 2);
    }

    #[test]
    fn test_rearm_ignores_confidence() {
        let counter = run(&[(Open, 1.0), (Close, 0.2), (Open, 1.0)]);
        assert_eq!(counter.snapshot().valid_count, 2);
    }

    #[test]
    fn test_outside_screen_does_not_rearm() {
        let counter = run(&[(Open, 1.0), (OutsideScreen, 1.0), (Open, 1.0)]);
        assert_eq!(counter.snapshot().valid_count, 1);
        assert!(counter.state().is_in_open_phase());
    }

    #[test]
    fn test_reset() {
        let mut counter = run(&[(Open, 1.0), (Close, 1.0), (ErrorOpen, 1.0)]);
        assert_eq!(counter.snapshot(), CounterSnapshot { valid_count: 1, error_count: 1 });
        counter.reset();
        assert_eq!(counter.state(), &CounterState::default());
        counter.observe(Open, 1.0);
        assert_eq!(counter.snapshot().valid_count, 1);
    }
}
