use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::classifier::{Classification, PoseClassifier};
use crate::config::SessionConfig;
use crate::counter::{CounterSnapshot, RepCounter};
use crate::pose::Person;

/// 1フレーム処理の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub classification: Classification,
    pub counts: CounterSnapshot,
}

/// 表示スレッドへ公開する値
///
/// 有効数と不協調数は1つの u64 に詰めて、片方だけ更新された組を読ませない。
struct SharedCounts {
    packed: AtomicU64,
    outside_screen: AtomicBool,
}

impl SharedCounts {
    fn new() -> Self {
        Self {
            packed: AtomicU64::new(0),
            outside_screen: AtomicBool::new(true),
        }
    }

    fn store(&self, counts: CounterSnapshot) {
        let packed = ((counts.valid_count as u64) << 32) | counts.error_count as u64;
        self.packed.store(packed, Ordering::Release);
    }

    fn load(&self) -> CounterSnapshot {
        let packed = self.packed.load(Ordering::Acquire);
        CounterSnapshot {
            valid_count: (packed >> 32) as u32,
            error_count: packed as u32,
        }
    }
}

/// 回数の読み取り専用ハンドル（書き込み側をブロックしない）
#[derive(Clone)]
pub struct CountsReader {
    shared: Arc<SharedCounts>,
}

impl CountsReader {
    pub fn snapshot(&self) -> CounterSnapshot {
        self.shared.load()
    }

    pub fn valid_count(&self) -> u32 {
        self.snapshot().valid_count
    }

    pub fn error_count(&self) -> u32 {
        self.snapshot().error_count
    }

    /// 直近フレームで画面外だったか（分類前は true）
    pub fn is_outside_screen(&self) -> bool {
        self.shared.outside_screen.load(Ordering::Acquire)
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 1回のトラッキングセッション
///
/// `process_frame` は単一の処理経路から到着順に呼ぶ。分類器の差し替え・リセット・停止は
/// 別スレッドから呼んでよく、処理中のフレームとは分類器のロックで直列化される。
pub struct TrackingSession {
    min_person_score: f32,
    running: AtomicBool,
    /// reset のたびに進む。古い世代で分類した結果は捨てる
    generation: AtomicU64,
    classifier: Mutex<Option<Box<dyn PoseClassifier>>>,
    counter: Mutex<RepCounter>,
    shared: Arc<SharedCounts>,
}

impl TrackingSession {
    pub fn new(classifier: Box<dyn PoseClassifier>) -> Self {
        Self::from_config(&SessionConfig::default(), classifier)
    }

    pub fn from_config(config: &SessionConfig, classifier: Box<dyn PoseClassifier>) -> Self {
        info!(classifier = classifier.name(), "tracking session started");
        Self {
            min_person_score: config.min_person_score,
            running: AtomicBool::new(true),
            generation: AtomicU64::new(0),
            classifier: Mutex::new(Some(classifier)),
            counter: Mutex::new(RepCounter::new()),
            shared: Arc::new(SharedCounts::new()),
        }
    }

    /// 検出結果1フレーム分を処理
    ///
    /// 停止後・分類器なし・人物スコア不足・姿勢チェック不合格のときは None。
    /// 分類中に reset / stop が入った場合も結果を捨てて None。
    pub fn process_frame(&self, persons: &[Person]) -> Option<FrameOutcome> {
        if !self.running.load(Ordering::Acquire) {
            return None;
        }

        let person = persons.first()?;
        // NaN スコアも不合格
        if person.score.partial_cmp(&self.min_person_score) != Some(std::cmp::Ordering::Greater) {
            trace!(score = person.score, "person score below threshold");
            return None;
        }

        let (classification, generation) = {
            let mut guard = lock(&self.classifier);
            let classifier = guard.as_mut()?;
            if !classifier.pose_is_correct(persons) {
                debug!(classifier = classifier.name(), "pose rejected");
                return None;
            }
            let generation = self.generation.load(Ordering::Acquire);
            (classifier.classify(person), generation)
        };

        let mut counter = lock(&self.counter);
        if !self.running.load(Ordering::Acquire)
            || self.generation.load(Ordering::Acquire) != generation
        {
            warn!(phase = ?classification.phase, "session changed during classification, result discarded");
            return None;
        }

        let counts = counter.observe(classification.phase, classification.confidence);
        self.shared.store(counts);
        self.shared
            .outside_screen
            .store(classification.outside_screen, Ordering::Release);

        Some(FrameOutcome {
            classification,
            counts,
        })
    }

    /// 分類器を差し替える。処理中のフレームが終わるのを待ち、古い方は close してから破棄
    pub fn set_classifier(&self, classifier: Box<dyn PoseClassifier>) {
        let mut guard = lock(&self.classifier);
        if let Some(mut old) = guard.take() {
            warn!(old = old.name(), new = classifier.name(), "replacing classifier");
            old.close();
        }
        *guard = Some(classifier);
    }

    /// 新しいセッションとしてカウンタと分類器のラッチを初期化
    pub fn reset(&self) {
        let mut classifier = lock(&self.classifier);
        if let Some(c) = classifier.as_mut() {
            c.reset();
        }
        let mut counter = lock(&self.counter);
        counter.reset();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.store(counter.snapshot());
        self.shared.outside_screen.store(true, Ordering::Release);
        info!("tracking session reset");
    }

    /// フレーム受付を止めてから分類器を解放する
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        let mut guard = lock(&self.classifier);
        if let Some(mut classifier) = guard.take() {
            classifier.close();
        }
        let counts = self.shared.load();
        info!(
            valid = counts.valid_count,
            error = counts.error_count,
            "tracking session stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn counts(&self) -> CountsReader {
        CountsReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}
