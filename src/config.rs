use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// 手首・足首がこの信頼度未満なら画面外
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    /// 開: 鼻-肩-手首 の基準角（度）
    #[serde(default = "default_arm_open_angle")]
    pub arm_open_angle: f32,
    /// 閉: 腰-肩-手首 の基準角（度）
    #[serde(default = "default_arm_close_angle")]
    pub arm_close_angle: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// 分類を行う人物検出スコアの下限（これを超えること）
    #[serde(default = "default_min_person_score")]
    pub min_person_score: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// tracing の EnvFilter 書式（RUST_LOG が優先）
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_visibility_threshold() -> f32 { 0.10 }
fn default_arm_open_angle() -> f32 { 60.0 }
fn default_arm_close_angle() -> f32 { 30.0 }
fn default_min_person_score() -> f32 { 0.40 }
fn default_log_filter() -> String { "info".to_string() }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: default_visibility_threshold(),
            arm_open_angle: default_arm_open_angle(),
            arm_close_angle: default_arm_close_angle(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_person_score: default_min_person_score(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// 読めなければデフォルト値で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("config not loaded, using defaults: {e:#}");
                Self::default()
            }
        }
    }
}
