//! # Report モジュール
//!
//! トラック終了時（完了・タイムアウト）に統計を受け取るレポーターを提供します。
//!
//! - `LogReporter`: tracing でトラックごとの要約を出力
//! - `YamlReporter`: 統計全体を `track_NNN.yaml` として書き出し、外部の描画ツールへ渡す

use crate::models::{IReporter, Statistics, Vector3D};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// トラックの終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackOutcome {
    /// 全ウェイポイント到達後に停止した
    Completed,
    /// 制限時間を超えた
    TimedOut,
}

impl std::fmt::Display for TrackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackOutcome::Completed => write!(f, "完了"),
            TrackOutcome::TimedOut => write!(f, "タイムアウト"),
        }
    }
}

/// レポーターに渡されるトラック終了時の記録
#[derive(Debug, Clone, Serialize)]
pub struct TrackReport {
    pub track_index: usize,
    pub track_name: String,
    pub outcome: TrackOutcome,
    pub elapsed_s: f64,
    pub waypoints: Vec<Vector3D>,
    pub statistics: Statistics,
}

impl TrackReport {
    /// エンジンが保持する軽量な要約を作成
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            track_index: self.track_index,
            track_name: self.track_name.clone(),
            outcome: self.outcome,
            elapsed_s: self.elapsed_s,
            sample_count: self.statistics.len(),
            max_speed: self.statistics.max_speed(),
            path_length: self.statistics.path_length(),
            final_position: self.statistics.last().map(|s| s.position),
        }
    }
}

/// トラック結果の要約
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub track_index: usize,
    pub track_name: String,
    pub outcome: TrackOutcome,
    pub elapsed_s: f64,
    pub sample_count: usize,
    pub max_speed: f64,
    pub path_length: f64,
    pub final_position: Option<Vector3D>,
}

/// トラックごとの要約をログへ出力するレポーター
#[derive(Debug, Default)]
pub struct LogReporter;

impl IReporter for LogReporter {
    fn report(&mut self, report: &TrackReport) {
        let summary = report.summary();
        info!(
            "トラック{} [{}] {}: 経過 {:.1}秒, サンプル {}件, 最大速度 {:.2}m/s, 飛行距離 {:.1}m",
            summary.track_index + 1,
            summary.track_name,
            summary.outcome,
            summary.elapsed_s,
            summary.sample_count,
            summary.max_speed,
            summary.path_length
        );
    }
}

/// トラックごとの統計をYAMLファイルへ書き出すレポーター
#[derive(Debug, Clone)]
pub struct YamlReporter {
    output_dir: PathBuf,
}

impl YamlReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// トラック番号に対応する出力パス
    pub fn path_for(&self, track_index: usize) -> PathBuf {
        self.output_dir.join(format!("track_{:03}.yaml", track_index + 1))
    }

    fn write(&self, report: &TrackReport) -> Result<PathBuf, Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(report.track_index);
        let contents = serde_yaml::to_string(report)?;
        fs::write(&path, contents)?;
        Ok(path)
    }
}

impl IReporter for YamlReporter {
    fn report(&mut self, report: &TrackReport) {
        // 書き込み失敗でシミュレーションは止めない
        match self.write(report) {
            Ok(path) => info!("統計を出力しました: {}", path.display()),
            Err(e) => warn!(
                "統計の出力に失敗しました (トラック{}): {}",
                report.track_index + 1,
                e
            ),
        }
    }
}
