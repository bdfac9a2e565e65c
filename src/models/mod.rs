// 基本的なデータ型と数学ユーティリティ
pub mod common;

// 外部協調者（レポーター、操縦ロジック）のインターフェース定義
pub mod traits;

// トラック形状
pub mod ring;
pub mod track;

// 運動状態と走行管理
pub mod drone;
pub mod track_runner;
pub mod statistics;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use ring::Ring;
pub use track::Track;
pub use drone::{Drone, TargetState};
pub use track_runner::{RunnerStatus, TrackRunner};
pub use statistics::{Sample, Statistics};
