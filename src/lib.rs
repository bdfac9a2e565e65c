//! # dronetrack
//!
//! リング状のウェイポイントを持つ3Dトラック列をドローンが飛行する
//! 運動学シミュレーションです。
//!
//! - `models`: ベクトル・回転、リング、トラック、ドローン状態、走行管理、統計
//! - `simulation`: トラック列を順に処理するシミュレーションエンジン
//! - `pilot`: 呼び出し側の簡易操縦ロジック
//! - `report`: トラック終了時の統計出力
//! - `scenario`: YAMLシナリオ設定
//! - `logging`: tracing によるログ設定

pub mod logging;
pub mod models;
pub mod pilot;
pub mod report;
pub mod scenario;
pub mod simulation;
