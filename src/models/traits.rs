use crate::models::{
    common::Vector3D,
    drone::{Drone, TargetState},
};
use crate::report::TrackReport;

/// トラック終了時に統計を受け取る外部協調者のインターフェース
///
/// 描画や保存などの消費側であり、シミュレーションへは何も返しません。
pub trait IReporter {
    /// トラック完了またはタイムアウト時に1回呼ばれる
    fn report(&mut self, report: &TrackReport);
}

/// 操縦ロジック（呼び出し側）のインターフェース
pub trait IPilot {
    /// 現在の状態と次のウェイポイントから目標状態を決定
    fn command(&mut self, drone: &Drone, next_waypoint: Option<Vector3D>) -> TargetState;
}
