//! # Pilot モジュール
//!
//! シミュレーションエンジンの呼び出し側として動作する簡易操縦ロジックです。
//! エンジン自体は経路計画を行わないため、CLIとテストではこの操縦ロジックで
//! 目標の回転と速度を毎ティック決定します。

use crate::models::{math_utils, Drone, IPilot, Rotator3D, TargetState, Vector3D};

/// 次のウェイポイントへ直進する操縦ロジック
///
/// 機首方向の誤差が大きいほど減速してその場で旋回し、ウェイポイントに
/// 近づくほど速度を落とします。トラック完了後（ウェイポイントなし）は停止を指示します。
#[derive(Debug, Clone)]
pub struct WaypointPilot {
    /// 巡航速度（m/s）
    pub cruise_speed: f64,
    /// 距離あたりの速度上限（1/s）。`speed <= distance * approach_gain`
    pub approach_gain: f64,
}

impl Default for WaypointPilot {
    fn default() -> Self {
        Self {
            cruise_speed: 10.0,
            approach_gain: 1.0,
        }
    }
}

impl WaypointPilot {
    pub fn new(cruise_speed: f64, approach_gain: f64) -> Self {
        Self {
            cruise_speed,
            approach_gain,
        }
    }

    /// ウェイポイント方向を向く目標回転
    ///
    /// ヨーは現在値から近い側へ回るように正規化し、真上・真下の場合は現在のヨーを維持します。
    fn desired_rotation(current: Rotator3D, direction: Vector3D) -> Rotator3D {
        let facing = Rotator3D::facing(direction);
        let horizontal = (direction.x.powi(2) + direction.y.powi(2)).sqrt();
        let yaw = if horizontal > 1e-6 {
            current.z + math_utils::normalize_angle(facing.z - current.z)
        } else {
            current.z
        };
        Rotator3D::new(0.0, facing.y, yaw)
    }
}

impl IPilot for WaypointPilot {
    fn command(&mut self, drone: &Drone, next_waypoint: Option<Vector3D>) -> TargetState {
        let Some(waypoint) = next_waypoint else {
            return TargetState {
                rotation: drone.rotation(),
                speed: 0.0,
            };
        };

        let offset = waypoint - drone.position();
        let distance = offset.magnitude();
        if distance == 0.0 {
            return TargetState {
                rotation: drone.rotation(),
                speed: 0.0,
            };
        }

        let rotation = Self::desired_rotation(drone.rotation(), offset);
        let alignment = drone.rotation().heading().dot(&offset.normalize()).max(0.0);
        let speed = (self.cruise_speed * alignment.powi(2)).min(distance * self.approach_gain);

        TargetState { rotation, speed }
    }
}
