use crate::models::common::{math_utils, Rotator3D, SimulationConstants, Vector3D};

/// 呼び出し側が指示する目標状態
///
/// 次に上書きされるまで毎ティック保持されます。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetState {
    pub rotation: Rotator3D,
    /// 目標速度（代入時に `[0, MAX_SPEED]` へ丸め済み）
    pub speed: f64,
}

/// ドローンの運動状態
///
/// シミュレーション全体を通じて1機だけ存在し、トラックが切り替わっても
/// 位置・回転・速度はそのまま引き継がれます。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drone {
    position: Vector3D,
    rotation: Rotator3D,
    speed: f64,
}

impl Drone {
    /// 最大速度（m/s）
    pub const MAX_SPEED: f64 = 20.0;

    /// 停止状態のドローンを作成
    pub fn new(position: Vector3D, rotation: Rotator3D) -> Self {
        Self {
            position,
            rotation,
            speed: 0.0,
        }
    }

    pub fn position(&self) -> Vector3D {
        self.position
    }

    pub fn rotation(&self) -> Rotator3D {
        self.rotation
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// 速度を設定（範囲外の値は `[0, MAX_SPEED]` に飽和）
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = Self::clamp_speed(speed);
    }

    /// 速度を `[0, MAX_SPEED]` に丸める。NaNは0として扱う
    pub fn clamp_speed(speed: f64) -> f64 {
        if speed.is_nan() {
            0.0
        } else {
            speed.clamp(0.0, Self::MAX_SPEED)
        }
    }

    /// 1ティック分の運動更新を行った新しい状態を返す
    ///
    /// 回転と速度をそれぞれのレート上限で目標へ近づけ、更新後の回転から
    /// 求めた機首方向に更新後の速度で `dt` 秒だけ前進させます（前進オイラー法）。
    pub fn stepped(&self, target: &TargetState, constants: &SimulationConstants) -> Drone {
        let max_turn = constants.max_rotation_delta();
        let rotation = Rotator3D::new(
            math_utils::approach(self.rotation.x, target.rotation.x, max_turn),
            math_utils::approach(self.rotation.y, target.rotation.y, max_turn),
            math_utils::approach(self.rotation.z, target.rotation.z, max_turn),
        );

        let speed = Self::clamp_speed(math_utils::approach(
            self.speed,
            target.speed,
            constants.max_speed_delta(),
        ));

        let position = self.position + rotation.heading() * (speed * constants.dt);

        Drone {
            position,
            rotation,
            speed,
        }
    }
}
