use crate::models::{
    common::{Rotator3D, Vector3D},
    drone::Drone,
};
use serde::Serialize;

/// 1ティック分の記録
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// トラック開始からの経過時間（秒）
    pub time_s: f64,
    pub position: Vector3D,
    pub rotation: Rotator3D,
    pub speed: f64,
}

/// トラック単位の時系列統計
///
/// 追記のみ。トラック切り替え時にレポーターへ渡された後は破棄されます。
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    samples: Vec<Sample>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// ドローンの現在状態を追記
    pub fn record(&mut self, time_s: f64, drone: &Drone) {
        self.samples.push(Sample {
            time_s,
            position: drone.position(),
            rotation: drone.rotation(),
            speed: drone.speed(),
        });
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 記録中の最大速度
    pub fn max_speed(&self) -> f64 {
        self.samples.iter().map(|s| s.speed).fold(0.0, f64::max)
    }

    /// 飛行経路の総延長
    pub fn path_length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| w[0].position.distance(&w[1].position))
            .sum()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}
