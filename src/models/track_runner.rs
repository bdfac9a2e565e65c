use crate::models::{
    common::Vector3D,
    drone::Drone,
    track::Track,
};
use std::collections::VecDeque;
use tracing::debug;

/// トラック走行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    /// 現在のウェイポイントへ向かっている
    Approaching,
    /// 全ウェイポイントに到達済み
    Finished,
}

/// 1トラック分の走行管理
///
/// ウェイポイントの待ち行列、現在目標のウェイポイント、完了状態、
/// トラック内の経過時間を保持します。ドローン本体はシミュレーションエンジンが
/// 所有し、各メソッドには参照として渡されます。
#[derive(Debug, Clone)]
pub struct TrackRunner {
    remaining: VecDeque<Vector3D>,
    current: Option<Vector3D>,
    status: RunnerStatus,
    ticks: u64,
    dt: f64,
}

impl TrackRunner {
    /// ウェイポイント到達判定距離（m）
    pub const REACHED_THRESHOLD: f64 = 4.0;

    /// トラックから走行管理を作成
    ///
    /// 最初のウェイポイントが現在目標になります。トラックは必ずゴールを持つため、
    /// 作成直後は常に `Approaching` です。
    pub fn new(track: &Track, dt: f64) -> Self {
        let mut remaining: VecDeque<Vector3D> = track.waypoints().into();
        let current = remaining.pop_front();
        let status = if current.is_some() {
            RunnerStatus::Approaching
        } else {
            RunnerStatus::Finished
        };

        Self {
            remaining,
            current,
            status,
            ticks: 0,
            dt,
        }
    }

    /// ウェイポイント到達を判定し、到達していれば次へ進める
    ///
    /// 完了後は何もしません。到達した場合は `true` を返します。
    pub fn advance_if_reached(&mut self, drone: &Drone) -> bool {
        if self.status == RunnerStatus::Finished {
            return false;
        }
        let Some(waypoint) = self.current else {
            return false;
        };

        let distance = drone.position().distance(&waypoint);
        if distance > Self::REACHED_THRESHOLD {
            return false;
        }

        match self.remaining.pop_front() {
            Some(next) => {
                debug!(
                    "ウェイポイント到達: {} (距離 {:.2}m) 次: {} 残り {}",
                    waypoint,
                    distance,
                    next,
                    self.remaining.len() + 1
                );
                self.current = Some(next);
            }
            None => {
                debug!("最終ウェイポイント到達: {} (距離 {:.2}m)", waypoint, distance);
                self.current = None;
                self.status = RunnerStatus::Finished;
            }
        }
        true
    }

    /// 経過時間を1ティック進める
    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    /// トラック開始からの経過時間（秒）
    pub fn elapsed_s(&self) -> f64 {
        self.ticks as f64 * self.dt
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn status(&self) -> RunnerStatus {
        self.status
    }

    /// 現在目標のウェイポイント（完了後は `None`）
    pub fn next_waypoint(&self) -> Option<Vector3D> {
        self.current
    }

    /// 現在目標を含む残りウェイポイント数
    pub fn remaining_waypoints(&self) -> usize {
        match self.status {
            RunnerStatus::Approaching => self.remaining.len() + 1,
            RunnerStatus::Finished => 0,
        }
    }

    pub fn is_track_finished(&self) -> bool {
        self.status == RunnerStatus::Finished
    }

    /// トラック完了かつドローンが停止しているか
    pub fn is_drone_stopped(&self, drone: &Drone) -> bool {
        self.is_track_finished() && drone.speed() == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{common::Rotator3D, ring::Ring};

    fn track_with_rings(positions: &[Vector3D], end: Vector3D) -> Track {
        let rings = positions.iter().map(|p| Ring::at(*p).unwrap()).collect();
        Track::new(Vector3D::default(), end, rings, 60.0).unwrap()
    }

    fn drone_at(position: Vector3D) -> Drone {
        Drone::new(position, Rotator3D::default())
    }

    #[test]
    fn test_initial_state() {
        let track = track_with_rings(
            &[Vector3D::new(0.0, 0.0, 10.0), Vector3D::new(0.0, 0.0, 15.0)],
            Vector3D::new(0.0, 0.0, 20.0),
        );
        let runner = TrackRunner::new(&track, 0.1);
        assert_eq!(runner.status(), RunnerStatus::Approaching);
        assert_eq!(runner.next_waypoint(), Some(Vector3D::new(0.0, 0.0, 10.0)));
        assert_eq!(runner.remaining_waypoints(), 3);
        assert_eq!(runner.elapsed_s(), 0.0);
    }

    #[test]
    fn test_reached_threshold_is_inclusive() {
        let track = track_with_rings(&[Vector3D::new(0.0, 0.0, 4.0)], Vector3D::new(0.0, 0.0, 20.0));
        let mut runner = TrackRunner::new(&track, 0.1);

        assert!(runner.advance_if_reached(&drone_at(Vector3D::default())));
        assert_eq!(runner.next_waypoint(), Some(Vector3D::new(0.0, 0.0, 20.0)));
        assert_eq!(runner.remaining_waypoints(), 1);
    }

    #[test]
    fn test_not_reached_outside_threshold() {
        let track = track_with_rings(&[Vector3D::new(0.0, 0.0, 4.5)], Vector3D::new(0.0, 0.0, 20.0));
        let mut runner = TrackRunner::new(&track, 0.1);

        assert!(!runner.advance_if_reached(&drone_at(Vector3D::default())));
        assert_eq!(runner.next_waypoint(), Some(Vector3D::new(0.0, 0.0, 4.5)));
    }

    #[test]
    fn test_zero_ring_track_finishes_at_end() {
        let track = track_with_rings(&[], Vector3D::new(0.0, 0.0, 20.0));
        let mut runner = TrackRunner::new(&track, 0.1);
        assert_eq!(runner.remaining_waypoints(), 1);

        let mut drone = drone_at(Vector3D::new(0.0, 0.0, 17.0));
        assert!(runner.advance_if_reached(&drone));
        assert!(runner.is_track_finished());
        assert_eq!(runner.next_waypoint(), None);
        assert_eq!(runner.remaining_waypoints(), 0);

        // 完了後は判定しない
        assert!(!runner.advance_if_reached(&drone));

        drone.set_speed(3.0);
        assert!(!runner.is_drone_stopped(&drone));
        drone.set_speed(0.0);
        assert!(runner.is_drone_stopped(&drone));
    }

    #[test]
    fn test_elapsed_counts_ticks() {
        let track = track_with_rings(&[], Vector3D::new(0.0, 0.0, 20.0));
        let mut runner = TrackRunner::new(&track, 0.1);
        for _ in 0..25 {
            runner.tick();
        }
        assert_eq!(runner.ticks(), 25);
        assert!((runner.elapsed_s() - 2.5).abs() < 1e-12);
    }
}
