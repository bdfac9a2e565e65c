//! # Simulation モジュール
//!
//! ドローン飛行シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! エンジンは未処理トラックの待ち行列、シミュレーション全体で1機のドローン、
//! 現在トラックの走行管理と統計を保持し、固定時間刻み（Δt）で状態を進めます。
//! 操縦ロジックは持たず、呼び出し側が毎ティック目標の回転と速度を指示します。
//!
//! ## 1ティックの処理順序
//!
//! 1. **タイマー更新**: トラック内経過時間を Δt 進める
//! 2. **タイムアウト判定**: 制限時間超過なら統計を出力してトラックを切り替え
//! 3. **完了判定**: 全ウェイポイント到達かつ停止ならトラックを切り替え
//! 4. **回転収束**: 各軸を最大 `dr·Δt` だけ目標へ近づける
//! 5. **速度収束**: 最大 `dv·Δt` だけ目標速度へ近づける
//! 6. **位置更新**: 機首方向へ `speed·Δt` 前進（前進オイラー法）
//! 7. **到達判定**: ウェイポイント到達なら次へ進める
//! 8. **統計記録**: 位置・回転・速度を記録
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use dronetrack::models::{Rotator3D, SimulationConstants, Track, Vector3D};
//! use dronetrack::simulation::SimulationEngine;
//!
//! let track = Track::new(Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(0.0, 0.0, 20.0), vec![], 60.0)?;
//! let mut engine = SimulationEngine::new(vec![track], SimulationConstants::default())?;
//!
//! while !engine.is_simulation_finished() {
//!     let speed = if engine.next_waypoint().is_some() { 10.0 } else { 0.0 };
//!     engine.set_drone_target_state(Rotator3D::new(0.0, -std::f64::consts::FRAC_PI_2, 0.0), speed)?;
//!     engine.update();
//! }
//! ```

use crate::models::*;
use crate::report::{TrackOutcome, TrackReport, TrackSummary};
use std::collections::VecDeque;
use tracing::{debug, info, trace, warn};

pub struct SimulationEngine {
    constants: SimulationConstants,
    drone: Drone,
    pending_tracks: VecDeque<Track>,
    current_track: Track,
    track_index: usize,
    runner: TrackRunner,
    statistics: Statistics,
    target: TargetState,
    is_finished: bool,
    step_count: u64,
    summaries: Vec<TrackSummary>,
    reporters: Vec<Box<dyn IReporter>>,
    verbose_level: u8,
}

impl SimulationEngine {
    /// トラック列からシミュレーションエンジンを作成
    ///
    /// ドローンは最初のトラックのスタート地点に無回転・停止状態で配置されます。
    ///
    /// # エラー
    ///
    /// トラック列が空の場合、または定数が正の有限値でない場合
    pub fn new(tracks: Vec<Track>, constants: SimulationConstants) -> Result<Self, SimulationError> {
        validate_constants(&constants)?;

        let mut pending_tracks: VecDeque<Track> = tracks.into();
        let current_track = pending_tracks
            .pop_front()
            .ok_or(SimulationError::EmptyTrackList)?;

        let drone = Drone::new(current_track.start(), Rotator3D::default());
        let mut runner = TrackRunner::new(&current_track, constants.dt);
        runner.advance_if_reached(&drone);

        Ok(Self {
            constants,
            drone,
            pending_tracks,
            current_track,
            track_index: 0,
            runner,
            statistics: Statistics::new(),
            target: TargetState::default(),
            is_finished: false,
            step_count: 0,
            summaries: Vec::new(),
            reporters: Vec::new(),
            verbose_level: 0,
        })
    }

    /// 詳細出力レベルを設定（run() の進行状況ログに使用）
    pub fn with_verbose_level(mut self, verbose_level: u8) -> Self {
        self.verbose_level = verbose_level;
        self
    }

    /// トラック終了時に統計を受け取るレポーターを登録
    pub fn add_reporter(&mut self, reporter: Box<dyn IReporter>) {
        self.reporters.push(reporter);
    }

    pub fn constants(&self) -> &SimulationConstants {
        &self.constants
    }

    /// ドローンの現在状態（読み取り専用）
    pub fn drone(&self) -> &Drone {
        &self.drone
    }

    /// 現在目標のウェイポイント（トラック完了後は `None`）
    pub fn next_waypoint(&self) -> Option<Vector3D> {
        self.runner.next_waypoint()
    }

    /// 現在目標を含む残りウェイポイント数
    pub fn remaining_waypoints(&self) -> usize {
        self.runner.remaining_waypoints()
    }

    pub fn current_track(&self) -> &Track {
        &self.current_track
    }

    /// 現在のトラック番号（0始まり）
    pub fn track_index(&self) -> usize {
        self.track_index
    }

    /// 未処理のトラック数（現在トラックを除く）
    pub fn pending_tracks(&self) -> usize {
        self.pending_tracks.len()
    }

    pub fn track_runner(&self) -> &TrackRunner {
        &self.runner
    }

    /// 現在トラックの経過時間（秒）
    pub fn elapsed_s(&self) -> f64 {
        self.runner.elapsed_s()
    }

    pub fn target_state(&self) -> TargetState {
        self.target
    }

    /// 現在トラックで記録中の統計
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// 終了済みトラックの要約
    pub fn summaries(&self) -> &[TrackSummary] {
        &self.summaries
    }

    pub fn is_simulation_finished(&self) -> bool {
        self.is_finished
    }

    /// ドローンの目標回転と目標速度を設定
    ///
    /// 目標速度は `[0, MAX_SPEED]` に丸められます。NaN や無限大を含む場合は
    /// 既存の目標を変更せずにエラーを返します。
    pub fn set_drone_target_state(&mut self, rotation: Rotator3D, speed: f64) -> Result<(), SimulationError> {
        if !rotation.is_finite() || speed.is_nan() {
            return Err(SimulationError::NonFiniteTarget);
        }

        self.target = TargetState {
            rotation,
            speed: Drone::clamp_speed(speed),
        };
        Ok(())
    }

    /// シミュレーションを1ティック（Δt）進める
    ///
    /// 終了後に呼ばれた場合は何もしません。
    pub fn update(&mut self) {
        if self.is_finished {
            return;
        }

        self.runner.tick();

        if self.runner.elapsed_s() >= self.current_track.timeout_s() {
            warn!(
                "トラック{}がタイムアウトしました ({:.1}秒, 残りウェイポイント {})",
                self.track_index + 1,
                self.runner.elapsed_s(),
                self.runner.remaining_waypoints()
            );
            self.finish_track(TrackOutcome::TimedOut);
            return;
        }

        if self.runner.is_track_finished() && self.runner.is_drone_stopped(&self.drone) {
            self.finish_track(TrackOutcome::Completed);
            return;
        }

        self.drone = self.drone.stepped(&self.target, &self.constants);
        self.runner.advance_if_reached(&self.drone);
        self.statistics.record(self.runner.elapsed_s(), &self.drone);
        self.step_count += 1;

        trace!(
            "t={:.1}s pos={} rot={} speed={:.2}",
            self.runner.elapsed_s(),
            self.drone.position(),
            self.drone.rotation(),
            self.drone.speed()
        );
    }

    /// 操縦ロジックを使ってシミュレーションを最後まで実行
    ///
    /// 毎ティック、状態を読み取り、操縦ロジックの目標を設定してから更新します。
    ///
    /// # エラー
    ///
    /// 操縦ロジックが有限でない目標を返した場合、または `max_steps` 回の更新で
    /// 終了しなかった場合
    pub fn run<P: IPilot>(&mut self, pilot: &mut P, max_steps: u64) -> Result<(), SimulationError> {
        info!("=== シミュレーション実行開始 ===");

        let mut steps = 0;
        while !self.is_finished {
            if steps >= max_steps {
                return Err(SimulationError::StepLimitExceeded(max_steps));
            }

            let command = pilot.command(&self.drone, self.next_waypoint());
            self.set_drone_target_state(command.rotation, command.speed)?;
            self.update();
            steps += 1;

            if self.verbose_level > 0 && steps % 100 == 0 {
                info!(
                    "進行状況: トラック {}/{} 経過 {:.1}秒 位置 {} 速度 {:.2}m/s",
                    self.track_index + 1,
                    self.track_index + 1 + self.pending_tracks.len(),
                    self.runner.elapsed_s(),
                    self.drone.position(),
                    self.drone.speed()
                );
            }
        }

        info!("=== シミュレーション完了 ===");
        info!("総更新回数: {}", steps);

        Ok(())
    }

    /// 実行結果の概要を表示
    pub fn print_summary(&self) {
        println!("=== シミュレーション結果 ===");
        for summary in &self.summaries {
            let final_position = summary
                .final_position
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  トラック{} {}: {} ({:.1}秒, 最大速度 {:.2}m/s, 飛行距離 {:.1}m, 最終位置 {})",
                summary.track_index + 1,
                summary.track_name,
                summary.outcome,
                summary.elapsed_s,
                summary.max_speed,
                summary.path_length,
                final_position
            );
        }
        let completed = self
            .summaries
            .iter()
            .filter(|s| s.outcome == TrackOutcome::Completed)
            .count();
        println!("完了トラック: {}/{}", completed, self.summaries.len());
        println!("総ステップ数: {}", self.step_count);
    }

    /// 現在トラックの統計を出力し、次のトラックへ切り替える（なければ終了）
    fn finish_track(&mut self, outcome: TrackOutcome) {
        let report = TrackReport {
            track_index: self.track_index,
            track_name: self.current_track.name().to_string(),
            outcome,
            elapsed_s: self.runner.elapsed_s(),
            waypoints: self.current_track.waypoints(),
            statistics: std::mem::take(&mut self.statistics),
        };
        for reporter in &mut self.reporters {
            reporter.report(&report);
        }
        self.summaries.push(report.summary());

        match self.pending_tracks.pop_front() {
            Some(track) => {
                self.track_index += 1;
                self.runner = TrackRunner::new(&track, self.constants.dt);
                self.runner.advance_if_reached(&self.drone);
                self.current_track = track;
                info!(
                    "トラック{}を開始: {} (制限時間 {:.1}秒)",
                    self.track_index + 1,
                    self.current_track,
                    self.current_track.timeout_s()
                );
            }
            None => {
                self.is_finished = true;
                debug!("全トラック終了 (ステップ数: {})", self.step_count);
            }
        }
    }
}

fn validate_constants(constants: &SimulationConstants) -> Result<(), SimulationError> {
    let checks = [
        ("dt", constants.dt),
        ("speed_rate", constants.speed_rate),
        ("rotation_rate", constants.rotation_rate),
    ];
    for (name, value) in checks {
        if !(value.is_finite() && value > 0.0) {
            return Err(SimulationError::InvalidConstants(format!(
                "{} must be positive (got {})",
                name, value
            )));
        }
    }
    Ok(())
}

/// シミュレーションエラー
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    EmptyTrackList,
    NonFiniteTarget,
    InvalidConstants(String),
    StepLimitExceeded(u64),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::EmptyTrackList => {
                write!(f, "トラック列が空です")
            }
            SimulationError::NonFiniteTarget => {
                write!(f, "目標状態に有限でない値が含まれています")
            }
            SimulationError::InvalidConstants(msg) => {
                write!(f, "シミュレーション定数が不正です: {}", msg)
            }
            SimulationError::StepLimitExceeded(steps) => {
                write!(f, "{}ステップ以内にシミュレーションが終了しませんでした", steps)
            }
        }
    }
}

impl std::error::Error for SimulationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pilot::WaypointPilot;
    use std::cell::RefCell;
    use std::f64::consts::FRAC_PI_2;
    use std::rc::Rc;

    /// 受け取ったレポートを共有バッファへ保存するレポーター
    struct RecordingReporter(Rc<RefCell<Vec<TrackReport>>>);

    impl IReporter for RecordingReporter {
        fn report(&mut self, report: &TrackReport) {
            self.0.borrow_mut().push(report.clone());
        }
    }

    fn recording(engine: &mut SimulationEngine) -> Rc<RefCell<Vec<TrackReport>>> {
        let reports = Rc::new(RefCell::new(Vec::new()));
        engine.add_reporter(Box::new(RecordingReporter(Rc::clone(&reports))));
        reports
    }

    fn point_track(start: Vector3D, end: Vector3D, timeout_s: f64) -> Track {
        Track::new(start, end, Vec::new(), timeout_s).unwrap()
    }

    fn straight_up_track() -> Track {
        Track::new(
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(0.0, 0.0, 20.0),
            vec![Ring::at(Vector3D::new(0.0, 0.0, 10.0)).unwrap()],
            60.0,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_track_list_is_rejected() {
        let result = SimulationEngine::new(Vec::new(), SimulationConstants::default());
        assert!(matches!(result, Err(SimulationError::EmptyTrackList)));
    }

    #[test]
    fn test_invalid_constants_are_rejected() {
        let constants = SimulationConstants {
            dt: 0.0,
            ..SimulationConstants::default()
        };
        let result = SimulationEngine::new(vec![straight_up_track()], constants);
        assert!(matches!(result, Err(SimulationError::InvalidConstants(_))));
    }

    #[test]
    fn test_initial_state() {
        let engine = SimulationEngine::new(vec![straight_up_track()], SimulationConstants::default()).unwrap();
        assert_eq!(engine.drone().position(), Vector3D::new(0.0, 0.0, 0.0));
        assert_eq!(engine.drone().speed(), 0.0);
        assert_eq!(engine.next_waypoint(), Some(Vector3D::new(0.0, 0.0, 10.0)));
        assert_eq!(engine.remaining_waypoints(), 2);
        assert_eq!(engine.elapsed_s(), 0.0);
        assert!(!engine.is_simulation_finished());
    }

    #[test]
    fn test_target_speed_is_clamped_and_non_finite_rejected() {
        let mut engine = SimulationEngine::new(vec![straight_up_track()], SimulationConstants::default()).unwrap();

        engine.set_drone_target_state(Rotator3D::default(), 25.0).unwrap();
        assert_eq!(engine.target_state().speed, 20.0);
        engine.set_drone_target_state(Rotator3D::default(), -5.0).unwrap();
        assert_eq!(engine.target_state().speed, 0.0);

        engine.set_drone_target_state(Rotator3D::new(0.1, 0.2, 0.3), 5.0).unwrap();
        let before = engine.target_state();
        assert_eq!(
            engine.set_drone_target_state(Rotator3D::new(f64::NAN, 0.0, 0.0), 1.0),
            Err(SimulationError::NonFiniteTarget)
        );
        assert_eq!(engine.set_drone_target_state(Rotator3D::default(), f64::NAN), Err(SimulationError::NonFiniteTarget));
        assert_eq!(engine.target_state(), before);
    }

    #[test]
    fn test_rotation_converges_without_overshoot() {
        let constants = SimulationConstants::default();
        let mut engine = SimulationEngine::new(vec![straight_up_track()], constants).unwrap();
        let target = Rotator3D::new(0.3, -1.0, 0.05);
        engine.set_drone_target_state(target, 0.0).unwrap();

        for _ in 0..20 {
            let before = engine.drone().rotation();
            engine.update();
            let after = engine.drone().rotation();
            for ((b, a), t) in before.iter().zip(after.iter()).zip(target.iter()) {
                assert!((a - t).abs() <= (b - t).abs());
                assert!((a - b).abs() <= constants.max_rotation_delta() + 1e-12);
                let (lo, hi) = if b <= t { (b, t) } else { (t, b) };
                assert!(a >= lo && a <= hi);
            }
        }
        assert_eq!(engine.drone().rotation(), target);
    }

    #[test]
    fn test_statistics_sample_per_tick() {
        let mut engine = SimulationEngine::new(vec![straight_up_track()], SimulationConstants::default()).unwrap();
        engine.set_drone_target_state(Rotator3D::default(), 5.0).unwrap();
        for _ in 0..7 {
            engine.update();
        }
        assert_eq!(engine.statistics().len(), 7);
        assert_eq!(engine.step_count(), 7);
        let last = engine.statistics().last().unwrap();
        assert!((last.time_s - 0.7).abs() < 1e-9);
        assert_eq!(last.speed, 5.0);
    }

    #[test]
    fn test_two_tracks_switch_on_completion() {
        // スタート = ゴールのトラックは作成直後に完了し、ドローンは停止している
        let first = point_track(Vector3D::default(), Vector3D::default(), 10.0).with_name("first");
        let second = point_track(Vector3D::new(0.0, 0.0, 50.0), Vector3D::new(0.0, 0.0, 2.0), 10.0).with_name("second");
        let mut engine = SimulationEngine::new(vec![first, second], SimulationConstants::default()).unwrap();
        let reports = recording(&mut engine);

        assert!(engine.track_runner().is_track_finished());
        assert_eq!(engine.pending_tracks(), 1);

        engine.update();
        assert_eq!(engine.track_index(), 1);
        assert_eq!(engine.elapsed_s(), 0.0);
        assert_eq!(engine.current_track().name(), "second");
        assert!(!engine.is_simulation_finished());
        // ドローンはトラックをまたいで位置を引き継ぐ
        assert_eq!(engine.drone().position(), Vector3D::default());
        assert!(engine.track_runner().is_track_finished());

        engine.update();
        assert!(engine.is_simulation_finished());

        let reports = reports.borrow();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.outcome == TrackOutcome::Completed));
        assert_eq!(reports[1].track_name, "second");
        assert_eq!(engine.summaries().len(), 2);
    }

    #[test]
    fn test_timeout_switches_track_and_flushes_statistics() {
        let first = point_track(Vector3D::default(), Vector3D::new(100.0, 0.0, 0.0), 1.0);
        let second = point_track(Vector3D::default(), Vector3D::new(0.0, 100.0, 0.0), 0.5);
        let mut engine = SimulationEngine::new(vec![first, second], SimulationConstants::default()).unwrap();
        let reports = recording(&mut engine);

        let mut updates = 0;
        while engine.track_index() == 0 {
            engine.update();
            updates += 1;
            assert!(updates <= 20);
        }
        assert_eq!(updates, 10);
        assert_eq!(engine.elapsed_s(), 0.0);
        assert!(!engine.is_simulation_finished());
        {
            let reports = reports.borrow();
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].outcome, TrackOutcome::TimedOut);
            // タイムアウトしたティックでは記録しない
            assert_eq!(reports[0].statistics.len(), 9);
            assert_eq!(reports[0].waypoints, vec![Vector3D::new(100.0, 0.0, 0.0)]);
        }

        while !engine.is_simulation_finished() {
            engine.update();
        }
        assert_eq!(reports.borrow().len(), 2);
        assert_eq!(reports.borrow()[1].outcome, TrackOutcome::TimedOut);

        // 終了後の update は何もしない
        let steps = engine.step_count();
        engine.update();
        assert_eq!(engine.step_count(), steps);
        assert_eq!(reports.borrow().len(), 2);
    }

    #[test]
    fn test_track_not_complete_until_drone_stops() {
        let track = point_track(Vector3D::default(), Vector3D::new(10.0, 0.0, 0.0), 30.0);
        let mut engine = SimulationEngine::new(vec![track], SimulationConstants::default()).unwrap();
        engine.set_drone_target_state(Rotator3D::default(), 5.0).unwrap();

        for _ in 0..50 {
            engine.update();
            if engine.track_runner().is_track_finished() {
                break;
            }
        }
        assert!(engine.track_runner().is_track_finished());
        assert!(engine.drone().speed() > 0.0);
        engine.update();
        assert!(!engine.is_simulation_finished());

        engine.set_drone_target_state(Rotator3D::default(), 0.0).unwrap();
        for _ in 0..20 {
            engine.update();
        }
        assert!(engine.is_simulation_finished());
        assert_eq!(engine.summaries()[0].outcome, TrackOutcome::Completed);
    }

    #[test]
    fn test_end_to_end_straight_up() {
        let mut engine = SimulationEngine::new(vec![straight_up_track()], SimulationConstants::default()).unwrap();
        let up = Rotator3D::new(0.0, -FRAC_PI_2, 0.0);
        let mut max_speed: f64 = 0.0;

        for _ in 0..1000 {
            if engine.is_simulation_finished() {
                break;
            }
            let speed = if engine.next_waypoint().is_some() { 10.0 } else { 0.0 };
            engine.set_drone_target_state(up, speed).unwrap();
            engine.update();
            max_speed = max_speed.max(engine.drone().speed());
        }

        assert!(engine.is_simulation_finished());
        assert!(max_speed <= Drone::MAX_SPEED);
        let z = engine.drone().position().z;
        assert!((z - 20.0).abs() < 4.0, "z = {}", z);
        assert_eq!(engine.summaries()[0].outcome, TrackOutcome::Completed);
    }

    #[test]
    fn test_run_with_waypoint_pilot() {
        let tracks = vec![
            straight_up_track(),
            Track::new(
                Vector3D::new(0.0, 0.0, 20.0),
                Vector3D::new(30.0, 10.0, 20.0),
                vec![Ring::at(Vector3D::new(15.0, 0.0, 25.0)).unwrap()],
                60.0,
            )
            .unwrap(),
        ];
        let mut engine = SimulationEngine::new(tracks, SimulationConstants::default()).unwrap();
        let mut pilot = WaypointPilot::default();

        engine.run(&mut pilot, 10_000).unwrap();

        assert!(engine.is_simulation_finished());
        assert!(engine.summaries().iter().all(|s| s.outcome == TrackOutcome::Completed));
    }

    #[test]
    fn test_run_reports_step_limit() {
        let mut engine = SimulationEngine::new(vec![straight_up_track()], SimulationConstants::default()).unwrap();
        let mut pilot = WaypointPilot::default();
        assert_eq!(
            engine.run(&mut pilot, 5),
            Err(SimulationError::StepLimitExceeded(5))
        );
    }
}
