use crate::models::{math_utils, ModelError, Ring, Rotator3D, SimulationConstants, Track, Vector3D};
use crate::pilot::WaypointPilot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_dt")]
    pub dt_s: f64,
    #[serde(default = "default_speed_rate")]
    pub speed_rate_mps2: f64,
    #[serde(default = "default_rotation_rate")]
    pub rotation_rate_deg_s: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_s: default_dt(),
            speed_rate_mps2: default_speed_rate(),
            rotation_rate_deg_s: default_rotation_rate(),
            max_steps: default_max_steps(),
        }
    }
}

/// 操縦ロジック設定
#[derive(Debug, Deserialize, Serialize)]
pub struct PilotConfig {
    #[serde(default = "default_cruise_speed")]
    pub cruise_speed_mps: f64,
    #[serde(default = "default_approach_gain")]
    pub approach_gain: f64,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            cruise_speed_mps: default_cruise_speed(),
            approach_gain: default_approach_gain(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position3D {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

impl From<Position3D> for Vector3D {
    fn from(p: Position3D) -> Self {
        Vector3D::new(p.x_m, p.y_m, p.z_m)
    }
}

/// 回転（度で記述し、読み込み時にラジアンへ変換）
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Rotation3D {
    #[serde(default)]
    pub x_deg: f64,
    #[serde(default)]
    pub y_deg: f64,
    #[serde(default)]
    pub z_deg: f64,
}

impl From<Rotation3D> for Rotator3D {
    fn from(r: Rotation3D) -> Self {
        Rotator3D::new(
            math_utils::deg_to_rad(r.x_deg),
            math_utils::deg_to_rad(r.y_deg),
            math_utils::deg_to_rad(r.z_deg),
        )
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Scale3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Scale3D {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0, z: 1.0 }
    }
}

/// リング設定
#[derive(Debug, Deserialize, Serialize)]
pub struct RingConfig {
    pub position: Position3D,
    #[serde(default)]
    pub rotation: Rotation3D,
    #[serde(default)]
    pub scale: Scale3D,
    #[serde(default = "default_ring_height")]
    pub height_m: f64,
    #[serde(default = "default_hole_radius")]
    pub hole_radius_m: f64,
    #[serde(default = "default_complexity")]
    pub complexity: u32,
}

/// トラック設定
#[derive(Debug, Deserialize, Serialize)]
pub struct TrackConfig {
    pub id: String,
    pub start: Position3D,
    pub end: Position3D,
    pub timeout_s: f64,
    #[serde(default)]
    pub rings: Vec<RingConfig>,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub sim: SimulationConfig,
    #[serde(default)]
    pub pilot: PilotConfig,
    pub tracks: Vec<TrackConfig>,
}

fn default_dt() -> f64 {
    0.1
}

fn default_speed_rate() -> f64 {
    10.0
}

fn default_rotation_rate() -> f64 {
    90.0
}

fn default_max_steps() -> u64 {
    100_000
}

fn default_cruise_speed() -> f64 {
    10.0
}

fn default_approach_gain() -> f64 {
    1.0
}

fn default_ring_height() -> f64 {
    1.0
}

fn default_hole_radius() -> f64 {
    5.0
}

fn default_complexity() -> u32 {
    50
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let rates = [
            ("dt_s", self.sim.dt_s),
            ("speed_rate_mps2", self.sim.speed_rate_mps2),
            ("rotation_rate_deg_s", self.sim.rotation_rate_deg_s),
            ("cruise_speed_mps", self.pilot.cruise_speed_mps),
            ("approach_gain", self.pilot.approach_gain),
        ];
        for (name, value) in rates {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScenarioError::ValidationError(format!("{} must be positive", name)));
            }
        }
        if self.sim.max_steps == 0 {
            return Err(ScenarioError::ValidationError("max_steps must be positive".to_string()));
        }

        if self.tracks.is_empty() {
            return Err(ScenarioError::ValidationError("at least one track is required".to_string()));
        }

        for track in &self.tracks {
            if !(track.timeout_s.is_finite() && track.timeout_s > 0.0) {
                return Err(ScenarioError::ValidationError(format!(
                    "Track {} timeout {} must be positive",
                    track.id, track.timeout_s
                )));
            }
        }

        Ok(())
    }

    /// シミュレーション定数へ変換
    pub fn constants(&self) -> SimulationConstants {
        SimulationConstants {
            dt: self.sim.dt_s,
            speed_rate: self.sim.speed_rate_mps2,
            rotation_rate: math_utils::deg_to_rad(self.sim.rotation_rate_deg_s),
        }
    }

    /// 操縦ロジックを作成
    pub fn pilot(&self) -> WaypointPilot {
        WaypointPilot::new(self.pilot.cruise_speed_mps, self.pilot.approach_gain)
    }

    /// トラック列へ変換
    pub fn to_tracks(&self) -> Result<Vec<Track>, ScenarioError> {
        self.tracks
            .iter()
            .map(|track_config| {
                let rings = track_config
                    .rings
                    .iter()
                    .map(|ring| {
                        Ring::new(
                            ring.position.into(),
                            ring.rotation.into(),
                            Vector3D::new(ring.scale.x, ring.scale.y, ring.scale.z),
                            ring.height_m,
                            ring.hole_radius_m,
                            ring.complexity,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ScenarioError::Model(track_config.id.clone(), e))?;

                let track = Track::new(
                    track_config.start.into(),
                    track_config.end.into(),
                    rings,
                    track_config.timeout_s,
                )
                .map_err(|e| ScenarioError::Model(track_config.id.clone(), e))?;

                Ok(track.with_name(track_config.id.clone()))
            })
            .collect()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("速度収束レート: {:.1}m/s²", self.sim.speed_rate_mps2);
        println!("回転収束レート: {:.1}度/秒", self.sim.rotation_rate_deg_s);
        println!("最大ステップ数: {}", self.sim.max_steps);
        println!();

        println!("=== トラック ===");
        println!("トラック数: {}", self.tracks.len());
        let total_rings: usize = self.tracks.iter().map(|t| t.rings.len()).sum();
        println!("総リング数: {}", total_rings);

        for track in &self.tracks {
            println!(
                "  {}: リング {}個 (制限時間: {:.1}秒)",
                track.id,
                track.rings.len(),
                track.timeout_s
            );
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
    Model(String, ModelError),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
            ScenarioError::Model(track_id, err) => {
                write!(f, "トラック {} の構築エラー: {}", track_id, err)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}
