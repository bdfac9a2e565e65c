use crate::models::common::{ModelError, Vector3D};
use crate::models::ring::Ring;

/// 飛行トラック
///
/// スタート地点、ゴール地点、その間に順番に通過するリング列から構成されます。
/// スタート地点はドローンの初期位置であり、到達すべきウェイポイントには含まれません。
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    name: String,
    start: Vector3D,
    end: Vector3D,
    rings: Vec<Ring>,
    /// トラックの制限時間（秒）
    timeout_s: f64,
}

impl Track {
    /// 新しいTrackインスタンスを作成
    ///
    /// # 引数
    ///
    /// * `start` - スタート地点
    /// * `end` - ゴール地点
    /// * `rings` - 通過順に並んだリング（空でもよい）
    /// * `timeout_s` - 制限時間（秒、正の有限値）
    pub fn new(
        start: Vector3D,
        end: Vector3D,
        rings: Vec<Ring>,
        timeout_s: f64,
    ) -> Result<Self, ModelError> {
        if !start.is_finite() {
            return Err(ModelError::NonFiniteCoordinate("track.start"));
        }
        if !end.is_finite() {
            return Err(ModelError::NonFiniteCoordinate("track.end"));
        }
        if !(timeout_s.is_finite() && timeout_s > 0.0) {
            return Err(ModelError::InvalidTimeout(timeout_s));
        }

        Ok(Self {
            name: String::new(),
            start,
            end,
            rings,
            timeout_s,
        })
    }

    /// 表示名を設定
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> Vector3D {
        self.start
    }

    pub fn end(&self) -> Vector3D {
        self.end
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn timeout_s(&self) -> f64 {
        self.timeout_s
    }

    /// 到達すべきウェイポイント列（リング位置を順に並べ、最後にゴール）
    pub fn waypoints(&self) -> Vec<Vector3D> {
        self.rings
            .iter()
            .map(Ring::position)
            .chain(std::iter::once(self.end))
            .collect()
    }

    /// トラック長（リング数 + スタート + ゴール）
    pub fn len(&self) -> usize {
        self.rings.len() + 2
    }

    /// スタートとゴールを常に持つため空にはならない
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Track {} -> {} ({} rings)",
            self.start,
            self.end,
            self.rings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoints_exclude_start() {
        let rings = vec![
            Ring::at(Vector3D::new(0.0, 0.0, 10.0)).unwrap(),
            Ring::at(Vector3D::new(5.0, 0.0, 15.0)).unwrap(),
        ];
        let track = Track::new(
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(0.0, 0.0, 20.0),
            rings,
            30.0,
        )
        .unwrap();

        assert_eq!(
            track.waypoints(),
            vec![
                Vector3D::new(0.0, 0.0, 10.0),
                Vector3D::new(5.0, 0.0, 15.0),
                Vector3D::new(0.0, 0.0, 20.0),
            ]
        );
        assert_eq!(track.len(), 4);
    }

    #[test]
    fn test_empty_track_has_single_waypoint() {
        let track = Track::new(Vector3D::default(), Vector3D::new(1.0, 1.0, 1.0), Vec::new(), 5.0)
            .unwrap()
            .with_name("empty");
        assert_eq!(track.waypoints(), vec![Vector3D::new(1.0, 1.0, 1.0)]);
        assert_eq!(track.len(), 2);
        assert_eq!(track.name(), "empty");
    }

    #[test]
    fn test_timeout_must_be_positive() {
        for timeout in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(Track::new(Vector3D::default(), Vector3D::default(), Vec::new(), timeout).is_err());
        }
    }
}
