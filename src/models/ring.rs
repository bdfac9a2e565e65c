use crate::models::common::{ModelError, Rotator3D, Vector3D};

/// トラック上のリング（通過ウェイポイント）
///
/// シミュレーションでは位置のみを使用します。回転・スケール・高さ・
/// 穴の半径・分割数は描画側のための形状情報です。
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    position: Vector3D,
    rotation: Rotator3D,
    scale: Vector3D,
    height: f64,
    hole_radius: f64,
    complexity: u32,
}

impl Ring {
    /// リングの最小分割数
    pub const MIN_COMPLEXITY: u32 = 2;

    /// 新しいRingインスタンスを作成
    ///
    /// # 引数
    ///
    /// * `position` - リング中心位置
    /// * `rotation` - リングの向き
    /// * `scale` - 各軸方向のスケール
    /// * `height` - リングの厚み（> 0）
    /// * `hole_radius` - 穴の半径（> 0）
    /// * `complexity` - メッシュ分割数（>= 2）
    ///
    /// # 戻り値
    ///
    /// 検証済みのリング、またはどのパラメータが不正かを示すエラー
    pub fn new(
        position: Vector3D,
        rotation: Rotator3D,
        scale: Vector3D,
        height: f64,
        hole_radius: f64,
        complexity: u32,
    ) -> Result<Self, ModelError> {
        if !position.is_finite() {
            return Err(ModelError::NonFiniteCoordinate("ring.position"));
        }
        if !rotation.is_finite() {
            return Err(ModelError::NonFiniteCoordinate("ring.rotation"));
        }
        if !scale.is_finite() {
            return Err(ModelError::NonFiniteCoordinate("ring.scale"));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(ModelError::InvalidRing { field: "height", value: height });
        }
        if !(hole_radius.is_finite() && hole_radius > 0.0) {
            return Err(ModelError::InvalidRing { field: "hole_radius", value: hole_radius });
        }
        if complexity < Self::MIN_COMPLEXITY {
            return Err(ModelError::InvalidRing { field: "complexity", value: complexity as f64 });
        }

        Ok(Self {
            position,
            rotation,
            scale,
            height,
            hole_radius,
            complexity,
        })
    }

    /// 位置以外を既定値（無回転、等倍、高さ1、半径5、分割数50）としたリング
    pub fn at(position: Vector3D) -> Result<Self, ModelError> {
        Self::new(
            position,
            Rotator3D::default(),
            Vector3D::new(1.0, 1.0, 1.0),
            1.0,
            5.0,
            50,
        )
    }

    pub fn position(&self) -> Vector3D {
        self.position
    }

    pub fn rotation(&self) -> Rotator3D {
        self.rotation
    }

    pub fn scale(&self) -> Vector3D {
        self.scale
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn hole_radius(&self) -> f64 {
        self.hole_radius
    }

    pub fn complexity(&self) -> u32 {
        self.complexity
    }
}
