use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// 3次元位置（ベクトル）を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 3次元距離を計算
    pub fn distance(&self, other: &Vector3D) -> f64 {
        (*self - *other).magnitude()
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 内積
    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// ベクトルを正規化（長さ0の場合はそのまま返す）
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag, self.z / mag)
        } else {
            *self
        }
    }

    /// 全成分が有限値かどうか
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// x, y, z の順で成分を返すイテレータ
    pub fn iter(&self) -> std::array::IntoIter<f64, 3> {
        self.to_array().into_iter()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl IntoIterator for Vector3D {
    type Item = f64;
    type IntoIter = std::array::IntoIter<f64, 3>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_array().into_iter()
    }
}

impl std::fmt::Display for Vector3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// 3次元回転（ラジアン）を表す構造体
///
/// 各成分は正規化されません。機体前方軸 (1, 0, 0) に対して
/// `Rz(z)·Ry(y)·Rx(x)` の順で適用される回転として解釈します。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator3D {
    pub x: f64, // rad (roll)
    pub y: f64, // rad (pitch)
    pub z: f64, // rad (yaw)
}

impl Rotator3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 回転の差の大きさ
    pub fn distance(&self, other: &Rotator3D) -> f64 {
        let diff = *self - *other;
        (diff.x.powi(2) + diff.y.powi(2) + diff.z.powi(2)).sqrt()
    }

    /// 回転から機首方向の単位ベクトルを計算
    ///
    /// ロール成分（x）は前方軸まわりの回転なので方向には影響しません。
    pub fn heading(&self) -> Vector3D {
        Vector3D::new(
            self.y.cos() * self.z.cos(),
            self.y.cos() * self.z.sin(),
            -self.y.sin(),
        )
    }

    /// 指定方向を向く回転を計算（`heading` の逆変換、ロールは0）
    ///
    /// 長さ0の方向が与えられた場合は無回転を返します。
    pub fn facing(direction: Vector3D) -> Self {
        let unit = direction.normalize();
        if unit.magnitude() == 0.0 {
            return Self::default();
        }
        let pitch = -unit.z.clamp(-1.0, 1.0).asin();
        let yaw = if unit.x.abs() > 1e-12 || unit.y.abs() > 1e-12 {
            unit.y.atan2(unit.x)
        } else {
            0.0
        };
        Self::new(0.0, pitch, yaw)
    }

    /// 全成分が有限値かどうか
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// x, y, z の順で成分を返すイテレータ
    pub fn iter(&self) -> std::array::IntoIter<f64, 3> {
        self.to_array().into_iter()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Rotator3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Rotator3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl IntoIterator for Rotator3D {
    type Item = f64;
    type IntoIter = std::array::IntoIter<f64, 3>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_array().into_iter()
    }
}

impl std::fmt::Display for Rotator3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// シミュレーション定数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConstants {
    /// 1ティックの時間刻み（秒）
    pub dt: f64,
    /// 速度の収束レート（m/s²）
    pub speed_rate: f64,
    /// 回転の収束レート（rad/s）
    pub rotation_rate: f64,
}

impl SimulationConstants {
    /// 1ティックあたりの最大速度変化量
    pub fn max_speed_delta(&self) -> f64 {
        self.speed_rate * self.dt
    }

    /// 1ティックあたりの各軸の最大回転量
    pub fn max_rotation_delta(&self) -> f64 {
        self.rotation_rate * self.dt
    }
}

impl Default for SimulationConstants {
    fn default() -> Self {
        Self {
            dt: 0.1,
            speed_rate: 10.0,
            rotation_rate: std::f64::consts::FRAC_PI_2,
        }
    }
}

/// モデル構築時の検証エラー
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// リングのパラメータが範囲外
    InvalidRing { field: &'static str, value: f64 },
    /// トラックのタイムアウトが正の有限値でない
    InvalidTimeout(f64),
    /// 座標に NaN / 無限大が含まれる
    NonFiniteCoordinate(&'static str),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::InvalidRing { field, value } => {
                write!(f, "リングのパラメータが不正です: {} = {}", field, value)
            }
            ModelError::InvalidTimeout(value) => {
                write!(f, "トラックのタイムアウトは正の値である必要があります: {}", value)
            }
            ModelError::NonFiniteCoordinate(field) => {
                write!(f, "座標に有限でない値が含まれています: {}", field)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 現在値を目標値へ最大 `max_delta` だけ近づける
    ///
    /// 目標値を追い越すことはなく、変化は単調です。
    pub fn approach(current: f64, target: f64, max_delta: f64) -> f64 {
        if current < target {
            (current + max_delta).min(target)
        } else {
            (current - max_delta).max(target)
        }
    }

    /// 角度を -π〜π の範囲に正規化（ラジアン）
    pub fn normalize_angle(angle_rad: f64) -> f64 {
        use std::f64::consts::PI;
        let mut normalized = angle_rad % (2.0 * PI);
        if normalized > PI {
            normalized -= 2.0 * PI;
        } else if normalized <= -PI {
            normalized += 2.0 * PI;
        }
        normalized
    }

    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees.to_radians()
    }
}
