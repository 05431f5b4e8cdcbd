//! 运动学层错误类型定义

use thiserror::Error;

/// 运动学层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// 坐标系名称不在运动链中
    #[error("Frame '{frame}' is not part of the kinematic chain")]
    FrameNotFound { frame: String },

    /// 坐标系名称重复
    #[error("Duplicate frame name '{frame}' in kinematic chain")]
    DuplicateFrame { frame: String },

    /// 可驱动关节名称重复
    #[error("Duplicate actuated joint name '{joint}' in kinematic chain")]
    DuplicateJoint { joint: String },

    /// 运动链为空（base 与 tip 之间没有任何 segment）
    #[error("Kinematic chain has no segments")]
    EmptyChain,

    /// 关节限位无效（lower > upper 或 NaN）
    #[error("Invalid limits for joint '{joint}': lower {lower} > upper {upper}")]
    InvalidLimits { joint: String, lower: f64, upper: f64 },

    /// 关节轴长度为零
    #[error("Joint '{joint}' has a zero-length axis")]
    InvalidAxis { joint: String },

    /// 输入维度与运动链自由度不一致
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// tip 坐标系位于 base 坐标系之前
    #[error("Tip frame '{tip}' does not come after base frame '{base}'")]
    TipBeforeBase { base: String, tip: String },
}
