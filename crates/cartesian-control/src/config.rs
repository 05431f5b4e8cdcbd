//! # 控制器配置
//!
//! 从 TOML 加载控制器配置：运动链描述、关节列表、PID 增益、命令类型等。
//!
//! ```toml
//! base_frame = "base_link"
//! tip_frame = "tool0"
//! joints = ["shoulder", "elbow"]
//! command_type = "position"
//! period_ms = 2.0
//!
//! [solver]
//! damping = 0.001
//!
//! [gains.trans_x]
//! p = 5.0
//!
//! [[segments]]
//! joint = "shoulder"
//! link = "upper_arm"
//! kind = "revolute"
//! axis = [0.0, 0.0, 1.0]
//! limits = { lower = -1.5, upper = 1.5 }
//! ```
//!
//! 字符串类参数缺省为空，在 [`ControllerConfig::validate`] 中统一报告
//! [`ControlError::MissingParameter`]，与硬件初始化阶段的错误处理一致。

use crate::command::CommandType;
use crate::dynamics::SolverConfig;
use crate::error::ControlError;
use crate::pid::SpatialGains;
use cartesian_kinematics::{JointLimits, KinematicChain, Segment, origin_from_xyz_rpy};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 默认控制周期（毫秒）
pub const DEFAULT_PERIOD_MS: f64 = 2.0;

fn default_period_ms() -> f64 {
    DEFAULT_PERIOD_MS
}

/// 配置文件中的关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    #[default]
    Revolute,
    Prismatic,
    Fixed,
}

/// 关节限位
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub lower: f64,
    pub upper: f64,
}

/// 运动链中的一个 segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// 关节名称
    pub joint: String,
    /// 子坐标系名称
    pub link: String,
    #[serde(default)]
    pub kind: SegmentKind,
    /// 关节轴（关节坐标系）
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    /// 父坐标系到关节坐标系的平移（米）
    #[serde(default)]
    pub origin_xyz: [f64; 3],
    /// 父坐标系到关节坐标系的旋转（roll, pitch, yaw）
    #[serde(default)]
    pub origin_rpy: [f64; 3],
    /// 位置限位（缺省为无限位）
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
}

fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

impl SegmentConfig {
    fn to_segment(&self) -> Segment {
        let axis = Vector3::from(self.axis);
        let origin = origin_from_xyz_rpy(self.origin_xyz, self.origin_rpy);
        let segment = match self.kind {
            SegmentKind::Revolute => Segment::revolute(&self.joint, &self.link, axis, origin),
            SegmentKind::Prismatic => Segment::prismatic(&self.joint, &self.link, axis, origin),
            SegmentKind::Fixed => Segment::fixed(&self.joint, &self.link, origin),
        };
        match self.limits {
            Some(limits) => segment.with_limits(JointLimits::new(limits.lower, limits.upper)),
            None => segment,
        }
    }
}

/// 控制器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// 机器人描述的根坐标系（缺省与 `base_frame` 相同）
    #[serde(default)]
    pub root_frame: Option<String>,

    /// 控制器的基坐标系（误差和笛卡尔速度在此坐标系中表示）
    #[serde(default)]
    pub base_frame: String,

    /// 末端坐标系
    #[serde(default)]
    pub tip_frame: String,

    /// 受控关节名称（必须与 base → tip 子链的可驱动关节顺序一致）
    #[serde(default)]
    pub joints: Vec<String>,

    /// 命令类型
    #[serde(default)]
    pub command_type: Option<CommandType>,

    /// 控制周期（毫秒）
    #[serde(default = "default_period_ms")]
    pub period_ms: f64,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub gains: SpatialGains,

    /// 机器人描述：从根坐标系开始的串联 segment 列表
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

impl ControllerConfig {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self, ControlError> {
        Ok(toml::from_str(content)?)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ControlError> {
        let content = fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded controller configuration from {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ControlError> {
        toml::to_string_pretty(self).map_err(|e| ControlError::Configuration(e.to_string()))
    }

    /// 校验必需参数
    ///
    /// # 错误
    ///
    /// - [`ControlError::MissingParameter`]: 缺少 `base_frame`、`tip_frame`、
    ///   `joints`、`command_type` 或 `segments`
    /// - [`ControlError::Configuration`]: 周期、增益等数值无效
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.base_frame.is_empty() {
            return Err(ControlError::MissingParameter { name: "base_frame" });
        }
        if self.tip_frame.is_empty() {
            return Err(ControlError::MissingParameter { name: "tip_frame" });
        }
        if self.joints.is_empty() {
            return Err(ControlError::MissingParameter { name: "joints" });
        }
        if self.command_type.is_none() {
            return Err(ControlError::MissingParameter { name: "command_type" });
        }
        if self.segments.is_empty() {
            return Err(ControlError::MissingParameter { name: "segments" });
        }

        self.period()?;

        let names = ["trans_x", "trans_y", "trans_z", "rot_x", "rot_y", "rot_z"];
        for (name, gains) in names.iter().zip(self.gains.as_array()) {
            if ![gains.p, gains.i, gains.d, gains.i_clamp].iter().all(|v| v.is_finite()) {
                return Err(ControlError::Configuration(format!(
                    "Non-finite PID gains for axis {}",
                    name
                )));
            }
        }

        Ok(())
    }

    /// 命令类型（校验后必定存在）
    pub fn command_type(&self) -> Result<CommandType, ControlError> {
        self.command_type.ok_or(ControlError::MissingParameter { name: "command_type" })
    }

    /// 控制周期
    ///
    /// # 错误
    ///
    /// [`ControlError::Configuration`]: `period_ms` 非有限、非正、超出 `Duration`
    /// 范围，或换算后为零（小于 1 ns）
    pub fn period(&self) -> Result<Duration, ControlError> {
        let invalid = || {
            ControlError::Configuration(format!(
                "Invalid period_ms: {} (must be a positive duration of at least 1 ns)",
                self.period_ms
            ))
        };

        if self.period_ms.is_nan() || self.period_ms <= 0.0 {
            return Err(invalid());
        }
        let period = Duration::try_from_secs_f64(self.period_ms / 1000.0).map_err(|_| invalid())?;
        if period.is_zero() {
            return Err(invalid());
        }
        Ok(period)
    }

    /// 构建 `base_frame → tip_frame` 运动链
    ///
    /// 先由 `segments` 构建完整描述，再截取子链，最后确认 `joints`
    /// 与子链的可驱动关节一一对应。
    pub fn build_chain(&self) -> Result<Arc<KinematicChain>, ControlError> {
        self.validate()?;

        let root = self.root_frame.as_deref().unwrap_or(&self.base_frame);
        let model = KinematicChain::new(root, self.segments.iter().map(SegmentConfig::to_segment).collect())?;
        let chain = model.sub_chain(&self.base_frame, &self.tip_frame)?;

        let chain_joints: Vec<&str> = chain.joint_names().collect();
        if chain_joints.len() != self.joints.len() || chain_joints.iter().zip(&self.joints).any(|(a, b)| a != b) {
            return Err(ControlError::Configuration(format!(
                "Joint list {:?} does not match the actuated joints of chain {} -> {}: {:?}",
                self.joints, self.base_frame, self.tip_frame, chain_joints
            )));
        }

        Ok(Arc::new(chain))
    }
}
