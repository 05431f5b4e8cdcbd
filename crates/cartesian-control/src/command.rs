//! 关节指令输出
//!
//! 每个控制器实例在编译期固定一种命令类型：
//!
//! - [`PositionWriter`]: 写入仿真关节位置（位置接口硬件）
//! - [`VelocityWriter`]: 写入仿真关节速度（速度接口硬件）
//!
//! 命令类型是 `CartesianController` 的类型参数，运行期不可切换。

use crate::dynamics::JointMotion;
use crate::hardware::JointHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 硬件命令类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// 位置指令
    Position,
    /// 速度指令
    Velocity,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandType::Position => write!(f, "position"),
            CommandType::Velocity => write!(f, "velocity"),
        }
    }
}

/// 指令输出策略
pub trait CommandWriter {
    /// 该策略对应的命令类型
    const COMMAND_TYPE: CommandType;

    /// 将仿真关节运动写入硬件句柄（按链顺序一一对应）
    fn write<H: JointHandle>(handles: &mut [H], motion: &JointMotion);
}

/// 位置指令输出
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionWriter;

impl CommandWriter for PositionWriter {
    const COMMAND_TYPE: CommandType = CommandType::Position;

    fn write<H: JointHandle>(handles: &mut [H], motion: &JointMotion) {
        for (handle, position) in handles.iter_mut().zip(motion.positions.iter()) {
            handle.set_command(*position);
        }
    }
}

/// 速度指令输出
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityWriter;

impl CommandWriter for VelocityWriter {
    const COMMAND_TYPE: CommandType = CommandType::Velocity;

    fn write<H: JointHandle>(handles: &mut [H], motion: &JointMotion) {
        for (handle, velocity) in handles.iter_mut().zip(motion.velocities.iter()) {
            handle.set_command(*velocity);
        }
    }
}
