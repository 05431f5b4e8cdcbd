//! 控制层错误类型定义

use crate::command::CommandType;
use cartesian_kinematics::KinematicsError;
use std::time::Duration;
use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 缺少必需的配置参数
    #[error("Missing required parameter '{name}'")]
    MissingParameter { name: &'static str },

    /// 配置内容无效
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 硬件层没有该关节的句柄
    #[error("No hardware handle for joint '{joint}'")]
    UnknownHardwareHandle { joint: String },

    /// 控制器的命令类型与配置不一致
    #[error("Command type mismatch: controller writes {expected} commands, configuration requests {configured}")]
    CommandTypeMismatch {
        expected: CommandType,
        configured: CommandType,
    },

    /// 控制器尚未初始化
    #[error("Controller is not initialized")]
    NotInitialized,

    /// 控制周期无效（必须 > 0）
    ///
    /// 说明调度器已损坏，调用方应当终止控制循环。
    #[error("Invalid control period: {0:?} (must be > 0)")]
    InvalidPeriod(Duration),

    /// 输入或中间结果含 NaN / 无穷大
    #[error("Non-finite {what} rejected")]
    NonFiniteInput { what: &'static str },

    /// 运动学错误（坐标系解析失败、维度不一致等）
    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    /// 读取配置文件失败
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// 解析配置文件失败
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ControlError {
    /// 是否为配置类错误（初始化阶段致命）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ControlError::MissingParameter { .. }
                | ControlError::Configuration(_)
                | ControlError::UnknownHardwareHandle { .. }
                | ControlError::CommandTypeMismatch { .. }
                | ControlError::Io(_)
                | ControlError::Toml(_)
        )
    }
}
