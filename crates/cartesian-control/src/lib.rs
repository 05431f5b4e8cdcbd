//! # Cartesian Control
//!
//! 实时笛卡尔运动控制器：把六维笛卡尔误差转换为关节位置或速度指令。
//!
//! # 架构
//!
//! - **PID 层** (`pid`): 六个独立的单轴 PID，输出笛卡尔速度
//! - **动力学层** (`dynamics`): 正向动力学仿真，把笛卡尔速度积分为关节运动并施加限位
//! - **坐标变换** (`frames`): 6 维量和 6×6 张量的坐标系旋转
//! - **输出层** (`command`): 编译期选择的位置/速度指令写入策略
//! - **编排层** (`controller`): 生命周期管理和每周期调度
//!
//! 运动学（运动链、正运动学、雅可比）由 `cartesian-kinematics` 提供。
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use cartesian_control::prelude::*;
//!
//! let config = ControllerConfig::load("controller.toml")?;
//! let mut controller: CartesianController<_, VelocityWriter> = CartesianController::new();
//! controller.initialize(&config, &mut hardware)?;
//! controller.start(Duration::ZERO)?;
//! controller.tick(&error, config.period()?)?;
//! ```

pub mod command;
pub mod config;
pub mod controller;
pub mod dynamics;
pub mod error;
pub mod frames;
pub mod hardware;
pub mod pid;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub mod prelude;

pub use command::{CommandType, CommandWriter, PositionWriter, VelocityWriter};
pub use config::{ControllerConfig, LimitsConfig, SegmentConfig, SegmentKind};
pub use controller::{CartesianController, ControllerState};
pub use dynamics::{ForwardDynamicsSolver, JointMotion, SolverConfig};
pub use error::ControlError;
pub use hardware::{HardwareInterface, JointHandle};
pub use pid::{Pid, PidGains, SpatialGains, SpatialPidController};

// 运动学层
pub use cartesian_kinematics::{ForwardKinematicsSolver, KinematicChain, KinematicsError};
