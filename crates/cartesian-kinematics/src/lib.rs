//! # Cartesian Kinematics
//!
//! 串联机构的运动学层：
//!
//! - `chain` - 运动链模型（segment、关节类型、限位、子链截取）
//! - `fk` - 正运动学求解器（任意命名坐标系的位姿）
//! - `jacobian` - tip 几何雅可比矩阵（预分配缓冲区）
//!
//! 本 crate 不依赖控制层，只提供纯函数式的几何计算。

pub mod chain;
pub mod error;
pub mod fk;
pub mod jacobian;

// 重新导出常用类型
pub use chain::{JointKind, JointLimits, KinematicChain, Segment, origin_from_xyz_rpy};
pub use error::KinematicsError;
pub use fk::ForwardKinematicsSolver;
