//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use cartesian_control::prelude::*;
//! ```

pub use crate::command::{CommandType, CommandWriter, PositionWriter, VelocityWriter};
pub use crate::config::ControllerConfig;
pub use crate::controller::{CartesianController, ControllerState};
pub use crate::error::ControlError;
pub use crate::hardware::{HardwareInterface, JointHandle};
pub use crate::pid::{PidGains, SpatialGains};

pub use nalgebra::{Isometry3, Matrix6, Vector6};
pub use std::time::Duration;
