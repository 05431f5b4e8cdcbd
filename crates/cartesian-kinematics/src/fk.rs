//! 正运动学求解器
//!
//! 根据关节位置计算运动链中任意命名坐标系相对于 base 的位姿。
//!
//! 求解器只持有共享的运动链（`Arc<KinematicChain>`），没有可变状态，
//! 克隆代价为一次引用计数递增。

use crate::chain::KinematicChain;
use crate::error::KinematicsError;
use nalgebra::{Isometry3, UnitQuaternion};
use std::sync::Arc;

/// 正运动学求解器
#[derive(Debug, Clone)]
pub struct ForwardKinematicsSolver {
    chain: Arc<KinematicChain>,
}

impl ForwardKinematicsSolver {
    /// 创建求解器
    pub fn new(chain: Arc<KinematicChain>) -> Self {
        ForwardKinematicsSolver { chain }
    }

    /// 共享的运动链
    pub fn chain(&self) -> &Arc<KinematicChain> {
        &self.chain
    }

    /// 计算命名坐标系相对于 base 的位姿
    ///
    /// # 错误
    ///
    /// - [`KinematicsError::DimensionMismatch`]: `q.len()` 与自由度不一致
    /// - [`KinematicsError::FrameNotFound`]: `frame` 不在运动链中
    pub fn pose(&self, q: &[f64], frame: &str) -> Result<Isometry3<f64>, KinematicsError> {
        self.check_dimension(q)?;
        let index = self.chain.frame_index(frame).ok_or_else(|| KinematicsError::FrameNotFound {
            frame: frame.to_string(),
        })?;
        Ok(self.pose_at(q, index))
    }

    /// 只计算姿态（base ← frame 的旋转）
    pub fn rotation(&self, q: &[f64], frame: &str) -> Result<UnitQuaternion<f64>, KinematicsError> {
        self.pose(q, frame).map(|pose| pose.rotation)
    }

    /// tip 坐标系位姿
    pub fn tip_pose(&self, q: &[f64]) -> Result<Isometry3<f64>, KinematicsError> {
        self.check_dimension(q)?;
        Ok(self.pose_at(q, self.chain.segments().len()))
    }

    pub(crate) fn check_dimension(&self, q: &[f64]) -> Result<(), KinematicsError> {
        if q.len() != self.chain.dof() {
            return Err(KinematicsError::DimensionMismatch {
                expected: self.chain.dof(),
                actual: q.len(),
            });
        }
        Ok(())
    }

    /// 组合前 `index` 个 segment 的变换（调用方保证维度正确）
    pub(crate) fn pose_at(&self, q: &[f64], index: usize) -> Isometry3<f64> {
        let mut transform = Isometry3::identity();
        let mut positions = q.iter();

        for segment in &self.chain.segments()[..index] {
            transform *= segment.origin();
            let position = if segment.is_actuated() {
                positions.next().copied().unwrap_or(0.0)
            } else {
                0.0
            };
            transform *= segment.joint_transform(position);
        }

        transform
    }
}
