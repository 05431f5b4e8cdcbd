//! Forward Dynamics Solver - 关节空间运动仿真
//!
//! 维护一个内部的关节位置/速度仿真状态，把 tip 处的期望笛卡尔速度
//! 转换为关节指令，并保证关节位置不越过限位。
//!
//! # 每个周期
//!
//! ```text
//! J      = jacobian(q)                      // 上一周期稳定后的关节位置
//! q̇      = Jᵀ (J Jᵀ + λ² I)⁻¹ ẋ             // 阻尼最小二乘
//! q_new  = clamp(q + q̇ · dt, lower, upper)
//! q̇_out  = q̇                                // 未触限
//!        = (q_limit - q) / dt               // 触限：恰好到达限位的速度
//! ```
//!
//! 所有缓冲区在构造时分配，控制周期内不产生堆分配。
//!
//! # 重新锚定
//!
//! 每次控制器 `start` 时调用 [`ForwardDynamicsSolver::set_start_state`]，
//! 用硬件实测状态覆盖仿真状态，避免暂停期间或首个周期之前的指令漂移。

use crate::error::ControlError;
use crate::hardware::JointHandle;
use cartesian_kinematics::{ForwardKinematicsSolver, JointLimits, KinematicChain, KinematicsError};
use nalgebra::{DVector, Matrix6, Matrix6xX, Vector6};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// 默认阻尼系数 λ
pub const DEFAULT_DAMPING: f64 = 1e-3;

/// SVD 伪逆的奇异值阈值
const SINGULAR_VALUE_EPS: f64 = 1e-12;

/// 求解器配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// 阻尼最小二乘的阻尼系数 λ（≥ 0）
    pub damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            damping: DEFAULT_DAMPING,
        }
    }
}

/// 仿真关节运动（位置 + 速度），按链顺序排列
#[derive(Debug, Clone, PartialEq)]
pub struct JointMotion {
    pub positions: DVector<f64>,
    pub velocities: DVector<f64>,
}

impl JointMotion {
    /// 全零运动
    pub fn zeros(dof: usize) -> Self {
        JointMotion {
            positions: DVector::zeros(dof),
            velocities: DVector::zeros(dof),
        }
    }

    /// 关节数
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// 正向动力学求解器
#[derive(Debug, Clone)]
pub struct ForwardDynamicsSolver {
    fk: ForwardKinematicsSolver,
    limits: Vec<JointLimits>,
    config: SolverConfig,
    jacobian: Matrix6xX<f64>,
    motion: JointMotion,
}

impl ForwardDynamicsSolver {
    /// 创建求解器并分配全部缓冲区
    ///
    /// # 错误
    ///
    /// [`ControlError::Configuration`]: 阻尼系数为负数或非有限值
    pub fn new(chain: Arc<KinematicChain>, config: SolverConfig) -> Result<Self, ControlError> {
        if !config.damping.is_finite() || config.damping < 0.0 {
            return Err(ControlError::Configuration(format!(
                "Invalid solver damping: {} (must be finite and >= 0)",
                config.damping
            )));
        }

        let dof = chain.dof();
        let limits = chain.limits().collect();
        let fk = ForwardKinematicsSolver::new(chain);
        let jacobian = fk.jacobian_buffer();

        Ok(ForwardDynamicsSolver {
            fk,
            limits,
            config,
            jacobian,
            motion: JointMotion::zeros(dof),
        })
    }

    /// 自由度
    pub fn dof(&self) -> usize {
        self.motion.len()
    }

    /// 用硬件实测状态重置仿真状态
    ///
    /// # 错误
    ///
    /// 句柄数量与自由度不一致时返回 [`KinematicsError::DimensionMismatch`]。
    pub fn set_start_state<H: JointHandle>(&mut self, joints: &[H]) -> Result<(), ControlError> {
        if joints.len() != self.dof() {
            return Err(KinematicsError::DimensionMismatch {
                expected: self.dof(),
                actual: joints.len(),
            }
            .into());
        }

        for (i, joint) in joints.iter().enumerate() {
            self.motion.positions[i] = joint.position();
            self.motion.velocities[i] = joint.velocity();
        }

        tracing::debug!(
            "Simulation re-anchored to measured state: {:?}",
            self.motion.positions.as_slice()
        );
        Ok(())
    }

    /// 推进一个周期，返回新的仿真关节运动
    ///
    /// # 参数
    ///
    /// - `period`: 控制周期（必须 > 0）
    /// - `cartesian_velocity`: tip 处期望笛卡尔速度（base 坐标系）
    ///
    /// # 错误
    ///
    /// [`ControlError::InvalidPeriod`]: 周期为零，此时状态不变
    pub fn get_joint_control_cmds(
        &mut self,
        period: Duration,
        cartesian_velocity: &Vector6<f64>,
    ) -> Result<&JointMotion, ControlError> {
        if period.is_zero() {
            return Err(ControlError::InvalidPeriod(period));
        }
        let dt = period.as_secs_f64();

        self.fk.jacobian(self.motion.positions.as_slice(), &mut self.jacobian)?;
        let task = self.solve_task_space(cartesian_velocity);

        for i in 0..self.dof() {
            let velocity = self.jacobian.column(i).dot(&task);
            let previous = self.motion.positions[i];
            let integrated = previous + velocity * dt;
            let clamped = self.limits[i].clamp(integrated);

            self.motion.positions[i] = clamped;
            self.motion.velocities[i] = if clamped == integrated {
                velocity
            } else {
                (clamped - previous) / dt
            };
        }

        tracing::trace!(
            "Integrated joint motion: q = {:?}",
            self.motion.positions.as_slice()
        );
        Ok(&self.motion)
    }

    /// 求解 `(J Jᵀ + λ² I) y = ẋ`，关节速度为 `q̇ = Jᵀ y`
    fn solve_task_space(&self, cartesian_velocity: &Vector6<f64>) -> Vector6<f64> {
        let mut jjt = Matrix6::zeros();
        for column in self.jacobian.column_iter() {
            jjt += column * column.transpose();
        }
        let damping = self.config.damping;
        jjt += Matrix6::identity() * (damping * damping);

        if let Some(cholesky) = jjt.cholesky() {
            return cholesky.solve(cartesian_velocity);
        }

        // λ = 0 且 J 不满秩：退化为伪逆
        match jjt.svd(true, true).solve(cartesian_velocity, SINGULAR_VALUE_EPS) {
            Ok(task) => task,
            Err(reason) => {
                tracing::warn!("Task-space solve failed ({}), commanding zero joint velocity", reason);
                Vector6::zeros()
            },
        }
    }

    /// 当前仿真关节位置（供正运动学使用）
    pub fn positions(&self) -> &[f64] {
        self.motion.positions.as_slice()
    }

    /// 当前仿真关节速度
    pub fn velocities(&self) -> &[f64] {
        self.motion.velocities.as_slice()
    }

    /// 当前仿真关节运动
    pub fn motion(&self) -> &JointMotion {
        &self.motion
    }

    /// 关节限位（按链顺序）
    pub fn limits(&self) -> &[JointLimits] {
        &self.limits
    }

    /// 求解器配置
    pub fn config(&self) -> SolverConfig {
        self.config
    }
}
