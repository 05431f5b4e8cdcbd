//! Cartesian Controller - 控制器编排层
//!
//! 持有六维 PID、正向动力学求解器和正运动学求解器，管理生命周期，
//! 并在每个控制周期内执行：
//!
//! ```text
//! error ──► SpatialPidController ──► ẋ ──► ForwardDynamicsSolver ──► JointMotion ──► CommandWriter
//! ```
//!
//! # 生命周期
//!
//! ```text
//! Uninitialized ──initialize──► Running ◄──resume── Paused
//!                                  │  ──pause──►
//!                                  └─ start：用实测状态重新锚定仿真
//! ```
//!
//! - `initialize` 幂等：已初始化时直接返回 `Ok(())`
//! - `pause` 不重置任何内部状态；暂停期间 `tick` 不写硬件、不修改仿真状态
//! - `resume` 不重新锚定：调用方需要同时冻结外部误差来源（目标坐标系），
//!   否则恢复后会产生漂移
//!
//! # 命令类型
//!
//! 命令类型是类型参数 `W`（[`PositionWriter`](crate::command::PositionWriter) 或
//! [`VelocityWriter`](crate::command::VelocityWriter)），编译期固定。
//!
//! # 示例
//!
//! ```rust,ignore
//! use cartesian_control::{CartesianController, ControllerConfig, PositionWriter};
//!
//! let config = ControllerConfig::load("controller.toml")?;
//! let mut controller: CartesianController<_, PositionWriter> = CartesianController::new();
//! controller.initialize(&config, &mut hardware)?;
//! controller.start(Duration::ZERO)?;
//!
//! loop {
//!     controller.tick(&error, config.period()?)?;
//! }
//! ```

use crate::command::CommandWriter;
use crate::config::ControllerConfig;
use crate::dynamics::{ForwardDynamicsSolver, JointMotion};
use crate::error::ControlError;
use crate::frames;
use crate::hardware::{HardwareInterface, JointHandle};
use crate::pid::{SpatialGains, SpatialPidController};
use cartesian_kinematics::{ForwardKinematicsSolver, KinematicChain};
use nalgebra::{Isometry3, Matrix6, UnitQuaternion, Vector6};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace};

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// 未初始化
    Uninitialized,
    /// 已初始化，正常运行
    Running,
    /// 已初始化，暂停
    Paused,
}

/// 初始化后才存在的部分
#[derive(Debug)]
struct ControllerCore<H> {
    chain: Arc<KinematicChain>,
    fk: ForwardKinematicsSolver,
    dynamics: ForwardDynamicsSolver,
    spatial: SpatialPidController,
    handles: Vec<H>,
    cartesian_input: Vector6<f64>,
}

/// 笛卡尔运动控制器
#[derive(Debug)]
pub struct CartesianController<H: JointHandle, W: CommandWriter> {
    state: ControllerState,
    core: Option<ControllerCore<H>>,
    _writer: PhantomData<fn() -> W>,
}

impl<H: JointHandle, W: CommandWriter> Default for CartesianController<H, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: JointHandle, W: CommandWriter> CartesianController<H, W> {
    /// 创建未初始化的控制器
    pub fn new() -> Self {
        CartesianController {
            state: ControllerState::Uninitialized,
            core: None,
            _writer: PhantomData,
        }
    }

    /// 初始化：构建运动链、解析硬件句柄、创建求解器
    ///
    /// 幂等：已初始化时直接返回 `Ok(())`，不重新读取配置。
    ///
    /// # 错误
    ///
    /// 配置缺失、运动链无法解析、命令类型不匹配或硬件句柄无法解析时返回错误，
    /// 控制器保持 `Uninitialized`。
    pub fn initialize<I>(&mut self, config: &ControllerConfig, hardware: &mut I) -> Result<(), ControlError>
    where
        I: HardwareInterface<Handle = H>,
    {
        if self.core.is_some() {
            debug!("Controller already initialized, ignoring initialize()");
            return Ok(());
        }

        let core = Self::build_core(config, hardware).inspect_err(|e| {
            error!("Failed to initialize Cartesian controller: {}", e);
        })?;

        info!(
            "Cartesian controller initialized: {} -> {} ({} joints, {} commands)",
            core.chain.base_frame(),
            core.chain.tip_frame(),
            core.handles.len(),
            W::COMMAND_TYPE
        );

        self.core = Some(core);
        self.state = ControllerState::Running;
        Ok(())
    }

    fn build_core<I>(config: &ControllerConfig, hardware: &mut I) -> Result<ControllerCore<H>, ControlError>
    where
        I: HardwareInterface<Handle = H>,
    {
        config.validate()?;

        let configured = config.command_type()?;
        if configured != W::COMMAND_TYPE {
            return Err(ControlError::CommandTypeMismatch {
                expected: W::COMMAND_TYPE,
                configured,
            });
        }

        let chain = config.build_chain()?;

        let handles = config
            .joints
            .iter()
            .map(|joint| {
                hardware
                    .handle(joint)
                    .ok_or_else(|| ControlError::UnknownHardwareHandle { joint: joint.clone() })
            })
            .collect::<Result<Vec<H>, _>>()?;

        let dynamics = ForwardDynamicsSolver::new(Arc::clone(&chain), config.solver)?;

        Ok(ControllerCore {
            fk: ForwardKinematicsSolver::new(Arc::clone(&chain)),
            chain,
            dynamics,
            spatial: SpatialPidController::new(config.gains),
            handles,
            cartesian_input: Vector6::zeros(),
        })
    }

    /// 启动：用硬件实测状态重新锚定仿真，进入运行状态
    pub fn start(&mut self, time: Duration) -> Result<(), ControlError> {
        let core = self.core.as_mut().ok_or(ControlError::NotInitialized)?;
        core.dynamics.set_start_state(&core.handles)?;
        self.state = ControllerState::Running;
        info!("Cartesian controller started at t={:?}", time);
        Ok(())
    }

    /// 暂停：之后的 `tick` 不再写硬件，内部状态保持不变
    pub fn pause(&mut self, time: Duration) -> Result<(), ControlError> {
        self.ensure_initialized()?;
        self.state = ControllerState::Paused;
        info!("Cartesian controller paused at t={:?}", time);
        Ok(())
    }

    /// 恢复：从暂停时的仿真状态继续（不重新锚定）
    pub fn resume(&mut self, time: Duration) -> Result<(), ControlError> {
        self.ensure_initialized()?;
        self.state = ControllerState::Running;
        info!("Cartesian controller resumed at t={:?}", time);
        Ok(())
    }

    /// 计算本周期的关节指令（不写硬件）
    ///
    /// 暂停时为空操作。
    ///
    /// # 错误
    ///
    /// - [`ControlError::NotInitialized`]
    /// - [`ControlError::InvalidPeriod`]: 周期为零（调度器损坏，调用方应终止）
    /// - [`ControlError::NonFiniteInput`]: 误差或 PID 输出含 NaN / 无穷大，此时状态不变
    pub fn compute_joint_control_cmds(
        &mut self,
        error: &Vector6<f64>,
        period: Duration,
    ) -> Result<(), ControlError> {
        let paused = self.is_paused();
        let core = self.core.as_mut().ok_or(ControlError::NotInitialized)?;
        if paused {
            return Ok(());
        }
        if period.is_zero() {
            return Err(ControlError::InvalidPeriod(period));
        }

        if !is_finite(error) {
            return Err(ControlError::NonFiniteInput { what: "Cartesian error" });
        }

        // PID 在副本上更新，输出有效后再提交
        let mut spatial = core.spatial.clone();
        let cartesian_input = spatial.update(error, period);
        if !is_finite(&cartesian_input) {
            return Err(ControlError::NonFiniteInput { what: "spatial PID output" });
        }

        core.dynamics.get_joint_control_cmds(period, &cartesian_input)?;
        core.spatial = spatial;
        core.cartesian_input = cartesian_input;
        Ok(())
    }

    /// 将仿真关节运动写入硬件
    ///
    /// 暂停时为空操作：硬件层保持最后一次写入的指令。
    /// 控制器不读取关节反馈，如果跟踪的目标坐标系没有同时暂停，恢复后会产生漂移。
    pub fn write_joint_control_cmds(&mut self) -> Result<(), ControlError> {
        let paused = self.is_paused();
        let core = self.core.as_mut().ok_or(ControlError::NotInitialized)?;
        if paused {
            return Ok(());
        }

        W::write(&mut core.handles, core.dynamics.motion());
        Ok(())
    }

    /// 一个控制周期：计算 + 写入
    pub fn tick(&mut self, error: &Vector6<f64>, period: Duration) -> Result<(), ControlError> {
        self.compute_joint_control_cmds(error, period)?;
        self.write_joint_control_cmds()?;
        trace!("tick: period={:?}, state={:?}", period, self.state);
        Ok(())
    }

    /// 将 `from` 坐标系中的 6 维量表示到 base 坐标系
    pub fn express_in_base_frame(&self, vector: &Vector6<f64>, from: &str) -> Result<Vector6<f64>, ControlError> {
        let rotation = self.rotation_to_base(from)?;
        Ok(frames::rotate_vector6(&rotation, vector))
    }

    /// 将 `from` 坐标系中的 6×6 张量表示到 base 坐标系（仅对角块）
    pub fn express_tensor_in_base_frame(
        &self,
        tensor: &Matrix6<f64>,
        from: &str,
    ) -> Result<Matrix6<f64>, ControlError> {
        let rotation = self.rotation_to_base(from)?;
        Ok(frames::rotate_tensor(&rotation, tensor))
    }

    /// 将 base 坐标系中的 6 维量表示到 `to` 坐标系
    pub fn express_in_frame(&self, vector: &Vector6<f64>, to: &str) -> Result<Vector6<f64>, ControlError> {
        let rotation = self.rotation_to_base(to)?;
        Ok(frames::inverse_rotate_vector6(&rotation, vector))
    }

    /// base ← frame 的旋转，基于当前仿真关节位置
    fn rotation_to_base(&self, frame: &str) -> Result<UnitQuaternion<f64>, ControlError> {
        let core = self.core.as_ref().ok_or(ControlError::NotInitialized)?;
        Ok(core.fk.rotation(core.dynamics.positions(), frame)?)
    }

    /// tip 坐标系位姿（基于当前仿真关节位置）
    pub fn end_effector_pose(&self) -> Result<Isometry3<f64>, ControlError> {
        let core = self.core.as_ref().ok_or(ControlError::NotInitialized)?;
        Ok(core.fk.tip_pose(core.dynamics.positions())?)
    }

    /// 任意坐标系位姿（基于当前仿真关节位置）
    pub fn frame_pose(&self, frame: &str) -> Result<Isometry3<f64>, ControlError> {
        let core = self.core.as_ref().ok_or(ControlError::NotInitialized)?;
        Ok(core.fk.pose(core.dynamics.positions(), frame)?)
    }

    /// 重置 PID 内部状态（配置重载时使用）
    pub fn reset_spatial_controller(&mut self) -> Result<(), ControlError> {
        let core = self.core.as_mut().ok_or(ControlError::NotInitialized)?;
        core.spatial.reset();
        Ok(())
    }

    /// 调度器检测到周期超时：清除 PID 微分历史，保留积分
    pub fn on_time_jump(&mut self, gap: Duration) -> Result<(), ControlError> {
        let core = self.core.as_mut().ok_or(ControlError::NotInitialized)?;
        core.spatial.on_time_jump(gap);
        Ok(())
    }

    /// 更新 PID 增益，不清除内部状态
    pub fn set_gains(&mut self, gains: SpatialGains) -> Result<(), ControlError> {
        let core = self.core.as_mut().ok_or(ControlError::NotInitialized)?;
        core.spatial.set_gains(gains);
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), ControlError> {
        if self.core.is_none() {
            return Err(ControlError::NotInitialized);
        }
        Ok(())
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.state == ControllerState::Paused
    }

    /// 当前仿真关节运动
    pub fn simulated_motion(&self) -> Option<&JointMotion> {
        self.core.as_ref().map(|core| core.dynamics.motion())
    }

    /// 最近一个周期的 PID 输出（笛卡尔速度）
    pub fn cartesian_input(&self) -> Option<Vector6<f64>> {
        self.core.as_ref().map(|core| core.cartesian_input)
    }

    /// 共享的运动链
    pub fn chain(&self) -> Option<&Arc<KinematicChain>> {
        self.core.as_ref().map(|core| &core.chain)
    }

    /// 受控关节名称（链顺序）
    pub fn joint_names(&self) -> Vec<&str> {
        self.core
            .as_ref()
            .map(|core| core.handles.iter().map(|h| h.name()).collect())
            .unwrap_or_default()
    }
}

fn is_finite(v: &Vector6<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}
