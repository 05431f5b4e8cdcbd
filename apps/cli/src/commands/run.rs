//! 运行命令
//!
//! 在 [`MockHardware`] 上运行控制循环：每个周期以恒定误差调用 `tick`，
//! 然后把写入的指令积分为模拟硬件的实测状态。

use super::parse_values;
use anyhow::{Context, Result, bail};
use cartesian_control::mock::MockHardware;
use cartesian_control::{
    CartesianController, CommandType, CommandWriter, ControllerConfig, PositionWriter,
    VelocityWriter,
};
use clap::Args;
use nalgebra::Vector6;
use spin_sleep::SpinSleeper;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 超过名义周期该倍数视为时间跳变
const TIME_JUMP_MULTIPLIER: u32 = 2;

/// 运行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 控制器配置文件（TOML）
    #[arg(short, long)]
    pub config: PathBuf,

    /// 运行的周期数
    #[arg(short, long, default_value_t = 100)]
    pub ticks: u64,

    /// 恒定笛卡尔误差 vx,vy,vz,wx,wy,wz（base 坐标系）
    #[arg(short, long, allow_hyphen_values = true)]
    pub error: String,

    /// 模拟硬件的初始关节位置，逗号分隔（默认全零）
    #[arg(short, long, allow_hyphen_values = true)]
    pub start: Option<String>,

    /// 按真实时间运行（每周期 spin_sleep 一个控制周期）
    #[arg(long)]
    pub realtime: bool,

    /// 在第 K 个周期前暂停
    #[arg(long)]
    pub pause_after: Option<u64>,

    /// 在第 M 个周期前恢复
    #[arg(long, requires = "pause_after")]
    pub resume_after: Option<u64>,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let config = ControllerConfig::load(&self.config)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;
        config.validate().context("Invalid controller configuration")?;

        match config.command_type()? {
            CommandType::Position => self.run::<PositionWriter>(&config),
            CommandType::Velocity => self.run::<VelocityWriter>(&config),
        }
    }

    /// 解析误差向量
    fn error_vector(&self) -> Result<Vector6<f64>> {
        let values = parse_values(&self.error, "--error")?;
        if values.len() != 6 {
            bail!("--error expects 6 values (vx,vy,vz,wx,wy,wz), got {}", values.len());
        }
        Ok(Vector6::from_column_slice(&values))
    }

    /// 解析初始关节位置
    fn start_positions(&self, dof: usize) -> Result<Vec<f64>> {
        let Some(start) = &self.start else {
            return Ok(vec![0.0; dof]);
        };
        let values = parse_values(start, "--start")?;
        if values.len() != dof {
            bail!("--start expects {} values, got {}", dof, values.len());
        }
        Ok(values)
    }

    fn run<W: CommandWriter>(&self, config: &ControllerConfig) -> Result<()> {
        if let (Some(pause), Some(resume)) = (self.pause_after, self.resume_after)
            && resume <= pause
        {
            bail!("--resume-after ({resume}) must be greater than --pause-after ({pause})");
        }

        let error = self.error_vector()?;
        let start = self.start_positions(config.joints.len())?;
        let period = config.period()?;

        let mut hardware = MockHardware::new();
        for (joint, position) in config.joints.iter().zip(&start) {
            hardware.add_joint(joint.as_str(), *position);
        }

        let mut controller: CartesianController<_, W> = CartesianController::new();
        controller
            .initialize(config, &mut hardware)
            .context("Failed to initialize controller")?;
        controller.start(Duration::ZERO)?;

        info!(
            "Running {} ticks at {:?} ({} commands, realtime: {})",
            self.ticks,
            period,
            W::COMMAND_TYPE,
            self.realtime
        );

        let sleeper = SpinSleeper::default();
        let max_gap = period * TIME_JUMP_MULTIPLIER;
        let mut last_tick = Instant::now();
        let mut elapsed = Duration::ZERO;

        for tick in 0..self.ticks {
            if self.pause_after == Some(tick) {
                controller.pause(elapsed)?;
            }
            if self.resume_after == Some(tick) {
                controller.resume(elapsed)?;
            }

            if self.realtime {
                let gap = last_tick.elapsed();
                if tick > 0 && gap > max_gap {
                    warn!("Tick {} overran: {:?} since previous tick", tick, gap);
                    controller.on_time_jump(gap)?;
                }
                last_tick = Instant::now();
            }

            controller.tick(&error, period)?;
            if !controller.is_paused() {
                hardware.step(W::COMMAND_TYPE, period);
            }

            if let Some(motion) = controller.simulated_motion() {
                debug!(
                    "tick {}: command = {:?}",
                    tick,
                    match W::COMMAND_TYPE {
                        CommandType::Position => motion.positions.as_slice(),
                        CommandType::Velocity => motion.velocities.as_slice(),
                    }
                );
            }

            elapsed += period;
            if self.realtime {
                sleeper.sleep(period);
            }
        }

        self.report(&controller, &hardware)
    }

    fn report<W: CommandWriter>(
        &self,
        controller: &CartesianController<cartesian_control::mock::MockJointHandle, W>,
        hardware: &MockHardware,
    ) -> Result<()> {
        let pose = controller.end_effector_pose()?;
        let t = pose.translation.vector;
        let (roll, pitch, yaw) = pose.rotation.euler_angles();

        println!("Final state ({:?}):", controller.state());
        for (name, position) in controller.joint_names().iter().zip(hardware.positions()) {
            println!("  {:<16} {:>10.5}", name, position);
        }
        println!("Tip position: [{:.5}, {:.5}, {:.5}]", t.x, t.y, t.z);
        println!("Tip rpy:      [{:.5}, {:.5}, {:.5}]", roll, pitch, yaw);
        println!("Hardware writes: {}", hardware.total_writes());
        Ok(())
    }
}
