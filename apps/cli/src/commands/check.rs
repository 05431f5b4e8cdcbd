//! 配置检查命令
//!
//! 加载配置并构建运动链，打印坐标系、自由度和关节限位。

use anyhow::{Context, Result};
use cartesian_control::ControllerConfig;
use cartesian_kinematics::ForwardKinematicsSolver;
use clap::Args;
use std::path::PathBuf;

/// 检查命令参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 控制器配置文件（TOML）
    #[arg(short, long)]
    pub config: PathBuf,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<()> {
        let config = ControllerConfig::load(&self.config)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;
        let chain = config.build_chain().context("Invalid kinematic chain")?;
        let command_type = config.command_type()?;

        println!("Chain:        {}", chain);
        println!("Frames:       {}", chain.frames().collect::<Vec<_>>().join(" -> "));
        println!("DOF:          {}", chain.dof());
        println!("Command type: {}", command_type);
        println!("Period:       {:?}", config.period()?);
        println!("Damping:      {}", config.solver.damping);
        println!("Joints:");
        for (name, limits) in chain.joint_names().zip(chain.limits()) {
            println!("  {:<16} [{:>8.4}, {:>8.4}]", name, limits.lower, limits.upper);
        }

        let fk = ForwardKinematicsSolver::new(chain.clone());
        let home = vec![0.0; chain.dof()];
        let tip = fk.tip_pose(&home)?;
        let t = tip.translation.vector;
        println!("Tip at zero:  [{:.4}, {:.4}, {:.4}]", t.x, t.y, t.z);

        Ok(())
    }
}
