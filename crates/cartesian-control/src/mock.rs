//! Mock 硬件接口
//!
//! 用于测试和仿真的内存硬件：每个关节的状态保存在 `Arc<Mutex<_>>` 中，
//! 句柄与 [`MockHardware`] 共享同一份状态，便于在控制循环外观察写入的指令。
//!
//! [`MockHardware::step`] 把最近一次写入的指令积分为新的实测状态，
//! 模拟一个理想的位置/速度伺服。

use crate::command::CommandType;
use crate::hardware::{HardwareInterface, JointHandle};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// 单个模拟关节的状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockJointState {
    /// 实测位置
    pub position: f64,
    /// 实测速度
    pub velocity: f64,
    /// 最近一次写入的指令
    pub command: Option<f64>,
    /// 累计写入次数
    pub writes: usize,
}

/// 模拟关节句柄
#[derive(Debug, Clone)]
pub struct MockJointHandle {
    name: String,
    state: Arc<Mutex<MockJointState>>,
}

impl JointHandle for MockJointHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn velocity(&self) -> f64 {
        self.state.lock().velocity
    }

    fn set_command(&mut self, command: f64) {
        let mut state = self.state.lock();
        state.command = Some(command);
        state.writes += 1;
    }
}

/// 模拟硬件
#[derive(Debug, Default)]
pub struct MockHardware {
    joints: Vec<(String, Arc<Mutex<MockJointState>>)>,
}

impl MockHardware {
    /// 创建空的模拟硬件
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加关节（链式调用）
    pub fn with_joint(mut self, name: impl Into<String>, position: f64) -> Self {
        self.add_joint(name, position);
        self
    }

    /// 添加关节
    pub fn add_joint(&mut self, name: impl Into<String>, position: f64) {
        let state = MockJointState {
            position,
            ..MockJointState::default()
        };
        self.joints.push((name.into(), Arc::new(Mutex::new(state))));
    }

    /// 关节状态快照
    pub fn joint(&self, name: &str) -> Option<MockJointState> {
        self.find(name).map(|state| state.lock().clone())
    }

    /// 全部关节的实测位置（按添加顺序）
    pub fn positions(&self) -> Vec<f64> {
        self.joints.iter().map(|(_, state)| state.lock().position).collect()
    }

    /// 设置实测状态，关节不存在时返回 `false`
    pub fn set_measured(&self, name: &str, position: f64, velocity: f64) -> bool {
        match self.find(name) {
            Some(state) => {
                let mut state = state.lock();
                state.position = position;
                state.velocity = velocity;
                true
            },
            None => false,
        }
    }

    /// 全部关节的累计写入次数
    pub fn total_writes(&self) -> usize {
        self.joints.iter().map(|(_, state)| state.lock().writes).sum()
    }

    /// 按指令推进一个周期（理想伺服）
    ///
    /// - 位置指令：位置跳到指令值，速度为平均速度
    /// - 速度指令：速度等于指令值，位置积分
    pub fn step(&self, command_type: CommandType, period: Duration) {
        let dt = period.as_secs_f64();
        for (_, state) in &self.joints {
            let mut state = state.lock();
            let Some(command) = state.command else {
                continue;
            };
            match command_type {
                CommandType::Position => {
                    if dt > 0.0 {
                        state.velocity = (command - state.position) / dt;
                    }
                    state.position = command;
                },
                CommandType::Velocity => {
                    state.velocity = command;
                    state.position += command * dt;
                },
            }
        }
    }

    fn find(&self, name: &str) -> Option<&Arc<Mutex<MockJointState>>> {
        self.joints.iter().find(|(joint, _)| joint == name).map(|(_, state)| state)
    }
}

impl HardwareInterface for MockHardware {
    type Handle = MockJointHandle;

    fn handle(&mut self, joint: &str) -> Option<MockJointHandle> {
        self.find(joint).map(|state| MockJointHandle {
            name: joint.to_string(),
            state: Arc::clone(state),
        })
    }
}
