//! 集成测试共享工具
//!
//! 提供一个记录写入的内存硬件和几份常用的机器人配置。

#![allow(dead_code)]

use cartesian_control::{ControllerConfig, HardwareInterface, JointHandle};
use parking_lot::Mutex;
use std::sync::Arc;

/// 单个关节的记录
#[derive(Debug, Clone, Default)]
pub struct JointRecord {
    pub position: f64,
    pub velocity: f64,
    pub commands: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct RecordingHandle {
    name: String,
    record: Arc<Mutex<JointRecord>>,
}

impl JointHandle for RecordingHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> f64 {
        self.record.lock().position
    }

    fn velocity(&self) -> f64 {
        self.record.lock().velocity
    }

    fn set_command(&mut self, command: f64) {
        self.record.lock().commands.push(command);
    }
}

/// 记录全部写入的硬件
#[derive(Debug, Default)]
pub struct RecordingHardware {
    joints: Vec<(String, Arc<Mutex<JointRecord>>)>,
}

impl RecordingHardware {
    pub fn new(joints: &[(&str, f64)]) -> Self {
        let joints = joints
            .iter()
            .map(|(name, position)| {
                let record = JointRecord {
                    position: *position,
                    ..JointRecord::default()
                };
                (name.to_string(), Arc::new(Mutex::new(record)))
            })
            .collect();
        RecordingHardware { joints }
    }

    pub fn set_measured(&self, name: &str, position: f64, velocity: f64) {
        let record = self.record(name);
        let mut record = record.lock();
        record.position = position;
        record.velocity = velocity;
    }

    pub fn commands(&self, name: &str) -> Vec<f64> {
        self.record(name).lock().commands.clone()
    }

    pub fn total_writes(&self) -> usize {
        self.joints.iter().map(|(_, record)| record.lock().commands.len()).sum()
    }

    fn record(&self, name: &str) -> Arc<Mutex<JointRecord>> {
        self.joints
            .iter()
            .find(|(joint, _)| joint == name)
            .map(|(_, record)| Arc::clone(record))
            .unwrap_or_else(|| panic!("unknown joint {name}"))
    }
}

impl HardwareInterface for RecordingHardware {
    type Handle = RecordingHandle;

    fn handle(&mut self, joint: &str) -> Option<RecordingHandle> {
        self.joints
            .iter()
            .find(|(name, _)| name == joint)
            .map(|(name, record)| RecordingHandle {
                name: name.clone(),
                record: Arc::clone(record),
            })
    }
}

/// 单个转动关节，限位 [-1, 1]，p = 1
pub const SINGLE_JOINT: &str = r#"
    base_frame = "base"
    tip_frame = "link1"
    joints = ["j1"]
    command_type = "position"
    period_ms = 10.0

    [solver]
    damping = 0.0

    [gains.rot_z]
    p = 1.0

    [[segments]]
    joint = "j1"
    link = "link1"
    kind = "revolute"
    axis = [0.0, 0.0, 1.0]
    limits = { lower = -1.0, upper = 1.0 }
"#;

/// 平面三连杆（带 world → base 安装段和 tool0 法兰）
pub const PLANAR_ARM: &str = r#"
    root_frame = "world"
    base_frame = "base_link"
    tip_frame = "tool0"
    joints = ["shoulder", "elbow", "wrist"]
    command_type = "velocity"
    period_ms = 2.0

    [solver]
    damping = 0.001

    [gains.trans_x]
    p = 2.0
    [gains.trans_y]
    p = 2.0
    [gains.rot_z]
    p = 1.0

    [[segments]]
    joint = "mount"
    link = "base_link"
    kind = "fixed"
    origin_xyz = [0.0, 0.0, 0.5]

    [[segments]]
    joint = "shoulder"
    link = "upper_arm"
    limits = { lower = -3.0, upper = 3.0 }

    [[segments]]
    joint = "elbow"
    link = "forearm"
    origin_xyz = [1.0, 0.0, 0.0]
    limits = { lower = -2.5, upper = 2.5 }

    [[segments]]
    joint = "wrist"
    link = "hand"
    origin_xyz = [0.8, 0.0, 0.0]
    limits = { lower = -2.0, upper = 2.0 }

    [[segments]]
    joint = "flange"
    link = "tool0"
    kind = "fixed"
    origin_xyz = [0.3, 0.0, 0.0]
"#;

pub fn config(toml: &str) -> ControllerConfig {
    ControllerConfig::from_toml_str(toml).expect("test config must parse")
}
