//! 硬件抽象层接口
//!
//! 控制器只依赖以下读写契约，不关心具体传输方式（CAN、EtherCAT、仿真器……）：
//!
//! - 每个关节：读取实测位置、实测速度；每周期写入一个指令值
//! - 硬件接口：按关节名称解析句柄
//!
//! 句柄在初始化时解析一次，之后按链顺序保存在控制器中。

/// 单个关节的硬件句柄
pub trait JointHandle {
    /// 关节名称
    fn name(&self) -> &str;

    /// 实测位置（rad 或 m）
    fn position(&self) -> f64;

    /// 实测速度（rad/s 或 m/s）
    fn velocity(&self) -> f64;

    /// 写入指令值（位置或速度，取决于控制器的命令类型）
    fn set_command(&mut self, command: f64);
}

/// 硬件接口：按名称解析关节句柄
pub trait HardwareInterface {
    /// 句柄类型
    type Handle: JointHandle;

    /// 解析关节句柄，找不到时返回 `None`
    fn handle(&mut self, joint: &str) -> Option<Self::Handle>;
}
