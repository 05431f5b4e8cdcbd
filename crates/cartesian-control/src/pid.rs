//! Spatial PID Controller - 六维比例-积分-微分控制器
//!
//! 将 6 维位姿/速度误差转换为笛卡尔速度指令。六个轴（3 平移 + 3 旋转）
//! 各自拥有独立的 PID 状态，轴间没有耦合。
//!
//! # 算法
//!
//! ```text
//! integral = clamp(integral + e * dt, ±i_clamp)
//! output   = p * e + i * integral + d * (e - e_prev) / dt
//! ```
//!
//! 其中 `e_prev` 初始为 0。
//!
//! # 特性
//!
//! - **积分饱和保护**: `i_clamp` 限制积分项累积（`i_clamp = 0` 即关闭积分）
//! - **时间跳变处理**: `on_time_jump()` 只重置微分项，保留积分项
//! - **确定性**: 输出只取决于 `(error, period, 内部状态)`
//!
//! # 示例
//!
//! ```rust
//! use cartesian_control::pid::{PidGains, SpatialGains, SpatialPidController};
//! use nalgebra::Vector6;
//! use std::time::Duration;
//!
//! let gains = SpatialGains::uniform(PidGains::new(5.0, 0.0, 0.0));
//! let mut pid = SpatialPidController::new(gains);
//!
//! let error = Vector6::new(0.1, 0.0, 0.0, 0.0, 0.0, 0.0);
//! let velocity = pid.update(&error, Duration::from_millis(10));
//! assert!((velocity[0] - 0.5).abs() < 1e-12);
//! ```

use nalgebra::Vector6;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 单轴 PID 增益
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// 比例增益
    pub p: f64,
    /// 积分增益
    pub i: f64,
    /// 微分增益
    pub d: f64,
    /// 积分项绝对值上限（0 表示关闭积分）
    pub i_clamp: f64,
}

impl PidGains {
    /// 创建增益（积分上限为 0）
    pub const fn new(p: f64, i: f64, d: f64) -> Self {
        PidGains { p, i, d, i_clamp: 0.0 }
    }

    /// 设置积分上限
    pub const fn with_i_clamp(mut self, i_clamp: f64) -> Self {
        self.i_clamp = i_clamp;
        self
    }
}

/// 六轴增益
///
/// 字段名与配置文件中的 `[gains.trans_x]` 等表一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialGains {
    pub trans_x: PidGains,
    pub trans_y: PidGains,
    pub trans_z: PidGains,
    pub rot_x: PidGains,
    pub rot_y: PidGains,
    pub rot_z: PidGains,
}

impl SpatialGains {
    /// 六个轴使用相同增益
    pub const fn uniform(gains: PidGains) -> Self {
        Self::new(gains, gains)
    }

    /// 平移轴与旋转轴分别设置
    pub const fn new(translational: PidGains, rotational: PidGains) -> Self {
        SpatialGains {
            trans_x: translational,
            trans_y: translational,
            trans_z: translational,
            rot_x: rotational,
            rot_y: rotational,
            rot_z: rotational,
        }
    }

    /// 按 `[vx, vy, vz, wx, wy, wz]` 顺序返回
    pub fn as_array(&self) -> [PidGains; 6] {
        [
            self.trans_x,
            self.trans_y,
            self.trans_z,
            self.rot_x,
            self.rot_y,
            self.rot_z,
        ]
    }
}

/// 单轴 PID 状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pid {
    gains: PidGains,
    integral: f64,
    last_error: f64,
}

impl Pid {
    pub fn new(gains: PidGains) -> Self {
        Pid {
            gains,
            integral: 0.0,
            last_error: 0.0,
        }
    }

    /// 计算一步输出（`dt_sec > 0` 由调用方保证）
    pub fn update(&mut self, error: f64, dt_sec: f64) -> f64 {
        let limit = self.gains.i_clamp.abs();
        self.integral = (self.integral + error * dt_sec).clamp(-limit, limit);

        let derivative = (error - self.last_error) / dt_sec;
        self.last_error = error;

        self.gains.p * error + self.gains.i * self.integral + self.gains.d * derivative
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }
}

/// 六维 PID 控制器
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialPidController {
    axes: [Pid; 6],
}

impl SpatialPidController {
    /// 创建新的控制器（积分和微分历史为零）
    pub fn new(gains: SpatialGains) -> Self {
        SpatialPidController {
            axes: gains.as_array().map(Pid::new),
        }
    }

    /// 计算笛卡尔速度指令
    ///
    /// # 参数
    ///
    /// - `error`: 6 维误差 `[x, y, z, rx, ry, rz]`
    /// - `period`: 控制周期
    ///
    /// 周期为零时返回零输出且不修改内部状态（控制器编排层会先拒绝零周期）。
    pub fn update(&mut self, error: &Vector6<f64>, period: Duration) -> Vector6<f64> {
        let dt_sec = period.as_secs_f64();

        // 防止除零
        if dt_sec <= 0.0 {
            tracing::warn!(
                "Spatial PID received zero period: {:?}, returning zero output",
                period
            );
            return Vector6::zeros();
        }

        let mut output = Vector6::zeros();
        for (i, axis) in self.axes.iter_mut().enumerate() {
            output[i] = axis.update(error[i], dt_sec);
        }
        output
    }

    /// 完全重置（积分和微分历史）
    pub fn reset(&mut self) {
        for axis in self.axes.iter_mut() {
            axis.reset();
        }
    }

    /// 处理时间跳变：只重置微分项，保留积分项
    pub fn on_time_jump(&mut self, period: Duration) {
        tracing::warn!(
            "Spatial PID detected time jump: {:?}, resetting derivative term only",
            period
        );
        for axis in self.axes.iter_mut() {
            axis.last_error = 0.0;
        }
    }

    /// 更新增益（配置重载），不清除内部状态
    pub fn set_gains(&mut self, gains: SpatialGains) {
        for (axis, gains) in self.axes.iter_mut().zip(gains.as_array()) {
            axis.set_gains(gains);
        }
    }

    /// 当前增益
    pub fn gains(&self) -> SpatialGains {
        let [trans_x, trans_y, trans_z, rot_x, rot_y, rot_z] = self.axes.map(|a| a.gains());
        SpatialGains {
            trans_x,
            trans_y,
            trans_z,
            rot_x,
            rot_y,
            rot_z,
        }
    }

    /// 当前积分项（用于调试和监控）
    pub fn integral(&self) -> Vector6<f64> {
        Vector6::from_fn(|i, _| self.axes[i].integral())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_pid_gains_builder() {
        let gains = PidGains::new(10.0, 0.5, 0.1).with_i_clamp(5.0);
        assert_eq!(gains.p, 10.0);
        assert_eq!(gains.i, 0.5);
        assert_eq!(gains.d, 0.1);
        assert_eq!(gains.i_clamp, 5.0);
    }

    #[test]
    fn test_spatial_gains_layout() {
        let gains = SpatialGains::new(PidGains::new(1.0, 0.0, 0.0), PidGains::new(2.0, 0.0, 0.0));
        let array = gains.as_array();
        assert!(array[..3].iter().all(|g| g.p == 1.0));
        assert!(array[3..].iter().all(|g| g.p == 2.0));
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = SpatialPidController::new(SpatialGains::uniform(PidGains::new(10.0, 0.0, 0.0)));
        let error = Vector6::new(0.5, -0.5, 0.0, 0.1, 0.0, -0.2);

        let output = pid.update(&error, dt(10));

        assert!((output - error * 10.0).norm() < 1e-12);
    }

    #[test]
    fn test_integral_accumulation() {
        let gains = PidGains::new(0.0, 1.0, 0.0).with_i_clamp(10.0);
        let mut pid = SpatialPidController::new(SpatialGains::uniform(gains));
        let error = Vector6::repeat(0.5);

        // 积分 = 0.5 * 0.1 = 0.05
        let output1 = pid.update(&error, dt(100));
        assert!((output1[0] - 0.05).abs() < 1e-10);

        // 积分 = 0.05 + 0.5 * 0.1 = 0.1
        let output2 = pid.update(&error, dt(100));
        assert!((output2[5] - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_integral_saturation() {
        let gains = PidGains::new(0.0, 1.0, 0.0).with_i_clamp(0.5);
        let mut pid = SpatialPidController::new(SpatialGains::uniform(gains));
        let error = Vector6::repeat(-1.0);

        for _ in 0..10 {
            pid.update(&error, Duration::from_secs(1));
        }

        assert!((pid.integral()[0] + 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_zero_i_clamp_disables_integral() {
        let mut pid = SpatialPidController::new(SpatialGains::uniform(PidGains::new(0.0, 1.0, 0.0)));
        let output = pid.update(&Vector6::repeat(1.0), Duration::from_secs(1));
        assert_eq!(output, Vector6::zeros());
    }

    #[test]
    fn test_derivative_term() {
        let mut pid = SpatialPidController::new(SpatialGains::uniform(PidGains::new(0.0, 0.0, 1.0)));
        let error = Vector6::repeat(0.5);

        // 上次误差 = 0，变化率 = 0.5 / 0.1 = 5.0
        let output1 = pid.update(&error, dt(100));
        assert!((output1[2] - 5.0).abs() < 1e-10);

        // 误差不变，输出为 0
        let output2 = pid.update(&error, dt(100));
        assert!(output2[2].abs() < 1e-10);
    }

    #[test]
    fn test_axes_are_independent() {
        let gains = SpatialGains {
            trans_x: PidGains::new(1.0, 0.0, 0.0),
            rot_z: PidGains::new(3.0, 0.0, 0.0),
            ..SpatialGains::default()
        };
        let mut pid = SpatialPidController::new(gains);

        let output = pid.update(&Vector6::repeat(1.0), dt(10));
        assert_eq!(output, Vector6::new(1.0, 0.0, 0.0, 0.0, 0.0, 3.0));
    }

    #[test]
    fn test_zero_error_zero_output() {
        let gains = PidGains::new(3.0, 2.0, 1.0).with_i_clamp(1.0);
        let mut pid = SpatialPidController::new(SpatialGains::uniform(gains));
        let output = pid.update(&Vector6::zeros(), dt(1));
        assert_eq!(output, Vector6::zeros());
    }

    #[test]
    fn test_deterministic_sequences() {
        let gains = SpatialGains::new(
            PidGains::new(2.0, 0.7, 0.05).with_i_clamp(0.3),
            PidGains::new(1.0, 0.2, 0.01).with_i_clamp(0.1),
        );
        let mut a = SpatialPidController::new(gains);
        let mut b = SpatialPidController::new(gains);

        for k in 0..50 {
            let t = k as f64 * 0.1;
            let error = Vector6::new(t.sin(), t.cos(), 0.1 * t, -t.sin(), 0.0, 0.5);
            let period = Duration::from_micros(1000 + (k % 3) * 250);
            assert_eq!(a.update(&error, period), b.update(&error, period));
        }
    }

    #[test]
    fn test_on_time_jump_preserves_integral() {
        let gains = PidGains::new(0.0, 1.0, 1.0).with_i_clamp(10.0);
        let mut pid = SpatialPidController::new(SpatialGains::uniform(gains));

        pid.update(&Vector6::repeat(0.5), Duration::from_secs(1));
        let integral_before = pid.integral();
        assert!(integral_before[0] > 0.0);

        pid.on_time_jump(Duration::from_secs(10));

        assert_eq!(pid.integral(), integral_before);
        assert!(pid.axes.iter().all(|a| a.last_error == 0.0));
    }

    #[test]
    fn test_reset() {
        let gains = PidGains::new(1.0, 1.0, 1.0).with_i_clamp(10.0);
        let mut pid = SpatialPidController::new(SpatialGains::uniform(gains));

        pid.update(&Vector6::repeat(0.5), Duration::from_secs(1));
        assert!(pid.integral()[0] != 0.0);

        pid.reset();

        assert_eq!(pid.integral(), Vector6::zeros());
        assert_eq!(pid, SpatialPidController::new(SpatialGains::uniform(gains)));
    }

    #[test]
    fn test_set_gains_keeps_state() {
        let gains = PidGains::new(0.0, 1.0, 0.0).with_i_clamp(10.0);
        let mut pid = SpatialPidController::new(SpatialGains::uniform(gains));
        pid.update(&Vector6::repeat(1.0), Duration::from_secs(1));

        let new_gains = SpatialGains::uniform(PidGains::new(4.0, 0.0, 0.0));
        pid.set_gains(new_gains);

        assert_eq!(pid.gains(), new_gains);
        assert!((pid.integral()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_period() {
        let mut pid = SpatialPidController::new(SpatialGains::uniform(PidGains::new(10.0, 1.0, 1.0)));
        let output = pid.update(&Vector6::repeat(0.5), Duration::ZERO);
        assert_eq!(output, Vector6::zeros());
        assert_eq!(pid.integral(), Vector6::zeros());
    }
}
