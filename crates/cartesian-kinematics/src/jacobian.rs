//! 几何雅可比矩阵
//!
//! 计算 tip 坐标系原点处、在 base 坐标系中表示的 6×n 几何雅可比矩阵：
//!
//! ```text
//! 转动关节 i:  J_lin = z_i × (p_tip - o_i),  J_ang = z_i
//! 移动关节 i:  J_lin = z_i,                  J_ang = 0
//! ```
//!
//! 行顺序为 `[vx, vy, vz, wx, wy, wz]`，列顺序与可驱动关节的链顺序一致。
//! 结果写入调用方预先分配的矩阵，控制周期内不产生堆分配。

use crate::chain::JointKind;
use crate::error::KinematicsError;
use crate::fk::ForwardKinematicsSolver;
use nalgebra::{Isometry3, Matrix6xX, Vector3};

impl ForwardKinematicsSolver {
    /// 分配一个与自由度匹配的雅可比矩阵缓冲区
    pub fn jacobian_buffer(&self) -> Matrix6xX<f64> {
        Matrix6xX::zeros(self.chain().dof())
    }

    /// 计算 tip 雅可比矩阵，写入 `out`
    ///
    /// # 错误
    ///
    /// [`KinematicsError::DimensionMismatch`]: `q` 长度或 `out` 列数与自由度不一致
    pub fn jacobian(&self, q: &[f64], out: &mut Matrix6xX<f64>) -> Result<(), KinematicsError> {
        self.check_dimension(q)?;
        if out.ncols() != self.chain().dof() {
            return Err(KinematicsError::DimensionMismatch {
                expected: self.chain().dof(),
                actual: out.ncols(),
            });
        }

        let segments = self.chain().segments();
        let tip = self.pose_at(q, segments.len()).translation.vector;

        let mut transform = Isometry3::identity();
        let mut column = 0;
        for segment in segments {
            transform *= segment.origin();

            let axis = transform.rotation * segment.axis();
            let position = match segment.kind() {
                JointKind::Fixed => 0.0,
                JointKind::Revolute => {
                    let linear = axis.cross(&(tip - transform.translation.vector));
                    write_column(out, column, &linear, &axis);
                    column += 1;
                    q[column - 1]
                },
                JointKind::Prismatic => {
                    write_column(out, column, &axis, &Vector3::zeros());
                    column += 1;
                    q[column - 1]
                },
            };

            transform *= segment.joint_transform(position);
        }

        Ok(())
    }
}

fn write_column(out: &mut Matrix6xX<f64>, column: usize, linear: &Vector3<f64>, angular: &Vector3<f64>) {
    let mut col = out.column_mut(column);
    col.fixed_rows_mut::<3>(0).copy_from(linear);
    col.fixed_rows_mut::<3>(3).copy_from(angular);
}
