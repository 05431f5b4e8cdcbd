//! 坐标系变换工具
//!
//! 在不同坐标系之间重新表示 6 维空间量（力旋量、速度旋量）和二阶张量。
//! 只做旋转，不做平移（不是完整的伴随变换）。
//!
//! # 张量
//!
//! 6×6 张量（刚度、阻尼等）的两个对角 3×3 块分别作为二阶张量旋转：
//!
//! ```text
//! K' = | R K_tt Rᵀ      0     |
//!      |     0      R K_rr Rᵀ |
//! ```
//!
//! 非对角耦合块不参与变换，结果中置零。这是已知的简化。

use nalgebra::{Matrix3, Matrix6, UnitQuaternion, Vector6};

/// 用 `rotation` 旋转 6 维量的平移和旋转两部分
#[inline]
pub fn rotate_vector6(rotation: &UnitQuaternion<f64>, vector: &Vector6<f64>) -> Vector6<f64> {
    let linear = rotation * vector.fixed_rows::<3>(0).into_owned();
    let angular = rotation * vector.fixed_rows::<3>(3).into_owned();

    let mut out = Vector6::zeros();
    out.fixed_rows_mut::<3>(0).copy_from(&linear);
    out.fixed_rows_mut::<3>(3).copy_from(&angular);
    out
}

/// 用 `rotation` 的逆旋转 6 维量
#[inline]
pub fn inverse_rotate_vector6(rotation: &UnitQuaternion<f64>, vector: &Vector6<f64>) -> Vector6<f64> {
    rotate_vector6(&rotation.inverse(), vector)
}

/// 旋转 6×6 张量的两个对角块（非对角块置零）
pub fn rotate_tensor(rotation: &UnitQuaternion<f64>, tensor: &Matrix6<f64>) -> Matrix6<f64> {
    let r: Matrix3<f64> = rotation.to_rotation_matrix().into_inner();
    let r_t = r.transpose();

    let mut out = Matrix6::zeros();
    out.fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&(r * tensor.fixed_view::<3, 3>(0, 0) * r_t));
    out.fixed_view_mut::<3, 3>(3, 3)
        .copy_from(&(r * tensor.fixed_view::<3, 3>(3, 3) * r_t));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_vector6_quarter_turn() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let wrench = Vector6::new(1.0, 0.0, 0.0, 0.0, 2.0, 0.0);

        let rotated = rotate_vector6(&rotation, &wrench);

        assert_relative_eq!(rotated, Vector6::new(0.0, 1.0, 0.0, -2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_rotate_round_trip() {
        let rotation = UnitQuaternion::from_euler_angles(0.3, -0.8, 1.9);
        let v = Vector6::new(0.5, -1.0, 2.0, 0.1, 0.2, -0.3);

        let back = inverse_rotate_vector6(&rotation, &rotate_vector6(&rotation, &v));

        assert_relative_eq!(back, v, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_tensor_diagonal_blocks() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let stiffness = Matrix6::from_diagonal(&Vector6::new(100.0, 200.0, 300.0, 1.0, 2.0, 3.0));

        let rotated = rotate_tensor(&rotation, &stiffness);

        // 绕 z 旋转 90°：x、y 方向刚度互换
        let expected = Matrix6::from_diagonal(&Vector6::new(200.0, 100.0, 300.0, 2.0, 1.0, 3.0));
        assert_relative_eq!(rotated, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_rotate_tensor_drops_coupling() {
        let rotation = UnitQuaternion::identity();
        let mut tensor = Matrix6::identity();
        tensor[(0, 4)] = 7.0;
        tensor[(5, 1)] = -3.0;

        let rotated = rotate_tensor(&rotation, &tensor);

        assert_eq!(rotated, Matrix6::identity());
    }
}
