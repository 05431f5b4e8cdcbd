//! 运动链模型
//!
//! 描述从 base 坐标系到 tip 坐标系的串联机构：每个 [`Segment`] 由一个关节
//! （转动 / 移动 / 固定）、父坐标系到关节坐标系的固定变换、关节轴以及
//! 该 segment 产生的子坐标系（link）名称组成。
//!
//! # 坐标系索引
//!
//! ```text
//! frame 0        = base
//! frame k (k>0)  = segments[k - 1].link
//! tip            = segments[len - 1].link
//! ```
//!
//! 运动链构造后不可变，控制器内部通过 `Arc<KinematicChain>` 共享。
//!
//! # 示例
//!
//! ```rust
//! use cartesian_kinematics::{JointLimits, KinematicChain, Segment};
//! use nalgebra::{Isometry3, Vector3};
//!
//! let chain = KinematicChain::new(
//!     "base_link",
//!     vec![
//!         Segment::revolute("shoulder", "upper_arm", Vector3::z(), Isometry3::identity())
//!             .with_limits(JointLimits::new(-1.5, 1.5)),
//!         Segment::fixed("flange", "tool0", Isometry3::translation(0.0, 0.0, 0.1)),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(chain.dof(), 1);
//! assert_eq!(chain.tip_frame(), "tool0");
//! ```

use crate::error::KinematicsError;
use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use std::collections::HashSet;
use std::fmt;

/// 关节轴长度阈值（小于此值视为零向量）
const AXIS_NORM_THRESHOLD: f64 = 1e-9;

/// 关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    /// 转动关节，关节变量单位为弧度
    Revolute,
    /// 移动关节，关节变量单位为米
    Prismatic,
    /// 固定关节（不计入自由度）
    Fixed,
}

impl JointKind {
    /// 是否为可驱动关节
    #[inline]
    pub const fn is_actuated(self) -> bool {
        !matches!(self, JointKind::Fixed)
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JointKind::Revolute => "revolute",
            JointKind::Prismatic => "prismatic",
            JointKind::Fixed => "fixed",
        };
        write!(f, "{}", name)
    }
}

/// 关节位置限位 `[lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    /// 下限
    pub lower: f64,
    /// 上限
    pub upper: f64,
}

impl JointLimits {
    /// 创建新的限位
    ///
    /// 合法性（`lower <= upper`）在 [`KinematicChain::new`] 中统一检查。
    #[inline]
    pub const fn new(lower: f64, upper: f64) -> Self {
        JointLimits { lower, upper }
    }

    /// 无限位（连续关节）
    #[inline]
    pub const fn unbounded() -> Self {
        JointLimits {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    /// 将位置钳位到限位内
    #[inline]
    pub fn clamp(&self, position: f64) -> f64 {
        position.clamp(self.lower, self.upper)
    }

    /// 位置是否在限位内（闭区间）
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.lower && position <= self.upper
    }

    fn is_valid(&self) -> bool {
        // NaN 比较恒为 false，因此 NaN 限位也会被拒绝
        self.lower <= self.upper
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// 运动链中的一个 segment
#[derive(Debug, Clone)]
pub struct Segment {
    joint: String,
    link: String,
    kind: JointKind,
    axis: Vector3<f64>,
    origin: Isometry3<f64>,
    limits: JointLimits,
}

impl Segment {
    /// 创建新的 segment
    ///
    /// # 参数
    ///
    /// - `joint`: 关节名称
    /// - `link`: 该 segment 产生的子坐标系名称
    /// - `kind`: 关节类型
    /// - `axis`: 关节轴（在关节坐标系中表示，无需归一化）
    /// - `origin`: 父坐标系到关节坐标系的固定变换
    pub fn new(
        joint: impl Into<String>,
        link: impl Into<String>,
        kind: JointKind,
        axis: Vector3<f64>,
        origin: Isometry3<f64>,
    ) -> Self {
        Segment {
            joint: joint.into(),
            link: link.into(),
            kind,
            axis,
            origin,
            limits: JointLimits::unbounded(),
        }
    }

    /// 转动关节 segment
    pub fn revolute(
        joint: impl Into<String>,
        link: impl Into<String>,
        axis: Vector3<f64>,
        origin: Isometry3<f64>,
    ) -> Self {
        Self::new(joint, link, JointKind::Revolute, axis, origin)
    }

    /// 移动关节 segment
    pub fn prismatic(
        joint: impl Into<String>,
        link: impl Into<String>,
        axis: Vector3<f64>,
        origin: Isometry3<f64>,
    ) -> Self {
        Self::new(joint, link, JointKind::Prismatic, axis, origin)
    }

    /// 固定关节 segment
    pub fn fixed(
        joint: impl Into<String>,
        link: impl Into<String>,
        origin: Isometry3<f64>,
    ) -> Self {
        Self::new(joint, link, JointKind::Fixed, Vector3::z(), origin)
    }

    /// 设置关节限位
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 关节名称
    pub fn joint(&self) -> &str {
        &self.joint
    }

    /// 子坐标系名称
    pub fn link(&self) -> &str {
        &self.link
    }

    /// 关节类型
    pub fn kind(&self) -> JointKind {
        self.kind
    }

    /// 关节轴（关节坐标系，单位向量）
    pub fn axis(&self) -> Vector3<f64> {
        self.axis
    }

    /// 父坐标系到关节坐标系的固定变换
    pub fn origin(&self) -> &Isometry3<f64> {
        &self.origin
    }

    /// 关节限位
    pub fn limits(&self) -> JointLimits {
        self.limits
    }

    /// 是否为可驱动关节
    #[inline]
    pub fn is_actuated(&self) -> bool {
        self.kind.is_actuated()
    }

    /// 关节运动产生的变换
    #[inline]
    pub fn joint_transform(&self, position: f64) -> Isometry3<f64> {
        match self.kind {
            JointKind::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&Unit::new_unchecked(self.axis), position),
            ),
            JointKind::Prismatic => {
                Isometry3::from_parts(Translation3::from(self.axis * position), UnitQuaternion::identity())
            },
            JointKind::Fixed => Isometry3::identity(),
        }
    }
}

/// 从 `xyz` + `rpy`（roll-pitch-yaw，外旋 XYZ）构造固定变换
///
/// 与 URDF `<origin xyz rpy>` 的约定一致。
pub fn origin_from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(xyz[0], xyz[1], xyz[2]),
        UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]),
    )
}

/// 串联运动链
///
/// 不可变；自由度（可驱动关节数）在构造时确定。
#[derive(Debug, Clone)]
pub struct KinematicChain {
    base_frame: String,
    segments: Vec<Segment>,
    dof: usize,
}

impl KinematicChain {
    /// 创建并校验运动链
    ///
    /// # 错误
    ///
    /// - [`KinematicsError::EmptyChain`]: 没有 segment
    /// - [`KinematicsError::DuplicateFrame`]: 坐标系名称重复
    /// - [`KinematicsError::DuplicateJoint`]: 可驱动关节名称重复
    /// - [`KinematicsError::InvalidAxis`]: 可驱动关节的轴为零向量
    /// - [`KinematicsError::InvalidLimits`]: 限位 `lower > upper`
    pub fn new(
        base_frame: impl Into<String>,
        segments: Vec<Segment>,
    ) -> Result<Self, KinematicsError> {
        let base_frame = base_frame.into();
        if segments.is_empty() {
            return Err(KinematicsError::EmptyChain);
        }

        let mut frames = HashSet::with_capacity(segments.len() + 1);
        frames.insert(base_frame.clone());

        let mut joints = HashSet::with_capacity(segments.len());

        let mut segments = segments;
        for segment in segments.iter_mut() {
            if !frames.insert(segment.link.clone()) {
                return Err(KinematicsError::DuplicateFrame {
                    frame: segment.link.clone(),
                });
            }

            if segment.is_actuated() {
                // 关节名称是硬件句柄的键
                if !joints.insert(segment.joint.clone()) {
                    return Err(KinematicsError::DuplicateJoint {
                        joint: segment.joint.clone(),
                    });
                }

                let norm = segment.axis.norm();
                if norm < AXIS_NORM_THRESHOLD || !norm.is_finite() {
                    return Err(KinematicsError::InvalidAxis {
                        joint: segment.joint.clone(),
                    });
                }
                segment.axis /= norm;

                if !segment.limits.is_valid() {
                    return Err(KinematicsError::InvalidLimits {
                        joint: segment.joint.clone(),
                        lower: segment.limits.lower,
                        upper: segment.limits.upper,
                    });
                }
            }
        }

        let dof = segments.iter().filter(|s| s.is_actuated()).count();

        Ok(KinematicChain {
            base_frame,
            segments,
            dof,
        })
    }

    /// base 坐标系名称
    pub fn base_frame(&self) -> &str {
        &self.base_frame
    }

    /// tip 坐标系名称（最后一个 segment 的子坐标系）
    pub fn tip_frame(&self) -> &str {
        // 构造时保证 segments 非空
        self.segments.last().map(|s| s.link.as_str()).unwrap_or(&self.base_frame)
    }

    /// 全部 segment（含固定关节）
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 自由度（可驱动关节数）
    #[inline]
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// 可驱动关节（按链顺序）
    pub fn actuated(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_actuated())
    }

    /// 可驱动关节名称（按链顺序）
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.actuated().map(|s| s.joint.as_str())
    }

    /// 可驱动关节限位（按链顺序）
    pub fn limits(&self) -> impl Iterator<Item = JointLimits> + '_ {
        self.actuated().map(|s| s.limits)
    }

    /// 全部坐标系名称（base 在前）
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.base_frame.as_str()).chain(self.segments.iter().map(|s| s.link.as_str()))
    }

    /// 坐标系索引：0 为 base，k 为第 k 个 segment 的子坐标系
    pub fn frame_index(&self, frame: &str) -> Option<usize> {
        self.frames().position(|f| f == frame)
    }

    /// 截取 `base → tip` 之间的子链
    ///
    /// 返回的子链以 `base` 为基坐标系，`tip` 为末端坐标系。
    ///
    /// # 错误
    ///
    /// - [`KinematicsError::FrameNotFound`]: `base` 或 `tip` 不存在
    /// - [`KinematicsError::TipBeforeBase`]: `tip` 位于 `base` 之前
    /// - [`KinematicsError::EmptyChain`]: `base == tip`
    pub fn sub_chain(&self, base: &str, tip: &str) -> Result<KinematicChain, KinematicsError> {
        let base_index = self.frame_index(base).ok_or_else(|| KinematicsError::FrameNotFound {
            frame: base.to_string(),
        })?;
        let tip_index = self.frame_index(tip).ok_or_else(|| KinematicsError::FrameNotFound {
            frame: tip.to_string(),
        })?;

        if tip_index == base_index {
            return Err(KinematicsError::EmptyChain);
        }
        if tip_index < base_index {
            return Err(KinematicsError::TipBeforeBase {
                base: base.to_string(),
                tip: tip.to_string(),
            });
        }

        let chain = KinematicChain {
            base_frame: base.to_string(),
            segments: self.segments[base_index..tip_index].to_vec(),
            dof: self.segments[base_index..tip_index].iter().filter(|s| s.is_actuated()).count(),
        };

        tracing::debug!(
            "Extracted sub-chain {} -> {} ({} segments, {} dof)",
            base,
            tip,
            chain.segments.len(),
            chain.dof
        );

        Ok(chain)
    }
}

impl fmt::Display for KinematicChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_frame)?;
        for segment in &self.segments {
            write!(f, " -[{}:{}]-> {}", segment.joint, segment.kind, segment.link)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planar_chain() -> KinematicChain {
        KinematicChain::new(
            "world",
            vec![
                Segment::fixed("mount", "base_link", Isometry3::translation(0.0, 0.0, 0.5)),
                Segment::revolute("shoulder", "upper_arm", Vector3::new(0.0, 0.0, 2.0), Isometry3::identity())
                    .with_limits(JointLimits::new(-1.5, 1.5)),
                Segment::revolute(
                    "elbow",
                    "forearm",
                    Vector3::z(),
                    Isometry3::translation(1.0, 0.0, 0.0),
                )
                .with_limits(JointLimits::new(-2.0, 2.0)),
                Segment::fixed("flange", "tool0", Isometry3::translation(1.0, 0.0, 0.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_chain_basic_queries() {
        let chain = planar_chain();

        assert_eq!(chain.base_frame(), "world");
        assert_eq!(chain.tip_frame(), "tool0");
        assert_eq!(chain.dof(), 2);
        assert_eq!(chain.joint_names().collect::<Vec<_>>(), vec!["shoulder", "elbow"]);
        assert_eq!(
            chain.frames().collect::<Vec<_>>(),
            vec!["world", "base_link", "upper_arm", "forearm", "tool0"]
        );
        assert_eq!(chain.frame_index("world"), Some(0));
        assert_eq!(chain.frame_index("forearm"), Some(3));
        assert_eq!(chain.frame_index("missing"), None);
    }

    #[test]
    fn test_chain_normalizes_axis() {
        let chain = planar_chain();
        let shoulder = chain.actuated().next().unwrap();
        assert!((shoulder.axis().norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_chain_rejects_empty() {
        let result = KinematicChain::new("base", Vec::new());
        assert_eq!(result.unwrap_err(), KinematicsError::EmptyChain);
    }

    #[test]
    fn test_chain_rejects_duplicate_frame() {
        let result = KinematicChain::new(
            "base",
            vec![
                Segment::revolute("j1", "link", Vector3::z(), Isometry3::identity()),
                Segment::revolute("j2", "link", Vector3::z(), Isometry3::identity()),
            ],
        );
        assert!(matches!(result, Err(KinematicsError::DuplicateFrame { frame }) if frame == "link"));
    }

    #[test]
    fn test_chain_rejects_duplicate_joint() {
        let result = KinematicChain::new(
            "base",
            vec![
                Segment::revolute("j", "link1", Vector3::z(), Isometry3::identity()),
                Segment::revolute("j", "link2", Vector3::z(), Isometry3::identity()),
            ],
        );
        assert!(matches!(result, Err(KinematicsError::DuplicateJoint { joint }) if joint == "j"));

        // 固定关节不对应硬件句柄，允许同名
        let chain = KinematicChain::new(
            "base",
            vec![
                Segment::fixed("mount", "link1", Isometry3::identity()),
                Segment::revolute("j", "link2", Vector3::z(), Isometry3::identity()),
                Segment::fixed("mount", "tool0", Isometry3::identity()),
            ],
        )
        .unwrap();
        assert_eq!(chain.dof(), 1);
    }

    #[test]
    fn test_chain_rejects_zero_axis() {
        let result = KinematicChain::new(
            "base",
            vec![Segment::revolute("j1", "link", Vector3::zeros(), Isometry3::identity())],
        );
        assert!(matches!(result, Err(KinematicsError::InvalidAxis { .. })));
    }

    #[test]
    fn test_chain_rejects_inverted_limits() {
        let result = KinematicChain::new(
            "base",
            vec![
                Segment::prismatic("slide", "carriage", Vector3::x(), Isometry3::identity())
                    .with_limits(JointLimits::new(0.5, -0.5)),
            ],
        );
        assert!(matches!(result, Err(KinematicsError::InvalidLimits { .. })));
    }

    #[test]
    fn test_sub_chain() {
        let chain = planar_chain();

        let sub = chain.sub_chain("base_link", "forearm").unwrap();
        assert_eq!(sub.base_frame(), "base_link");
        assert_eq!(sub.tip_frame(), "forearm");
        assert_eq!(sub.dof(), 2);
        assert_eq!(sub.segments().len(), 2);

        let sub = chain.sub_chain("upper_arm", "tool0").unwrap();
        assert_eq!(sub.dof(), 1);
        assert_eq!(sub.joint_names().collect::<Vec<_>>(), vec!["elbow"]);
    }

    #[test]
    fn test_sub_chain_errors() {
        let chain = planar_chain();

        assert!(matches!(
            chain.sub_chain("nowhere", "tool0"),
            Err(KinematicsError::FrameNotFound { frame }) if frame == "nowhere"
        ));
        assert!(matches!(
            chain.sub_chain("forearm", "base_link"),
            Err(KinematicsError::TipBeforeBase { .. })
        ));
        assert_eq!(
            chain.sub_chain("forearm", "forearm").unwrap_err(),
            KinematicsError::EmptyChain
        );
    }

    #[test]
    fn test_joint_limits() {
        let limits = JointLimits::new(-1.0, 1.0);
        assert_eq!(limits.clamp(1.03), 1.0);
        assert_eq!(limits.clamp(-7.0), -1.0);
        assert_eq!(limits.clamp(0.25), 0.25);
        assert!(limits.contains(1.0));
        assert!(!limits.contains(1.0 + 1e-9));

        let free = JointLimits::unbounded();
        assert_eq!(free.clamp(1e9), 1e9);
    }

    #[test]
    fn test_joint_transform() {
        let revolute = Segment::revolute("j", "l", Vector3::z(), Isometry3::identity());
        let t = revolute.joint_transform(std::f64::consts::FRAC_PI_2);
        let p = t * nalgebra::Point3::new(1.0, 0.0, 0.0);
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);

        let prismatic = Segment::prismatic("s", "c", Vector3::x(), Isometry3::identity());
        let t = prismatic.joint_transform(0.3);
        assert!((t.translation.vector.x - 0.3).abs() < 1e-12);

        let fixed = Segment::fixed("f", "t", Isometry3::identity());
        assert_eq!(fixed.joint_transform(10.0), Isometry3::identity());
    }

    #[test]
    fn test_origin_from_xyz_rpy() {
        let origin = origin_from_xyz_rpy([0.1, 0.2, 0.3], [0.0, 0.0, std::f64::consts::FRAC_PI_2]);
        assert!((origin.translation.vector - Vector3::new(0.1, 0.2, 0.3)).norm() < 1e-12);
        let x = origin.rotation * Vector3::x();
        assert!((x - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn test_chain_display() {
        let chain = planar_chain();
        let text = format!("{}", chain);
        assert!(text.starts_with("world"));
        assert!(text.contains("shoulder:revolute"));
        assert!(text.ends_with("tool0"));
    }
}
