//! Planar reflection math used to place the secondary view of a mirror.
//!
//! Everything in here is pure: it takes the primary camera and the mirror plane
//! of the current frame and returns the parameters of the reflected view,
//! nothing is accumulated between frames.

use bevy_camera::prelude::{PerspectiveProjection, Projection};
use bevy_math::{Mat4, Quat, Vec3, Vec4};
use bevy_reflect::Reflect;
use bevy_transform::prelude::*;

/// A plane defined by a unit normal and its signed distance from the world origin.
///
/// Points `p` on the plane satisfy `normal.dot(p) == distance`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MirrorPlane {
    pub normal: Vec3,
    pub distance: f32,
}

impl MirrorPlane {
    /// Plane going through `point`, `normal` is normalized (a zero normal stays zero).
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Positive on the side the normal points to.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Moves the plane along its normal by `offset`.
    pub fn with_offset(self, offset: f32) -> Self {
        Self {
            distance: self.distance + offset,
            ..self
        }
    }

    /// The point of the plane closest to the world origin.
    pub fn origin(&self) -> Vec3 {
        self.normal * self.distance
    }

    /// The plane as `(normal, w)` where the kept half-space is `normal.dot(p) + w >= 0`,
    /// which is the layout of a [HalfSpace](bevy_camera::primitives::HalfSpace).
    pub fn to_half_space(&self) -> Vec4 {
        self.normal.extend(-self.distance)
    }

    /// Affine matrix reflecting points and directions across this plane.
    ///
    /// Diagonal terms are `1 - 2n²`, off-diagonal terms `-2 nᵢ nⱼ` and the
    /// translation `-2 (-d) n`. The matrix is its own inverse.
    pub fn reflection_matrix(&self) -> Mat4 {
        let n = self.normal;
        let d = self.distance;
        Mat4::from_cols(
            Vec4::new(
                1.0 - 2.0 * n.x * n.x,
                -2.0 * n.y * n.x,
                -2.0 * n.z * n.x,
                0.0,
            ),
            Vec4::new(
                -2.0 * n.x * n.y,
                1.0 - 2.0 * n.y * n.y,
                -2.0 * n.z * n.y,
                0.0,
            ),
            Vec4::new(
                -2.0 * n.x * n.z,
                -2.0 * n.y * n.z,
                1.0 - 2.0 * n.z * n.z,
                0.0,
            ),
            Vec4::new(
                -2.0 * -d * n.x,
                -2.0 * -d * n.y,
                -2.0 * -d * n.z,
                1.0,
            ),
        )
    }

    pub fn reflect_point(&self, point: Vec3) -> Vec3 {
        self.reflection_matrix().transform_point3(point)
    }
}

/// `v - 2 (v·n) n`
pub fn reflect_direction(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Reflects the forward and up directions of `rotation` across `normal` and
/// builds a proper rotation looking along the reflected forward.
///
/// The rotation is not extracted from the reflection matrix, which has a
/// negative determinant.
pub fn reflect_rotation(rotation: Quat, normal: Vec3) -> Quat {
    let forward = reflect_direction(rotation * Vec3::NEG_Z, normal);
    let up = reflect_direction(rotation * Vec3::Y, normal);
    Transform::IDENTITY.looking_to(forward, up).rotation
}

/// How the field of view of the secondary view is derived from the primary camera's.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub enum FovMode {
    /// Use the primary camera's field of view unchanged.
    #[default]
    PassThrough,
    /// Compensate for the off-axis projection with
    /// `atan(tan(fov * 0.5 * scale) * aspect * aspect_factor) * 2`.
    Adjusted { scale: f32, aspect_factor: f32 },
}

impl FovMode {
    /// The constants of the first mirror implementations, kept for visual parity.
    pub const LEGACY_ADJUSTED: Self = Self::Adjusted {
        scale: 0.82,
        aspect_factor: 0.75,
    };

    /// `field_of_view` is in radians, so is the result.
    pub fn field_of_view(&self, field_of_view: f32, aspect: f32) -> f32 {
        match *self {
            FovMode::PassThrough => field_of_view,
            FovMode::Adjusted {
                scale,
                aspect_factor,
            } => ((field_of_view * 0.5 * scale).tan() * aspect * aspect_factor).atan() * 2.0,
        }
    }
}

/// State of the primary viewer's camera, sampled every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryCameraState {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view, in radians.
    pub field_of_view: f32,
}

impl PrimaryCameraState {
    /// Samples the camera, non perspective projections fall back to the default field of view.
    pub fn from_camera(transform: &GlobalTransform, projection: Option<&Projection>) -> Self {
        let field_of_view = match projection {
            Some(Projection::Perspective(perspective)) => perspective.fov,
            _ => PerspectiveProjection::default().fov,
        };
        Self {
            position: transform.translation(),
            rotation: transform.rotation(),
            field_of_view,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// World matrix of the camera, looking along its forward with its up as the up axis.
    pub fn world_matrix(&self) -> Mat4 {
        let rotation = Transform::IDENTITY
            .looking_to(self.forward(), self.up())
            .rotation;
        Mat4::from_rotation_translation(rotation, self.position)
    }
}

/// Everything the secondary view of a mirror needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryViewParams {
    /// The mirror plane the view was reflected across.
    pub plane: MirrorPlane,
    /// Reflected eye position.
    pub view_position: Vec3,
    /// Reflected eye orientation.
    pub view_rotation: Quat,
    pub field_of_view: f32,
    pub aspect: f32,
    /// Faces the mirror from the reflected eye, biased by the mirror's clip offset.
    pub clip_plane: MirrorPlane,
}

/// Computes the reflected view of `camera` in a mirror located at `mirror_position`
/// whose surface has the normal `plane_normal`.
pub fn compute_secondary_view(
    mirror_position: Vec3,
    plane_normal: Vec3,
    clip_offset: f32,
    camera: &PrimaryCameraState,
    aspect: f32,
    fov_mode: FovMode,
) -> SecondaryViewParams {
    let plane = MirrorPlane::from_point_normal(mirror_position, plane_normal);

    let reflected_world = plane.reflection_matrix() * camera.world_matrix();
    let view_position = reflected_world.w_axis.truncate();
    let view_rotation = reflect_rotation(camera.rotation, plane.normal);

    // Must face away from the reflected eye whatever side of the mirror the probe hit
    let clip_normal = (mirror_position - view_position)
        .try_normalize()
        .unwrap_or(plane.normal);
    let clip_plane =
        MirrorPlane::from_point_normal(mirror_position, clip_normal).with_offset(clip_offset);

    SecondaryViewParams {
        plane,
        view_position,
        view_rotation,
        field_of_view: fov_mode.field_of_view(camera.field_of_view, aspect),
        aspect,
        clip_plane,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f32 = 1e-3;

    fn camera_at(position: Vec3, forward: Vec3) -> PrimaryCameraState {
        PrimaryCameraState {
            position,
            rotation: Transform::IDENTITY.looking_to(forward, Vec3::Y).rotation,
            field_of_view: 1.2,
        }
    }

    #[test]
    fn mirror_facing_x_reflects_camera_behind_it() {
        let camera = camera_at(Vec3::new(-100., 0., 0.), Vec3::X);
        let params =
            compute_secondary_view(Vec3::ZERO, Vec3::X, -1.0, &camera, 16. / 9., FovMode::PassThrough);

        assert!(params.view_position.abs_diff_eq(Vec3::new(100., 0., 0.), EPSILON));
        let forward = params.view_rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_X, EPSILON));
        let up = params.view_rotation * Vec3::Y;
        assert!(up.abs_diff_eq(Vec3::Y, EPSILON));
    }

    #[test]
    fn clip_plane_faces_mirror_and_is_biased_toward_eye() {
        let camera = camera_at(Vec3::new(-100., 0., 0.), Vec3::X);
        // The probe may report either face of the mirror
        for normal in [Vec3::X, Vec3::NEG_X] {
            let params =
                compute_secondary_view(Vec3::ZERO, normal, -1.0, &camera, 1.0, FovMode::PassThrough);
            assert!(params.clip_plane.normal.abs_diff_eq(Vec3::NEG_X, EPSILON));
            assert!((params.clip_plane.distance - -1.0).abs() < EPSILON);
            assert!(params.clip_plane.signed_distance(Vec3::ZERO) > 0.0);
            assert!(params.clip_plane.signed_distance(params.view_position) < 0.0);
        }
    }

    #[test]
    fn eye_on_the_mirror_falls_back_to_plane_normal() {
        let camera = camera_at(Vec3::new(0., 2., 0.), Vec3::NEG_Z);
        let params =
            compute_secondary_view(Vec3::new(0., 2., 0.), Vec3::Z, 0.0, &camera, 1.0, FovMode::PassThrough);
        assert!(params.view_position.abs_diff_eq(Vec3::new(0., 2., 0.), EPSILON));
        assert_eq!(params.clip_plane.normal, Vec3::Z);
    }

    #[test]
    fn reflection_matches_translated_plane() {
        let plane = MirrorPlane::from_point_normal(Vec3::new(0., 1., 0.), Vec3::Y);
        let reflected = plane.reflect_point(Vec3::new(0., 3., 0.));
        assert!(reflected.abs_diff_eq(Vec3::new(0., -1., 0.), EPSILON));
    }

    #[test]
    fn fov_modes() {
        assert_eq!(FovMode::PassThrough.field_of_view(1.1, 2.0), 1.1);
        let adjusted = FovMode::Adjusted {
            scale: 1.0,
            aspect_factor: 1.0,
        };
        assert!((adjusted.field_of_view(1.1, 1.0) - 1.1).abs() < EPSILON);
        assert!(FovMode::LEGACY_ADJUSTED.field_of_view(1.1, 16. / 9.) > 0.0);
    }

    #[test]
    fn static_input_gives_identical_views() {
        let camera = camera_at(Vec3::new(3., 1., 7.), Vec3::new(-0.3, 0.1, -1.0));
        let normal = Vec3::new(0.2, 0.0, 1.0).normalize();
        let first = compute_secondary_view(Vec3::ONE, normal, -1.0, &camera, 1.5, FovMode::PassThrough);
        let second = compute_secondary_view(Vec3::ONE, normal, -1.0, &camera, 1.5, FovMode::PassThrough);
        assert_eq!(first, second);
    }

    fn unit_normal() -> impl Strategy<Value = Vec3> {
        (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
            .prop_filter("normal must not be degenerate", |v| v.length() > 0.1)
            .prop_map(Vec3::normalize)
    }

    fn point() -> impl Strategy<Value = Vec3> {
        (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn points_on_the_plane_are_fixed(normal in unit_normal(), origin in point(), offset in point()) {
            let plane = MirrorPlane::from_point_normal(origin, normal);
            // Project an arbitrary point onto the plane
            let on_plane = offset - plane.signed_distance(offset) * plane.normal;
            prop_assert!(plane.reflect_point(on_plane).abs_diff_eq(on_plane, 0.05));
        }

        #[test]
        fn reflecting_twice_is_identity(normal in unit_normal(), origin in point(), p in point()) {
            let plane = MirrorPlane::from_point_normal(origin, normal);
            let back = plane.reflect_point(plane.reflect_point(p));
            prop_assert!(back.abs_diff_eq(p, 0.05));
        }

        #[test]
        fn points_and_directions_reflect_consistently(normal in unit_normal(), origin in point(), a in point(), b in point()) {
            let plane = MirrorPlane::from_point_normal(origin, normal);
            let matrix = plane.reflection_matrix();
            let reflected_segment = plane.reflect_point(b) - plane.reflect_point(a);
            prop_assert!(reflected_segment.abs_diff_eq(matrix.transform_vector3(b - a), 0.05));
            prop_assert!(reflected_segment.abs_diff_eq(reflect_direction(b - a, plane.normal), 0.05));
        }

        #[test]
        fn reflected_basis_stays_orthogonal(normal in unit_normal(), yaw in -3.1f32..3.1, pitch in -1.5f32..1.5) {
            let rotation = Quat::from_euler(bevy_math::EulerRot::YXZ, yaw, pitch, 0.0);
            let forward = reflect_direction(rotation * Vec3::NEG_Z, normal);
            let up = reflect_direction(rotation * Vec3::Y, normal);
            prop_assert!(forward.dot(up).abs() < EPSILON);

            let reflected = reflect_rotation(rotation, normal);
            prop_assert!((reflected * Vec3::NEG_Z).abs_diff_eq(forward, EPSILON));
            prop_assert!((reflected * Vec3::Y).abs_diff_eq(up, EPSILON));
        }

        #[test]
        fn clip_plane_faces_the_mirror(normal in unit_normal(), mirror in point(), eye in point()) {
            let camera = camera_at(eye, Vec3::NEG_Z);
            let params = compute_secondary_view(mirror, normal, -1.0, &camera, 1.0, FovMode::PassThrough);
            prop_assume!(params.view_position.distance(mirror) > 0.1);
            prop_assert!(params.clip_plane.normal.dot(mirror - params.view_position) > 0.0);
        }
    }
}
