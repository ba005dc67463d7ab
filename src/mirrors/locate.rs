//! Finds the plane of a mirror by probing the world geometry from the viewer's eye.

use std::borrow::Cow;

use bevy_app::prelude::*;
use bevy_color::palettes::basic::YELLOW;
use bevy_ecs::prelude::*;
use bevy_math::{
    bounding::{Aabb3d, RayCast3d},
    Dir3, Quat, Ray3d, Vec2, Vec3,
};
use bevy_reflect::{std_traits::ReflectDefault, Reflect};
use bevy_transform::prelude::*;

use super::*;
use super::Result;

/// Tag carried by mirror geometry.
pub const MIRROR_TAG: &str = "mirror";

/// Relative overshoot allowed past the end of a probe, which usually ends exactly on the surface.
const PROBE_TOLERANCE: f32 = 1e-4;

/// Add the plane locator logic to [MirrorsPlugin]
pub(super) fn build_locate(app: &mut App) {
    app.register_type::<MirrorCollider>()
        .init_resource::<MirrorProbe>()
        .add_systems(PostUpdate, sync_mirror_colliders.in_set(MirrorSystems::Sync));
}

/// Shape swept by the plane probe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub enum ProbeShape {
    #[default]
    Ray,
    /// A sphere of the given radius, catches thin or slightly misaligned mirrors.
    Sphere { radius: f32 },
}

/// A request to the [GeometryProbe] service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeQuery<'a> {
    pub start: Vec3,
    pub end: Vec3,
    pub shape: ProbeShape,
    /// Only geometry with this tag can be hit.
    pub tag: &'a str,
    /// Ignore world geometry that isn't an entity.
    ///
    /// Advisory, for probes backed by a physics world. [PlanarColliderProbe] only
    /// knows entities.
    pub entities_only: bool,
    /// Also consider geometry that only exists on this process.
    pub include_client_only: bool,
}

impl<'a> ProbeQuery<'a> {
    /// The query the plane locator runs, toward mirror entities only, client-only geometry included.
    pub fn mirror_geometry(start: Vec3, end: Vec3, shape: ProbeShape, tag: &'a str) -> Self {
        Self {
            start,
            end,
            shape,
            tag,
            entities_only: true,
            include_client_only: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub entity: Option<Entity>,
    pub position: Vec3,
    /// Normal of the face that was hit, facing the start of the probe.
    pub normal: Vec3,
    /// Distance travelled along the probe before the hit.
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub start: Vec3,
    pub end: Vec3,
    pub hit: Option<ProbeHit>,
}

/// Ray and sphere casts against the world.
///
/// The host engine usually provides this through its physics backend, see [MirrorProbe::custom].
pub trait GeometryProbe: Send + Sync + 'static {
    fn probe(&self, query: &ProbeQuery) -> ProbeResult;
}

/// [Component] describing the collision geometry of a mirror: a rectangle in the
/// local XY plane facing local +Z, like a [Rectangle](bevy_math::primitives::Rectangle) mesh.
///
/// Used by the built-in [PlanarColliderProbe].
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component, Default)]
pub struct MirrorCollider {
    pub half_size: Vec2,
    pub tag: Cow<'static, str>,
    /// Geometry which only exists on this process (never replicated).
    pub client_only: bool,
}

impl Default for MirrorCollider {
    fn default() -> Self {
        Self {
            half_size: Vec2::splat(0.5),
            tag: Cow::Borrowed(MIRROR_TAG),
            client_only: false,
        }
    }
}

impl MirrorCollider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_size: size * 0.5,
            ..Self::default()
        }
    }
}

/// A [MirrorCollider] placed in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarCollider {
    pub entity: Entity,
    pub center: Vec3,
    pub rotation: Quat,
    pub half_size: Vec2,
    pub tag: Cow<'static, str>,
    pub client_only: bool,
}

impl PlanarCollider {
    pub fn from_collider(entity: Entity, collider: &MirrorCollider, transform: &GlobalTransform) -> Self {
        let (scale, rotation, center) = transform.to_scale_rotation_translation();
        Self {
            entity,
            center,
            rotation,
            half_size: collider.half_size * scale.truncate(),
            tag: collider.tag.clone(),
            client_only: collider.client_only,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Sweeps `shape` along `ray` for `max_distance`.
    ///
    /// The cast runs in collider space against the rectangle, grown by the radius
    /// of a sphere on every side.
    fn cast(&self, ray: Ray3d, max_distance: f32, shape: ProbeShape) -> Option<ProbeHit> {
        let radius = match shape {
            ProbeShape::Ray => 0.0,
            ProbeShape::Sphere { radius } => radius.max(0.0),
        };

        let inverse = self.rotation.inverse();
        let local_origin = inverse * (ray.origin - self.center);
        let local_direction = inverse * ray.direction;
        let bounds = Aabb3d::new(Vec3::ZERO, self.half_size.abs().extend(0.0) + Vec3::splat(radius));
        let distance = RayCast3d::new(local_origin, local_direction, max_distance).aabb_intersection_at(&bounds)?;

        let facing_normal = if local_origin.z < 0.0 {
            -self.normal()
        } else {
            self.normal()
        };
        let center_at_hit = ray.get_point(distance);
        let position = center_at_hit - facing_normal * facing_normal.dot(center_at_hit - self.center);

        Some(ProbeHit {
            entity: Some(self.entity),
            position,
            normal: facing_normal,
            distance,
        })
    }
}

/// [GeometryProbe] over the [MirrorCollider] entities, refreshed every frame by
/// [sync_mirror_colliders].
#[derive(Debug, Default, Clone)]
pub struct PlanarColliderProbe {
    colliders: Vec<PlanarCollider>,
}

impl PlanarColliderProbe {
    pub fn from_colliders(colliders: Vec<PlanarCollider>) -> Self {
        Self { colliders }
    }

    pub fn rebuild<'a>(
        &mut self,
        colliders: impl IntoIterator<Item = (Entity, &'a MirrorCollider, &'a GlobalTransform)>,
    ) {
        self.colliders.clear();
        self.colliders.extend(
            colliders
                .into_iter()
                .map(|(entity, collider, transform)| PlanarCollider::from_collider(entity, collider, transform)),
        );
    }
}

impl GeometryProbe for PlanarColliderProbe {
    fn probe(&self, query: &ProbeQuery) -> ProbeResult {
        let mut result = ProbeResult {
            start: query.start,
            end: query.end,
            hit: None,
        };

        let delta = query.end - query.start;
        let Ok(direction) = Dir3::new(delta) else {
            return result;
        };
        let ray = Ray3d::new(query.start, direction);
        let length = delta.length();
        let max_distance = length + length.max(1.0) * PROBE_TOLERANCE;

        // Every collider is an entity, `entities_only` filters nothing here
        result.hit = self
            .colliders
            .iter()
            .filter(|collider| collider.tag == query.tag)
            .filter(|collider| query.include_client_only || !collider.client_only)
            .filter_map(|collider| collider.cast(ray, max_distance, query.shape))
            .min_by(|a, b| a.distance.total_cmp(&b.distance));
        result
    }
}

/// [Resource] holding the [GeometryProbe] used to locate mirror planes.
///
/// Defaults to a [PlanarColliderProbe] over [MirrorCollider] entities.
#[derive(Resource)]
pub enum MirrorProbe {
    Colliders(PlanarColliderProbe),
    Custom(Box<dyn GeometryProbe>),
}

impl Default for MirrorProbe {
    fn default() -> Self {
        MirrorProbe::Colliders(PlanarColliderProbe::default())
    }
}

impl MirrorProbe {
    /// Uses a host provided probe, [MirrorCollider]s are then ignored.
    pub fn custom(probe: impl GeometryProbe) -> Self {
        MirrorProbe::Custom(Box::new(probe))
    }
}

impl GeometryProbe for MirrorProbe {
    fn probe(&self, query: &ProbeQuery) -> ProbeResult {
        match self {
            MirrorProbe::Colliders(colliders) => colliders.probe(query),
            MirrorProbe::Custom(probe) => probe.probe(query),
        }
    }
}

/// [System] copying the [MirrorCollider]s into the built-in probe.
pub fn sync_mirror_colliders(
    mut probe: ResMut<MirrorProbe>,
    colliders: Query<(Entity, &MirrorCollider, &GlobalTransform)>,
) {
    if let MirrorProbe::Colliders(planar) = probe.as_mut() {
        planar.rebuild(&colliders);
    }
}

/// Returns the normal of the mirror surface seen from `eye`, by probing from
/// `eye` toward `anchor` which must lie on the mirror's collision geometry.
///
/// The normal faces `eye`. Draws the probe segment when the overlay is enabled.
pub fn locate_plane_normal<P: GeometryProbe + ?Sized>(
    probe: &P,
    eye: Vec3,
    anchor: Vec3,
    shape: ProbeShape,
    tag: &str,
    overlay: &mut dyn DebugOverlay,
) -> Result<Vec3> {
    let result = probe.probe(&ProbeQuery::mirror_geometry(eye, anchor, shape, tag));

    if overlay.is_enabled() {
        overlay.line(result.start, result.end, YELLOW.into(), DrawOptions::default());
    }

    match result.hit {
        Some(hit) => Ok(hit.normal),
        None => Err(MirrorError::NoProbeHit {
            start: eye,
            end: anchor,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::EulerRot;
    use std::f32::consts::FRAC_PI_2;

    fn collider(center: Vec3, rotation: Quat, half_size: Vec2) -> PlanarCollider {
        PlanarCollider {
            entity: Entity::PLACEHOLDER,
            center,
            rotation,
            half_size,
            tag: Cow::Borrowed(MIRROR_TAG),
            client_only: false,
        }
    }

    fn facing_x() -> PlanarColliderProbe {
        PlanarColliderProbe::from_colliders(vec![collider(
            Vec3::ZERO,
            Quat::from_rotation_y(FRAC_PI_2),
            Vec2::splat(2.0),
        )])
    }

    #[test]
    fn ray_ending_on_the_mirror_hits_it() {
        let normal = locate_plane_normal(
            &facing_x(),
            Vec3::new(-10., 0., 0.),
            Vec3::ZERO,
            ProbeShape::Ray,
            MIRROR_TAG,
            &mut (),
        )
        .unwrap();
        assert!(normal.abs_diff_eq(Vec3::NEG_X, 1e-4));

        let normal = locate_plane_normal(
            &facing_x(),
            Vec3::new(10., 1., 1.),
            Vec3::ZERO,
            ProbeShape::Ray,
            MIRROR_TAG,
            &mut (),
        )
        .unwrap();
        assert!(normal.abs_diff_eq(Vec3::X, 1e-4));
    }

    #[test]
    fn sphere_stops_before_the_surface() {
        let result = facing_x().probe(&ProbeQuery::mirror_geometry(
            Vec3::new(-10., 0., 0.),
            Vec3::ZERO,
            ProbeShape::Sphere { radius: 1.0 },
            MIRROR_TAG,
        ));
        let hit = result.hit.unwrap();
        assert!((hit.distance - 9.0).abs() < 1e-4);
        assert!(hit.position.abs_diff_eq(Vec3::ZERO, 1e-4));
    }

    #[test]
    fn missing_the_rectangle_is_an_error() {
        let error = locate_plane_normal(
            &facing_x(),
            Vec3::new(-10., 0., 0.),
            Vec3::new(0., 5., 0.),
            ProbeShape::Ray,
            MIRROR_TAG,
            &mut (),
        )
        .unwrap_err();
        assert!(matches!(error, MirrorError::NoProbeHit { .. }));
    }

    #[test]
    fn filters_on_tag_and_client_only() {
        let mut other = collider(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2), Vec2::splat(2.0));
        other.tag = Cow::Borrowed("wall");
        let probe = PlanarColliderProbe::from_colliders(vec![other]);
        let query = ProbeQuery::mirror_geometry(Vec3::new(-10., 0., 0.), Vec3::ZERO, ProbeShape::Ray, MIRROR_TAG);
        assert!(probe.probe(&query).hit.is_none());

        let mut client = collider(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2), Vec2::splat(2.0));
        client.client_only = true;
        let probe = PlanarColliderProbe::from_colliders(vec![client]);
        assert!(probe.probe(&query).hit.is_some());
        let server_query = ProbeQuery {
            include_client_only: false,
            ..query
        };
        assert!(probe.probe(&server_query).hit.is_none());
    }

    #[test]
    fn closest_collider_wins() {
        let probe = PlanarColliderProbe::from_colliders(vec![
            collider(Vec3::ZERO, Quat::IDENTITY, Vec2::ONE),
            collider(Vec3::new(0., 0., 5.), Quat::IDENTITY, Vec2::ONE),
        ]);
        let hit = probe
            .probe(&ProbeQuery::mirror_geometry(
                Vec3::new(0., 0., 10.),
                Vec3::ZERO,
                ProbeShape::Ray,
                MIRROR_TAG,
            ))
            .hit
            .unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-4);
    }

    #[test]
    fn far_eyes_off_axis_still_hit_the_anchor() {
        let center = Vec3::new(1234.5, 87.25, -3021.75);
        let rotation = Quat::from_euler(EulerRot::YXZ, 0.7, 0.3, 0.1);
        let probe = PlanarColliderProbe::from_colliders(vec![collider(center, rotation, Vec2::ONE)]);

        for i in 0..200 {
            let yaw = (i as f32 * 0.37).sin() * 1.2;
            let pitch = (i as f32 * 0.61).cos() * 1.2;
            let local = Vec3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos());
            let eye = center + rotation * local * (2000.0 + i as f32 * 37.0);

            let normal = locate_plane_normal(&probe, eye, center, ProbeShape::Ray, MIRROR_TAG, &mut ())
                .unwrap_or_else(|error| panic!("eye {eye}: {error}"));
            assert!(normal.abs_diff_eq(rotation * Vec3::Z, 1e-4));
        }
    }

    #[test]
    fn rebuild_places_colliders_in_world_space() {
        let transform = GlobalTransform::from(
            Transform::from_xyz(3., 0., 0.)
                .with_rotation(Quat::from_rotation_y(FRAC_PI_2))
                .with_scale(Vec3::new(2., 2., 1.)),
        );
        let collider = MirrorCollider::from_size(Vec2::ONE);
        let mut probe = PlanarColliderProbe::default();
        probe.rebuild([(Entity::PLACEHOLDER, &collider, &transform)]);

        // The scaled rectangle spans 2 units, a point 0.9 off the center is on it
        let query = ProbeQuery::mirror_geometry(Vec3::new(10., 0.9, 0.), Vec3::new(3., 0.9, 0.), ProbeShape::Ray, MIRROR_TAG);
        let hit = probe.probe(&query).hit.unwrap();
        assert_eq!(hit.entity, Some(Entity::PLACEHOLDER));
        assert!(hit.position.abs_diff_eq(Vec3::new(3., 0.9, 0.), 1e-4));
        assert!(hit.normal.abs_diff_eq(Vec3::X, 1e-4));

        probe.rebuild(Vec::<(Entity, &MirrorCollider, &GlobalTransform)>::new());
        assert!(probe.probe(&query).hit.is_none());
    }

    #[test]
    fn probe_segment_is_drawn_when_enabled() {
        let mut overlay = MirrorDebugOverlay::default();
        overlay.begin_frame(true, 0.0);
        let _ = locate_plane_normal(
            &facing_x(),
            Vec3::new(-10., 0., 0.),
            Vec3::ZERO,
            ProbeShape::Ray,
            MIRROR_TAG,
            &mut overlay,
        );
        assert!(matches!(overlay.primitives(), [DebugPrimitive::Line { .. }]));
    }
}
