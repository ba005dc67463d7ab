//! Drives real cameras from secondary views

use bevy_app::prelude::*;
use bevy_camera::{
    prelude::*,
    primitives::{Frustum, HalfSpace},
    visibility::VisibilitySystems,
};
use bevy_ecs::prelude::*;
use bevy_reflect::Reflect;
use bevy_transform::prelude::*;

use super::*;

/// Index of the near plane in [Frustum::half_spaces].
const NEAR_HALF_SPACE: usize = 4;

/// Add the camera logic to [MirrorsPlugin]
pub(super) fn build_camera(app: &mut App) {
    app.register_type::<ReflectionCamera>().add_systems(
        PostUpdate,
        (
            sync_reflection_cameras
                .in_set(MirrorSystems::Camera)
                .before(VisibilitySystems::UpdateFrusta),
            clip_reflection_frusta
                .after(VisibilitySystems::UpdateFrusta)
                .after(MirrorSystems::Camera),
        ),
    );
}

/// [Component] for a camera rendering a [SecondaryView], usually to the texture
/// displayed by the mirror's material.
///
/// The camera is moved to the reflected eye, its perspective projection gets the
/// view's field of view and aspect, it is active only while the view is enabled,
/// and the near plane of its frustum is replaced by the view's clip plane.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ReflectionCamera {
    pub view: Entity,
}

/// [System] moving the [ReflectionCamera]s to the reflected eye of their views.
pub fn sync_reflection_cameras(
    views: Query<&SecondaryView>,
    mut reflection_cameras: Query<(
        &ReflectionCamera,
        &mut Camera,
        &mut Transform,
        &mut GlobalTransform,
        Option<&mut Projection>,
    )>,
) {
    for (reflection_camera, mut camera, mut transform, mut global_transform, projection) in
        &mut reflection_cameras
    {
        let Ok(view) = views.get(reflection_camera.view) else {
            camera.is_active = false;
            continue;
        };

        camera.is_active = view.is_enabled();
        let new_transform =
            Transform::from_translation(view.view_position()).with_rotation(view.view_rotation());
        *transform = new_transform;
        // Transform propagation already ran this frame
        *global_transform = GlobalTransform::from(new_transform);

        if let Some(mut projection) = projection {
            if let Projection::Perspective(perspective) = projection.as_mut() {
                perspective.fov = view.field_of_view();
                perspective.aspect_ratio = view.aspect();
            }
        }
    }
}

/// [System] replacing the near plane of the [ReflectionCamera]s' frusta by the clip plane.
pub fn clip_reflection_frusta(
    views: Query<&SecondaryView>,
    mut reflection_cameras: Query<(&ReflectionCamera, &mut Frustum)>,
) {
    for (reflection_camera, mut frustum) in &mut reflection_cameras {
        let Some(clip_plane) = views
            .get(reflection_camera.view)
            .ok()
            .and_then(SecondaryView::clip_plane)
        else {
            continue;
        };
        frustum.half_spaces[NEAR_HALF_SPACE] = HalfSpace::new(clip_plane.to_half_space());
    }
}
