//! System and helpers for the per-frame update of secondary views

use bevy_app::prelude::*;
use bevy_camera::prelude::Projection;
use bevy_color::palettes::basic::{GREEN, RED, WHITE};
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_time::Time;
use bevy_transform::prelude::*;
use tracing::{error, trace};

use super::*;

/// Length of the clip plane normal drawn by the debug overlay.
const DEBUG_NORMAL_LENGTH: f32 = 1.0;
/// Radius of the debug markers.
const DEBUG_MARKER_RADIUS: f32 = 0.1;

/// Add the update logic to [MirrorsPlugin]
pub(super) fn build_update(app: &mut App) {
    app.add_systems(PostUpdate, update_mirror_views.in_set(MirrorSystems::Reflect));
}

/// Reflects the [MirrorViewer] camera in every mirror which has a live [SecondaryView].
///
/// Mirrors without a view yet are skipped. If the plane probe of a mirror hits
/// nothing the error is logged and its view keeps the values of the last frame.
#[allow(clippy::too_many_arguments)]
pub fn update_mirror_views(
    settings: Res<MirrorSettings>,
    debug: Res<MirrorDebugSettings>,
    viewport: Res<MirrorViewport>,
    probe: Res<MirrorProbe>,
    time: Res<Time>,
    mut overlay: ResMut<MirrorDebugOverlay>,
    viewer_query: Query<(&GlobalTransform, Option<&Projection>), (With<MirrorViewer>, Without<SecondaryView>)>,
    mirror_query: Query<(Entity, &Mirror, &GlobalTransform, &MirrorView)>,
    mut views: Query<(&mut SecondaryView, &mut Transform, &mut GlobalTransform), Without<Mirror>>,
) {
    overlay.begin_frame(debug.draw_overlay, time.delta_secs());

    let Some((viewer_transform, viewer_projection)) = viewer_query.iter().next() else {
        trace!("No MirrorViewer camera, skipping mirrors");
        return;
    };
    let camera = PrimaryCameraState::from_camera(viewer_transform, viewer_projection);

    for (mirror_entity, mirror, mirror_global_transform, mirror_view) in &mirror_query {
        let Ok((mut view, mut view_transform, mut view_global_transform)) = views.get_mut(mirror_view.view)
        else {
            trace!("Mirror {mirror_entity} has no secondary view yet");
            continue;
        };

        view.set_enabled(true);
        let mirror_transform = mirror_global_transform.compute_transform();

        if debug.update_geometry {
            match locate_plane_normal(
                probe.as_ref(),
                camera.position,
                mirror_transform.translation,
                settings.probe_shape,
                &settings.geometry_tag,
                overlay.as_mut(),
            ) {
                Ok(plane_normal) => {
                    let params = compute_secondary_view(
                        mirror_transform.translation,
                        plane_normal,
                        mirror.clip_offset,
                        &camera,
                        viewport.aspect(),
                        settings.fov_mode,
                    );
                    view.apply(&params);
                    // Written by hand, transform propagation already ran this frame
                    *view_transform = mirror_transform;
                    *view_global_transform = *mirror_global_transform;
                }
                Err(error) => error!("Mirror {mirror_entity}: {error}"),
            }
        }

        if overlay.is_enabled() {
            draw_mirror_debug(overlay.as_mut(), mirror_entity, mirror_transform.translation, &view);
        }
    }
}

/// Labels and markers for a mirror, its clip plane and its reflected eye.
fn draw_mirror_debug(
    overlay: &mut dyn DebugOverlay,
    mirror_entity: Entity,
    mirror_position: Vec3,
    view: &SecondaryView,
) {
    let options = DrawOptions {
        duration: None,
        ignore_depth: true,
    };

    overlay.sphere(mirror_position, DEBUG_MARKER_RADIUS, WHITE.into(), options);
    overlay.text(mirror_position, format!("mirror {mirror_entity}"), WHITE.into(), options);

    if let Some(clip_plane) = view.clip_plane() {
        // Project the anchor on the biased plane
        let origin = mirror_position - clip_plane.signed_distance(mirror_position) * clip_plane.normal;
        overlay.vector(origin, origin + clip_plane.normal * DEBUG_NORMAL_LENGTH, GREEN.into());
        overlay.text(
            origin,
            format!("clip plane d={:.2}", clip_plane.distance),
            GREEN.into(),
            options,
        );
    }

    overlay.sphere(view.view_position(), DEBUG_MARKER_RADIUS, RED.into(), options);
    overlay.text(
        view.view_position(),
        format!("reflected eye fov={:.1}°", view.field_of_view().to_degrees()),
        RED.into(),
        options,
    );
}
