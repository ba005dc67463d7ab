//! Systems for the creation of the secondary views of mirrors

use bevy_app::prelude::*;
use bevy_asset::Handle;
use bevy_ecs::prelude::*;
use bevy_mesh::{Mesh, Mesh3d};
use bevy_transform::prelude::*;
use bevy_window::{PrimaryWindow, Window};
use tracing::debug;

use super::*;

/// Add the creation logic to [MirrorsPlugin]
pub(super) fn build_create(app: &mut App) {
    app.register_type::<SecondaryView>()
        .register_type::<MirrorView>()
        .add_systems(PostUpdate, sync_viewport.in_set(MirrorSystems::Sync))
        .add_systems(
            PostUpdate,
            (recreate_secondary_views, create_secondary_views)
                .chain()
                .in_set(MirrorSystems::Lifecycle),
        );
}

/// [System] copying the size of the primary window into [MirrorViewport].
///
/// Leaves the viewport untouched when there is no primary window.
pub fn sync_viewport(
    mut viewport: ResMut<MirrorViewport>,
    primary_window_query: Query<&Window, With<PrimaryWindow>>,
) {
    if let Some(window) = primary_window_query.iter().next() {
        viewport.set_if_neq(MirrorViewport::new(
            window.physical_width() as f32,
            window.physical_height() as f32,
        ));
    }
}

/// [System] creating the [SecondaryView] of mirrors on their first model assignment.
///
/// A mirror whose view is still alive is left alone when its model changes again.
/// Does nothing if [MirrorSettings::renders] is false.
pub fn create_secondary_views(
    mut commands: Commands,
    settings: Res<MirrorSettings>,
    viewport: Res<MirrorViewport>,
    mut tasks: ResMut<DeferredMirrorTasks>,
    mirrors_to_create: Query<
        (Entity, &GlobalTransform, &Mesh3d, Option<&MirrorView>),
        (With<Mirror>, Changed<Mesh3d>),
    >,
    views: Query<(), With<SecondaryView>>,
) {
    if !settings.renders {
        return;
    }

    for (mirror_entity, mirror_transform, mesh, mirror_view) in &mirrors_to_create {
        if mirror_view.is_some_and(|mirror_view| views.contains(mirror_view.view)) {
            continue;
        }
        spawn_secondary_view(
            &mut commands,
            &mut tasks,
            &settings,
            &viewport,
            mirror_entity,
            mirror_transform,
            mesh.0.clone(),
        );
    }
}

/// [System] handling [RecreateMirrorView]: the old view is destroyed before a new one is created.
pub fn recreate_secondary_views(
    mut commands: Commands,
    settings: Res<MirrorSettings>,
    viewport: Res<MirrorViewport>,
    mut tasks: ResMut<DeferredMirrorTasks>,
    mirrors_to_recreate: Query<
        (Entity, &GlobalTransform, Option<&Mesh3d>, Option<&MirrorView>),
        (With<Mirror>, With<RecreateMirrorView>),
    >,
) {
    for (mirror_entity, mirror_transform, mesh, mirror_view) in &mirrors_to_recreate {
        let mut mirror_commands = commands.entity(mirror_entity);
        mirror_commands.remove::<RecreateMirrorView>();
        if mirror_view.is_some() {
            mirror_commands.remove::<MirrorView>();
        }
        if let Some(mirror_view) = mirror_view {
            destroy_secondary_view(&mut commands, mirror_view.view);
        }

        if !settings.renders {
            continue;
        }
        match mesh {
            Some(mesh) => spawn_secondary_view(
                &mut commands,
                &mut tasks,
                &settings,
                &viewport,
                mirror_entity,
                mirror_transform,
                mesh.0.clone(),
            ),
            // Will be created on model assignment
            None => debug!("Mirror {mirror_entity} has no model yet, its secondary view is not recreated"),
        }
    }
}

/// Spawns the [SecondaryView] of a mirror and schedules hiding the original mirror.
fn spawn_secondary_view(
    commands: &mut Commands,
    tasks: &mut DeferredMirrorTasks,
    settings: &MirrorSettings,
    viewport: &MirrorViewport,
    mirror_entity: Entity,
    mirror_transform: &GlobalTransform,
    geometry: Handle<Mesh>,
) {
    let transform = mirror_transform.compute_transform();
    let view_entity = commands
        .spawn((
            SecondaryView::new(mirror_entity, geometry, viewport.width.max(1.0) as u32),
            transform,
            *mirror_transform,
        ))
        .id();

    let guard = tasks.schedule(
        mirror_entity,
        settings.hide_original_delay,
        DeferredAction::HideOriginal,
    );

    commands.entity(mirror_entity).insert((
        MirrorView { view: view_entity },
        guard,
    ));

    debug!("Created secondary view {view_entity} for mirror {mirror_entity}");
}
