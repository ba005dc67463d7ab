//! Systems and helpers for the destruction of secondary views

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use tracing::{debug, warn};

use super::*;

/// Add the despawn logic to [MirrorsPlugin]
pub(super) fn build_despawn(app: &mut App) {
    app.add_systems(
        PostUpdate,
        despawn_orphaned_views
            .in_set(MirrorSystems::Lifecycle)
            .before(recreate_secondary_views),
    );
}

/// Despawns a [SecondaryView] entity, if it still exists.
pub fn destroy_secondary_view(commands: &mut Commands, view: Entity) {
    if let Ok(mut view_commands) = commands.get_entity(view) {
        view_commands.try_despawn();
    }
}

/// [System] which despawns the [SecondaryView]s whose [Mirror] despawned, or
/// which are not the view referenced by their mirror anymore.
///
/// Keeps at most one secondary view per mirror.
pub fn despawn_orphaned_views(
    mut commands: Commands,
    views: Query<(Entity, &SecondaryView)>,
    mirrors: Query<Option<&MirrorView>, With<Mirror>>,
) {
    for (view_entity, view) in &views {
        match mirrors.get(view.mirror) {
            Err(_) => {
                debug!("Mirror {} is gone, despawning its secondary view {view_entity}", view.mirror);
                destroy_secondary_view(&mut commands, view_entity);
            }
            Ok(Some(mirror_view)) if mirror_view.view == view_entity => {}
            Ok(_) => {
                warn!(
                    "Secondary view {view_entity} is not the view of its mirror {}, despawning it",
                    view.mirror
                );
                destroy_secondary_view(&mut commands, view_entity);
            }
        }
    }
}
