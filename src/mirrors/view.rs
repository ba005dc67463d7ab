//! The secondary view rendered by a mirror.

use bevy_asset::Handle;
use bevy_ecs::prelude::*;
use bevy_math::{Quat, Vec3};
use bevy_mesh::Mesh;
use bevy_reflect::Reflect;
use bevy_transform::prelude::*;

use super::*;

/// [Component] of the secondary ("portal") view of a [Mirror], on its own entity.
///
/// Its [Transform] follows the mirror, while the render-time view (the reflected
/// eye) is stored separately. Created by [create_secondary_views], despawned
/// with its mirror.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct SecondaryView {
    /// The mirror owning this view.
    pub mirror: Entity,
    /// Render geometry of the mirror the view is composited on.
    pub geometry: Handle<Mesh>,
    /// Width in pixels of the render target, the viewport width when created.
    pub resolution_width: u32,
    pub render_shadows: bool,
    enabled: bool,
    view_position: Vec3,
    view_rotation: Quat,
    field_of_view: f32,
    aspect: f32,
    clip_plane: Option<MirrorPlane>,
    last_plane: Option<MirrorPlane>,
}

impl SecondaryView {
    pub fn new(mirror: Entity, geometry: Handle<Mesh>, resolution_width: u32) -> Self {
        Self {
            mirror,
            geometry,
            resolution_width,
            render_shadows: true,
            enabled: true,
            view_position: Vec3::ZERO,
            view_rotation: Quat::IDENTITY,
            field_of_view: 0.0,
            aspect: 1.0,
            clip_plane: None,
            last_plane: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn view_position(&self) -> Vec3 {
        self.view_position
    }

    pub fn view_rotation(&self) -> Quat {
        self.view_rotation
    }

    pub fn set_view(&mut self, position: Vec3, rotation: Quat) {
        self.view_position = position;
        self.view_rotation = rotation;
    }

    /// Vertical field of view in radians.
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn set_field_of_view(&mut self, field_of_view: f32) {
        self.field_of_view = field_of_view;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Geometry on the negative side of this plane is not rendered, `None` until
    /// the first update.
    pub fn clip_plane(&self) -> Option<MirrorPlane> {
        self.clip_plane
    }

    pub fn set_clip_plane(&mut self, plane: MirrorPlane) {
        self.clip_plane = Some(plane);
    }

    /// The mirror plane of the last update, for debug display.
    pub fn last_plane(&self) -> Option<MirrorPlane> {
        self.last_plane
    }

    /// Pushes the parameters of a frame into the view.
    pub fn apply(&mut self, params: &SecondaryViewParams) {
        self.set_view(params.view_position, params.view_rotation);
        self.set_field_of_view(params.field_of_view);
        self.set_aspect(params.aspect);
        self.set_clip_plane(params.clip_plane);
        self.last_plane = Some(params.plane);
    }
}

/// [Component] on a [Mirror] referencing its [SecondaryView] entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct MirrorView {
    pub view: Entity,
}
