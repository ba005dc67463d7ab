//! Components, resources and plugin to create mirrors without caring about their implementation

use std::borrow::Cow;
use std::time::Duration;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_reflect::{std_traits::ReflectDefault, Reflect};
use bevy_time::Time;
use bevy_transform::prelude::*;

use super::*;

/// Default offset of the clip plane, toward the reflected eye, hiding the seam at the mirror edges.
pub const DEFAULT_CLIP_OFFSET: f32 = -1.0;

/// Default material of the mirror surface.
pub const DEFAULT_MIRROR_MATERIAL: &str = "materials/mirror.vmat";

/// [Plugin] to add support for mirrors to a bevy App.
pub struct MirrorsPlugin {
    /// Will be added as a [Resource], can be changed during execution.
    pub settings: MirrorSettings,
    /// Initial debug toggles, will be added as a [Resource].
    pub debug: MirrorDebugSettings,
}

impl Default for MirrorsPlugin {
    fn default() -> Self {
        MirrorsPlugin {
            settings: MirrorSettings::default(),
            debug: MirrorDebugSettings::default(),
        }
    }
}

impl MirrorsPlugin {
    /// Draws the debug overlay from the start.
    pub const DEBUG: Self = Self {
        settings: MirrorSettings::DEFAULT,
        debug: MirrorDebugSettings {
            draw_overlay: true,
            update_geometry: true,
        },
    };

    /// For processes that don't render (servers), no secondary view is ever created.
    pub const HEADLESS: Self = Self {
        settings: MirrorSettings {
            renders: false,
            ..MirrorSettings::DEFAULT
        },
        debug: MirrorDebugSettings::DEFAULT,
    };
}

impl Plugin for MirrorsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .insert_resource(self.debug)
            .init_resource::<MirrorViewport>()
            .init_resource::<MirrorDebugOverlay>()
            .init_resource::<Time>()
            .register_type::<Mirror>()
            .register_type::<MirrorViewer>()
            .register_type::<MirrorSettings>()
            .register_type::<MirrorDebugSettings>()
            .register_type::<MirrorViewport>()
            .configure_sets(
                PostUpdate,
                (
                    MirrorSystems::Sync,
                    MirrorSystems::Lifecycle,
                    MirrorSystems::Reflect,
                    MirrorSystems::Camera,
                )
                    .chain()
                    .after(TransformSystems::Propagate),
            );

        build_locate(app);
        build_create(app);
        build_deferred(app);
        build_update(app);
        build_despawn(app);
        build_camera(app);

        #[cfg(feature = "gizmos")]
        app.add_systems(PostUpdate, draw_debug_gizmos.after(MirrorSystems::Reflect));
    }
}

/// Sets of the systems of [MirrorsPlugin], run in this order in [PostUpdate].
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirrorSystems {
    /// Viewport and colliders are read from the world.
    Sync,
    /// Secondary views are created and destroyed, deferred tasks run.
    Lifecycle,
    /// Secondary views are reflected.
    Reflect,
    /// [ReflectionCamera]s follow their views.
    Camera,
}

/// Configuration of the mirrors.
#[derive(Resource, Debug, Clone, PartialEq, Reflect)]
#[reflect(Resource, Default)]
pub struct MirrorSettings {
    /// False on processes which don't render, secondary views are then never created.
    pub renders: bool,
    /// Shape used to probe the mirror plane.
    pub probe_shape: ProbeShape,
    /// Tag of the geometry the plane probe can hit.
    pub geometry_tag: Cow<'static, str>,
    pub fov_mode: FovMode,
    /// Delay between the creation of a secondary view and hiding the original mirror,
    /// long enough for the view to render once.
    pub hide_original_delay: Duration,
}

impl MirrorSettings {
    pub const DEFAULT: Self = Self {
        renders: true,
        probe_shape: ProbeShape::Ray,
        geometry_tag: Cow::Borrowed(MIRROR_TAG),
        fov_mode: FovMode::PassThrough,
        hide_original_delay: Duration::from_millis(100),
    };
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runtime debug toggles shared by all mirrors, see [MirrorConsoleCommand].
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Resource, Default)]
pub struct MirrorDebugSettings {
    /// Record labels and markers for the mirrors, their clip planes and reflected eyes
    /// into [MirrorDebugOverlay].
    pub draw_overlay: bool,
    /// When false, secondary views stay enabled but stop following the primary camera.
    pub update_geometry: bool,
}

impl MirrorDebugSettings {
    pub const DEFAULT: Self = Self {
        draw_overlay: false,
        update_geometry: true,
    };
}

impl Default for MirrorDebugSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Size in pixels of the primary viewport, refreshed from the primary window every frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Resource, Default)]
pub struct MirrorViewport {
    pub width: f32,
    pub height: f32,
}

impl Default for MirrorViewport {
    fn default() -> Self {
        Self {
            width: 1280.,
            height: 720.,
        }
    }
}

impl MirrorViewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `width / height`, 1 for a collapsed viewport.
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// [Component] of a planar mirror.
///
/// The mirror gets its [SecondaryView] when a [Mesh3d](bevy_mesh::Mesh3d) is first
/// assigned to it. Its plane is found by probing geometry tagged as mirror
/// geometry, usually a [MirrorCollider] on the same entity.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component, Default)]
#[require(Transform)]
pub struct Mirror {
    /// Added to the distance of the clip plane, negative values move it toward
    /// the reflected eye.
    pub clip_offset: f32,
    /// Asset path of the surface material.
    pub material: String,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            clip_offset: DEFAULT_CLIP_OFFSET,
            material: DEFAULT_MIRROR_MATERIAL.to_owned(),
        }
    }
}

/// Marker [Component] for the camera looking at the mirrors.
///
/// Should be on a single camera, the first one found is used.
#[derive(Component, Debug, Default, Clone, Copy, Reflect)]
#[reflect(Component, Default)]
pub struct MirrorViewer;

/// Marker [Component] to destroy the [SecondaryView] of a [Mirror] and create a new one.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct RecreateMirrorView;
