//! Debug overlay used to visualize probes, planes and reflected eyes.

use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_math::Vec3;

/// Radius of the knob drawn at the end of [DebugOverlay::vector].
pub const DEBUG_KNOB_RADIUS: f32 = 0.05;

/// Options shared by every debug primitive.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DrawOptions {
    /// How long the primitive stays, in seconds, `None` for a single frame.
    pub duration: Option<f32>,
    /// Draw on top of the scene.
    pub ignore_depth: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DebugPrimitive {
    Line {
        start: Vec3,
        end: Vec3,
        color: Color,
        options: DrawOptions,
    },
    Sphere {
        center: Vec3,
        radius: f32,
        color: Color,
        options: DrawOptions,
    },
    Text {
        position: Vec3,
        text: String,
        color: Color,
        options: DrawOptions,
    },
}

impl DebugPrimitive {
    fn options_mut(&mut self) -> &mut DrawOptions {
        match self {
            DebugPrimitive::Line { options, .. }
            | DebugPrimitive::Sphere { options, .. }
            | DebugPrimitive::Text { options, .. } => options,
        }
    }
}

/// Debug drawing service, side effects only.
pub trait DebugOverlay {
    /// Callers can skip building labels when this is false.
    fn is_enabled(&self) -> bool {
        true
    }

    fn line(&mut self, start: Vec3, end: Vec3, color: Color, options: DrawOptions);

    fn sphere(&mut self, center: Vec3, radius: f32, color: Color, options: DrawOptions);

    fn text(&mut self, position: Vec3, text: String, color: Color, options: DrawOptions);

    /// A line with a small sphere at its end.
    fn vector(&mut self, start: Vec3, end: Vec3, color: Color) {
        self.line(start, end, color, DrawOptions::default());
        self.sphere(end, DEBUG_KNOB_RADIUS, color, DrawOptions::default());
    }
}

/// Draws nothing.
impl DebugOverlay for () {
    fn is_enabled(&self) -> bool {
        false
    }

    fn line(&mut self, _: Vec3, _: Vec3, _: Color, _: DrawOptions) {}

    fn sphere(&mut self, _: Vec3, _: f32, _: Color, _: DrawOptions) {}

    fn text(&mut self, _: Vec3, _: String, _: Color, _: DrawOptions) {}
}

/// [Resource] collecting the debug primitives of the mirrors for the current frame.
///
/// Filled by [update_mirror_views](super::update_mirror_views) when
/// [MirrorDebugSettings::draw_overlay](super::MirrorDebugSettings) is on, it is
/// up to the host to draw them (or to enable the `gizmos` feature).
#[derive(Resource, Debug, Default)]
pub struct MirrorDebugOverlay {
    enabled: bool,
    primitives: Vec<DebugPrimitive>,
}

impl MirrorDebugOverlay {
    /// Drops the expired primitives and enables or disables recording.
    pub fn begin_frame(&mut self, enabled: bool, delta_secs: f32) {
        self.enabled = enabled;
        self.primitives.retain_mut(|primitive| {
            let options = primitive.options_mut();
            match options.duration.as_mut() {
                Some(remaining) => {
                    *remaining -= delta_secs;
                    *remaining > 0.0
                }
                None => false,
            }
        });
    }

    pub fn primitives(&self) -> &[DebugPrimitive] {
        &self.primitives
    }

    fn push(&mut self, primitive: DebugPrimitive) {
        if self.enabled {
            self.primitives.push(primitive);
        }
    }
}

impl DebugOverlay for MirrorDebugOverlay {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn line(&mut self, start: Vec3, end: Vec3, color: Color, options: DrawOptions) {
        self.push(DebugPrimitive::Line {
            start,
            end,
            color,
            options,
        });
    }

    fn sphere(&mut self, center: Vec3, radius: f32, color: Color, options: DrawOptions) {
        self.push(DebugPrimitive::Sphere {
            center,
            radius,
            color,
            options,
        });
    }

    fn text(&mut self, position: Vec3, text: String, color: Color, options: DrawOptions) {
        self.push(DebugPrimitive::Text {
            position,
            text,
            color,
            options,
        });
    }
}

/// Draws the [MirrorDebugOverlay] with gizmos.
///
/// Gizmos can't render text, labels are drawn as a small sphere and traced.
#[cfg(feature = "gizmos")]
pub fn draw_debug_gizmos(overlay: Res<MirrorDebugOverlay>, mut gizmos: bevy_gizmos::prelude::Gizmos) {
    use bevy_math::Isometry3d;

    for primitive in overlay.primitives() {
        match primitive {
            DebugPrimitive::Line {
                start, end, color, ..
            } => gizmos.line(*start, *end, *color),
            DebugPrimitive::Sphere {
                center,
                radius,
                color,
                ..
            } => {
                gizmos.sphere(Isometry3d::from_translation(*center), *radius, *color);
            }
            DebugPrimitive::Text {
                position,
                text,
                color,
                ..
            } => {
                gizmos.sphere(Isometry3d::from_translation(*position), DEBUG_KNOB_RADIUS * 0.5, *color);
                tracing::trace!("{text} at {position}");
            }
        }
    }
}
