//! Bevy Basic Mirrors is a Bevy game engine plugin to create planar mirrors.
//!
//! Every frame, the camera marked with [MirrorViewer] is reflected across the plane
//! of each [Mirror], and the result (position, orientation, field of view, aspect
//! and a clip plane) is pushed into the mirror's [SecondaryView].
//!
//! ## Basic Usage
//! ```rust,no_run
//! use bevy_app::prelude::*;
//! use bevy_asset::Handle;
//! use bevy_basic_mirrors::*;
//! use bevy_ecs::prelude::*;
//! use bevy_math::Vec2;
//! use bevy_mesh::Mesh3d;
//! use bevy_transform::prelude::*;
//!
//! fn setup(mut commands: Commands) {
//!     commands.spawn((MirrorViewer, Transform::from_xyz(0., 1., 5.)));
//!     commands.spawn((
//!         Mirror::default(),
//!         MirrorCollider::from_size(Vec2::new(2., 3.)),
//!         Mesh3d(Handle::default()),
//!         Transform::from_xyz(0., 1.5, 0.),
//!     ));
//! }
//!
//! App::new()
//!     .add_plugins(MirrorsPlugin::default())
//!     .add_systems(Startup, setup)
//!     .run();
//! ```
//!
//! A window with a mirror rendering its reflection to a texture through a [ReflectionCamera]:
//! ```rust,no_run
#![doc = include_str!("../demos/mirror/main.rs")]
//! ```
//!
//! ## Vocabulary
//! - A Mirror is an entity with a planar surface reflecting the world
//! - The Viewer is the camera looking at mirrors
//! - A Secondary View is the reflected view of a mirror, its render-time position is the reflected eye
//! - A Reflection Camera is an optional camera following a secondary view
//!
//! ## Known limitations
//! - mirrors don't handle recursion, as in viewing a mirror through another mirror
//! - a single viewer is supported, the first camera with [MirrorViewer]
//! - the plane is probed from the viewer's eye to the mirror's origin, the collider
//!   of a mirror must contain its origin
//! - rendering the secondary view to a texture and compositing it on the mirror is
//!   left to the host (see [ReflectionCamera])
//! - Bevy's camera systems may update the aspect ratio of a [ReflectionCamera] from its render target

pub mod mirrors;
pub use mirrors::*;
#[doc(inline)]
pub use mirrors::{Mirror, MirrorsPlugin};
