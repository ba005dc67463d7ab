//! This example illustrates how to create a mirror and render its reflection to a texture,
//! the camera circles around a cube standing in front of the mirror

use bevy::camera::RenderTarget;
use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use bevy_basic_mirrors::*;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, MirrorsPlugin::default()))
        .add_systems(Startup, setup)
        .add_systems(Update, (orbit_viewer, attach_reflection_camera))
        .run();
}

/// The quad showing the reflection texture, the mirror itself is hidden once its view exists.
#[derive(Component)]
struct MirrorSurface {
    mirror: Entity,
    image: Handle<Image>,
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        MirrorViewer,
        Camera3d::default(),
        Transform::from_xyz(0., 2., 15.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(4., 8., 4.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let mirror_size = Vec2::new(10., 6.);
    let mirror_mesh = meshes.add(Rectangle::from_size(mirror_size));
    let mirror_transform = Transform::from_xyz(0., 0., -5.);
    let mirror = commands
        .spawn((
            Mirror::default(),
            MirrorCollider::from_size(mirror_size),
            Mesh3d(mirror_mesh.clone()),
            MeshMaterial3d(materials.add(Color::srgb(0.6, 0.6, 0.7))),
            mirror_transform,
        ))
        .id();

    // The texture holds the whole reflected view, it is not projected on the surface
    let image = images.add(Image::new_target_texture(
        1024,
        1024,
        TextureFormat::Bgra8UnormSrgb,
        None,
    ));
    commands.spawn((
        MirrorSurface {
            mirror,
            image: image.clone(),
        },
        Mesh3d(mirror_mesh),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(image),
            unlit: true,
            ..default()
        })),
        mirror_transform,
    ));

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_length(2.))),
        MeshMaterial3d(materials.add(Color::srgb(0.8, 0.3, 0.2))),
        Transform::from_xyz(0., 0., 0.),
    ));
}

/// Spawns a [ReflectionCamera] rendering to the surface texture once the mirror has its view.
fn attach_reflection_camera(
    mut commands: Commands,
    surfaces: Query<(Entity, &MirrorSurface)>,
    mirror_views: Query<&MirrorView>,
) {
    for (surface_entity, surface) in &surfaces {
        let Ok(mirror_view) = mirror_views.get(surface.mirror) else {
            continue;
        };
        commands.spawn((
            ReflectionCamera {
                view: mirror_view.view,
            },
            Camera3d::default(),
            Camera {
                order: -1,
                ..default()
            },
            RenderTarget::from(surface.image.clone()),
        ));
        commands.entity(surface_entity).remove::<MirrorSurface>();
    }
}

fn orbit_viewer(time: Res<Time>, mut viewers: Query<&mut Transform, With<MirrorViewer>>) {
    let angle = time.elapsed_secs() * 0.3;
    for mut transform in &mut viewers {
        *transform = Transform::from_xyz(angle.sin() * 12., 2., 5. + angle.cos() * 10.)
            .looking_at(Vec3::new(0., 0., -5.), Vec3::Y);
    }
}
