// view.rs      View module
//
// Copyright (c) 2024  meshpress contributors
//
use crate::mesh::build_mesh;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    log::LogPlugin,
    pbr::wireframe::{WireframeConfig, WireframePlugin},
    prelude::*,
    render::primitives::Aabb,
    tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task},
    window::{PrimaryWindow, Window},
};
use meshpress::{EncodeResult, Options};
use std::f32::consts::{FRAC_PI_2, PI};
use std::path::PathBuf;

/// Encode job resource
#[derive(Resource)]
struct EncodeJob {
    input: PathBuf,
    output: PathBuf,
    options: Options,
}

/// Outcome of an encode task
struct Outcome {
    result: EncodeResult,
    input_len: u64,
    output_len: u64,
    mesh: Option<meshpress::Mesh>,
}

/// Component for a running encode task
#[derive(Component)]
struct EncodeTask(Task<Outcome>);

/// Orbit camera around a focus point
#[derive(Component, Clone, Copy, Debug)]
struct OrbitCamera {
    focus: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
}

/// Status text
#[derive(Component)]
struct StatusText;

/// Help text
#[derive(Component)]
struct HelpText;

impl OrbitCamera {
    /// Create an orbit camera framing a bounding box
    fn framing(aabb: &Aabb) -> Self {
        let half = Vec3::from(aabb.half_extents).max(Vec3::splat(0.01));
        OrbitCamera {
            focus: Vec3::from(aabb.center),
            yaw: 0.0,
            pitch: -0.3,
            distance: half.length() * 3.0,
        }
    }

    /// Get camera rotation
    fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Make camera transform
    fn transform(&self) -> Transform {
        let rotation = self.rotation();
        Transform {
            translation: self.focus + rotation * Vec3::Z * self.distance,
            rotation,
            ..default()
        }
    }

    /// Move focus point in the view plane
    fn pan(&mut self, motion: Vec2, win_sz: Vec2) {
        let step = motion / win_sz.max(Vec2::ONE) * self.distance;
        let rotation = self.rotation();
        self.focus += rotation * Vec3::new(-step.x, step.y, 0.0);
    }

    /// Orbit around focus point
    fn orbit(&mut self, motion: Vec2, win_sz: Vec2) {
        let delta = motion / win_sz.max(Vec2::ONE) * PI;
        self.yaw -= delta.x * 2.0;
        self.pitch = (self.pitch - delta.y).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Move toward or away from focus point
    fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * 0.9_f32.powf(steps)).max(0.001);
    }
}

/// Encode a mesh in a worker task and view the decoded result
pub fn view_encode(input: PathBuf, output: PathBuf, options: Options) {
    App::new()
        .insert_resource(EncodeJob {
            input,
            output,
            options,
        })
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 500.0,
        })
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "mpress".to_string(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(WireframePlugin)
        .add_systems(
            Startup,
            (init_wireframe, spawn_scene, spawn_text, start_encoding),
        )
        .add_systems(
            Update,
            (
                poll_encoding,
                drag_camera,
                zoom_camera,
                toggle_wireframe,
                toggle_help,
            ),
        )
        .run();
}

/// System to start with wireframe hidden
fn init_wireframe(mut config: ResMut<WireframeConfig>) {
    config.global = false;
}

/// System to spawn light and camera
fn spawn_scene(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        ..default()
    });
    let aabb = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0));
    commands.spawn(camera_bundle(&aabb));
}

/// System to spawn status and help text
fn spawn_text(mut commands: Commands, job: Res<EncodeJob>) {
    let style = TextStyle {
        font_size: 18.0,
        ..default()
    };
    commands.spawn((
        StatusText,
        TextBundle::from_section(
            format!("Encoding {} ...", job.input.display()),
            style.clone(),
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        }),
    ));
    commands.spawn((
        HelpText,
        TextBundle::from_section(
            "_____ Mouse _____\n\
             right: pan camera\n\
             middle: rotate camera\n\
             wheel: zoom camera\n\
             \n\
             _____ Keys _____\n\
             'Q': toggle help text\n\
             'W': toggle wireframe",
            style,
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        }),
    ));
}

/// Run encoder and decode output (on a worker thread)
fn run_encode(input: PathBuf, output: PathBuf, options: Options) -> Outcome {
    let result = meshpress::encode(&input, &output, &options);
    let file_len = |p: &PathBuf| std::fs::metadata(p).map_or(0, |m| m.len());
    let mesh = if result.is_ok() {
        match meshpress::decode_file(&output) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                tracing::error!("decoding {}: {e}", output.display());
                None
            }
        }
    } else {
        None
    };
    Outcome {
        input_len: file_len(&input),
        output_len: file_len(&output),
        result,
        mesh,
    }
}

/// System to start the encode task
fn start_encoding(mut commands: Commands, job: Res<EncodeJob>) {
    let (input, output, options) =
        (job.input.clone(), job.output.clone(), job.options);
    let pool = AsyncComputeTaskPool::get();
    let task = pool.spawn(async move { run_encode(input, output, options) });
    commands.spawn(EncodeTask(task));
}

/// Make status message for an encode outcome
fn status_message(outcome: &Outcome) -> String {
    if !outcome.result.is_ok() {
        return outcome.result.to_string();
    }
    let ratio = if outcome.output_len > 0 {
        outcome.input_len as f64 / outcome.output_len as f64
    } else {
        0.0
    };
    let mut msg = format!(
        "{} => {} bytes ({ratio:.1}:1)",
        outcome.input_len, outcome.output_len
    );
    if let Some(mesh) = &outcome.mesh {
        msg.push_str(&format!(
            "\n{} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        ));
    }
    msg
}

/// System to poll the encode task
fn poll_encoding(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut EncodeTask)>,
    mut status: Query<&mut Text, With<StatusText>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    for (entity, mut task) in &mut tasks {
        let Some(outcome) = block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        let msg = status_message(&outcome);
        tracing::info!("{}", msg.replace('\n', ", "));
        for mut text in &mut status {
            text.sections[0].value = msg.clone();
        }
        let Some(mesh) = outcome.mesh else {
            continue;
        };
        let min = Vec3::from_array(mesh.pos_min().to_array());
        let max = Vec3::from_array(mesh.pos_max().to_array());
        commands.spawn(PbrBundle {
            mesh: meshes.add(build_mesh(&mesh)),
            material: materials.add(StandardMaterial {
                base_color: Color::rgb(0.8, 0.7, 0.6),
                double_sided: true,
                cull_mode: None,
                ..default()
            }),
            ..default()
        });
        let framed = OrbitCamera::framing(&Aabb::from_min_max(min, max));
        for (mut orbit, mut xform) in &mut cameras {
            *orbit = framed;
            *xform = framed.transform();
        }
    }
}

/// Build camera bundle framing a bounding box
fn camera_bundle(aabb: &Aabb) -> (Camera3dBundle, OrbitCamera) {
    let orbit = OrbitCamera::framing(aabb);
    (
        Camera3dBundle {
            transform: orbit.transform(),
            ..default()
        },
        orbit,
    )
}

/// Get the size of the primary window
fn primary_window_size(windows: &Query<&Window, With<PrimaryWindow>>) -> Vec2 {
    match windows.get_single() {
        Ok(window) => Vec2::new(window.width(), window.height()),
        Err(_) => Vec2::ONE,
    }
}

/// System to pan or orbit the camera with mouse drags
fn drag_camera(
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut ev_motion: EventReader<MouseMotion>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    let motion: Vec2 = ev_motion.read().map(|ev| ev.delta).sum();
    let panning = mouse.pressed(MouseButton::Right);
    let orbiting = mouse.pressed(MouseButton::Middle);
    if motion == Vec2::ZERO || !(panning || orbiting) {
        return;
    }
    let win_sz = primary_window_size(&windows);
    for (mut orbit, mut xform) in &mut cameras {
        if panning {
            orbit.pan(motion, win_sz);
        } else {
            orbit.orbit(motion, win_sz);
        }
        *xform = orbit.transform();
    }
}

/// System to zoom the camera with the mouse wheel
fn zoom_camera(
    mut ev_scroll: EventReader<MouseWheel>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    let steps: f32 = ev_scroll.read().map(|ev| ev.y).sum();
    if steps != 0.0 {
        for (mut orbit, mut xform) in &mut cameras {
            orbit.zoom(steps);
            *xform = orbit.transform();
        }
    }
}

/// System to toggle wireframe with `W`
fn toggle_wireframe(
    keys: Res<ButtonInput<KeyCode>>,
    mut config: ResMut<WireframeConfig>,
) {
    if keys.just_pressed(KeyCode::KeyW) {
        config.global ^= true;
    }
}

/// System to toggle help text with `Q`
fn toggle_help(
    keys: Res<ButtonInput<KeyCode>>,
    mut help: Query<&mut Visibility, With<HelpText>>,
) {
    if !keys.just_pressed(KeyCode::KeyQ) {
        return;
    }
    for mut vis in &mut help {
        *vis = match *vis {
            Visibility::Hidden => Visibility::Inherited,
            _ => Visibility::Hidden,
        };
    }
}
