//! Windowed application driving the renderer from a telemetry source.
//!
//! The app owns the winit event loop, the tokio runtime the terrain loader
//! spawns onto, and the playback state. Each redraw advances the playback
//! clock, samples the track, moves the vehicle object, and renders one frame.
//! The renderer itself never blocks on the network; a pending terrain load is
//! only ever polled.

use std::sync::Arc;

use cgmath::{Deg, Matrix4, Rad};
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::camera::{CameraRig, Projection};
use crate::data_structures::object::ObjectHandle;
use crate::exit::ExitFlag;
use crate::playback::{HudState, PlaybackClock};
use crate::renderer::{Renderer, VEHICLE_MATERIAL};
use crate::telemetry::TelemetrySource;
use crate::terrain::{AsyncTerrainLoader, TerrainRequest};

/// Grid resolution requested for the streamed terrain.
const TERRAIN_POINTS_PER_AXIS: usize = 65;

/// Playback and camera controls, mapped from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlAction {
    TogglePlayback,
    FastForward,
    Rewind,
    SwitchCamera,
    Exit,
}

fn map_key(code: KeyCode) -> Option<ControlAction> {
    match code {
        KeyCode::Space => Some(ControlAction::TogglePlayback),
        KeyCode::KeyF => Some(ControlAction::FastForward),
        KeyCode::KeyR => Some(ControlAction::Rewind),
        KeyCode::KeyC => Some(ControlAction::SwitchCamera),
        KeyCode::Escape => Some(ControlAction::Exit),
        _ => None,
    }
}

/// Everything that exists only once the window and GPU are up.
struct Scene {
    renderer: Renderer,
    projection: Projection,
    rig: CameraRig,
    clock: PlaybackClock,
    vehicle: ObjectHandle,
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    track: Box<dyn TelemetrySource>,
    scene: Option<Scene>,
    exit: ExitFlag,
    last_time: Instant,
    hud: Option<HudState>,
}

impl App {
    fn new(track: Box<dyn TelemetrySource>) -> Self {
        let async_runtime = tokio::runtime::Runtime::new()
            .expect("App initialization failed. Cannot create the async runtime");
        Self {
            async_runtime,
            track,
            scene: None,
            exit: ExitFlag::new(),
            last_time: Instant::now(),
            hud: None,
        }
    }

    /// Observers (a HUD overlay, tests) can watch for shutdown.
    pub fn exit_flag(&self) -> ExitFlag {
        self.exit.clone()
    }

    /// The overlay snapshot from the most recent frame, if one was rendered.
    pub fn hud(&self) -> Option<HudState> {
        self.hud
    }

    fn apply_action(&mut self, action: ControlAction, event_loop: &ActiveEventLoop) {
        let Some(scene) = &mut self.scene else {
            return;
        };
        match action {
            ControlAction::Exit => {
                self.shutdown(event_loop);
                return;
            }
            ControlAction::TogglePlayback => scene.clock.toggle_play(),
            ControlAction::FastForward => scene.clock.fast_forward(),
            ControlAction::Rewind => scene.clock.rewind(),
            ControlAction::SwitchCamera => scene.rig.switch_mode(),
        }
        log::info!(
            "playback: {} at {:+.0}x",
            if scene.clock.is_playing() { "running" } else { "paused" },
            scene.clock.multiplier(),
        );
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exit.set();
        if let Some(scene) = &mut self.scene {
            if let Err(e) = scene.renderer.shutdown() {
                log::error!("teardown did not complete cleanly: {:#}", e);
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes().with_title("overflight");
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("Failed to create the main window"),
        );
        let size = window.inner_size();

        let renderer = self
            .async_runtime
            .block_on(Renderer::new(window, AsyncTerrainLoader::default()));
        let mut renderer = match renderer {
            Ok(renderer) => renderer,
            Err(e) => panic!(
                "App initialization failed. Cannot create the renderer: {}",
                e
            ),
        };

        let vehicle = {
            let mesh = renderer
                .upload_mesh("vehicle", &vehicle_mesh())
                .expect("uploading the built-in vehicle mesh failed");
            let material = renderer
                .material(VEHICLE_MATERIAL)
                .expect("the vehicle material is registered at renderer construction");
            renderer.add_object(mesh, material)
        };

        let bbox = self.track.bounding_box();
        renderer.begin_terrain_load(
            self.async_runtime.handle(),
            TerrainRequest {
                bbox,
                points_per_axis: TERRAIN_POINTS_PER_AXIS,
                origin: bbox.center(),
            },
        );

        let projection = Projection::new(size.width.max(1), size.height.max(1), Deg(55.0), 0.5, 50_000.0);
        let clock = PlaybackClock::new(self.track.start_time(), self.track.end_time());

        self.scene = Some(Scene {
            renderer,
            projection,
            rig: CameraRig::new(60.0, 25.0),
            clock,
            vehicle,
        });
        self.last_time = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(scene) = &mut self.scene {
                    scene.renderer.resize(size.width, size.height);
                    scene.projection.resize(size.width.max(1), size.height.max(1));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = map_key(code) {
                    self.apply_action(action, event_loop);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                let Some(scene) = &mut self.scene else {
                    return;
                };
                scene.clock.update(dt);
                let point = self.track.point_at(scene.clock.time());

                scene.renderer.object_mut(scene.vehicle).transform =
                    Matrix4::from_translation(point.position)
                        * Matrix4::from_angle_y(Rad(point.yaw))
                        * Matrix4::from_angle_x(Rad(point.pitch))
                        * Matrix4::from_angle_z(Rad(point.roll));

                let view = scene.rig.view_matrix(&point);
                let proj = scene.projection.calc_matrix();
                if let Err(e) = scene.renderer.render_frame(view, proj) {
                    log::error!("rendering failed, shutting down: {:#}", e);
                    self.shutdown(event_loop);
                    return;
                }

                self.hud = Some(HudState {
                    position: point.position,
                    min_altitude: self.track.min_altitude(),
                    max_altitude: self.track.max_altitude(),
                    time: scene.clock.time(),
                    multiplier: scene.clock.multiplier(),
                    playing: scene.clock.is_playing(),
                });
                log::trace!("{:?}", self.hud);

                scene.renderer.ctx.window.request_redraw();
            }
            _ => {}
        }
    }
}

/// A small dart pointing down negative z, sized in meters. Stands in for an
/// externally loaded aircraft model.
fn vehicle_mesh() -> crate::data_structures::mesh::MeshData {
    use crate::data_structures::mesh::MeshData;
    let positions = [
        [0.0, 0.0, -12.0],  // nose
        [-8.0, 0.0, 6.0],   // left wingtip
        [8.0, 0.0, 6.0],    // right wingtip
        [0.0, 3.0, 4.0],    // tail fin
    ];
    let normals = [
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    let tex_coords = [[0.5, 0.0], [0.0, 1.0], [1.0, 1.0], [0.5, 0.8]];
    // Body triangle plus the two fin faces, wound to face outwards.
    let indices = [0u32, 1, 2, 0, 3, 1, 0, 2, 3];
    MeshData::from_raw_arrays(&positions, &normals, &tex_coords, &indices)
}

/// Open a window and play back `track` until the window closes or the track
/// viewer is quit.
pub fn run(track: Box<dyn TelemetrySource>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(track);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_control_key_maps_to_exactly_one_action() {
        assert_eq!(map_key(KeyCode::Space), Some(ControlAction::TogglePlayback));
        assert_eq!(map_key(KeyCode::KeyF), Some(ControlAction::FastForward));
        assert_eq!(map_key(KeyCode::KeyR), Some(ControlAction::Rewind));
        assert_eq!(map_key(KeyCode::KeyC), Some(ControlAction::SwitchCamera));
        assert_eq!(map_key(KeyCode::Escape), Some(ControlAction::Exit));
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn the_vehicle_mesh_is_a_closed_fan_of_three_triangles() {
        let mesh = vehicle_mesh();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }
}
