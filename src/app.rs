//! Application shell
//!
//! Owns the window, render engine, UI and scene, and drives the per-frame
//! sequence: simulation step, camera follow, transform upload, UI logic,
//! then rendering. UI logic runs before the render callback so its closures
//! can borrow the simulation and scene mutably.

use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::gfx::{
    camera::{CameraController, CameraManager, CameraMode, FlightCamera},
    rendering::RenderEngine,
    scene::{Model, Scene},
};
use crate::sim::{Simulation, SimulationManager};
use crate::ui::UiManager;

const MOUSE_SENSITIVITY: f32 = 0.8;
const MOVEMENT_SPEED: f32 = 200.0;

/// Water surface sits above the flight ceiling, the whole world reads as
/// underwater.
const DEFAULT_WATER_HEIGHT: f32 = 1200.0;

pub struct ShoalApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    simulation_manager: SimulationManager,
    start_time: Instant,
    last_frame: Instant,
    water_height: f32,
}

impl ShoalApp {
    pub async fn new() -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let camera = FlightCamera::new(1.0);
        let controller = CameraController::new(MOUSE_SENSITIVITY, MOVEMENT_SPEED);
        let scene = Scene::new(CameraManager::new(camera, controller));

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                simulation_manager: SimulationManager::new(),
                start_time: Instant::now(),
                last_frame: Instant::now(),
                water_height: DEFAULT_WATER_HEIGHT,
            },
        }
    }

    /// Loads an OBJ model into the scene; returns the model index.
    pub fn load_model(&mut self, path: &str) -> anyhow::Result<usize> {
        self.app_state.scene.load_model(path)
    }

    /// Registers procedural geometry; returns the model index.
    pub fn add_model(&mut self, model: Model) -> usize {
        self.app_state.scene.add_model(model)
    }

    pub fn add_material_rgb(
        &mut self,
        name: &str,
        r: f32,
        g: f32,
        b: f32,
        metallic: f32,
        roughness: f32,
    ) {
        self.app_state
            .scene
            .add_material_rgb(name, r, g, b, metallic, roughness);
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Attaches and initializes a simulation. Its scene objects are created
    /// now; GPU resources follow once the window exists.
    pub fn attach_simulation(&mut self, simulation: Box<dyn Simulation>) {
        self.app_state
            .simulation_manager
            .attach_simulation(simulation, &mut self.app_state.scene);
    }

    pub fn set_water_height(&mut self, height: f32) {
        self.app_state.water_height = height;
    }

    /// Consumes the app and runs the event loop until exit.
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl AppState {
    fn render(&mut self) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };
        let Some(window) = self.window.as_ref() else {
            return;
        };

        let now = Instant::now();
        let delta_time = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        let time = self.start_time.elapsed().as_secs_f32();

        self.simulation_manager.update(delta_time, &mut self.scene);

        self.scene.camera_manager.update(delta_time);
        if let Some(focus) = self.simulation_manager.camera_focus() {
            self.scene.camera_manager.follow(&focus);
        }
        self.scene.update();

        self.scene.update_all_transforms(render_engine.queue());
        render_engine.update(
            self.scene.camera_manager.camera.uniform,
            time,
            self.water_height,
        );

        if let Some(ui_manager) = &mut self.ui_manager {
            let simulation_manager = &mut self.simulation_manager;
            let scene = &mut self.scene;
            ui_manager.update_logic(window, |ui| {
                simulation_manager.render_ui(ui, scene);

                let camera = &mut scene.camera_manager.camera;
                ui.window("Camera")
                    .size([300.0, 170.0], imgui::Condition::FirstUseEver)
                    .position([20.0, 230.0], imgui::Condition::FirstUseEver)
                    .build(|| {
                        ui.text(format!("Mode: {:?} (keys 1-4)", camera.mode));
                        if ui.button("Free") {
                            camera.set_mode(CameraMode::Free);
                        }
                        ui.same_line();
                        if ui.button("Behind") {
                            camera.set_mode(CameraMode::Behind);
                        }
                        ui.same_line();
                        if ui.button("Parallel") {
                            camera.set_mode(CameraMode::Parallel);
                        }
                        ui.same_line();
                        if ui.button("Tower") {
                            camera.set_mode(CameraMode::Tower);
                        }
                        ui.separator();
                        ui.text(format!("FOV: {:.0} deg (scroll to zoom)", camera.fov.0));
                    });
            });

            render_engine.render_frame(
                &self.scene,
                Some(
                    |device: &wgpu::Device,
                     queue: &wgpu::Queue,
                     encoder: &mut wgpu::CommandEncoder,
                     view: &wgpu::TextureView| {
                        ui_manager.render_display_only(device, queue, encoder, view);
                    },
                ),
            );
        } else {
            render_engine.render_frame(
                &self.scene,
                None::<
                    fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
                >,
            );
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("shoal")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            self.scene
                .camera_manager
                .camera
                .resize_projection(width, height);

            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });

            self.scene
                .init_gpu_resources(renderer.device(), renderer.queue());

            let mut ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );
            ui_manager.update_display_size(width, height);

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);
            self.last_frame = Instant::now();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // UI gets first refusal on input events.
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event: ref key_event,
                ..
            } => {
                if let winit::keyboard::PhysicalKey::Code(key_code) = key_event.physical_key {
                    use winit::keyboard::KeyCode;
                    match key_code {
                        KeyCode::Escape => {
                            event_loop.exit();
                            return;
                        }
                        KeyCode::Digit1 => {
                            self.scene.camera_manager.camera.set_mode(CameraMode::Free)
                        }
                        KeyCode::Digit2 => self
                            .scene
                            .camera_manager
                            .camera
                            .set_mode(CameraMode::Behind),
                        KeyCode::Digit3 => self
                            .scene
                            .camera_manager
                            .camera
                            .set_mode(CameraMode::Parallel),
                        KeyCode::Digit4 => self
                            .scene
                            .camera_manager
                            .camera
                            .set_mode(CameraMode::Tower),
                        _ => {}
                    }
                }
                self.scene.camera_manager.process_keyboard_event(key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Camera never sees device events while the UI is capturing input.
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            let io = ui_manager.context.io();
            if io.want_capture_mouse || io.want_capture_keyboard {
                return;
            }
        }

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
