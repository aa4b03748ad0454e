//! Hosts the attached simulation: pause state, time scaling and an optional
//! fixed-timestep accumulator for deterministic stepping.

use imgui::Ui;

use super::traits::{CameraFocus, Simulation};
use crate::gfx::scene::Scene;

pub struct SimulationManager {
    simulation: Option<Box<dyn Simulation>>,
    is_paused: bool,
    time_scale: f32,
    accumulated_time: f32,
    fixed_timestep: Option<f32>,
}

impl SimulationManager {
    pub fn new() -> Self {
        Self {
            simulation: None,
            is_paused: false,
            time_scale: 1.0,
            accumulated_time: 0.0,
            fixed_timestep: None,
        }
    }

    /// Attaches a simulation, replacing any previous one.
    pub fn attach_simulation(&mut self, mut simulation: Box<dyn Simulation>, scene: &mut Scene) {
        log::info!("attaching simulation '{}'", simulation.name());
        simulation.initialize(scene);
        self.simulation = Some(simulation);
        self.is_paused = false;
    }

    /// Advances the attached simulation, honoring pause, time scale and the
    /// fixed timestep if one is set.
    pub fn update(&mut self, delta_time: f32, scene: &mut Scene) {
        if self.is_paused {
            return;
        }

        let Some(simulation) = &mut self.simulation else {
            return;
        };
        let scaled_delta = delta_time * self.time_scale;

        if let Some(fixed_dt) = self.fixed_timestep {
            self.accumulated_time += scaled_delta;
            while self.accumulated_time >= fixed_dt {
                simulation.update(fixed_dt, scene);
                self.accumulated_time -= fixed_dt;
            }
        } else {
            simulation.update(scaled_delta, scene);
        }
    }

    /// Draws the shared playback panel plus the simulation's own controls.
    pub fn render_ui(&mut self, ui: &Ui, scene: &mut Scene) {
        let Some(simulation) = &mut self.simulation else {
            return;
        };

        ui.window("Simulation")
            .size([300.0, 190.0], imgui::Condition::FirstUseEver)
            .position([20.0, 20.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("Simulation: {}", simulation.name()));
                ui.separator();

                if ui.button(if self.is_paused { "Play" } else { "Pause" }) {
                    self.is_paused = !self.is_paused;
                    simulation.set_running(!self.is_paused);
                }
                ui.same_line();
                if ui.button("Reset") {
                    simulation.reset(scene);
                }

                ui.separator();
                ui.slider("Time scale", 0.1, 3.0, &mut self.time_scale);

                let mut use_fixed = self.fixed_timestep.is_some();
                if ui.checkbox("Fixed timestep", &mut use_fixed) {
                    self.fixed_timestep = use_fixed.then_some(1.0 / 60.0);
                    self.accumulated_time = 0.0;
                }
                if let Some(ref mut fixed_dt) = self.fixed_timestep {
                    ui.slider("Fixed dt", 1.0 / 120.0, 1.0 / 30.0, fixed_dt);
                }
            });

        simulation.render_ui(ui);
    }

    pub fn camera_focus(&self) -> Option<CameraFocus> {
        self.simulation.as_ref().and_then(|s| s.camera_focus())
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_paused = paused;
        if let Some(simulation) = &mut self.simulation {
            simulation.set_running(!paused);
        }
    }

    pub fn set_fixed_timestep(&mut self, timestep: Option<f32>) {
        self.fixed_timestep = timestep;
        self.accumulated_time = 0.0;
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn has_simulation(&self) -> bool {
        self.simulation.is_some()
    }
}

impl Default for SimulationManager {
    fn default() -> Self {
        Self::new()
    }
}
