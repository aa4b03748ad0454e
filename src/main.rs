//! Demo scene: a flock of fish over a ground plane with a central tower,
//! trailing a waypoint-chasing leader. Pass an OBJ path to use a custom
//! model for the flock instead of the built-in fish.

use cgmath::vec3;
use shoal::gfx::geometry;
use shoal::sim::{FlockConfig, FlockSimulation, Obstacle, WorldBounds};
use shoal::ShoalApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = pollster::block_on(ShoalApp::new());

    let bounds = WorldBounds::default();
    let tower_radius = 50.0;
    let tower_height = 600.0;

    // Static scenery.
    let ground = app.add_model(geometry::ground_model(bounds.ground_extent));
    let tower = app.add_model(geometry::tower_model(tower_radius, tower_height, 24));

    app.add_material_rgb("ground", 0.25, 0.3, 0.2, 0.0, 0.9);
    app.add_material_rgb("tower", 0.45, 0.42, 0.38, 0.0, 0.8);
    app.add_material_rgb("boid", 0.9, 0.45, 0.15, 0.1, 0.6);
    app.add_material_rgb("leader", 0.95, 0.85, 0.2, 0.3, 0.4);

    {
        let scene = app.scene_mut();
        let ground_object = scene.spawn(ground, "ground");
        if let Some(object) = scene.get_object_mut(ground_object) {
            object.set_material("ground");
        }
        let tower_object = scene.spawn(tower, "tower");
        if let Some(object) = scene.get_object_mut(tower_object) {
            object.set_material("tower");
        }
    }

    // Optional custom flock model from the command line.
    let custom_model = match std::env::args().nth(1) {
        Some(path) => Some(app.load_model(&path)?),
        None => None,
    };

    let config = FlockConfig {
        bounds,
        obstacle: Obstacle::new(vec3(0.0, 0.0, 0.0), tower_radius, tower_height),
        ..FlockConfig::default()
    };
    let mut simulation = FlockSimulation::new(config);
    if let Some(model) = custom_model {
        simulation = simulation.with_model(model);
    }
    app.attach_simulation(Box::new(simulation));

    app.run();
    Ok(())
}
