//! Scene management
//!
//! Objects reference shared [Model]s by index and carry their own transform,
//! visibility and material assignment. The [Scene] owns the model list, the
//! object list, the material manager and the camera.

pub mod model;
pub mod object;
pub mod scene;
pub mod vertex;

pub use model::{DrawModel, Mesh, Model};
pub use object::Object;
pub use scene::Scene;
pub use vertex::Vertex3D;
