mod column;
mod context;
mod floor;
mod mesh;
mod stick;

pub use column::{BrightnessPolicy, ColumnParams, SplitRows, build_column};
pub use context::{FloorStyle, SceneContext, SceneError};
pub use floor::{
    FloorError, FloorParams, build_checkerboard_floor, build_solid_floor, required_square_size,
};
pub use mesh::Mesh;
pub use stick::{StickParams, build_stick, build_stick_pair, eye_inclination, stick_endpoints};
