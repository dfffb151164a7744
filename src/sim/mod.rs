mod body_collision;
mod collision_data;
mod context;
mod hitbox;
mod integrator;
mod oracle;
mod params;
mod rigid_body;
mod suspension;
pub mod terrain;
mod vehicle;

pub use body_collision::*;
pub use collision_data::*;
pub use context::*;
pub use hitbox::*;
pub use integrator::*;
pub use oracle::*;
pub use params::*;
pub use rigid_body::*;
pub use suspension::*;
pub use vehicle::*;
