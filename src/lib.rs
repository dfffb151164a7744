//! Deterministic kart and bike physics: rigid-body integration, wheel suspension and body collision
//! resolution against an external track collision service.
//!
//! A vehicle is driven by calling [`VehiclePhysics::tick`] once per frame with a
//! [`CollisionOracle`] for the track and the frame's [`VehicleStatus`].

pub use glam;

pub mod consts;
pub mod logging;
pub mod math;
pub mod sim;
pub mod trace;

pub use sim::{
    CollisionData, CollisionOracle, ContactEntry, ContactInfo, RigidBodyState, VehicleKind,
    VehicleParams, VehiclePhysics, VehicleStatus,
};
