pub mod float;
mod matrix;
mod quat;
mod vector;

pub use matrix::*;
pub use quat::*;
pub use vector::*;
