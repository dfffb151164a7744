mod oracles;
mod setup;

pub use oracles::*;
pub use setup::*;
