mod flake;
mod layout;

pub use flake::*;
