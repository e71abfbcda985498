mod default;
mod flake;
mod status;
#[cfg(test)]
mod tests;

pub use default::*;
pub use flake::*;
pub use status::*;
