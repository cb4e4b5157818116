// Word search grid generation

pub mod grid;

pub use grid::{Grid, GridGenerator, PlacementFailure};
