pub mod arena;
pub mod bot;
pub mod game;
pub mod moves;
pub mod web;

pub use arena::*;
pub use bot::*;
pub use game::*;
pub use moves::*;
