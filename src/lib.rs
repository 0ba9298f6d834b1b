pub mod config;
pub mod game;
pub mod snake;
pub mod term;

pub type TermInt = u16;
pub type GridInt = i32;
pub type Cell = (GridInt, GridInt);
