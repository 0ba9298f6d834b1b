use std::collections::{HashSet, VecDeque};

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::{Cell, GridInt};
use Heading::*;
use Outcome::*;

pub const INITIAL_SNAKE_LENGTH: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right
}

impl Heading {
    pub fn delta(self) -> (GridInt, GridInt) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn is_opposite(self, other: Heading) -> bool {
        matches!((self, other), (Up, Down) | (Down, Up) | (Right, Left) | (Left, Right))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continuing,
    Collided,
    /// Every cell of the grid is covered by the snake.
    Filled,
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    ZeroSized { width: GridInt, height: GridInt },
    #[error("grid width {width} cannot hold the initial snake of length {length}")]
    TooNarrow { width: GridInt, length: usize },
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge { width: GridInt, height: GridInt },
    #[error("snake body must contain at least one cell")]
    EmptyBody,
    #[error("cell {0:?} lies outside the grid")]
    OutOfBounds(Cell),
    #[error("cell {0:?} appears more than once in the body")]
    DuplicateCell(Cell),
    #[error("food at {0:?} overlaps the snake")]
    FoodOnBody(Cell),
}

pub struct GridState<R: Rng = StdRng> {
    width: GridInt,
    height: GridInt,
    wrap: bool,
    // tail at the front, head at the back
    body: VecDeque<Cell>,
    // heading used by the last advance
    active: Heading,
    pending: Heading,
    food: Option<Cell>,
    rng: R,
}

impl GridState<StdRng> {
    pub fn seeded(width: GridInt, height: GridInt, wrap: bool, seed: u64) -> Result<Self, GridError> {
        GridState::new(width, height, wrap, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GridState<R> {
    /// Creates a game with a three cell snake heading right, its head near
    /// the middle of the grid, and a freshly placed piece of food.
    pub fn new(width: GridInt, height: GridInt, wrap: bool, rng: R) -> Result<Self, GridError> {
        check_dimensions(width, height)?;

        let length = INITIAL_SNAKE_LENGTH as GridInt;
        if width < length {
            return Err(GridError::TooNarrow { width, length: INITIAL_SNAKE_LENGTH });
        }

        let head = ((width / 2).max(length - 1), height / 2);
        let (dx, dy) = Right.delta();
        let body = (0..length).rev()
            .map(|i| (head.0 - dx * i, head.1 - dy * i))
            .collect();

        let mut state = GridState { width, height, wrap, body, active: Right, pending: Right, food: None, rng };
        state.food = state.generate_food();
        Ok(state)
    }

    /// Builds a state from an explicit body (tail first). When `food` is
    /// `None` a piece is generated, if the board has room for one.
    pub fn from_body(
        width: GridInt,
        height: GridInt,
        wrap: bool,
        body: Vec<Cell>,
        heading: Heading,
        food: Option<Cell>,
        rng: R,
    ) -> Result<Self, GridError> {
        check_dimensions(width, height)?;

        if body.is_empty() {
            return Err(GridError::EmptyBody);
        }

        let mut seen = HashSet::with_capacity(body.len());
        for &cell in &body {
            if !in_bounds(cell, width, height) {
                return Err(GridError::OutOfBounds(cell));
            }
            if !seen.insert(cell) {
                return Err(GridError::DuplicateCell(cell));
            }
        }

        if let Some(cell) = food {
            if !in_bounds(cell, width, height) {
                return Err(GridError::OutOfBounds(cell));
            }
            if seen.contains(&cell) {
                return Err(GridError::FoodOnBody(cell));
            }
        }

        let body = VecDeque::from(body);
        let mut state = GridState { width, height, wrap, body, active: heading, pending: heading, food, rng };
        if state.food.is_none() {
            state.food = state.generate_food();
        }
        Ok(state)
    }

    /// Discards this game and starts a new one on the same grid, carrying
    /// the random source over so successive games differ.
    pub fn new_game(self) -> Result<Self, GridError> {
        GridState::new(self.width, self.height, self.wrap, self.rng)
    }

    pub fn width(&self) -> GridInt {
        self.width
    }

    pub fn height(&self) -> GridInt {
        self.height
    }

    pub fn wraps(&self) -> bool {
        self.wrap
    }

    /// Body cells from tail to head.
    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn head(&self) -> Cell {
        // body is never empty
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Heading the next `advance` moves in.
    pub fn heading(&self) -> Heading {
        self.pending
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Samples random cells until one is free of the snake. Returns `None`
    /// when the snake covers the whole grid.
    pub fn generate_food(&mut self) -> Option<Cell> {
        if self.body.len() >= self.cell_count() {
            return None;
        }

        loop {
            let cell = (self.rng.gen_range(0..self.width), self.rng.gen_range(0..self.height));
            if !self.body.contains(&cell) {
                return Some(cell);
            }
        }
    }

    pub fn set_heading(&mut self, heading: Heading) {
        if heading.is_opposite(self.active) {
            debug!("ignoring turn {:?} against active heading {:?}", heading, self.active);
            return;
        }
        self.pending = heading;
    }

    /// Moves the snake one cell. A collision leaves the state untouched.
    pub fn advance(&mut self) -> Outcome {
        let heading = self.pending;
        let (x, y) = self.head();
        let (dx, dy) = heading.delta();
        let mut next = (x + dx, y + dy);

        if !in_bounds(next, self.width, self.height) {
            if !self.wrap {
                return Collided;
            }
            next = (next.0.rem_euclid(self.width), next.1.rem_euclid(self.height));
        }

        if self.body.contains(&next) {
            return Collided;
        }

        self.active = heading;
        self.body.push_back(next);

        if Some(next) == self.food {
            if self.body.len() == self.cell_count() {
                self.food = None;
                return Filled;
            }
            self.food = self.generate_food();
        } else {
            self.body.pop_front();
        }

        Continuing
    }
}

fn check_dimensions(width: GridInt, height: GridInt) -> Result<(), GridError> {
    if width <= 0 || height <= 0 {
        return Err(GridError::ZeroSized { width, height });
    }
    if width.checked_mul(height).is_none() {
        return Err(GridError::TooLarge { width, height });
    }
    Ok(())
}

fn in_bounds(cell: Cell, width: GridInt, height: GridInt) -> bool {
    (0..width).contains(&cell.0) && (0..height).contains(&cell.1)
}
