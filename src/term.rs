use crate::{Cell, GridInt, TermInt};
use crate::snake::GridState;
use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::{bail, Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};
use log::warn;
use rand::Rng;

const TILE_CHAR: char = '█';

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Body,
    Head,
    Food,
}

impl Tile {
    fn glyph(self) -> (char, Color) {
        match self {
            Tile::Empty => (' ', Color::Reset),
            Tile::Body => (TILE_CHAR, Color::White),
            Tile::Head => (TILE_CHAR, Color::Yellow),
            Tile::Food => (TILE_CHAR, Color::Red),
        }
    }
}

pub struct TermManager {
    stdout: Stdout,
    // one entry per grid cell, as last drawn
    screen: Vec<Tile>,
    grid_width: GridInt,
    grid_height: GridInt,
    tile_size: TermInt,
}

impl TermManager {
    pub fn new(grid_width: GridInt, grid_height: GridInt, tile_size: TermInt) -> Result<Self> {
        let (width, height) = terminal::size().context("Error reading terminal size")?;
        check_fits(grid_width, grid_height, tile_size, (width, height))?;

        // fits on screen, so the cell count is small
        let screen = vec![Tile::Empty; grid_width as usize * grid_height as usize];
        Ok(TermManager { stdout: stdout(), screen, grid_width, grid_height, tile_size })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen).context("Error entering alt screen")?;
        terminal::enable_raw_mode().context("Error setting raw mode")?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking).context("Error hiding cursor")?;
        Ok(())
    }

    /// Puts the terminal back the way it was. Keeps going past failures so
    /// later steps still run.
    pub fn restore(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            warn!("failed to disable raw mode: {}", err);
        }
        if let Err(err) = execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen) {
            warn!("failed to leave alternate screen: {}", err);
        }
    }

    /// Waits up to `timeout` for the first key event, then drains whatever
    /// else is already queued.
    pub fn read_key_events_queue(&self, timeout: Duration) -> Result<Vec<KeyEvent>> {
        let mut events = vec![];
        let mut wait = timeout;

        while poll(wait).context("Error polling events")? {
            if let Event::Key(ev) = read().context("Error reading event")? {
                events.push(ev);
            }
            wait = Duration::from_millis(0);
        }

        Ok(events)
    }

    pub fn draw_borders(&mut self) -> Result<()> {
        let (board_w, board_h) = self.board_size();
        let width = board_w as TermInt + 2;
        let height = board_h as TermInt + 2;

        let end_x = width - 1;
        let end_y = height - 1;

        for x in 0..width {
            let ch = if x == 0 || x == width - 1 {'+'} else {'-'};
            self.print_at((x, 0), ch)?;
            self.print_at((x, end_y), ch)?;
        }

        for y in 1..height - 1 {
            self.print_at((0, y), '|')?;
            self.print_at((end_x, y), '|')?;
        }

        self.flush()
    }

    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All)).context("Error clearing")?;
        for tile in self.screen.iter_mut() {
            *tile = Tile::Empty;
        }
        Ok(())
    }

    /// Draws the tiles of `state` that differ from the previous frame.
    pub fn render<R: Rng>(&mut self, state: &GridState<R>) -> Result<()> {
        let frame = frame_tiles(state);

        for index in changed_tiles(&self.screen, &frame) {
            let x = index as GridInt % self.grid_width;
            let y = index as GridInt / self.grid_width;
            self.draw_tile((x, y), frame[index])?;
        }

        self.screen = frame;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush().context("Error flushing")
    }

    ///////////////////////////////////////////////////////////////////////////

    // Glyphs are about twice as tall as wide, so a square tile spans two
    // columns per row.
    fn board_size(&self) -> (usize, usize) {
        let tile = self.tile_size as usize;
        (self.grid_width as usize * tile * 2, self.grid_height as usize * tile)
    }

    fn draw_tile(&mut self, cell: Cell, tile: Tile) -> Result<()> {
        let (ch, color) = tile.glyph();
        let row: String = std::iter::repeat(ch).take(self.tile_size as usize * 2).collect();
        let left = 1 + cell.0 as TermInt * self.tile_size * 2;
        let top = 1 + cell.1 as TermInt * self.tile_size;

        for dy in 0..self.tile_size {
            queue!(
                self.stdout,
                cursor::MoveTo(left, top + dy),
                style::SetForegroundColor(color),
                style::Print(&row),
                style::ResetColor
            ).context("Error drawing tile")?;
        }

        Ok(())
    }

    fn print_at(&mut self, pos: (TermInt, TermInt), ch: char) -> Result<()> {
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch)).context("Error printing")?;
        Ok(())
    }
}

/// Fails unless a bordered board of the given grid fits in `term_size`.
pub fn check_fits(grid_width: GridInt, grid_height: GridInt, tile_size: TermInt, term_size: (TermInt, TermInt)) -> Result<()> {
    if grid_width <= 0 || grid_height <= 0 || tile_size == 0 {
        bail!("cannot draw a {}x{} grid with tile size {}", grid_width, grid_height, tile_size);
    }

    let tile = tile_size as u64;
    let board_w = grid_width as u64 * tile * 2 + 2;
    let board_h = grid_height as u64 * tile + 2;
    let (width, height) = term_size;
    if board_w > width as u64 || board_h > height as u64 {
        bail!("terminal of {}x{} is too small for a {}x{} board", width, height, board_w, board_h);
    }
    Ok(())
}

/// Lays the state out as one tile per grid cell, row-major.
pub fn frame_tiles<R: Rng>(state: &GridState<R>) -> Vec<Tile> {
    let width = state.width();
    let index = |(x, y): Cell| (y * width + x) as usize;
    let mut tiles = vec![Tile::Empty; state.cell_count()];

    for cell in state.body() {
        tiles[index(*cell)] = Tile::Body;
    }
    tiles[index(state.head())] = Tile::Head;

    if let Some(food) = state.food() {
        tiles[index(food)] = Tile::Food;
    }

    tiles
}

pub fn changed_tiles(old: &[Tile], new: &[Tile]) -> Vec<usize> {
    new.iter().enumerate()
        .filter(|(i, tile)| old.get(*i) != Some(*tile))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Heading;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn frame_marks_head_body_and_food() {
        let state = GridState::from_body(3, 2, false, vec![(0, 0), (1, 0)], Heading::Right, Some((2, 1)),
            StdRng::seed_from_u64(1)).unwrap();
        let tiles = frame_tiles(&state);
        assert_eq!(tiles, vec![
            Tile::Body, Tile::Head, Tile::Empty,
            Tile::Empty, Tile::Empty, Tile::Food,
        ]);
    }

    #[test]
    fn board_must_fit_terminal() {
        // 10 cells of 2 columns plus borders
        assert!(check_fits(10, 10, 1, (22, 12)).is_ok());
        assert!(check_fits(10, 10, 1, (21, 12)).is_err());
        assert!(check_fits(10, 10, 2, (22, 12)).is_err());
        assert!(check_fits(100_000, 100_000, 1, (200, 60)).is_err());
        assert!(check_fits(-5, 10, 1, (200, 60)).is_err());
        assert!(check_fits(10, 0, 1, (200, 60)).is_err());
    }

    #[test]
    fn only_changed_tiles_are_redrawn() {
        let mut state = GridState::from_body(4, 1, false, vec![(0, 0), (1, 0)], Heading::Right, Some((3, 0)),
            StdRng::seed_from_u64(1)).unwrap();
        let before = frame_tiles(&state);
        state.advance();
        let after = frame_tiles(&state);
        // tail leaves (0,0), old head becomes body, head moves to (2,0)
        assert_eq!(changed_tiles(&before, &after), vec![0, 1, 2]);
        assert!(changed_tiles(&after, &after).is_empty());
    }
}
