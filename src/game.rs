use std::time::{Duration, Instant};

use crate::config::GameConfig;
use crate::term::TermManager;
use crate::snake::{GridState, Heading::{*, self}, Outcome};

use anyhow::{Context, Result};
use crossterm::event::{KeyEvent, KeyModifiers, KeyCode};
use log::info;
use rand::{rngs::StdRng, SeedableRng};

/// Key presses collected between two ticks.
#[derive(Debug, Default, PartialEq)]
pub struct Intent {
    pub heading: Option<Heading>,
    pub quit: bool,
}

impl Intent {
    /// Folds new events in; a later heading replaces an earlier one.
    pub fn absorb(&mut self, events: &[KeyEvent]) {
        for ev in events {
            if is_quit(ev) {
                self.quit = true;
            } else if let Some(heading) = heading_for_key(ev) {
                self.heading = Some(heading);
            }
        }
    }
}

pub struct SnakeGame {
    config: GameConfig,
    term: TermManager,
}

impl SnakeGame {
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let term = TermManager::new(config.width, config.height, config.tile_size)?;
        Ok(SnakeGame { config, term })
    }

    /// Plays games back to back until the player quits. The terminal is
    /// restored whether or not the loop failed.
    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;
        let res = self.play();
        self.term.restore();
        res
    }

    fn play(&mut self) -> Result<()> {
        let GameConfig { width, height, wrap, .. } = self.config;
        let state = match self.config.seed {
            Some(seed) => GridState::seeded(width, height, wrap, seed),
            None => GridState::new(width, height, wrap, StdRng::from_entropy()),
        };
        let mut state = state.context("Error creating game")?;
        let mut games = 1;
        info!("game {} started", games);

        self.term.clear()?;
        self.term.draw_borders()?;
        self.term.render(&state)?;

        let interval = self.config.tick_interval();
        let mut next_tick = Instant::now() + interval;
        let mut intent = Intent::default();

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            let events = self.term.read_key_events_queue(timeout)?;
            intent.absorb(&events);

            if intent.quit {
                info!("quit requested at length {}", state.len());
                return Ok(());
            }

            let now = Instant::now();
            if now < next_tick { continue; }
            next_tick = next_deadline(next_tick, interval, now);

            if let Some(heading) = intent.heading.take() {
                state.set_heading(heading);
            }

            match state.advance() {
                Outcome::Continuing => {},
                outcome => {
                    info!("game {} ended: {:?} at length {}", games, outcome, state.len());
                    state = state.new_game().context("Error creating game")?;
                    games += 1;
                    info!("game {} started", games);
                }
            }

            self.term.render(&state)?;
        }
    }
}

/// The tick after `deadline`, pushed out to a full interval from `now`
/// when the loop fell behind, so a stall never turns into a burst of moves.
pub fn next_deadline(deadline: Instant, interval: Duration, now: Instant) -> Instant {
    let next = deadline + interval;
    if next <= now { now + interval } else { next }
}

pub fn heading_for_key(ev: &KeyEvent) -> Option<Heading> {
    match ev.code {
        KeyCode::Char('w') | KeyCode::Up => Some(Up),
        KeyCode::Char('a') | KeyCode::Left => Some(Left),
        KeyCode::Char('s') | KeyCode::Down => Some(Down),
        KeyCode::Char('d') | KeyCode::Right => Some(Right),
        _ => None,
    }
}

fn is_quit(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
        || matches!(ev.code, KeyCode::Esc | KeyCode::Char('q'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn maps_arrows_and_wasd() {
        assert_eq!(heading_for_key(&key(KeyCode::Up)), Some(Up));
        assert_eq!(heading_for_key(&key(KeyCode::Char('a'))), Some(Left));
        assert_eq!(heading_for_key(&key(KeyCode::Char('s'))), Some(Down));
        assert_eq!(heading_for_key(&key(KeyCode::Right)), Some(Right));
        assert_eq!(heading_for_key(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ticks_keep_their_cadence() {
        let start = Instant::now();
        let interval = Duration::from_millis(200);
        let now = start + Duration::from_millis(10);
        assert_eq!(next_deadline(start, interval, now), start + interval);
    }

    #[test]
    fn stall_does_not_queue_ticks() {
        let start = Instant::now();
        let interval = Duration::from_millis(200);
        let now = start + Duration::from_secs(5);
        assert_eq!(next_deadline(start, interval, now), now + interval);
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit(&key(KeyCode::Esc)));
        assert!(is_quit(&key(KeyCode::Char('q'))));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&key(KeyCode::Char('c'))));
    }

    #[test]
    fn latest_heading_wins() {
        let mut intent = Intent::default();
        intent.absorb(&[key(KeyCode::Up), key(KeyCode::Char('x'))]);
        intent.absorb(&[key(KeyCode::Left)]);
        assert_eq!(intent, Intent { heading: Some(Left), quit: false });

        intent.absorb(&[key(KeyCode::Esc)]);
        assert!(intent.quit);
        assert_eq!(intent.heading, Some(Left));
    }
}
