/// Input state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - One move per fresh key press
///   - Repeating a held direction as soon as the previous move finishes
///
/// Honors Release events when the renderer enabled crossterm's keyboard
/// enhancement. Falls back to timeout-based release detection on terminals
/// that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use jumpgrid::Move;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// A key must be held this long before its move auto-repeats.
const REPEAT_DELAY: Duration = Duration::from_millis(250);

/// What a key asks the game to do.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Move),
    Save,
    Quit,
}

/// Key bindings.
///   ←/a  left        →/d  right       ↑/w  up        ↓/s  down
///   q    up-left     e    up-right    r    reset     c    recenter
///   p    save        Esc  quit
pub fn command_for(code: KeyCode) -> Option<Command> {
    let mv = match code {
        KeyCode::Left | KeyCode::Char('a') => Move::LEFT,
        KeyCode::Right | KeyCode::Char('d') => Move::RIGHT,
        KeyCode::Up | KeyCode::Char('w') => Move::UP,
        KeyCode::Down | KeyCode::Char('s') => Move::DOWN,
        KeyCode::Char('q') => Move::UP_LEFT,
        KeyCode::Char('e') => Move::UP_RIGHT,
        KeyCode::Char('r') => Move::Reset,
        KeyCode::Char('c') => Move::Recenter,
        KeyCode::Char('p') => return Some(Command::Save),
        KeyCode::Esc => return Some(Command::Quit),
        _ => return None,
    };
    Some(Command::Move(mv))
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// When each currently held key went down.
    held_since: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            held_since: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per loop iteration.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.on_key(key);
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        let active = &self.last_active;
        self.held_since.retain(|code, _| active.contains_key(code));
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                self.held_since.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                let now = Instant::now();
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.held_since.insert(key.code, now);
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Commands for keys freshly pressed this iteration, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.fresh_presses.iter().filter_map(|c| command_for(*c)).collect()
    }

    /// A motive move whose key has been held past the repeat delay.
    pub fn held_move(&self) -> Option<Move> {
        self.held_since
            .iter()
            .filter(|(c, since)| self.is_held(**c) && since.elapsed() >= REPEAT_DELAY)
            .map(|(c, _)| c)
            .filter_map(|c| match command_for(*c) {
                Some(Command::Move(mv @ Move::Motive(_))) => Some(mv),
                _ => None,
            })
            .next()
    }

    /// Check if any raw event this iteration has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings() {
        assert_eq!(command_for(KeyCode::Char('q')), Some(Command::Move(Move::UP_LEFT)));
        assert_eq!(command_for(KeyCode::Down), Some(Command::Move(Move::DOWN)));
        assert_eq!(command_for(KeyCode::Char('c')), Some(Command::Move(Move::Recenter)));
        assert_eq!(command_for(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(command_for(KeyCode::Char('z')), None);
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn release_ends_hold_only_when_honored() {
        let mut input = InputState::new();
        input.on_key(key(KeyCode::Left, KeyEventKind::Press));
        input.on_key(key(KeyCode::Left, KeyEventKind::Release));
        assert!(input.is_held(KeyCode::Left));

        input.honor_release = true;
        input.on_key(key(KeyCode::Left, KeyEventKind::Release));
        assert!(!input.is_held(KeyCode::Left));
        assert!(input.held_since.is_empty());
    }

    #[test]
    fn repeat_events_are_not_fresh_presses() {
        let mut input = InputState::new();
        input.on_key(key(KeyCode::Char('d'), KeyEventKind::Press));
        input.on_key(key(KeyCode::Char('d'), KeyEventKind::Repeat));
        assert_eq!(input.commands(), vec![Command::Move(Move::RIGHT)]);
        assert_eq!(input.held_move(), None);
    }
}
