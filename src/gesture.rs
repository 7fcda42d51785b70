//! Debounced finger count -> character action.
//!
//! The raw per-frame estimate flickers near ambiguous poses, so it goes through a
//! [`Debouncer`] first: a change is only accepted once the previous accepted value
//! has been held for the dwell time. The stable count then picks a sprite and a
//! position delta via [`Action::for_fingers`], and [`GestureState`] applies the
//! delta and clamps the player to the playfield.

use std::time::{Duration, Instant};

use crate::config::GameSettings;

/// Minimum-dwell filter over a discrete signal.
#[derive(Debug, Clone)]
pub struct Debouncer {
    dwell: Duration,
    stable: i32,
    last_change: Instant,
}

impl Debouncer {
    /// Starts at 0 fingers with `now` as the last accepted change.
    pub fn new(dwell: Duration, now: Instant) -> Self {
        Self {
            dwell,
            stable: 0,
            last_change: now,
        }
    }

    /// Feed one raw estimate observed at `at`; returns the stable value afterwards.
    pub fn update(&mut self, raw: i32, at: Instant) -> i32 {
        if raw != self.stable && at.saturating_duration_since(self.last_change) > self.dwell {
            self.stable = raw;
            self.last_change = at;
        }
        self.stable
    }

    pub fn stable(&self) -> i32 {
        self.stable
    }
}

/// Which of the four sprites is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprite {
    Idle,
    Walk,
    Run,
    Jump,
}

impl Sprite {
    pub const ALL: [Sprite; 4] = [Sprite::Idle, Sprite::Walk, Sprite::Run, Sprite::Jump];

    /// Logical asset name.
    pub fn name(self) -> &'static str {
        match self {
            Sprite::Idle => "idle",
            Sprite::Walk => "walk",
            Sprite::Run => "run",
            Sprite::Jump => "jump",
        }
    }
}

/// Sprite plus the position delta for one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub sprite: Sprite,
    pub dx: f64,
    pub dy: f64,
}

impl Action {
    const IDLE: Action = Action {
        sprite: Sprite::Idle,
        dx: 0.0,
        dy: 0.0,
    };

    /// Total over every integer; anything outside 1..=4 idles.
    pub fn for_fingers(fingers: i32, game: &GameSettings) -> Action {
        let step = game.move_speed;
        match fingers {
            1 => Action { sprite: Sprite::Walk, dx: -step, dy: 0.0 },
            2 => Action { sprite: Sprite::Run, dx: step, dy: 0.0 },
            3 => Action { sprite: Sprite::Jump, dx: 0.0, dy: -game.jump_height },
            4 => Action { sprite: Sprite::Walk, dx: -step * game.fast_walk_factor, dy: 0.0 },
            _ => Action::IDLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Everything the presentation loop mutates per processed frame.
#[derive(Debug, Clone)]
pub struct GestureState {
    debouncer: Debouncer,
    sprite: Sprite,
    position: Position,
    game: GameSettings,
}

impl GestureState {
    pub fn new(game: GameSettings, dwell: Duration, now: Instant) -> Self {
        let mut state = Self {
            debouncer: Debouncer::new(dwell, now),
            sprite: Sprite::Idle,
            position: Position {
                x: game.start_x,
                y: game.start_y,
            },
            game,
        };
        state.position = state.clamp(state.position);
        state
    }

    /// One processed frame: debounce the raw estimate, map it, move, clamp.
    /// Returns the stable finger count.
    pub fn update(&mut self, raw_fingers: i32, at: Instant) -> i32 {
        let before = self.debouncer.stable();
        let fingers = self.debouncer.update(raw_fingers, at);
        if fingers != before {
            log::debug!("gesture: {before} -> {fingers} fingers");
        }

        let action = Action::for_fingers(fingers, &self.game);
        self.sprite = action.sprite;
        self.position = self.clamp(Position {
            x: self.position.x + action.dx,
            y: self.position.y + action.dy,
        });
        fingers
    }

    fn clamp(&self, p: Position) -> Position {
        let max_x = (self.game.playfield_width as f64 - self.game.sprite_width as f64).max(0.0);
        let max_y = (self.game.playfield_height as f64 - self.game.sprite_height as f64).max(0.0);
        Position {
            x: p.x.clamp(0.0, max_x),
            y: p.y.clamp(0.0, max_y),
        }
    }

    pub fn fingers(&self) -> i32 {
        self.debouncer.stable()
    }

    pub fn sprite(&self) -> Sprite {
        self.sprite
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DWELL: Duration = Duration::from_millis(500);

    fn ms(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    fn small_field() -> GameSettings {
        GameSettings {
            playfield_width: 100,
            playfield_height: 80,
            sprite_width: 40,
            sprite_height: 50,
            start_x: 30.0,
            start_y: 10.0,
            ..GameSettings::default()
        }
    }

    #[test]
    fn commits_only_after_the_dwell() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DWELL, t0);
        let raw = [(0, 0), (0, 100), (1, 150), (1, 300), (1, 600), (2, 650)];
        let stable: Vec<i32> = raw.iter().map(|&(f, t)| d.update(f, ms(t0, t))).collect();
        assert_eq!(stable, vec![0, 0, 0, 0, 1, 1]);
        // the dwell restarts at the commit (t=600), not at the first sighting of 2
        assert_eq!(d.update(2, ms(t0, 1_100)), 1);
        assert_eq!(d.update(2, ms(t0, 1_101)), 2);
    }

    #[test]
    fn exactly_the_dwell_is_not_enough() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DWELL, t0);
        assert_eq!(d.update(3, ms(t0, 500)), 0);
        assert_eq!(d.update(3, ms(t0, 501)), 3);
    }

    #[test]
    fn commits_to_the_current_raw_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DWELL, t0);
        d.update(1, ms(t0, 100));
        d.update(2, ms(t0, 200));
        assert_eq!(d.update(4, ms(t0, 700)), 4);
    }

    #[test]
    fn at_most_one_change_per_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DWELL, t0);
        let mut changes = Vec::new();
        let mut last = d.stable();
        // noisy stream alternating every 10 ms for 5 s
        for i in 0..500u64 {
            let raw = (i % 4) as i32;
            let now = ms(t0, i * 10);
            let s = d.update(raw, now);
            if s != last {
                assert_eq!(s, raw);
                changes.push(now);
                last = s;
            }
        }
        assert!(!changes.is_empty());
        for pair in changes.windows(2) {
            assert!(pair[1] - pair[0] > DWELL);
        }
    }

    #[test]
    fn earlier_timestamps_never_commit() {
        let t0 = Instant::now() + Duration::from_secs(10);
        let mut d = Debouncer::new(DWELL, t0);
        assert_eq!(d.update(2, t0 - Duration::from_secs(5)), 0);
    }

    #[test]
    fn mapping_table() {
        let g = GameSettings::default();
        let a = |f| Action::for_fingers(f, &g);
        assert_eq!(a(0), Action { sprite: Sprite::Idle, dx: 0.0, dy: 0.0 });
        assert_eq!(a(1), Action { sprite: Sprite::Walk, dx: -1.0, dy: 0.0 });
        assert_eq!(a(2), Action { sprite: Sprite::Run, dx: 1.0, dy: 0.0 });
        assert_eq!(a(3), Action { sprite: Sprite::Jump, dx: 0.0, dy: -5.0 });
        assert_eq!(a(4).sprite, Sprite::Walk);
        assert!((a(4).dx + 1.2).abs() < 1e-12);
        assert_eq!(a(4).dy, 0.0);
    }

    #[test]
    fn mapping_is_total() {
        let g = GameSettings::default();
        for f in [i32::MIN, -1, 5, 6, 100, i32::MAX] {
            assert_eq!(Action::for_fingers(f, &g), Action::IDLE, "fingers = {f}");
        }
    }

    #[test]
    fn sprite_names() {
        let names: Vec<_> = Sprite::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["idle", "walk", "run", "jump"]);
    }

    #[test]
    fn start_position_is_clamped() {
        let state = GestureState::new(GameSettings::default(), DWELL, Instant::now());
        assert_eq!(state.position(), Position { x: 400.0, y: 100.0 });
        assert_eq!(state.sprite(), Sprite::Idle);
        assert_eq!(state.fingers(), 0);
    }

    #[test]
    fn clamp_holds_for_every_gesture() {
        let t0 = Instant::now();
        let g = small_field();
        let mut state = GestureState::new(g.clone(), Duration::from_millis(1), t0);
        let mut t = 0;
        for fingers in [1, 2, 3, 4, 0, -3, 9] {
            for _ in 0..200 {
                t += 5;
                state.update(fingers, ms(t0, t));
                let p = state.position();
                assert!(p.x >= 0.0 && p.x <= (g.playfield_width - g.sprite_width) as f64);
                assert!(p.y >= 0.0 && p.y <= (g.playfield_height - g.sprite_height) as f64);
            }
        }
    }

    #[test]
    fn walking_left_stops_at_the_edge() {
        let t0 = Instant::now();
        let mut state = GestureState::new(small_field(), DWELL, t0);
        assert_eq!(state.update(1, ms(t0, 600)), 1);
        assert_eq!(state.sprite(), Sprite::Walk);
        assert_eq!(state.position().x, 29.0);
        for i in 0..100 {
            state.update(1, ms(t0, 700 + i));
        }
        assert_eq!(state.position().x, 0.0);
    }

    #[test]
    fn jumping_moves_up_until_the_top() {
        let t0 = Instant::now();
        let mut state = GestureState::new(small_field(), DWELL, t0);
        state.update(3, ms(t0, 600));
        assert_eq!(state.sprite(), Sprite::Jump);
        assert_eq!(state.position().y, 5.0);
        state.update(3, ms(t0, 610));
        assert_eq!(state.position().y, 0.0);
    }

    #[test]
    fn debounced_flicker_keeps_the_previous_action() {
        let t0 = Instant::now();
        let mut state = GestureState::new(small_field(), DWELL, t0);
        state.update(2, ms(t0, 600));
        assert_eq!(state.sprite(), Sprite::Run);
        // a single misread frame right after the change is ignored
        assert_eq!(state.update(0, ms(t0, 640)), 2);
        assert_eq!(state.sprite(), Sprite::Run);
        assert_eq!(state.position().x, 32.0);
    }
}
