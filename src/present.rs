// Presentation side of the capture channel: drains frame reports, owns the gesture
// state, and builds the two panels the window shows.
use crossbeam_channel::{Receiver, TryRecvError};

use crate::capture::FrameReport;
use crate::config::GameSettings;
use crate::draw;
use crate::gesture::GestureState;
use crate::sprites::SpriteSet;
use crate::types::FrameBuffer;

/// Outcome of one drain of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drained {
    pub reports: usize,
    /// The capture thread is gone and nothing more will arrive.
    pub disconnected: bool,
}

pub struct Presenter {
    state: GestureState,
    latest: Option<FrameReport>,
    game: GameSettings,
}

impl Presenter {
    pub fn new(state: GestureState, game: GameSettings) -> Self {
        Self {
            state,
            latest: None,
            game,
        }
    }

    /// Apply every pending report in arrival order; keep the last one for display.
    pub fn drain(&mut self, rx: &Receiver<FrameReport>) -> Drained {
        let mut reports = 0;
        loop {
            match rx.try_recv() {
                Ok(report) => {
                    self.state
                        .update(report.detection.fingers, report.captured_at);
                    self.latest = Some(report);
                    reports += 1;
                }
                Err(TryRecvError::Empty) => {
                    return Drained {
                        reports,
                        disconnected: false,
                    };
                }
                Err(TryRecvError::Disconnected) => {
                    return Drained {
                        reports,
                        disconnected: true,
                    };
                }
            }
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn latest(&self) -> Option<&FrameReport> {
        self.latest.as_ref()
    }

    /// Camera panel for the most recent report, or a placeholder message.
    pub fn camera_panel(&self, placeholder: &str) -> FrameBuffer {
        let (w, h) = (self.game.playfield_width, self.game.playfield_height);
        match &self.latest {
            Some(report) => draw::render_camera_panel(
                &report.frame,
                report.detection.hand.as_ref(),
                &report.detection.valleys,
                self.state.fingers(),
                w,
                h,
            ),
            None => draw::render_camera_placeholder(w, h, placeholder),
        }
    }

    pub fn playfield_panel(&self, sprites: &SpriteSet) -> FrameBuffer {
        draw::render_playfield(
            self.game.playfield_width,
            self.game.playfield_height,
            sprites.get(self.state.sprite()),
            self.state.position(),
        )
    }
}

/// Lay the two panels out left to right on one screen buffer.
pub fn compose(screen: &mut FrameBuffer, left: &FrameBuffer, right: &FrameBuffer) {
    screen.blit(left, 0, 0);
    screen.blit(right, left.width, 0);
}
