// What you SEE:
// • Left: live camera, the tracked hand outlined in green, "FINGERS: n" (debounced).
// • Right: the character. 1 finger walks left, 2 runs right, 3 jumps, 4 walks left faster.
// • ESC, closing the window or Ctrl-C quits and releases the camera.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use gesture_runner::camera::CameraCapture;
use gesture_runner::capture::Capture;
use gesture_runner::config::Config;
use gesture_runner::draw::Drawer;
use gesture_runner::fingers::HandDetector;
use gesture_runner::gesture::GestureState;
use gesture_runner::present::{self, Presenter};
use gesture_runner::sprites::SpriteSet;
use gesture_runner::types::FrameBuffer;

const WINDOW_TITLE: &str = "Gesture Runner";
const WINDOW_FPS: usize = 60;

#[derive(Parser, Debug)]
#[command(author, version, about = "Count fingers on a webcam and steer a sprite with them")]
struct Args {
    /// TOML config file; every key is optional
    #[arg(long, env = "GESTURE_RUNNER_CONFIG")]
    config: Option<PathBuf>,
    /// Camera device index (overrides the config file)
    #[arg(long)]
    camera_index: Option<u32>,
    /// Directory holding idle.png, walk.png, run.png and jump.png
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = Config::load(args.config.as_deref()).context("loading config")?;
    if let Some(index) = args.camera_index {
        cfg.camera.index = index;
    }
    if let Some(dir) = args.assets {
        cfg.asset_dir = dir;
    }

    /* --- Sprites first: a missing asset stops us before any device is touched. */
    let sprites = SpriteSet::load(&cfg.asset_dir, cfg.game.sprite_width, cfg.game.sprite_height)
        .context("loading sprites")?;

    /* --- Window: camera panel on the left, playfield on the right. */
    let panel_w = cfg.game.playfield_width as usize;
    let panel_h = cfg.game.playfield_height as usize;
    let mut drawer = Drawer::new(WINDOW_TITLE, panel_w * 2, panel_h, WINDOW_FPS)?;
    let mut screen = FrameBuffer::filled(panel_w * 2, panel_h, 0);

    /* --- Capture thread: opens the camera itself and runs the hand detector. */
    let detector = HandDetector::new(cfg.skin.clone(), cfg.fingers.clone());
    let camera_settings = cfg.camera.clone();
    let (capture, frames) =
        Capture::spawn(move || CameraCapture::open(&camera_settings), detector)?;

    let shutdown = capture.shutdown_flag();
    let ctrlc_flag = capture.shutdown_flag();
    ctrlc::set_handler(move || ctrlc_flag.store(true, Ordering::Release))
        .context("installing Ctrl-C handler")?;

    let state = GestureState::new(cfg.game.clone(), cfg.gesture.debounce, Instant::now());
    let mut presenter = Presenter::new(state, cfg.game.clone());
    let mut placeholder = "NO FRAMES";
    let mut capture_gone = false;

    /* --- FPS bookkeeping (logged once per second) */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    log::info!("running; ESC or Ctrl-C to quit");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() && !shutdown.load(Ordering::Acquire) {
        let drained = presenter.drain(&frames);
        if drained.disconnected && !capture_gone {
            capture_gone = true;
            placeholder = "NO CAMERA";
            log::warn!("capture stopped; the playfield stays up without updates");
        }

        if drained.reports > 0 || presenter.latest().is_none() {
            let left = presenter.camera_panel(placeholder);
            let right = presenter.playfield_panel(&sprites);
            present::compose(&mut screen, &left, &right);
        }

        drawer.present(&screen)?;

        frames_this_second += drained.reports as u32;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            log::debug!("camera FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    log::info!("shutting down");
    capture.stop();
    Ok(())
}
