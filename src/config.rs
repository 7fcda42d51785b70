use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

const DEFAULT_CAMERA_INDEX: u32 = 0;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_CAMERA_FPS: u32 = 30;

const DEFAULT_HUE: (u8, u8) = (0, 20);
const DEFAULT_SATURATION: (u8, u8) = (20, 255);
const DEFAULT_VALUE: (u8, u8) = (70, 255);
const DEFAULT_BLUR_KERNEL: u32 = 5;
const DEFAULT_MASK_CUTOFF: u8 = 0;

/// 1/256 px units, ~39 px at the default resolution.
const DEFAULT_DEFECT_DEPTH: u32 = 10_000;
const DEFAULT_DEBOUNCE_MS: u64 = 500;

const DEFAULT_PLAYFIELD: (u32, u32) = (800, 600);
const DEFAULT_SPRITE: (u32, u32) = (400, 500);
const DEFAULT_MOVE_SPEED: f64 = 1.0;
const DEFAULT_JUMP_HEIGHT: f64 = 5.0;
const DEFAULT_FAST_WALK_FACTOR: f64 = 1.2;

const DEFAULT_ASSET_DIR: &str = "assets";

/// 8-bit hue tops out at 179 (degrees / 2).
pub const HUE_MAX: u8 = 179;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    camera: Option<CameraConfigFile>,
    skin: Option<SkinConfigFile>,
    fingers: Option<FingersConfigFile>,
    gesture: Option<GestureConfigFile>,
    game: Option<GameConfigFile>,
    assets: Option<AssetsConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    index: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SkinConfigFile {
    hue: Option<[u8; 2]>,
    saturation: Option<[u8; 2]>,
    value: Option<[u8; 2]>,
    blur_kernel: Option<u32>,
    mask_cutoff: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FingersConfigFile {
    defect_depth_threshold: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GestureConfigFile {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GameConfigFile {
    playfield_width: Option<u32>,
    playfield_height: Option<u32>,
    sprite_width: Option<u32>,
    sprite_height: Option<u32>,
    move_speed: Option<f64>,
    jump_height: Option<f64>,
    fast_walk_factor: Option<f64>,
    start_x: Option<f64>,
    start_y: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AssetsConfigFile {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub camera: CameraSettings,
    pub skin: SkinSettings,
    pub fingers: FingerSettings,
    pub gesture: GestureSettings,
    pub game: GameSettings,
    pub asset_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Inclusive 8-bit HSV skin range plus the mask smoothing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinSettings {
    pub hue: (u8, u8),
    pub saturation: (u8, u8),
    pub value: (u8, u8),
    /// Odd Gaussian kernel size; sigma is derived from it.
    pub blur_kernel: u32,
    /// Blurred mask values strictly above this count as skin.
    pub mask_cutoff: u8,
}

impl SkinSettings {
    /// Sigma for a `k`×`k` Gaussian when none is given explicitly.
    pub fn blur_sigma(&self) -> f32 {
        0.3 * ((self.blur_kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            hue: DEFAULT_HUE,
            saturation: DEFAULT_SATURATION,
            value: DEFAULT_VALUE,
            blur_kernel: DEFAULT_BLUR_KERNEL,
            mask_cutoff: DEFAULT_MASK_CUTOFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FingerSettings {
    /// Defects deeper than this (in 1/256 px) count as a finger valley.
    pub defect_depth_threshold: u32,
}

impl Default for FingerSettings {
    fn default() -> Self {
        Self {
            defect_depth_threshold: DEFAULT_DEFECT_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureSettings {
    pub debounce: Duration,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub playfield_width: u32,
    pub playfield_height: u32,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub move_speed: f64,
    pub jump_height: f64,
    pub fast_walk_factor: f64,
    pub start_x: f64,
    pub start_y: f64,
}

impl Default for GameSettings {
    fn default() -> Self {
        let (pw, ph) = DEFAULT_PLAYFIELD;
        let (sw, sh) = DEFAULT_SPRITE;
        Self {
            playfield_width: pw,
            playfield_height: ph,
            sprite_width: sw,
            sprite_height: sh,
            move_speed: DEFAULT_MOVE_SPEED,
            jump_height: DEFAULT_JUMP_HEIGHT,
            fast_walk_factor: DEFAULT_FAST_WALK_FACTOR,
            start_x: pw as f64 / 2.0,
            start_y: ph as f64 - 150.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraSettings {
                index: DEFAULT_CAMERA_INDEX,
                width: DEFAULT_CAMERA_WIDTH,
                height: DEFAULT_CAMERA_HEIGHT,
                fps: DEFAULT_CAMERA_FPS,
            },
            skin: SkinSettings::default(),
            fingers: FingerSettings::default(),
            gesture: GestureSettings::default(),
            game: GameSettings::default(),
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
        }
    }
}

impl Config {
    /// Load from an optional TOML file; anything the file leaves out keeps its default.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let file = match path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse TOML text directly (no file involved).
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| Error::ConfigParse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        let defaults = Config::default();

        let camera = file.camera.unwrap_or_default();
        let camera = CameraSettings {
            index: camera.index.unwrap_or(defaults.camera.index),
            width: camera.width.unwrap_or(defaults.camera.width),
            height: camera.height.unwrap_or(defaults.camera.height),
            fps: camera.fps.unwrap_or(defaults.camera.fps),
        };

        let skin = file.skin.unwrap_or_default();
        let pair = |v: Option<[u8; 2]>, d: (u8, u8)| v.map(|[lo, hi]| (lo, hi)).unwrap_or(d);
        let skin = SkinSettings {
            hue: pair(skin.hue, defaults.skin.hue),
            saturation: pair(skin.saturation, defaults.skin.saturation),
            value: pair(skin.value, defaults.skin.value),
            blur_kernel: skin.blur_kernel.unwrap_or(defaults.skin.blur_kernel),
            mask_cutoff: skin.mask_cutoff.unwrap_or(defaults.skin.mask_cutoff),
        };

        let fingers = FingerSettings {
            defect_depth_threshold: file
                .fingers
                .and_then(|f| f.defect_depth_threshold)
                .unwrap_or(defaults.fingers.defect_depth_threshold),
        };

        let gesture = GestureSettings {
            debounce: file
                .gesture
                .and_then(|g| g.debounce_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.gesture.debounce),
        };

        let game = file.game.unwrap_or_default();
        let d = defaults.game;
        let playfield_width = game.playfield_width.unwrap_or(d.playfield_width);
        let playfield_height = game.playfield_height.unwrap_or(d.playfield_height);
        let game = GameSettings {
            playfield_width,
            playfield_height,
            sprite_width: game.sprite_width.unwrap_or(d.sprite_width),
            sprite_height: game.sprite_height.unwrap_or(d.sprite_height),
            move_speed: game.move_speed.unwrap_or(d.move_speed),
            jump_height: game.jump_height.unwrap_or(d.jump_height),
            fast_walk_factor: game.fast_walk_factor.unwrap_or(d.fast_walk_factor),
            // The start point follows the playfield unless pinned explicitly.
            start_x: game.start_x.unwrap_or(playfield_width as f64 / 2.0),
            start_y: game.start_y.unwrap_or(playfield_height as f64 - 150.0),
        };

        let asset_dir = file
            .assets
            .and_then(|a| a.dir)
            .unwrap_or(defaults.asset_dir);

        Self {
            camera,
            skin,
            fingers,
            gesture,
            game,
            asset_dir,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::Config(msg));

        if self.camera.width == 0 || self.camera.height == 0 {
            return invalid("camera width/height must be non-zero".into());
        }

        let s = &self.skin;
        if s.hue.1 > HUE_MAX {
            return invalid(format!("skin.hue upper bound {} exceeds {HUE_MAX}", s.hue.1));
        }
        for (name, (lo, hi)) in [("hue", s.hue), ("saturation", s.saturation), ("value", s.value)] {
            if lo > hi {
                return invalid(format!("skin.{name} range is inverted: [{lo}, {hi}]"));
            }
        }
        if s.blur_kernel == 0 || s.blur_kernel % 2 == 0 {
            return invalid(format!("skin.blur_kernel must be odd, got {}", s.blur_kernel));
        }

        if self.gesture.debounce.is_zero() {
            return invalid("gesture.debounce_ms must be non-zero".into());
        }

        let g = &self.game;
        if g.playfield_width == 0 || g.playfield_height == 0 {
            return invalid("game playfield must be non-empty".into());
        }
        if g.sprite_width == 0 || g.sprite_height == 0 {
            return invalid("game sprite size must be non-zero".into());
        }
        if g.sprite_width > g.playfield_width || g.sprite_height > g.playfield_height {
            return invalid(format!(
                "sprite {}x{} does not fit the {}x{} playfield",
                g.sprite_width, g.sprite_height, g.playfield_width, g.playfield_height
            ));
        }
        for (name, v) in [
            ("move_speed", g.move_speed),
            ("jump_height", g.jump_height),
            ("fast_walk_factor", g.fast_walk_factor),
            ("start_x", g.start_x),
            ("start_y", g.start_y),
        ] {
            if !v.is_finite() {
                return invalid(format!("game.{name} must be finite"));
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, Error> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_without_file() {
        let cfg = Config::load(None).expect("defaults");
        assert_eq!(cfg.camera.index, 0);
        assert_eq!(cfg.skin.hue, (0, 20));
        assert_eq!(cfg.skin.saturation, (20, 255));
        assert_eq!(cfg.skin.value, (70, 255));
        assert_eq!(cfg.fingers.defect_depth_threshold, 10_000);
        assert_eq!(cfg.gesture.debounce, Duration::from_millis(500));
        assert_eq!(cfg.game.start_x, 400.0);
        assert_eq!(cfg.game.start_y, 450.0);
        assert_eq!(cfg.asset_dir, PathBuf::from("assets"));
    }

    #[test]
    fn five_tap_kernel_gives_sigma_1_1() {
        let sigma = SkinSettings::default().blur_sigma();
        assert!((sigma - 1.1).abs() < 1e-6, "sigma = {sigma}");
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let mut file = NamedTempFile::new().expect("temp config");
        write!(
            file,
            r#"
            [camera]
            index = 2

            [skin]
            hue = [2, 18]

            [gesture]
            debounce_ms = 250

            [game]
            playfield_width = 1000

            [assets]
            dir = "/opt/sprites"
            "#
        )
        .expect("write config");

        let cfg = Config::load(Some(file.path())).expect("load config");
        assert_eq!(cfg.camera.index, 2);
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.skin.hue, (2, 18));
        assert_eq!(cfg.skin.value, (70, 255));
        assert_eq!(cfg.gesture.debounce, Duration::from_millis(250));
        assert_eq!(cfg.game.playfield_width, 1000);
        assert_eq!(cfg.game.start_x, 500.0);
        assert_eq!(cfg.asset_dir, PathBuf::from("/opt/sprites"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }), "{err:?}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[skin]\nhu = [0, 20]\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }), "{err:?}");
    }

    #[test]
    fn rejects_bad_values() {
        for text in [
            "[skin]\nhue = [0, 200]\n",
            "[skin]\nsaturation = [100, 20]\n",
            "[skin]\nblur_kernel = 4\n",
            "[gesture]\ndebounce_ms = 0\n",
            "[game]\nsprite_width = 900\n",
            "[camera]\nwidth = 0\n",
        ] {
            let err = Config::from_toml_str(text).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{text}: {err:?}");
        }
    }
}
