// Character sprites, loaded once at startup by logical name (`<dir>/<name>.png`) and
// scaled to the on-screen sprite size.
// A missing or unreadable sprite stops the program before the window opens.
use std::path::Path;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::error::Error;
use crate::gesture::Sprite;

/// Decoded sprite at display size, kept as straight RGBA for alpha-tested blitting.
pub struct SpriteImage {
    pub image: RgbaImage,
}

pub struct SpriteSet {
    idle: SpriteImage,
    walk: SpriteImage,
    run: SpriteImage,
    jump: SpriteImage,
}

impl SpriteSet {
    /// Load all four sprites from `dir`, each resized to `width`×`height`.
    pub fn load(dir: &Path, width: u32, height: u32) -> Result<Self, Error> {
        let set = Self {
            idle: load_one(dir, Sprite::Idle, width, height)?,
            walk: load_one(dir, Sprite::Walk, width, height)?,
            run: load_one(dir, Sprite::Run, width, height)?,
            jump: load_one(dir, Sprite::Jump, width, height)?,
        };
        log::info!("loaded {} sprites from {}", Sprite::ALL.len(), dir.display());
        Ok(set)
    }

    pub fn get(&self, sprite: Sprite) -> &SpriteImage {
        match sprite {
            Sprite::Idle => &self.idle,
            Sprite::Walk => &self.walk,
            Sprite::Run => &self.run,
            Sprite::Jump => &self.jump,
        }
    }
}

fn load_one(dir: &Path, sprite: Sprite, width: u32, height: u32) -> Result<SpriteImage, Error> {
    let name = sprite.name();
    let path = dir.join(format!("{name}.png"));
    if !path.is_file() {
        return Err(Error::MissingSprite { name, path });
    }
    let image = image::open(&path)
        .map_err(|source| Error::SpriteDecode {
            path: path.clone(),
            source,
        })?
        .to_rgba8();
    log::debug!(
        "sprite {name}: {}x{} scaled to {width}x{height}",
        image.width(),
        image.height()
    );
    let image = imageops::resize(&image, width, height, FilterType::Nearest);
    Ok(SpriteImage { image })
}
