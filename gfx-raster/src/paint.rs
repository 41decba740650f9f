//! Paint sources.

use crate::color::Color;
use crate::gradient::Gradient;
use crate::texture::Texture;

/// What a fill, stroke or paint operation draws with.
#[derive(Debug, Clone)]
pub enum Paint {
    Color(Color),
    Gradient(Gradient),
    Texture(Texture),
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Color(Color::BLACK)
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Color(color)
    }
}

impl From<Gradient> for Paint {
    fn from(gradient: Gradient) -> Self {
        Paint::Gradient(gradient)
    }
}

impl From<Texture> for Paint {
    fn from(texture: Texture) -> Self {
        Paint::Texture(texture)
    }
}
