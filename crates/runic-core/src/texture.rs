//! Texture plumbing: opaque handles, CPU bitmaps, and the traits that hide
//! the GPU from the compositor core.

use crate::cache::CacheKey;
use crate::error::LoadError;
use crate::mesh::Mesh;

// ---------------------------------------------------------------------------
// TextureHandle
// ---------------------------------------------------------------------------

/// An opaque handle to a GPU texture, issued by a [`TextureStore`].
///
/// [`TextureHandle::NONE`] is the sentinel "no texture": submitting it to a
/// quad sink draws nothing. It is what failed resource loads resolve to, so
/// one rune's missing asset never aborts a frame sweep.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The "no texture" sentinel.
    pub const NONE: Self = Self(u32::MAX);

    /// Whether this is the sentinel handle.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

// ---------------------------------------------------------------------------
// Bitmap
// ---------------------------------------------------------------------------

/// CPU-side pixel data: tightly packed RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap from raw RGBA8 bytes. The byte length must be
    /// `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A solid single-colour bitmap.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

// ---------------------------------------------------------------------------
// Store / loader / mesh-renderer traits
// ---------------------------------------------------------------------------

/// Owner of GPU textures. Implementations pair creation and destruction of
/// each GPU object exactly once (RAII); dropping the store releases every
/// texture it issued.
///
/// Uploads use nearest-neighbour filtering; the fixed-size bitmap-font
/// aesthetic wants sharp, pixelated sampling.
pub trait TextureStore {
    /// Upload a bitmap, returning the handle it will be addressed by.
    fn upload(&mut self, bitmap: &Bitmap) -> TextureHandle;
}

/// The asset boundary: given a cache key, produce pixel data or fail.
///
/// Font rasterization and image decode both live behind this trait; the
/// compositor core never looks inside.
pub trait BitmapLoader {
    fn load(&mut self, key: &CacheKey) -> Result<Bitmap, LoadError>;
}

/// Pre-renders a mesh into an off-screen sprite texture registered with the
/// given store, returning the sprite's handle.
pub trait MeshRenderer {
    fn prerender(
        &mut self,
        mesh: &Mesh,
        store: &mut dyn TextureStore,
    ) -> Result<TextureHandle, LoadError>;
}

/// The bundle of external collaborators a compositing pass needs.
///
/// Borrowed for the duration of one pass; every field is owned by the
/// backend (or by a test fixture) and outlives the sweep.
pub struct Assets<'a> {
    /// Glyph rasterizer (character → bitmap).
    pub glyphs: &'a mut dyn BitmapLoader,
    /// Page-image decoder (file path → bitmap).
    pub pages: &'a mut dyn BitmapLoader,
    /// Off-screen mesh sprite renderer.
    pub meshes: &'a mut dyn MeshRenderer,
    /// GPU texture owner.
    pub store: &'a mut dyn TextureStore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_handle() {
        assert!(TextureHandle::NONE.is_none());
        assert!(!TextureHandle(0).is_none());
        assert!(!TextureHandle(41).is_none());
    }

    #[test]
    fn solid_bitmap_layout() {
        let b = Bitmap::solid(2, 3, [1, 2, 3, 4]);
        assert_eq!(b.pixels.len(), 2 * 3 * 4);
        assert_eq!(&b.pixels[0..4], &[1, 2, 3, 4]);
        assert_eq!(&b.pixels[20..24], &[1, 2, 3, 4]);
    }
}
