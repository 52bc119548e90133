//! Runes: one grid cell's drawable/updatable content.
//!
//! A rune may be a character glyph, a static page image, or one tile of a
//! 3-D mesh pre-rendered to a sprite. The compositor only ever uses the
//! capability surface (`draw`, `update`, `footprint`); adding a kind means
//! extending the payload enum and its `match` arms, never touching the
//! grid sweep.

use crate::cache::{CacheKey, TextureCache};
use crate::geom::Rect;
use crate::mesh::Mesh;
use crate::style::{RenderFlags, RenderProps};
use crate::texture::{Assets, TextureHandle};

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// Rendered size of a rune in whole cells, anchored at its upper-left cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footprint {
    pub w: u32,
    pub h: u32,
}

impl Footprint {
    /// The common single-cell footprint.
    pub const ONE: Self = Self { w: 1, h: 1 };

    /// Create a footprint; dimensions are clamped to at least 1x1.
    #[inline]
    pub const fn new(w: u32, h: u32) -> Self {
        Self {
            w: if w == 0 { 1 } else { w },
            h: if h == 0 { 1 } else { h },
        }
    }
}

impl Default for Footprint {
    #[inline]
    fn default() -> Self {
        Self::ONE
    }
}

// ---------------------------------------------------------------------------
// Texture binding state machine
// ---------------------------------------------------------------------------

/// Lazy texture binding: `Unloaded -> Ready` happens at most once, on the
/// first draw; `Unloaded -> Failed` is terminal and resolves to the
/// no-texture sentinel forever after.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TexBinding {
    Unloaded,
    Ready(TextureHandle),
    Failed,
}

impl TexBinding {
    /// Resolve the binding, running `bind` only from the `Unloaded` state.
    fn resolve(&mut self, bind: impl FnOnce() -> TextureHandle) -> TextureHandle {
        match *self {
            TexBinding::Ready(h) => h,
            TexBinding::Failed => TextureHandle::NONE,
            TexBinding::Unloaded => {
                let h = bind();
                *self = if h.is_none() {
                    TexBinding::Failed
                } else {
                    TexBinding::Ready(h)
                };
                h
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DrawResult
// ---------------------------------------------------------------------------

/// What a rune hands to the quad submission routine.
///
/// `dest` is in cell-local pixel coordinates (the anchor cell's origin is
/// `(0, 0)`); the compositor translates it to grid-pixel space. `clip` is a
/// normalized source rectangle into `texture`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawResult {
    pub texture: TextureHandle,
    pub dest: Rect,
    pub clip: Rect,
}

// ---------------------------------------------------------------------------
// Specs (mutation API payloads)
// ---------------------------------------------------------------------------

/// Specification for a character rune.
#[derive(Clone, Debug, PartialEq)]
pub struct CharSpec {
    pub ch: char,
    pub props: RenderProps,
    pub flags: RenderFlags,
}

impl CharSpec {
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            props: RenderProps::default(),
            flags: RenderFlags::NONE,
        }
    }

    pub fn with_props(mut self, props: RenderProps) -> Self {
        self.props = props;
        self
    }

    pub fn with_flags(mut self, flags: RenderFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Specification for a static page-image rune.
#[derive(Clone, Debug, PartialEq)]
pub struct ImgSpec {
    pub path: String,
    pub footprint: Footprint,
}

impl ImgSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            footprint: Footprint::ONE,
        }
    }

    pub fn with_footprint(mut self, w: u32, h: u32) -> Self {
        self.footprint = Footprint::new(w, h);
        self
    }
}

/// Specification for a mesh-tile rune.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSpec {
    pub mesh: Mesh,
    pub footprint: Footprint,
    /// Sprite offset in pixels relative to the anchor cell's origin.
    pub offset: (f32, f32),
}

impl MeshSpec {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            footprint: Footprint::ONE,
            offset: (0.0, 0.0),
        }
    }

    pub fn with_footprint(mut self, w: u32, h: u32) -> Self {
        self.footprint = Footprint::new(w, h);
        self
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = (x, y);
        self
    }
}

// ---------------------------------------------------------------------------
// Rune
// ---------------------------------------------------------------------------

/// Discriminant of a rune's content kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuneKind {
    Blank,
    Char,
    Img,
    Mesh,
}

/// Closed payload union. Variant data is only touched from `draw`/`update`
/// match arms.
#[derive(Clone, Debug)]
enum Payload {
    Blank,
    Char {
        ch: char,
    },
    Img {
        path: String,
    },
    Mesh {
        mesh: Mesh,
        /// Pixel offset of the sprite relative to the anchor cell.
        offset: (f32, f32),
        /// Animation state advanced by `update`.
        angle: f32,
    },
}

/// Everything a compositing pass needs to let runes bind textures: the
/// screen-owned caches plus the backend collaborators.
pub struct DrawCtx<'a, 'b> {
    /// Square cell edge in pixels.
    pub cell_size: f32,
    pub glyphs: &'a mut TextureCache,
    pub pages: &'a mut TextureCache,
    pub assets: &'a mut Assets<'b>,
}

/// One grid cell's content.
#[derive(Clone, Debug)]
pub struct Rune {
    pub flags: RenderFlags,
    pub props: RenderProps,
    footprint: Footprint,
    binding: TexBinding,
    payload: Payload,
}

impl Rune {
    /// The shared blank rune: one cell, no texture, draws nothing.
    pub fn blank() -> Self {
        Self {
            flags: RenderFlags::NONE,
            props: RenderProps::default(),
            footprint: Footprint::ONE,
            binding: TexBinding::Failed, // blank never binds a texture
            payload: Payload::Blank,
        }
    }

    #[inline]
    pub fn kind(&self) -> RuneKind {
        match self.payload {
            Payload::Blank => RuneKind::Blank,
            Payload::Char { .. } => RuneKind::Char,
            Payload::Img { .. } => RuneKind::Img,
            Payload::Mesh { .. } => RuneKind::Mesh,
        }
    }

    #[inline]
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Current spin angle of a mesh rune's sprite, if this is one.
    pub fn spin_angle(&self) -> Option<f32> {
        match self.payload {
            Payload::Mesh { angle, .. } => Some(angle),
            _ => None,
        }
    }

    /// Produce this frame's draw for the rune.
    ///
    /// Pure with respect to cell content apart from the at-most-once lazy
    /// texture bind through the cache; never mutates grid topology. A rune
    /// whose resource failed to load keeps returning the no-texture
    /// sentinel; the caller draws nothing for it and carries on.
    pub fn draw(&mut self, ctx: &mut DrawCtx<'_, '_>) -> DrawResult {
        let cell = ctx.cell_size;
        let dest = Rect::new(
            0.0,
            0.0,
            self.footprint.w as f32 * cell,
            self.footprint.h as f32 * cell,
        );

        let (texture, dest) = match &self.payload {
            Payload::Blank => (TextureHandle::NONE, dest),
            Payload::Char { ch } => {
                let key = CacheKey::Glyph(*ch);
                let texture = self
                    .binding
                    .resolve(|| ctx.glyphs.get_or_load(key, ctx.assets.glyphs, ctx.assets.store));
                (texture, dest)
            }
            Payload::Img { path } => {
                let key = CacheKey::Page(path.clone());
                let texture = self
                    .binding
                    .resolve(|| ctx.pages.get_or_load(key, ctx.assets.pages, ctx.assets.store));
                (texture, dest)
            }
            Payload::Mesh { mesh, offset, .. } => {
                let texture = self.binding.resolve(|| {
                    match ctx.assets.meshes.prerender(mesh, &mut *ctx.assets.store) {
                        Ok(h) => h,
                        Err(err) => {
                            log::warn!("mesh prerender failed: {err}");
                            TextureHandle::NONE
                        }
                    }
                });
                (texture, dest.translate(offset.0, offset.1))
            }
        };

        DrawResult {
            texture,
            dest,
            clip: Rect::UNIT,
        }
    }

    /// Advance per-frame animation state. Only mesh runes animate today:
    /// their sprite spin angle accumulates 3 degrees per update.
    pub fn update(&mut self) {
        if let Payload::Mesh { angle, .. } = &mut self.payload {
            *angle = (*angle + 3.0) % 360.0;
        }
    }
}

impl From<CharSpec> for Rune {
    fn from(spec: CharSpec) -> Self {
        Self {
            flags: spec.flags,
            props: spec.props,
            footprint: Footprint::ONE,
            binding: TexBinding::Unloaded,
            payload: Payload::Char { ch: spec.ch },
        }
    }
}

impl From<ImgSpec> for Rune {
    fn from(spec: ImgSpec) -> Self {
        Self {
            flags: RenderFlags::NONE,
            props: RenderProps::default(),
            footprint: spec.footprint,
            binding: TexBinding::Unloaded,
            payload: Payload::Img { path: spec.path },
        }
    }
}

impl From<MeshSpec> for Rune {
    fn from(spec: MeshSpec) -> Self {
        Self {
            flags: RenderFlags::NONE,
            props: RenderProps::default(),
            footprint: spec.footprint,
            binding: TexBinding::Unloaded,
            payload: Payload::Mesh {
                mesh: spec.mesh,
                offset: spec.offset,
                angle: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_clamps_to_one() {
        assert_eq!(Footprint::new(0, 0), Footprint::ONE);
        assert_eq!(Footprint::new(3, 0), Footprint::new(3, 1));
    }

    #[test]
    fn blank_rune_shape() {
        let r = Rune::blank();
        assert_eq!(r.kind(), RuneKind::Blank);
        assert_eq!(r.footprint(), Footprint::ONE);
        assert_eq!(r.spin_angle(), None);
    }

    #[test]
    fn binding_failure_is_terminal() {
        let mut b = TexBinding::Unloaded;
        assert!(b.resolve(|| TextureHandle::NONE).is_none());
        assert_eq!(b, TexBinding::Failed);
        // A later successful bind must not happen.
        assert!(b.resolve(|| TextureHandle(7)).is_none());
    }

    #[test]
    fn binding_ready_is_sticky() {
        let mut b = TexBinding::Unloaded;
        assert_eq!(b.resolve(|| TextureHandle(3)), TextureHandle(3));
        // The closure must not run again.
        assert_eq!(b.resolve(|| unreachable!()), TextureHandle(3));
    }

    #[test]
    fn mesh_update_advances_angle() {
        let mut r = Rune::from(MeshSpec::new(crate::mesh::unit_cube()).with_footprint(2, 2));
        assert_eq!(r.spin_angle(), Some(0.0));
        r.update();
        r.update();
        assert_eq!(r.spin_angle(), Some(6.0));
    }

    #[test]
    fn char_update_is_a_no_op() {
        let mut r = Rune::from(CharSpec::new('A'));
        r.update();
        assert_eq!(r.kind(), RuneKind::Char);
    }
}
