//! Core types for runic, a GPU cell-grid compositor for editor frontends.
//!
//! This crate provides the GPU-agnostic half of the *runic* compositor: the
//! linear-algebra kernel, polymorphic cell contents ([`Rune`]), the
//! fixed-capacity [`Screen`] grid with its damage-tracked update/redraw
//! passes, and the at-most-once [`TextureCache`]. Everything that touches a
//! real GPU sits behind the [`TextureStore`], [`BitmapLoader`] and
//! [`MeshRenderer`] traits so the compositing algorithm can be driven (and
//! tested) with in-memory fakes.

pub mod cache;
pub mod error;
pub mod geom;
pub mod mat4;
pub mod mesh;
pub mod rune;
pub mod screen;
pub mod style;
pub mod texture;
pub mod vec;

pub use cache::{CacheKey, TextureCache};
pub use error::{LoadError, MutationError};
pub use geom::{Point, Rect};
pub use mat4::{Mat4, MatrixStack};
pub use mesh::{Face, Mesh, MeshSource, MeshVertex};
pub use rune::{CharSpec, DrawResult, Footprint, ImgSpec, MeshSpec, Rune, RuneKind};
pub use screen::{QuadSink, Screen, MAX_COLS, MAX_ROWS};
pub use style::{Color, RenderFlags, RenderProps};
pub use texture::{Assets, Bitmap, BitmapLoader, MeshRenderer, TextureHandle, TextureStore};
pub use vec::{Vec3, Vec4};
