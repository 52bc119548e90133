//! Visual styling carried by every rune: [`Color`], [`RenderFlags`],
//! [`RenderProps`].

use std::ops::{BitAnd, BitOr};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGB colour packed into a `u32` (0x00RRGGBB).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub u32);

impl Color {
    /// The default / unset colour (0).
    pub const DEFAULT: Self = Self(0);

    /// Construct from individual RGB components.
    #[inline]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Red component.
    #[inline]
    pub const fn r(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// Green component.
    #[inline]
    pub const fn g(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// Blue component.
    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

// ---------------------------------------------------------------------------
// RenderFlags
// ---------------------------------------------------------------------------

/// Bitmask of per-rune text attributes.
///
/// The per-cell dirty bit is *not* part of this mask; damage flags belong to
/// the grid, not to the rune occupying it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderFlags(pub u32);

impl RenderFlags {
    pub const NONE: Self = Self(0);
    pub const INVERT: Self = Self(1 << 0);
    pub const BOLD: Self = Self(1 << 1);
    pub const ITALIC: Self = Self(1 << 2);
    pub const UNDERLINE: Self = Self(1 << 3);

    /// Whether this mask contains all the bits from `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Whether the mask is empty.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for RenderFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for RenderFlags {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// RenderProps
// ---------------------------------------------------------------------------

/// Rendering properties for a single rune.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderProps {
    /// Font size in pixels.
    pub font_size: u32,
    pub color: Color,
}

impl RenderProps {
    /// Set the font size (builder).
    #[inline]
    pub const fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    /// Set the colour (builder).
    #[inline]
    pub const fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Default for RenderProps {
    #[inline]
    fn default() -> Self {
        Self {
            font_size: 32,
            color: Color::from_rgb(200, 255, 255),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trip() {
        let c = Color::from_rgb(0xAB, 0xCD, 0xEF);
        assert_eq!(c.r(), 0xAB);
        assert_eq!(c.g(), 0xCD);
        assert_eq!(c.b(), 0xEF);
    }

    #[test]
    fn flag_ops() {
        let m = RenderFlags::BOLD | RenderFlags::UNDERLINE;
        assert!(m.contains(RenderFlags::BOLD));
        assert!(!m.contains(RenderFlags::ITALIC));
        assert_eq!(m & RenderFlags::BOLD, RenderFlags::BOLD);
        assert!(RenderFlags::NONE.is_empty());
    }

    #[test]
    fn props_builder() {
        let p = RenderProps::default()
            .with_font_size(16)
            .with_color(Color::from_rgb(255, 0, 0));
        assert_eq!(p.font_size, 16);
        assert_eq!(p.color.r(), 255);
    }
}
