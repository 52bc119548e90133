//! Asset loading: glyph rasterization, page-image decode, OBJ mesh import.

use std::path::PathBuf;

use fontdue::{Font, FontSettings};

use runic_core::{
    Bitmap, BitmapLoader, CacheKey, Color, Face, LoadError, MeshSource, MeshVertex, Vec3,
};

use crate::error::BackendError;

// ---------------------------------------------------------------------------
// FontLoader
// ---------------------------------------------------------------------------

/// Rasterizes glyphs into cell-sized RGBA bitmaps via fontdue.
///
/// Each glyph is composited into a square `cell_size` bitmap positioned on
/// the font's baseline, so the atlas-free texture-per-glyph path never needs
/// per-glyph offsets at draw time.
pub struct FontLoader {
    font: Font,
    font_size: f32,
    cell_size: u32,
    color: Color,
}

impl FontLoader {
    pub fn new(font_data: &[u8], font_size: f32, cell_size: u32) -> Result<Self, BackendError> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| BackendError::Font(e.to_string()))?;
        Ok(Self {
            font,
            font_size,
            cell_size,
            color: Color::from_rgb(200, 255, 255),
        })
    }

    /// Glyph tint (builder).
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl BitmapLoader for FontLoader {
    fn load(&mut self, key: &CacheKey) -> Result<Bitmap, LoadError> {
        let ch = match key {
            CacheKey::Glyph(ch) => *ch,
            other => return Err(LoadError::BadKey(other.to_string())),
        };
        if self.font.lookup_glyph_index(ch) == 0 {
            return Err(LoadError::MissingGlyph(ch));
        }

        let (metrics, coverage) = self.font.rasterize(ch, self.font_size);

        // Composite onto the baseline inside a cell-sized bitmap.
        let cell = self.cell_size;
        let mut pixels = vec![0u8; (cell * cell * 4) as usize];
        let ascent = self
            .font
            .horizontal_line_metrics(self.font_size)
            .map(|m| m.ascent.ceil() as i32)
            .unwrap_or(cell as i32);
        let origin_x = metrics.xmin;
        let origin_y = ascent - metrics.ymin - metrics.height as i32;

        let (r, g, b) = (self.color.r(), self.color.g(), self.color.b());
        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                let alpha = coverage[gy * metrics.width + gx];
                if alpha == 0 {
                    continue;
                }
                let px = origin_x + gx as i32;
                let py = origin_y + gy as i32;
                if px < 0 || py < 0 || px >= cell as i32 || py >= cell as i32 {
                    continue;
                }
                let i = ((py as u32 * cell + px as u32) * 4) as usize;
                pixels[i] = r;
                pixels[i + 1] = g;
                pixels[i + 2] = b;
                pixels[i + 3] = alpha;
            }
        }

        Ok(Bitmap::from_rgba8(cell, cell, pixels))
    }
}

// ---------------------------------------------------------------------------
// PageLoader
// ---------------------------------------------------------------------------

/// Decodes page images from disk via the `image` crate.
pub struct PageLoader {
    base: PathBuf,
}

impl PageLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl BitmapLoader for PageLoader {
    fn load(&mut self, key: &CacheKey) -> Result<Bitmap, LoadError> {
        let path = match key {
            CacheKey::Page(path) => self.base.join(path),
            other => return Err(LoadError::BadKey(other.to_string())),
        };
        let img = image::open(&path).map_err(|e| match e {
            image::ImageError::IoError(_) => LoadError::MissingAsset(path.display().to_string()),
            other => LoadError::Decode {
                path: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Bitmap::from_rgba8(width, height, rgba.into_raw()))
    }
}

// ---------------------------------------------------------------------------
// ObjSource
// ---------------------------------------------------------------------------

/// Minimal Wavefront OBJ importer: `v`, `vn`, `vt` and `f` records, with
/// fan triangulation of polygons. One output vertex per face corner.
pub struct ObjSource {
    base: PathBuf,
}

impl ObjSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl MeshSource for ObjSource {
    fn import(&mut self, path: &str) -> Result<(Vec<MeshVertex>, Vec<Face>), LoadError> {
        let full = self.base.join(path);
        let text = std::fs::read_to_string(&full)
            .map_err(|_| LoadError::MissingAsset(full.display().to_string()))?;
        parse_obj(&text).map_err(|reason| LoadError::Decode {
            path: full.display().to_string(),
            reason,
        })
    }
}

fn parse_obj(text: &str) -> Result<(Vec<MeshVertex>, Vec<Face>), String> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut texcos: Vec<[f32; 2]> = Vec::new();
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        let mut fields = line.split_whitespace();
        let err = |what: &str| format!("line {}: {what}", lineno + 1);

        match fields.next() {
            Some("v") => positions.push(parse_vec3(&mut fields).ok_or_else(|| err("bad v"))?),
            Some("vn") => normals.push(parse_vec3(&mut fields).ok_or_else(|| err("bad vn"))?),
            Some("vt") => {
                let u: f32 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| err("bad vt"))?;
                let v: f32 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| err("bad vt"))?;
                texcos.push([u, v]);
            }
            Some("f") => {
                let mut corners: Vec<MeshVertex> = Vec::new();
                for field in fields {
                    corners.push(
                        parse_corner(field, &positions, &normals, &texcos)
                            .ok_or_else(|| err("bad face corner"))?,
                    );
                }
                if corners.len() < 3 {
                    return Err(err("face with fewer than 3 corners"));
                }
                // Fan triangulation around the first corner.
                let first = vertices.len();
                vertices.extend(corners.iter().copied());
                if vertices.len() > u16::MAX as usize {
                    return Err(err("too many vertices for 16-bit indices"));
                }
                for i in 1..corners.len() - 1 {
                    faces.push([
                        first as u16,
                        (first + i) as u16,
                        (first + i + 1) as u16,
                    ]);
                }
            }
            // Comments, groups, materials and blank lines are skipped.
            _ => {}
        }
    }

    if vertices.is_empty() || faces.is_empty() {
        return Err("no geometry".into());
    }
    Ok((vertices, faces))
}

fn parse_vec3(fields: &mut std::str::SplitWhitespace<'_>) -> Option<Vec3> {
    let x: f32 = fields.next()?.parse().ok()?;
    let y: f32 = fields.next()?.parse().ok()?;
    let z: f32 = fields.next()?.parse().ok()?;
    Some(Vec3::new(x, y, z))
}

/// Resolve one `f` field (`v`, `v/t`, `v//n` or `v/t/n`, 1-based, negatives
/// counting from the end) into a vertex.
fn parse_corner(
    field: &str,
    positions: &[Vec3],
    normals: &[Vec3],
    texcos: &[[f32; 2]],
) -> Option<MeshVertex> {
    let mut parts = field.split('/');

    let resolve = |idx: &str, len: usize| -> Option<usize> {
        let i: i64 = idx.parse().ok()?;
        let i = if i < 0 { len as i64 + i } else { i - 1 };
        (0..len as i64).contains(&i).then_some(i as usize)
    };

    let position = *positions.get(resolve(parts.next()?, positions.len())?)?;
    let texco = match parts.next() {
        Some("") | None => [0.0, 0.0],
        Some(t) => *texcos.get(resolve(t, texcos.len())?)?,
    };
    let normal = match parts.next() {
        Some("") | None => Vec3::new(0.0, 0.0, 1.0),
        Some(n) => *normals.get(resolve(n, normals.len())?)?,
    };

    Some(MeshVertex {
        position,
        normal,
        color: [1.0, 1.0, 1.0, 1.0],
        texco,
    })
}
