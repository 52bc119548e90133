//! The [`Screen`]: a fixed-capacity 2-D grid of runes with per-cell damage
//! flags, and the update/redraw passes that composite it.
//!
//! Storage model: every cell holds a valid slot. A multi-cell rune's anchor
//! (upper-left) cell owns the rune; each cell it covers holds a back-pointer
//! to the anchor, so lookups resolve to the one authoritative instance and a
//! rune is never drawn twice in a pass.
//!
//! Coordinate mapping: column → x, row → y. The pixel origin of cell
//! `(row, col)` is `(col * cell_size, row * cell_size)`.

use crate::cache::TextureCache;
use crate::error::MutationError;
use crate::geom::{Point, Rect};
use crate::rune::{CharSpec, DrawCtx, Footprint, ImgSpec, MeshSpec, Rune};
use crate::texture::{Assets, TextureHandle};

/// Maximum number of columns a screen can be resized to.
pub const MAX_COLS: usize = 480;
/// Maximum number of rows a screen can be resized to.
pub const MAX_ROWS: usize = 300;

const DEFAULT_CELL_SIZE: f32 = 32.0;

// ---------------------------------------------------------------------------
// QuadSink
// ---------------------------------------------------------------------------

/// The shared textured-quad submission boundary.
///
/// The compositor calls [`submit`](QuadSink::submit) once per dirty anchor
/// cell per pass. `dest` is in grid-pixel coordinates, `clip` is a
/// normalized source rectangle. Sinks must treat [`TextureHandle::NONE`] as
/// "draw nothing" rather than an error.
pub trait QuadSink {
    fn submit(&mut self, texture: TextureHandle, dest: Rect, clip: Rect);
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// One cell of backing storage.
#[derive(Clone, Debug)]
enum Slot {
    /// The authoritative rune anchored at this cell.
    Anchor(Rune),
    /// Covered by a multi-cell rune anchored at `anchor` (x = col, y = row).
    Covered { anchor: Point },
}

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// A fixed-capacity grid of runes plus per-cell damage flags.
///
/// The screen owns the compositing algorithm and both texture caches; GPU
/// access happens only through the [`Assets`] collaborators handed to each
/// pass. Not safe for concurrent mutation: callers marshal all grid
/// mutations onto the compositor's thread between frames.
pub struct Screen {
    cols: usize,
    rows: usize,
    cap_cols: usize,
    cap_rows: usize,
    cell_size: f32,
    slots: Vec<Slot>,
    dirty: Vec<bool>,
    glyphs: TextureCache,
    pages: TextureCache,
}

impl Screen {
    /// Create a screen with the default capacity ([`MAX_COLS`] x
    /// [`MAX_ROWS`]) and a logical extent of `cols` x `rows`, every cell
    /// blank.
    pub fn new(cols: usize, rows: usize) -> Result<Self, MutationError> {
        Self::with_capacity(cols, rows, MAX_COLS, MAX_ROWS)
    }

    /// Create a screen with an explicit backing capacity. All capacity
    /// cells are allocated up front and filled with blank runes; growth via
    /// [`resize`](Screen::resize) never fabricates new cells.
    pub fn with_capacity(
        cols: usize,
        rows: usize,
        cap_cols: usize,
        cap_rows: usize,
    ) -> Result<Self, MutationError> {
        if cols > cap_cols || rows > cap_rows {
            return Err(MutationError::CapacityExceeded {
                cols,
                rows,
                cap_cols,
                cap_rows,
            });
        }
        let n = cap_cols * cap_rows;
        Ok(Self {
            cols,
            rows,
            cap_cols,
            cap_rows,
            cell_size: DEFAULT_CELL_SIZE,
            slots: (0..n).map(|_| Slot::Anchor(Rune::blank())).collect(),
            dirty: vec![true; n],
            glyphs: TextureCache::default(),
            pages: TextureCache::default(),
        })
    }

    /// Set the square cell edge in pixels (builder).
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    // -- accessors ------------------------------------------------------------

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Backing capacity as `(cols, rows)`.
    #[inline]
    pub fn capacity(&self) -> (usize, usize) {
        (self.cap_cols, self.cap_rows)
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Logical surface size in pixels.
    pub fn pixel_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cap_cols + col
    }

    #[inline]
    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Whether the cell's damage flag is set. Out-of-range cells read as
    /// clean.
    pub fn is_dirty(&self, row: usize, col: usize) -> bool {
        self.in_bounds(row, col) && self.dirty[self.index(row, col)]
    }

    /// Read-only lookup. Covered cells resolve to their anchor's rune.
    pub fn at(&self, row: usize, col: usize) -> Option<&Rune> {
        if !self.in_bounds(row, col) {
            return None;
        }
        match &self.slots[self.index(row, col)] {
            Slot::Anchor(rune) => Some(rune),
            Slot::Covered { anchor } => {
                match &self.slots[self.index(anchor.y as usize, anchor.x as usize)] {
                    Slot::Anchor(rune) => Some(rune),
                    // A covered cell always points at an anchor; refuse a
                    // broken back-pointer rather than chase it.
                    Slot::Covered { .. } => None,
                }
            }
        }
    }

    /// The cell containing pixel `(px, py)`, if it lies on the logical
    /// surface. Returned as `Point { x: col, y: row }`.
    pub fn cell_at_pixel(&self, px: f32, py: f32) -> Option<Point> {
        let (w, h) = self.pixel_size();
        if !Rect::new(0.0, 0.0, w, h).contains(px, py) {
            return None;
        }
        Some(Point::new(
            (px / self.cell_size) as i32,
            (py / self.cell_size) as i32,
        ))
    }

    // -- mutation API -----------------------------------------------------------

    /// Replace the rune at `(row, col)` with a character rune.
    pub fn set_char(&mut self, row: usize, col: usize, spec: CharSpec) -> Result<(), MutationError> {
        self.place(row, col, Rune::from(spec))
    }

    /// Replace the rune at `(row, col)` with a page-image rune.
    pub fn set_img(&mut self, row: usize, col: usize, spec: ImgSpec) -> Result<(), MutationError> {
        self.place(row, col, Rune::from(spec))
    }

    /// Replace the rune at `(row, col)` with a mesh-tile rune.
    pub fn set_mesh(&mut self, row: usize, col: usize, spec: MeshSpec) -> Result<(), MutationError> {
        self.place(row, col, Rune::from(spec))
    }

    /// Change the logical extent. Cell contents are untouched; newly exposed
    /// cells already hold blanks from construction. Exceeding the capacity
    /// is rejected and leaves the prior extent unchanged.
    pub fn resize(&mut self, cols: usize, rows: usize) -> Result<(), MutationError> {
        if cols > self.cap_cols || rows > self.cap_rows {
            return Err(MutationError::CapacityExceeded {
                cols,
                rows,
                cap_cols: self.cap_cols,
                cap_rows: self.cap_rows,
            });
        }
        // Newly exposed cells are damage.
        for row in 0..rows {
            for col in 0..cols {
                if row >= self.rows || col >= self.cols {
                    let idx = self.index(row, col);
                    self.dirty[idx] = true;
                }
            }
        }
        self.cols = cols;
        self.rows = rows;
        Ok(())
    }

    /// Validate and commit a rune placement. On any rejection the grid is
    /// left exactly as it was.
    fn place(&mut self, row: usize, col: usize, rune: Rune) -> Result<(), MutationError> {
        if !self.in_bounds(row, col) {
            return Err(MutationError::OutOfBounds {
                row,
                col,
                cols: self.cols,
                rows: self.rows,
            });
        }

        let fp = rune.footprint();
        let (fw, fh) = self.clamp_footprint(row, col, fp);
        let anchor = Point::new(col as i32, row as i32);

        // Validation first: the whole region must be free of *other*
        // multi-cell runes. Single-cell runes in the region are simply
        // replaced by coverage.
        for r in row..row + fh {
            for c in col..col + fw {
                match &self.slots[self.index(r, c)] {
                    Slot::Covered { anchor: a } if *a != anchor => {
                        return Err(MutationError::Overlap { row, col });
                    }
                    Slot::Anchor(existing)
                        if (r, c) != (row, col) && existing.footprint() != Footprint::ONE =>
                    {
                        return Err(MutationError::Overlap { row, col });
                    }
                    _ => {}
                }
            }
        }

        // Commit: release whatever the target anchor used to cover, then
        // write the new anchor and its coverage, marking the footprint
        // dirty.
        self.release(row, col);
        for r in row..row + fh {
            for c in col..col + fw {
                let idx = self.index(r, c);
                self.slots[idx] = Slot::Covered { anchor };
                self.dirty[idx] = true;
            }
        }
        let idx = self.index(row, col);
        self.slots[idx] = Slot::Anchor(rune);
        Ok(())
    }

    /// Reset the cells covered by the anchor at `(row, col)` to blanks.
    fn release(&mut self, row: usize, col: usize) {
        let fp = match &self.slots[self.index(row, col)] {
            Slot::Anchor(rune) => rune.footprint(),
            Slot::Covered { .. } => return,
        };
        if fp == Footprint::ONE {
            return;
        }
        let anchor = Point::new(col as i32, row as i32);
        // Coverage was written under the extent in force at placement time,
        // which a later shrink may have moved inside of. Sweep the stored
        // footprint out to capacity; the anchor match keeps this safe.
        let fw = (fp.w as usize).min(self.cap_cols - col);
        let fh = (fp.h as usize).min(self.cap_rows - row);
        for r in row..row + fh {
            for c in col..col + fw {
                let idx = self.index(r, c);
                if matches!(&self.slots[idx], Slot::Covered { anchor: a } if *a == anchor) {
                    self.slots[idx] = Slot::Anchor(Rune::blank());
                    self.dirty[idx] = true;
                }
            }
        }
    }

    /// Footprint clamped to the logical extent: `min(footprint, remaining)`.
    fn clamp_footprint(&self, row: usize, col: usize, fp: Footprint) -> (usize, usize) {
        (
            (fp.w as usize).min(self.cols - col),
            (fp.h as usize).min(self.rows - row),
        )
    }

    // -- per-frame passes --------------------------------------------------------

    /// Mark every cell of the logical extent dirty.
    fn mark_all_dirty(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = self.index(row, col);
                self.dirty[idx] = true;
            }
        }
    }

    /// Clear the damage flags of a rune's clamped footprint.
    fn clean_footprint(&mut self, row: usize, col: usize, fp: Footprint) {
        let (fw, fh) = self.clamp_footprint(row, col, fp);
        for r in row..row + fh {
            for c in col..col + fw {
                let idx = self.index(r, c);
                self.dirty[idx] = false;
            }
        }
    }

    /// The update pass: advance animation state of every rune, visiting each
    /// multi-cell rune exactly once via its anchor.
    pub fn update_runes(&mut self) {
        self.mark_all_dirty();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = self.index(row, col);
                if !self.dirty[idx] {
                    continue;
                }
                let fp = match &mut self.slots[idx] {
                    Slot::Covered { .. } => {
                        self.dirty[idx] = false;
                        continue;
                    }
                    Slot::Anchor(rune) => {
                        rune.update();
                        rune.footprint()
                    }
                };
                self.clean_footprint(row, col, fp);
            }
        }
    }

    /// The redraw pass: full redraw every frame. Marks everything dirty,
    /// then sweeps. This is a deliberate simplicity trade-off, not an
    /// optimization; callers wanting incremental redraw use
    /// [`compose_damaged`](Screen::compose_damaged).
    pub fn compose(&mut self, assets: &mut Assets<'_>, sink: &mut dyn QuadSink) {
        self.mark_all_dirty();
        self.sweep(assets, sink);
    }

    /// The damage-only redraw pass: sweeps without the mark-all prologue, so
    /// only cells mutated (or newly exposed) since the previous pass
    /// dispatch draws.
    pub fn compose_damaged(&mut self, assets: &mut Assets<'_>, sink: &mut dyn QuadSink) {
        self.sweep(assets, sink);
    }

    /// Row-major sweep over the logical extent. Each dirty anchor dispatches
    /// exactly one draw; its footprint is then marked clean, clamped to the
    /// logical bounds. Dirty covered cells only drop their flag; the draw
    /// already happened at the anchor.
    fn sweep(&mut self, assets: &mut Assets<'_>, sink: &mut dyn QuadSink) {
        let cell = self.cell_size;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = self.index(row, col);
                if !self.dirty[idx] {
                    continue;
                }
                let fp = match &mut self.slots[idx] {
                    Slot::Covered { .. } => {
                        self.dirty[idx] = false;
                        continue;
                    }
                    Slot::Anchor(rune) => {
                        let mut ctx = DrawCtx {
                            cell_size: cell,
                            glyphs: &mut self.glyphs,
                            pages: &mut self.pages,
                            assets,
                        };
                        let result = rune.draw(&mut ctx);
                        // Cell-local to grid-pixel coordinates.
                        let dest = result
                            .dest
                            .translate(col as f32 * cell, row as f32 * cell);
                        sink.submit(result.texture, dest, result.clip);
                        rune.footprint()
                    }
                };
                self.clean_footprint(row, col, fp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::error::LoadError;
    use crate::mesh::unit_cube;
    use crate::rune::RuneKind;
    use crate::texture::{Bitmap, BitmapLoader, MeshRenderer, TextureStore};

    // -- fakes -----------------------------------------------------------------

    struct SolidLoader;

    impl BitmapLoader for SolidLoader {
        fn load(&mut self, _key: &CacheKey) -> Result<Bitmap, LoadError> {
            Ok(Bitmap::solid(8, 8, [255, 255, 255, 255]))
        }
    }

    struct FailLoader;

    impl BitmapLoader for FailLoader {
        fn load(&mut self, key: &CacheKey) -> Result<Bitmap, LoadError> {
            Err(LoadError::MissingAsset(key.to_string()))
        }
    }

    #[derive(Default)]
    struct SeqStore {
        uploads: u32,
    }

    impl TextureStore for SeqStore {
        fn upload(&mut self, _bitmap: &Bitmap) -> TextureHandle {
            let h = TextureHandle(self.uploads);
            self.uploads += 1;
            h
        }
    }

    #[derive(Default)]
    struct SpriteMeshes {
        prerenders: usize,
    }

    impl MeshRenderer for SpriteMeshes {
        fn prerender(
            &mut self,
            _mesh: &crate::mesh::Mesh,
            store: &mut dyn TextureStore,
        ) -> Result<TextureHandle, LoadError> {
            self.prerenders += 1;
            Ok(store.upload(&Bitmap::solid(16, 16, [0, 255, 0, 255])))
        }
    }

    #[derive(Default)]
    struct CountSink {
        calls: Vec<(TextureHandle, Rect, Rect)>,
    }

    impl CountSink {
        fn textured(&self) -> Vec<&(TextureHandle, Rect, Rect)> {
            self.calls.iter().filter(|(t, _, _)| !t.is_none()).collect()
        }
    }

    impl QuadSink for CountSink {
        fn submit(&mut self, texture: TextureHandle, dest: Rect, clip: Rect) {
            self.calls.push((texture, dest, clip));
        }
    }

    /// A test harness bundling the fake collaborators.
    struct Rig {
        glyphs: SolidLoader,
        pages: SolidLoader,
        meshes: SpriteMeshes,
        store: SeqStore,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                glyphs: SolidLoader,
                pages: SolidLoader,
                meshes: SpriteMeshes::default(),
                store: SeqStore::default(),
            }
        }

        fn assets(&mut self) -> Assets<'_> {
            Assets {
                glyphs: &mut self.glyphs,
                pages: &mut self.pages,
                meshes: &mut self.meshes,
                store: &mut self.store,
            }
        }
    }

    fn screen(cols: usize, rows: usize) -> Screen {
        Screen::with_capacity(cols, rows, 16, 16).unwrap()
    }

    // -- construction / lookup ---------------------------------------------------

    #[test]
    fn construction_fills_blanks() {
        let s = screen(4, 3);
        assert_eq!(s.cols(), 4);
        assert_eq!(s.rows(), 3);
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(s.at(row, col).unwrap().kind(), RuneKind::Blank);
            }
        }
        assert!(s.at(3, 0).is_none());
        assert!(s.at(0, 4).is_none());
    }

    #[test]
    fn construction_beyond_capacity_rejected() {
        assert!(Screen::with_capacity(20, 2, 16, 16).is_err());
    }

    // -- mutation ------------------------------------------------------------------

    #[test]
    fn out_of_bounds_mutation_rejected() {
        let mut s = screen(3, 3);
        let err = s.set_char(3, 0, CharSpec::new('x'));
        assert_eq!(
            err,
            Err(MutationError::OutOfBounds {
                row: 3,
                col: 0,
                cols: 3,
                rows: 3
            })
        );
        let err = s.set_char(0, 7, CharSpec::new('x'));
        assert!(err.is_err());
    }

    #[test]
    fn covered_cells_resolve_to_anchor() {
        let mut s = screen(4, 4);
        s.set_mesh(0, 0, MeshSpec::new(unit_cube()).with_footprint(2, 2))
            .unwrap();
        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(s.at(row, col).unwrap().kind(), RuneKind::Mesh);
        }
        assert_eq!(s.at(2, 2).unwrap().kind(), RuneKind::Blank);
    }

    #[test]
    fn overlapping_footprints_rejected() {
        let mut s = screen(4, 4);
        s.set_mesh(0, 0, MeshSpec::new(unit_cube()).with_footprint(2, 2))
            .unwrap();

        // A covered cell cannot take a new rune.
        assert_eq!(
            s.set_char(1, 1, CharSpec::new('x')),
            Err(MutationError::Overlap { row: 1, col: 1 })
        );
        // Another multi-cell rune cannot intersect the coverage.
        assert!(
            s.set_mesh(1, 1, MeshSpec::new(unit_cube()).with_footprint(2, 2))
                .is_err()
        );
        // State untouched by the rejections.
        assert_eq!(s.at(1, 1).unwrap().kind(), RuneKind::Mesh);
    }

    #[test]
    fn replacing_an_anchor_releases_its_coverage() {
        let mut s = screen(4, 4);
        s.set_mesh(0, 0, MeshSpec::new(unit_cube()).with_footprint(2, 2))
            .unwrap();
        s.set_char(0, 0, CharSpec::new('A')).unwrap();
        assert_eq!(s.at(0, 0).unwrap().kind(), RuneKind::Char);
        assert_eq!(s.at(0, 1).unwrap().kind(), RuneKind::Blank);
        assert_eq!(s.at(1, 0).unwrap().kind(), RuneKind::Blank);
        assert_eq!(s.at(1, 1).unwrap().kind(), RuneKind::Blank);
    }

    #[test]
    fn mutation_marks_footprint_dirty() {
        let mut s = screen(5, 5);
        let mut rig = Rig::new();
        s.compose(&mut rig.assets(), &mut CountSink::default()); // all clean
        s.set_img(1, 2, ImgSpec::new("page.png").with_footprint(2, 3))
            .unwrap();
        for row in 0..5 {
            for col in 0..5 {
                let inside = (1..4).contains(&row) && (2..4).contains(&col);
                assert_eq!(s.is_dirty(row, col), inside, "cell ({row}, {col})");
            }
        }
    }

    // -- resize ---------------------------------------------------------------------

    #[test]
    fn resize_within_capacity_exposes_blanks() {
        let mut s = screen(3, 3);
        s.set_char(0, 0, CharSpec::new('A')).unwrap();
        s.resize(5, 4).unwrap();
        assert_eq!(s.cols(), 5);
        assert_eq!(s.rows(), 4);
        assert_eq!(s.at(0, 0).unwrap().kind(), RuneKind::Char);
        assert_eq!(s.at(3, 4).unwrap().kind(), RuneKind::Blank);
        // Newly exposed cells carry damage.
        assert!(s.is_dirty(3, 4));
    }

    #[test]
    fn resize_beyond_capacity_rejected() {
        let mut s = screen(3, 3);
        assert!(s.resize(17, 3).is_err());
        assert!(s.resize(3, 17).is_err());
        assert_eq!((s.cols(), s.rows()), (3, 3));
    }

    #[test]
    fn shrink_then_grow_round_trips() {
        let mut s = screen(4, 4);
        s.set_char(3, 3, CharSpec::new('Z')).unwrap();
        s.resize(2, 2).unwrap();
        assert!(s.at(3, 3).is_none()); // outside the logical extent
        s.resize(4, 4).unwrap();
        assert_eq!(s.at(3, 3).unwrap().kind(), RuneKind::Char); // contents untouched
    }

    #[test]
    fn replacing_an_anchor_while_shrunk_releases_offscreen_coverage() {
        let mut s = screen(4, 4);
        s.set_mesh(0, 0, MeshSpec::new(unit_cube()).with_footprint(2, 2))
            .unwrap();
        // Shrink past the coverage, swap the anchor, then grow back.
        s.resize(1, 1).unwrap();
        s.set_char(0, 0, CharSpec::new('A')).unwrap();
        s.resize(4, 4).unwrap();
        assert_eq!(s.at(0, 0).unwrap().kind(), RuneKind::Char);
        for (row, col) in [(0, 1), (1, 0), (1, 1)] {
            assert_eq!(s.at(row, col).unwrap().kind(), RuneKind::Blank, "cell ({row}, {col})");
        }
        // The formerly covered cells accept new runes again.
        s.set_char(0, 1, CharSpec::new('B')).unwrap();
        assert_eq!(s.at(0, 1).unwrap().kind(), RuneKind::Char);
    }

    // -- redraw pass -------------------------------------------------------------------

    #[test]
    fn full_sweep_dispatches_every_anchor_exactly_once() {
        for (cols, rows) in [(1, 1), (3, 2), (5, 5)] {
            let mut s = screen(cols, rows);
            let mut rig = Rig::new();
            let mut sink = CountSink::default();
            s.compose(&mut rig.assets(), &mut sink);
            assert_eq!(sink.calls.len(), cols * rows, "{cols}x{rows}");
        }
    }

    #[test]
    fn char_scenario_three_by_three() {
        let mut s = screen(3, 3).with_cell_size(32.0);
        s.set_char(1, 1, CharSpec::new('A')).unwrap();

        let mut rig = Rig::new();
        let mut sink = CountSink::default();
        s.compose(&mut rig.assets(), &mut sink);

        // 8 blanks + 1 'A', all dispatched.
        assert_eq!(sink.calls.len(), 9);
        let textured = sink.textured();
        assert_eq!(textured.len(), 1);
        let (_, dest, _) = textured[0];
        assert_eq!((dest.x, dest.y), (32.0, 32.0));
        assert_eq!((dest.w, dest.h), (32.0, 32.0));
    }

    #[test]
    fn mesh_scenario_two_by_two_on_four_by_four() {
        let mut s = screen(4, 4).with_cell_size(32.0);
        s.set_mesh(0, 0, MeshSpec::new(unit_cube()).with_footprint(2, 2))
            .unwrap();

        let mut rig = Rig::new();
        let mut sink = CountSink::default();
        s.compose(&mut rig.assets(), &mut sink);

        // 16 cells, 4 covered by the mesh: 12 blank anchors + 1 mesh anchor.
        assert_eq!(sink.calls.len(), 13);
        assert_eq!(rig.meshes.prerenders, 1);
        let textured = sink.textured();
        assert_eq!(textured.len(), 1);
        let (_, dest, _) = textured[0];
        assert_eq!((dest.x, dest.y), (0.0, 0.0));
        assert_eq!((dest.w, dest.h), (64.0, 64.0));

        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert!(!s.is_dirty(row, col));
        }
    }

    #[test]
    fn footprint_cleaning_is_confined_to_the_rectangle() {
        let mut s = screen(6, 6);
        let mut rig = Rig::new();
        s.compose(&mut rig.assets(), &mut CountSink::default());

        s.set_img(2, 1, ImgSpec::new("big.png").with_footprint(3, 2))
            .unwrap();
        let mut sink = CountSink::default();
        s.compose_damaged(&mut rig.assets(), &mut sink);

        // Only the anchor dispatched, and only the footprint flags changed
        // (they were clean before, dirtied by the mutation, cleaned by the
        // sweep; everything else stayed clean throughout).
        assert_eq!(sink.calls.len(), 1);
        for row in 0..6 {
            for col in 0..6 {
                assert!(!s.is_dirty(row, col));
            }
        }
    }

    #[test]
    fn footprint_clamps_at_the_logical_edge() {
        let mut s = screen(4, 4);
        // A 3x3 image anchored one cell from the corner spills over the
        // edge; the spill is clamped, never written.
        s.set_img(2, 2, ImgSpec::new("corner.png").with_footprint(3, 3))
            .unwrap();
        let mut rig = Rig::new();
        let mut sink = CountSink::default();
        s.compose(&mut rig.assets(), &mut sink);
        // 16 cells, 4 in the clamped footprint (1 anchor + 3 covered).
        assert_eq!(sink.calls.len(), 13);
    }

    #[test]
    fn damage_pass_draws_only_mutated_cells() {
        let mut s = screen(4, 4);
        let mut rig = Rig::new();
        s.compose(&mut rig.assets(), &mut CountSink::default());

        s.set_char(2, 3, CharSpec::new('Q')).unwrap();
        let mut sink = CountSink::default();
        s.compose_damaged(&mut rig.assets(), &mut sink);
        assert_eq!(sink.calls.len(), 1);

        // Nothing left dirty: a second damage pass is a no-op.
        let mut sink = CountSink::default();
        s.compose_damaged(&mut rig.assets(), &mut sink);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn failed_loads_do_not_abort_the_sweep() {
        let mut s = screen(3, 3);
        s.set_char(0, 0, CharSpec::new('A')).unwrap();
        s.set_char(2, 2, CharSpec::new('B')).unwrap();

        let mut glyphs = FailLoader;
        let mut pages = FailLoader;
        let mut meshes = SpriteMeshes::default();
        let mut store = SeqStore::default();
        let mut assets = Assets {
            glyphs: &mut glyphs,
            pages: &mut pages,
            meshes: &mut meshes,
            store: &mut store,
        };

        let mut sink = CountSink::default();
        s.compose(&mut assets, &mut sink);
        // All 9 cells dispatched; the failed runes resolve to the sentinel.
        assert_eq!(sink.calls.len(), 9);
        assert!(sink.textured().is_empty());
    }

    // -- update pass -----------------------------------------------------------------

    #[test]
    fn multi_cell_rune_updates_once_per_pass() {
        let mut s = screen(4, 4);
        s.set_mesh(0, 0, MeshSpec::new(unit_cube()).with_footprint(2, 2))
            .unwrap();
        s.update_runes();
        // One update, not one per covered cell.
        assert_eq!(s.at(0, 0).unwrap().spin_angle(), Some(3.0));
        s.update_runes();
        assert_eq!(s.at(1, 1).unwrap().spin_angle(), Some(6.0));
    }

    // -- glyph cache sharing ------------------------------------------------------------

    #[test]
    fn repeated_characters_share_one_texture() {
        let mut s = screen(4, 1);
        for col in 0..4 {
            s.set_char(0, col, CharSpec::new('=')).unwrap();
        }
        let mut rig = Rig::new();
        let mut sink = CountSink::default();
        s.compose(&mut rig.assets(), &mut sink);

        let textured = sink.textured();
        assert_eq!(textured.len(), 4);
        assert!(textured.iter().all(|(t, _, _)| *t == textured[0].0));
        assert_eq!(rig.store.uploads, 1);
    }

    // -- hit testing ---------------------------------------------------------------------

    #[test]
    fn cell_at_pixel_containment() {
        let s = screen(4, 3).with_cell_size(32.0);
        assert_eq!(s.cell_at_pixel(0.0, 0.0), Some(Point::new(0, 0)));
        assert_eq!(s.cell_at_pixel(33.0, 70.0), Some(Point::new(1, 2)));
        assert_eq!(s.cell_at_pixel(4.0 * 32.0, 0.0), None);
        assert_eq!(s.cell_at_pixel(-1.0, 5.0), None);
    }
}
