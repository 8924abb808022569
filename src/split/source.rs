use crate::error::Result;
use serde::Serialize;

/// Page rotation as stored in a page's `/Rotate` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rotation {
    None,
    Right, // 90° clockwise
    Down,  // 180°
    Left,  // 270° clockwise
}

impl Rotation {
    /// Normalize a `/Rotate` value; anything that is not a multiple of 90 is invalid.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Right),
            180 => Some(Rotation::Down),
            270 => Some(Rotation::Left),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }

    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Right | Rotation::Left)
    }

    /// Content transform `[a b c d e f]` placing a source page onto an output
    /// page of size `geometry` (already rotated). Quarter turns swap the axes
    /// and shift by the page height; everything else is drawn as-is.
    pub fn placement_matrix(self, geometry: PageGeometry) -> [f32; 6] {
        if self.swaps_axes() {
            [0.0, -1.0, 1.0, 0.0, 0.0, geometry.height]
        } else {
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        }
    }
}

/// Page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub const LETTER: PageGeometry = PageGeometry {
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        PageGeometry { width, height }
    }

    /// The size as displayed, i.e. with the page rotation applied.
    pub fn rotated(self, rotation: Rotation) -> Self {
        if rotation.swaps_axes() {
            PageGeometry::new(self.height, self.width)
        } else {
            self
        }
    }
}

/// Read-only access to the document being split.
///
/// Page numbers are 1-based. Implementations report an unreadable document
/// as [`SplitError::SharedResource`](crate::error::SplitError::SharedResource),
/// which aborts the run; a page that merely fails to copy is a
/// [`SplitError::PageCopy`](crate::error::SplitError::PageCopy).
pub trait SourceDocument {
    /// The output handle pages are copied into.
    type Output: ChildOutput;

    fn total_pages(&self) -> u32;

    /// Unrotated page size.
    fn page_geometry(&self, page: u32) -> Result<PageGeometry>;

    fn page_rotation(&self, page: u32) -> Result<Rotation>;

    /// Append `page` to `output` as a new page of size `geometry` (rotation
    /// already applied), compensating for `rotation`.
    fn copy_page_into(
        &self,
        output: &mut Self::Output,
        page: u32,
        geometry: PageGeometry,
        rotation: Rotation,
    ) -> Result<()>;
}

/// A child document being written.
pub trait ChildOutput {
    /// Bind the document to the size of its first page.
    fn set_page_size(&mut self, geometry: PageGeometry);
}

/// Write-once destination for child documents.
pub trait OutputStore<H> {
    /// Acquire the output named `name`. Fails with
    /// [`SplitError::OutputConflict`](crate::error::SplitError::OutputConflict)
    /// if it already exists.
    fn open_output(&mut self, name: &str) -> Result<H>;

    /// Flush and release a fully written output.
    fn close_output(&mut self, handle: H) -> Result<()>;

    /// Release an output whose child failed, removing anything written so far.
    fn abandon_output(&mut self, handle: H);
}
