//! Shared types for the markscan sheet-scanning pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// decoded photo without depending on `image` directly.
pub use image::RgbaImage;

/// Axis-aligned bounding box of a detected shape, in pixel coordinates
/// of the image it was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (pixels from the left of the image).
    pub x: u32,
    /// Top edge (pixels from the top of the image).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// X coordinate of the right edge (`x + width`).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge (`y + height`).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Center of the box, truncated to integer pixel coordinates.
    #[must_use]
    pub const fn center(&self) -> MarkPoint {
        MarkPoint {
            x: self.x + self.width / 2,
            y: self.y + self.height / 2,
        }
    }

    /// Whether `px` falls within the horizontal span `[x, x + width]`
    /// (inclusive on both ends).
    #[must_use]
    pub const fn contains_x(&self, px: u32) -> bool {
        self.x <= px && px <= self.right()
    }

    /// Whether `py` falls within the vertical span `[y, y + height]`
    /// (inclusive on both ends).
    #[must_use]
    pub const fn contains_y(&self, py: u32) -> bool {
        self.y <= py && py <= self.bottom()
    }
}

/// A detected shape, reduced to the measurements the pipeline consumes.
///
/// The raw contour point list stays inside [`crate::shape`]; everything
/// downstream works from the bounding box, enclosed area, and perimeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Bounding box of the contour.
    pub bounding_box: BoundingBox,
    /// Enclosed area in square pixels (shoelace formula).
    pub area: f64,
    /// Closed arc length of the contour in pixels.
    pub perimeter: f64,
}

/// A decoded machine-readable identifier symbol and where it sits on
/// the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    /// Decoded payload text, forwarded to the caller unchanged.
    pub payload: String,
    /// Pixel location of the symbol within the sheet crop.
    pub bounding_box: BoundingBox,
}

/// A labeled ruler mark delimiting one row or column of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Question number ("1", "2", …) or answer letter ("A"–"Z").
    pub label: String,
    /// The span of grid the header covers. Question headers are matched
    /// against a mark's y coordinate, answer headers against its x.
    pub extent: BoundingBox,
}

/// Centroid of a detected human mark, in rectified-grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPoint {
    /// Horizontal position (pixels from the left edge).
    pub x: u32,
    /// Vertical position (pixels from the top edge).
    pub y: u32,
}

/// Everything the geometric pipeline extracts from one photo.
///
/// Produced by [`crate::process`]; consumed by the grading crate, which
/// resolves marks against the header spans and scores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReading {
    /// Payloads of every identifier symbol decoded on the sheet.
    pub identifier_payloads: Vec<String>,
    /// Question headers (left ruler strip), sorted top to bottom and
    /// labeled "1", "2", ….
    pub questions: Vec<Header>,
    /// Answer headers (top ruler strip), sorted left to right and
    /// labeled "A" through "Z".
    pub answers: Vec<Header>,
    /// Centers of every cell judged to carry a human mark.
    pub marks: Vec<MarkPoint>,
}

/// Configuration for the sheet-scanning pipeline.
///
/// These values encode assumptions about one physical sheet template at
/// one capture resolution (ruler strip widths, printed mark sizes, the
/// brightness of the paper stock). They are configuration, not universal
/// constants: a different template or scan resolution needs different
/// values, not different code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Fixed brightness cut separating the bright sheet from the
    /// background when locating the sheet in the raw photo.
    pub sheet_threshold: u8,

    /// Gaussian blur sigma applied before identifier decoding, to keep
    /// histogram equalization from amplifying sensor noise.
    pub identifier_blur_sigma: f32,

    /// Shapes whose bounding box starts within this many pixels of the
    /// top (resp. left) edge of the rectified grid belong to the top
    /// (resp. left) ruler strip.
    pub ruler_margin: u32,

    /// Interior cell shapes must start to the right of this margin.
    pub interior_margin: u32,

    /// Top-strip (answer) headers must start at x ≥ this value; excludes
    /// the corner shape shared by both ruler strips.
    pub answer_corner_exclusion: u32,

    /// Left-strip (question) headers must start at y ≥ this value; the
    /// same corner exclusion from the other side.
    pub question_corner_exclusion: u32,

    /// Question-header candidates whose y origin is within this distance
    /// of an already-accepted candidate are dropped as duplicate
    /// detections of the same ruler mark.
    pub dedup_distance: u32,

    /// Minimum enclosed area (px²) for a header candidate; smaller
    /// detections are noise specks.
    pub min_shape_area: f64,

    /// Mean cell intensity strictly below this value (8-bit scale) marks
    /// the cell as filled in.
    pub mark_intensity_ceiling: f64,

    /// Polygon-approximation tolerance as a fraction of the contour
    /// perimeter when reducing the grid border to four corners.
    pub polygon_tolerance: f64,

    /// Window size of the edge-preserving bilateral filter applied
    /// before grid inference.
    pub smoothing_window: u32,

    /// Color and spatial sigma of the bilateral filter.
    pub smoothing_sigma: f32,

    /// Multiplicative gain of the linear rescale applied before mark
    /// detection sharpening.
    pub mark_gain: f32,

    /// Additive bias of the same rescale.
    pub mark_bias: f32,
}

impl SheetConfig {
    /// Default sheet brightness cut.
    pub const DEFAULT_SHEET_THRESHOLD: u8 = 140;
    /// Default identifier pre-blur sigma.
    pub const DEFAULT_IDENTIFIER_BLUR_SIGMA: f32 = 1.2;
    /// Default ruler strip margin.
    pub const DEFAULT_RULER_MARGIN: u32 = 7;
    /// Default interior cell margin.
    pub const DEFAULT_INTERIOR_MARGIN: u32 = 5;
    /// Default top-strip corner exclusion.
    pub const DEFAULT_ANSWER_CORNER_EXCLUSION: u32 = 15;
    /// Default left-strip corner exclusion.
    pub const DEFAULT_QUESTION_CORNER_EXCLUSION: u32 = 10;
    /// Default duplicate-suppression distance.
    pub const DEFAULT_DEDUP_DISTANCE: u32 = 19;
    /// Default minimum header shape area.
    pub const DEFAULT_MIN_SHAPE_AREA: f64 = 90.0;
    /// Default mark intensity ceiling.
    pub const DEFAULT_MARK_INTENSITY_CEILING: f64 = 240.0;
    /// Default polygon-approximation tolerance.
    pub const DEFAULT_POLYGON_TOLERANCE: f64 = 0.1;
    /// Default bilateral filter window.
    pub const DEFAULT_SMOOTHING_WINDOW: u32 = 5;
    /// Default bilateral filter sigma.
    pub const DEFAULT_SMOOTHING_SIGMA: f32 = 50.0;
    /// Default mark-detection rescale gain.
    pub const DEFAULT_MARK_GAIN: f32 = 0.8;
    /// Default mark-detection rescale bias.
    pub const DEFAULT_MARK_BIAS: f32 = 5.0;
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            sheet_threshold: Self::DEFAULT_SHEET_THRESHOLD,
            identifier_blur_sigma: Self::DEFAULT_IDENTIFIER_BLUR_SIGMA,
            ruler_margin: Self::DEFAULT_RULER_MARGIN,
            interior_margin: Self::DEFAULT_INTERIOR_MARGIN,
            answer_corner_exclusion: Self::DEFAULT_ANSWER_CORNER_EXCLUSION,
            question_corner_exclusion: Self::DEFAULT_QUESTION_CORNER_EXCLUSION,
            dedup_distance: Self::DEFAULT_DEDUP_DISTANCE,
            min_shape_area: Self::DEFAULT_MIN_SHAPE_AREA,
            mark_intensity_ceiling: Self::DEFAULT_MARK_INTENSITY_CEILING,
            polygon_tolerance: Self::DEFAULT_POLYGON_TOLERANCE,
            smoothing_window: Self::DEFAULT_SMOOTHING_WINDOW,
            smoothing_sigma: Self::DEFAULT_SMOOTHING_SIGMA,
            mark_gain: Self::DEFAULT_MARK_GAIN,
            mark_bias: Self::DEFAULT_MARK_BIAS,
        }
    }
}

/// Errors that can occur while scanning a sheet.
///
/// Every pipeline stage fails closed with one of these variants; callers
/// can distinguish "no sheet detected" from "sheet found but unreadable"
/// from an input-format error without the process ever crashing.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to decode the input image bytes.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// No dominant bright region in the raw photo.
    #[error("no sheet detected in the photo")]
    SheetNotFound,

    /// No decodable identifier symbol above the grid.
    #[error("no decodable identifier found on the sheet")]
    IdentifierNotFound,

    /// Cropping below the identifier left no grid region.
    #[error("no grid region remains below the identifier")]
    GridRegionEmpty,

    /// The grid border did not reduce to four usable corners.
    #[error("could not resolve four grid corners")]
    CornerDetectionFailed,
}
