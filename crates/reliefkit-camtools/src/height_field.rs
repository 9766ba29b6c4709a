//! Height Field Builder
//!
//! Loads a raster image, resamples it to the physical grid implied by the
//! target size and resolution, and turns each cell into either a height
//! (colour palette or grayscale relief) or an on/off activity flag.
//!
//! Row 0 of every grid is the top row of the image.

use crate::color_height::{ColorHeightMapper, MAX_PALETTE_HEIGHT};
use crate::error::{ParameterError, ParameterResult};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::map_colors;
use reliefkit_core::ImageLoadError;
use std::path::Path;

/// Rectangular grid of non-negative heights, row-major, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    rows: usize,
    cols: usize,
    max_height: f64,
    values: Vec<f64>,
}

impl HeightGrid {
    /// Build a grid, checking shape and the `[0, max_height]` range
    pub fn new(rows: usize, cols: usize, values: Vec<f64>, max_height: f64) -> ParameterResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ParameterError::InvalidDimensions(format!("{}x{}", rows, cols)));
        }
        if values.len() != rows * cols {
            return Err(ParameterError::InvalidDimensions(format!(
                "{} values for a {}x{} grid",
                values.len(),
                rows,
                cols
            )));
        }
        if let Some(&bad) = values
            .iter()
            .find(|v| !v.is_finite() || **v < 0.0 || **v > max_height)
        {
            return Err(ParameterError::OutOfRange {
                name: "height".to_string(),
                value: bad,
                min: 0.0,
                max: max_height,
            });
        }

        Ok(Self {
            rows,
            cols,
            max_height,
            values,
        })
    }

    /// Grid where every cell holds `height`
    pub fn filled(rows: usize, cols: usize, height: f64, max_height: f64) -> ParameterResult<Self> {
        Self::new(rows, cols, vec![height; rows * cols], max_height)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Upper bound every cell respects
    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Height at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.values[row * self.cols + col])
        } else {
            None
        }
    }

    /// One row of heights
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }
}

/// Binary per-cell activity flags, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMask {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl ActiveMask {
    /// Build a mask from row-major flags
    pub fn new(rows: usize, cols: usize, cells: Vec<bool>) -> ParameterResult<Self> {
        if rows == 0 || cols == 0 || cells.len() != rows * cols {
            return Err(ParameterError::InvalidDimensions(format!(
                "{} cells for a {}x{} mask",
                cells.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Parse rows of `#` (active) and `.` (inactive); handy for fixtures
    pub fn from_rows(rows: &[&str]) -> ParameterResult<Self> {
        let cols = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let cells = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c == '#'))
            .collect();
        Self::new(rows.len(), cols, cells)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether (row, col) is active; out of range is inactive
    pub fn is_active(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// Count of active cells
    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Largest grid edge accepted from a target size (points)
pub const MAX_GRID_POINTS: u32 = 20_000;

/// Requested physical size of the carving
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetSize {
    /// Width in millimeters (image pixel width / resolution if None)
    pub width_mm: Option<f64>,
    /// Height in millimeters (auto-calculated from aspect ratio if None)
    pub height_mm: Option<f64>,
}

impl TargetSize {
    /// Size from explicit dimensions
    pub fn new(width_mm: Option<f64>, height_mm: Option<f64>) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Grid dimensions `(cols, rows)` for an image of `image_width` x `image_height` pixels
    pub fn grid_dimensions(
        &self,
        image_width: u32,
        image_height: u32,
        steps_per_mm: f64,
    ) -> ParameterResult<(u32, u32)> {
        if image_width == 0 || image_height == 0 {
            return Err(ParameterError::InvalidDimensions(format!(
                "image is {}x{} pixels",
                image_width, image_height
            )));
        }
        for (name, value) in [("width_mm", self.width_mm), ("height_mm", self.height_mm)] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(ParameterError::OutOfRange {
                        name: name.to_string(),
                        value: v,
                        min: 0.0,
                        max: f64::MAX,
                    });
                }
            }
        }

        let width_mm = self
            .width_mm
            .unwrap_or(image_width as f64 / steps_per_mm);
        let aspect_ratio = image_height as f64 / image_width as f64;
        let height_mm = self.height_mm.unwrap_or(width_mm * aspect_ratio);

        let cols = (width_mm * steps_per_mm).round().max(1.0);
        let rows = (height_mm * steps_per_mm).round().max(1.0);
        if !(cols <= MAX_GRID_POINTS as f64 && rows <= MAX_GRID_POINTS as f64) {
            return Err(ParameterError::InvalidDimensions(format!(
                "{} x {} grid points exceeds {} per side",
                cols, rows, MAX_GRID_POINTS
            )));
        }
        Ok((cols as u32, rows as u32))
    }
}

/// Pre-processing applied to the grayscale image in relief mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReliefEnhancement {
    /// Use intensities as-is
    None,
    /// Equalize, smooth, contrast x1.3
    #[default]
    Standard,
    /// Invert, equalize, light blur, brightness x1.1
    InvertedRelief,
    /// Contrast x2.5 then edge enhancement
    AggressiveContrast,
}

impl ReliefEnhancement {
    /// Apply the enhancement chain
    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        match self {
            ReliefEnhancement::None => image.clone(),
            ReliefEnhancement::Standard => {
                let equalized = equalize_histogram(image);
                let smoothed = gaussian_blur_f32(&equalized, 1.0);
                scale_contrast(&smoothed, 1.3)
            }
            ReliefEnhancement::InvertedRelief => {
                let mut inverted = image.clone();
                image::imageops::invert(&mut inverted);
                let equalized = equalize_histogram(&inverted);
                let smoothed = gaussian_blur_f32(&equalized, 0.5);
                scale_brightness(&smoothed, 1.1)
            }
            ReliefEnhancement::AggressiveContrast => {
                let contrasted = scale_contrast(image, 2.5);
                image::imageops::unsharpen(&contrasted, 1.0, 2)
            }
        }
    }
}

/// Push intensities away from the image mean by `factor`
fn scale_contrast(image: &GrayImage, factor: f64) -> GrayImage {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum as f64 / count as f64).round();

    map_colors(image, |p| {
        let v = mean + factor * (p.0[0] as f64 - mean);
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Multiply intensities by `factor`
fn scale_brightness(image: &GrayImage, factor: f64) -> GrayImage {
    map_colors(image, |p| {
        Luma([(p.0[0] as f64 * factor).round().clamp(0.0, 255.0) as u8])
    })
}

/// Builds height grids and activity masks from images
#[derive(Debug, Clone)]
pub struct HeightFieldBuilder {
    steps_per_mm: f64,
    mapper: ColorHeightMapper,
}

impl HeightFieldBuilder {
    /// Builder for a resolution in grid points per millimeter
    pub fn new(steps_per_mm: f64) -> Self {
        Self {
            steps_per_mm,
            mapper: ColorHeightMapper::new(),
        }
    }

    /// Resolution in grid points per millimeter
    pub fn steps_per_mm(&self) -> f64 {
        self.steps_per_mm
    }

    /// Read and decode an image file
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, ImageLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImageLoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        image::open(path).map_err(|e| ImageLoadError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn dimensions(&self, image: &DynamicImage, size: TargetSize) -> ParameterResult<(u32, u32)> {
        size.grid_dimensions(image.width(), image.height(), self.steps_per_mm)
    }

    /// Palette heights (0 to 6) per cell
    pub fn color_grid(&self, image: &DynamicImage, size: TargetSize) -> ParameterResult<HeightGrid> {
        let (cols, rows) = self.dimensions(image, size)?;
        let resized = image::imageops::resize(&image.to_rgb8(), cols, rows, FilterType::Lanczos3);

        let values = resized
            .rows()
            .flat_map(|row| row.map(|pixel| self.mapper.height_for(pixel.0) as f64))
            .collect();

        tracing::debug!("Built {}x{} colour height grid", rows, cols);
        HeightGrid::new(rows as usize, cols as usize, values, MAX_PALETTE_HEIGHT as f64)
    }

    /// Grayscale relief: intensity `v` maps to `(1 - v/255) * max_depth`
    pub fn grayscale_grid(
        &self,
        image: &DynamicImage,
        size: TargetSize,
        max_depth: f64,
        enhancement: ReliefEnhancement,
    ) -> ParameterResult<HeightGrid> {
        if !(max_depth.is_finite() && max_depth >= 0.0) {
            return Err(ParameterError::OutOfRange {
                name: "max_depth".to_string(),
                value: max_depth,
                min: 0.0,
                max: f64::MAX,
            });
        }

        let (cols, rows) = self.dimensions(image, size)?;
        let resized = image::imageops::resize(&image.to_luma8(), cols, rows, FilterType::Lanczos3);
        let enhanced = enhancement.apply(&resized);

        let values = enhanced
            .rows()
            .flat_map(|row| {
                row.map(|pixel| ((1.0 - pixel.0[0] as f64 / 255.0) * max_depth).clamp(0.0, max_depth))
            })
            .collect();

        tracing::debug!(
            "Built {}x{} relief grid ({:?}, max depth {})",
            rows,
            cols,
            enhancement,
            max_depth
        );
        HeightGrid::new(rows as usize, cols as usize, values, max_depth)
    }

    /// Cells strictly darker than `threshold` are active
    pub fn active_mask(
        &self,
        image: &DynamicImage,
        size: TargetSize,
        threshold: u8,
    ) -> ParameterResult<ActiveMask> {
        let (cols, rows) = self.dimensions(image, size)?;
        let resized = image::imageops::resize(&image.to_luma8(), cols, rows, FilterType::Lanczos3);

        let cells = resized
            .pixels()
            .map(|pixel| self.mapper.is_active(pixel.0[0], threshold))
            .collect();

        ActiveMask::new(rows as usize, cols as usize, cells)
    }
}
