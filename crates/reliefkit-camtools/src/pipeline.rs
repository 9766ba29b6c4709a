//! Generation pipeline
//!
//! One pipeline per operation: load an image, derive a height grid or an
//! activity mask, and produce a [`MotionPlan`]. Stages that need the image
//! report [`CamToolError::NotReady`] until [`GenerationPipeline::load_image`]
//! has succeeded.

use crate::error::{CamToolError, CamToolResult};
use crate::height_field::{ActiveMask, HeightFieldBuilder, HeightGrid, ReliefEnhancement, TargetSize};
use crate::toolpath::{MotionPlan, ToolpathGenerator};
use image::DynamicImage;
use reliefkit_settings::GeneratorSettings;
use std::path::Path;

/// How heights are derived from the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationMode {
    /// Nearest palette colour, heights 0 to 6 mm, single pass
    Color,
    /// Dark is deep: `(1 - v/255) * max_depth`, single pass
    Grayscale {
        max_depth: f64,
        enhancement: ReliefEnhancement,
    },
    /// Thresholded mask cut down to `total_depth` in several passes
    Binary { total_depth: f64 },
}

impl GenerationMode {
    /// Grayscale mode using the configured relief depth
    pub fn grayscale_from(settings: &GeneratorSettings, enhancement: ReliefEnhancement) -> Self {
        GenerationMode::Grayscale {
            max_depth: settings.relief_depth,
            enhancement,
        }
    }

    /// Binary mode using the configured total depth
    pub fn binary_from(settings: &GeneratorSettings) -> Self {
        GenerationMode::Binary {
            total_depth: settings.total_depth,
        }
    }
}

/// Per-operation generation state
pub struct GenerationPipeline<'a> {
    settings: &'a GeneratorSettings,
    builder: HeightFieldBuilder,
    size: TargetSize,
    image: Option<DynamicImage>,
}

impl<'a> GenerationPipeline<'a> {
    /// Pipeline borrowing the generator settings
    pub fn new(settings: &'a GeneratorSettings) -> Self {
        Self {
            settings,
            builder: HeightFieldBuilder::new(settings.steps_per_mm),
            size: TargetSize::default(),
            image: None,
        }
    }

    /// Set the physical output size
    pub fn with_size(mut self, size: TargetSize) -> Self {
        self.size = size;
        self
    }

    /// Load and decode the source image
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> CamToolResult<()> {
        let path = path.as_ref();
        let image = HeightFieldBuilder::load_image(path).map_err(|e| {
            tracing::error!("{}", e);
            CamToolError::from(e)
        })?;
        tracing::info!(
            "Loaded image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.image = Some(image);
        Ok(())
    }

    /// Use an already decoded image
    pub fn set_image(&mut self, image: DynamicImage) {
        self.image = Some(image);
    }

    pub fn is_ready(&self) -> bool {
        self.image.is_some()
    }

    fn image(&self) -> CamToolResult<&DynamicImage> {
        self.image
            .as_ref()
            .ok_or_else(|| CamToolError::NotReady("no image loaded".to_string()))
    }

    /// Height grid for a continuous mode
    pub fn height_grid(&self, mode: GenerationMode) -> CamToolResult<HeightGrid> {
        let image = self.image()?;
        let grid = match mode {
            GenerationMode::Color => self.builder.color_grid(image, self.size)?,
            GenerationMode::Grayscale {
                max_depth,
                enhancement,
            } => self
                .builder
                .grayscale_grid(image, self.size, max_depth, enhancement)?,
            GenerationMode::Binary { .. } => {
                return Err(CamToolError::InvalidParameters(
                    "binary mode produces an activity mask, not a height grid".to_string(),
                ))
            }
        };
        Ok(grid)
    }

    /// Activity mask at the configured threshold
    pub fn active_mask(&self) -> CamToolResult<ActiveMask> {
        let image = self.image()?;
        Ok(self
            .builder
            .active_mask(image, self.size, self.settings.threshold)?)
    }

    /// Full plan for `mode`
    pub fn generate(&self, mode: GenerationMode) -> CamToolResult<MotionPlan> {
        self.generate_with_progress(mode, |_| {})
    }

    /// Full plan for `mode` with progress callback (0.0 to 1.0)
    pub fn generate_with_progress<F>(&self, mode: GenerationMode, progress: F) -> CamToolResult<MotionPlan>
    where
        F: FnMut(f32),
    {
        let generator = ToolpathGenerator::from_settings(self.settings)?;

        match mode {
            GenerationMode::Binary { total_depth } => {
                let mask = self.active_mask()?;
                generator.multi_pass_with_progress(&mask, total_depth, progress)
            }
            _ => {
                let grid = self.height_grid(mode)?;
                Ok(generator.single_pass_with_progress(&grid, progress))
            }
        }
    }
}

/// Load `path` and generate a plan in one call.
///
/// Any failure of the image stage comes back as a generation failure and
/// no plan is produced.
pub fn generate_from_file<P: AsRef<Path>>(
    path: P,
    settings: &GeneratorSettings,
    mode: GenerationMode,
    size: TargetSize,
) -> CamToolResult<MotionPlan> {
    let mut pipeline = GenerationPipeline::new(settings).with_size(size);
    pipeline.load_image(path)?;
    pipeline.generate(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_stages_not_ready_without_image() {
        let settings = GeneratorSettings::default();
        let pipeline = GenerationPipeline::new(&settings);
        assert!(!pipeline.is_ready());
        assert!(matches!(
            pipeline.height_grid(GenerationMode::Color),
            Err(CamToolError::NotReady(_))
        ));
        assert!(matches!(pipeline.active_mask(), Err(CamToolError::NotReady(_))));
        assert!(matches!(
            pipeline.generate(GenerationMode::Color),
            Err(CamToolError::NotReady(_))
        ));
    }

    #[test]
    fn test_binary_mode_has_no_height_grid() {
        let settings = GeneratorSettings::default();
        let mut pipeline = GenerationPipeline::new(&settings);
        pipeline.set_image(DynamicImage::ImageRgb8(RgbImage::new(2, 2)));
        assert!(matches!(
            pipeline.height_grid(GenerationMode::binary_from(&settings)),
            Err(CamToolError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_color_generation_from_memory() {
        let settings = GeneratorSettings::default();
        let mut pipeline = GenerationPipeline::new(&settings);
        pipeline.set_image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            3,
            2,
            Rgb([0, 0, 0]),
        )));

        let plan = pipeline.generate(GenerationMode::Color).unwrap();
        assert_eq!(plan.passes(), 1);
        assert_eq!(plan.cut_count(), 6);
        assert!(plan.to_lines().iter().any(|l| l == "G1 X0.000 Y0.000 Z-6.000 F1500"));
    }

    #[test]
    fn test_missing_file_is_generation_failure() {
        let settings = GeneratorSettings::default();
        let result = generate_from_file(
            "/no/such/image.png",
            &settings,
            GenerationMode::Color,
            TargetSize::default(),
        );
        match result {
            Err(e) => assert!(e.is_generation_failure()),
            Ok(_) => panic!("expected a generation failure"),
        }
    }
}
