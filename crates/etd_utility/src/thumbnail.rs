//! Thumbnail generation from one original image.
//!
//! # Responsibility
//! - Produce one PNG per requested size next to the original file.
//! - Keep scale and crop math in pure helpers.
//!
//! # Invariants
//! - Output files are named `<stem>_<suffix>.png`.
//! - Sizes are written `<height>x<width>`.
//! - Every output has exactly the requested dimensions: the source is scaled
//!   until it covers the target, then cropped around its center.
//! - Transparent areas are flattened onto white.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const OUTPUT_EXTENSION: &str = "png";
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

#[derive(Debug)]
pub enum ThumbnailError {
    Image(image::ImageError),
    InvalidSize(String),
    InvalidPath(PathBuf),
}

impl Display for ThumbnailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(err) => write!(f, "{err}"),
            Self::InvalidSize(value) => {
                write!(f, "invalid thumbnail size `{value}` (expected <height>x<width>)")
            }
            Self::InvalidPath(path) => {
                write!(f, "cannot derive thumbnail names from `{}`", path.display())
            }
        }
    }
}

impl Error for ThumbnailError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Image(err) => Some(err),
            Self::InvalidSize(_) | Self::InvalidPath(_) => None,
        }
    }
}

impl From<image::ImageError> for ThumbnailError {
    fn from(value: image::ImageError) -> Self {
        Self::Image(value)
    }
}

/// Post-processing applied to one thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ImageFilter {
    GaussianBlur { sigma: f32 },
    Grayscale,
    Brightness { value: i32 },
    Contrast { value: f32 },
    Negate,
}

impl ImageFilter {
    fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::GaussianBlur { sigma } => image.blur(sigma),
            Self::Grayscale => image.grayscale(),
            Self::Brightness { value } => image.brighten(value),
            Self::Contrast { value } => image.adjust_contrast(value),
            Self::Negate => {
                let mut image = image;
                image.invert();
                image
            }
        }
    }
}

/// One requested output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThumbnailSpec {
    /// `<height>x<width>`, e.g. `60x80`.
    pub size: String,
    #[serde(default)]
    pub filter: Option<ImageFilter>,
}

impl ThumbnailSpec {
    pub fn new(size: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: ImageFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> ThumbnailResult<(u32, u32)> {
        let invalid = || ThumbnailError::InvalidSize(self.size.clone());
        let (height, width) = self.size.split_once('x').ok_or_else(invalid)?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok((width, height))
    }
}

/// Smallest size keeping the aspect ratio that covers `target` entirely.
pub fn scale_outside(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (f64::from(source.0), f64::from(source.1));
    let (dst_w, dst_h) = (f64::from(target.0), f64::from(target.1));
    let ratio = (src_w / dst_w).min(src_h / dst_h);
    let scaled = |value: f64| -> u32 {
        let rounded = (value / ratio).round().max(1.0);
        if rounded >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            rounded as u32
        }
    };
    (scaled(src_w).max(target.0), scaled(src_h).max(target.1))
}

/// Top-left corner of a `target` sized window centered in `source`.
pub fn centered_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let offset = |outer: u32, inner: u32| -> u32 {
        let spare = f64::from(outer.saturating_sub(inner));
        (spare / 2.0).round() as u32
    };
    (offset(source.0, target.0), offset(source.1, target.1))
}

/// Writes resized variants of an image next to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates one PNG per `(suffix, spec)` and returns the written paths.
    pub fn generate_image_sizes(
        &self,
        original: &Path,
        specs: &[(String, ThumbnailSpec)],
    ) -> ThumbnailResult<Vec<PathBuf>> {
        let stem = original
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| ThumbnailError::InvalidPath(original.to_path_buf()))?;
        let directory = original.parent().unwrap_or_else(|| Path::new(""));

        let source = flatten_onto_background(&image::open(original)?);

        let mut written = Vec::with_capacity(specs.len());
        for (suffix, spec) in specs {
            let target = spec.dimensions()?;
            let thumbnail = render_thumbnail(&source, target, spec.filter);

            let path = directory.join(format!("{stem}_{suffix}.{OUTPUT_EXTENSION}"));
            thumbnail.save_with_format(&path, ImageFormat::Png)?;
            info!(
                "event=thumbnail_write module=thumbnail status=ok width={} height={} path={}",
                target.0,
                target.1,
                path.display()
            );
            written.push(path);
        }
        Ok(written)
    }
}

fn flatten_onto_background(image: &DynamicImage) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), BACKGROUND);
    imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas)
}

fn render_thumbnail(
    source: &DynamicImage,
    target: (u32, u32),
    filter: Option<ImageFilter>,
) -> DynamicImage {
    let (width, height) = scale_outside((source.width(), source.height()), target);
    let scaled = source.resize_exact(width, height, FilterType::Lanczos3);
    let (left, top) = centered_crop((width, height), target);
    let cropped = scaled.crop_imm(left, top, target.0, target.1);
    match filter {
        Some(filter) => filter.apply(cropped),
        None => cropped,
    }
}
