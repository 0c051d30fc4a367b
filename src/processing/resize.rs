//! Bounding-box resize arithmetic

use image::DynamicImage;
use tracing::debug;

/// Maximum output dimensions; an absent side is unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl Bounds {
    pub fn new(max_width: Option<u32>, max_height: Option<u32>) -> Self {
        Self { max_width, max_height }
    }
}

/// Available resize filters
#[derive(Debug, Clone, Copy, Default)]
pub enum FilterType {
    /// Triangle (linear interpolation)
    Triangle,
    /// Lanczos with radius 3 (high quality, recommended)
    #[default]
    Lanczos3,
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Fit `width`x`height` inside the bounds, preserving aspect ratio
///
/// Never enlarges: an image already inside the box keeps its dimensions.
pub fn fit_within(width: u32, height: u32, bounds: Bounds) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let scale_w = bounds
        .max_width
        .map(|max| max as f64 / width as f64)
        .unwrap_or(f64::INFINITY);
    let scale_h = bounds
        .max_height
        .map(|max| max as f64 / height as f64)
        .unwrap_or(f64::INFINITY);

    let scale = scale_w.min(scale_h);
    if scale >= 1.0 {
        return (width, height);
    }

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, height);

    // Rounding may overshoot a bound by one pixel on the constrained side
    let new_width = bounds.max_width.map_or(new_width, |max| new_width.min(max.max(1)));
    let new_height = bounds.max_height.map_or(new_height, |max| new_height.min(max.max(1)));

    (new_width, new_height)
}

/// Downscale an image to fit the bounds; returns the input untouched otherwise
pub fn resize_within(image: DynamicImage, bounds: Bounds, filter: FilterType) -> DynamicImage {
    let (target_width, target_height) = fit_within(image.width(), image.height(), bounds);

    if target_width == image.width() && target_height == image.height() {
        debug!("No resize needed for {}x{}", image.width(), image.height());
        return image;
    }

    debug!(
        "Resizing {}x{} -> {}x{} using {:?}",
        image.width(),
        image.height(),
        target_width,
        target_height,
        filter
    );

    image.resize_exact(target_width, target_height, filter.into())
}
