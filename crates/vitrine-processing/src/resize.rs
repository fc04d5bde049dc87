use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Bounding-box resize used by the transcoder
pub struct ImageResize;

impl ImageResize {
    /// Dimensions that fit `width`x`height` inside a `max_dimension` square,
    /// preserving aspect ratio. Images already inside the box are unchanged.
    pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
        let longest = width.max(height);
        if longest <= max_dimension || longest == 0 {
            return (width, height);
        }

        let scale = max_dimension as f64 / longest as f64;
        let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
        let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
        (new_width, new_height)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width.max(1) as f32;
        let height_ratio = orig_height as f32 / new_height.max(1) as f32;
        let max_ratio = width_ratio.max(height_ratio);

        // Heavy downscales hide the difference; keep the cheap filter there
        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Scale `img` down to fit `max_dimension`. Never upscales.
    pub fn fit(img: DynamicImage, max_dimension: u32) -> DynamicImage {
        let (width, height) = img.dimensions();
        let (new_width, new_height) = Self::fit_within(width, height, max_dimension);
        if (new_width, new_height) == (width, height) {
            return img;
        }

        let filter = Self::select_filter(width, height, new_width, new_height);
        tracing::debug!(
            from_width = width,
            from_height = height,
            to_width = new_width,
            to_height = new_height,
            filter = ?filter,
            "Resizing image"
        );
        img.resize_exact(new_width, new_height, filter)
    }
}
