use crate::resize::ImageResize;
use crate::validator::{decode_check, sniff_format, ImageInfo};
use crate::TranscodeError;
use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use vitrine_core::{ImageOutputFormat, TranscodeTarget};

/// Resizes and re-encodes raw image buffers.
///
/// Implementations must be pure: the same input and target always yield an
/// equivalent output, and nothing outside the call is touched.
#[async_trait]
pub trait Transcode: Send + Sync {
    /// Scale `data` to fit `target` and encode it in the target format.
    async fn transcode(&self, data: Bytes, target: TranscodeTarget)
        -> Result<Bytes, TranscodeError>;

    /// Decode `data` fully without re-encoding it.
    async fn inspect(&self, data: Bytes) -> Result<ImageInfo, TranscodeError>;
}

/// `image`-crate backed transcoder
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTranscoder;

impl ImageTranscoder {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous transcode. Call from a blocking context.
    pub fn transcode_blocking(
        data: &[u8],
        target: &TranscodeTarget,
    ) -> Result<Bytes, TranscodeError> {
        if target.max_dimension == 0 {
            return Err(TranscodeError::InvalidTarget(
                "max_dimension must be greater than 0".to_string(),
            ));
        }
        if !(1..=100).contains(&target.quality) {
            return Err(TranscodeError::InvalidTarget(format!(
                "quality must be between 1 and 100, got {}",
                target.quality
            )));
        }

        let format = sniff_format(data)?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        let img = ImageResize::fit(img, target.max_dimension);
        Self::encode(&img, target)
    }

    fn encode(img: &DynamicImage, target: &TranscodeTarget) -> Result<Bytes, TranscodeError> {
        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity(width as usize * height as usize * 3 / 4);

        match target.format {
            ImageOutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = img.to_rgb8();
                let mut encoder = JpegEncoder::new_with_quality(&mut buffer, target.quality);
                encoder
                    .encode_image(&rgb)
                    .map_err(|e| TranscodeError::Encode(e.to_string()))?;
            }
            ImageOutputFormat::Png => {
                img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                    .map_err(|e| TranscodeError::Encode(e.to_string()))?;
            }
        }

        Ok(Bytes::from(buffer))
    }
}

#[async_trait]
impl Transcode for ImageTranscoder {
    async fn transcode(
        &self,
        data: Bytes,
        target: TranscodeTarget,
    ) -> Result<Bytes, TranscodeError> {
        let start = std::time::Instant::now();
        let input_size = data.len();

        let output =
            tokio::task::spawn_blocking(move || Self::transcode_blocking(&data, &target)).await??;

        tracing::debug!(
            input_bytes = input_size,
            output_bytes = output.len(),
            max_dimension = target.max_dimension,
            quality = target.quality,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image transcoded"
        );

        Ok(output)
    }

    async fn inspect(&self, data: Bytes) -> Result<ImageInfo, TranscodeError> {
        let info = tokio::task::spawn_blocking(move || decode_check(&data)).await??;
        Ok(info)
    }
}
