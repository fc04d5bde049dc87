use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Quality presets for image compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    #[default]
    Normal, // Default quality, balanced size and quality
    Better,   // Higher quality, ≈125% file size
    Best,     // Near pristine quality, ≈170% file size
    Lighter,  // Smaller files, ≈80% file size
    Lightest, // Maximum compression, ≈50% file size
}

impl QualityPreset {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(QualityPreset::Normal),
            "better" => Ok(QualityPreset::Better),
            "best" => Ok(QualityPreset::Best),
            "lighter" => Ok(QualityPreset::Lighter),
            "lightest" => Ok(QualityPreset::Lightest),
            _ => Err(anyhow!("Invalid quality preset: {}", s)),
        }
    }

    /// Get quality value for JPEG (0-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 75,
            QualityPreset::Better => 85,
            QualityPreset::Best => 95,
            QualityPreset::Lighter => 65,
            QualityPreset::Lightest => 50,
        }
    }

    /// Parse either a preset name or a plain 1-100 quality value.
    pub fn parse_quality(s: &str) -> Result<u8> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            if (1..=100).contains(&value) {
                return Ok(value);
            }
            return Err(anyhow!("Quality must be between 1 and 100, got {}", value));
        }
        Ok(Self::parse(trimmed)?.jpeg_quality())
    }
}

/// Encoding used for uploaded objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageOutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageOutputFormat::Jpeg),
            "png" => Ok(ImageOutputFormat::Png),
            _ => Err(anyhow!("Invalid format: {}", s)),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            ImageOutputFormat::Jpeg => "image/jpeg",
            ImageOutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageOutputFormat::Jpeg => "jpg",
            ImageOutputFormat::Png => "png",
        }
    }
}

/// Target of one transcode: the image is scaled down to fit a
/// `max_dimension` square box and encoded at `quality`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeTarget {
    pub max_dimension: u32,
    /// 1-100; ignored by lossless formats
    pub quality: u8,
    #[serde(default)]
    pub format: ImageOutputFormat,
}

impl TranscodeTarget {
    pub fn jpeg(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality,
            format: ImageOutputFormat::Jpeg,
        }
    }
}
