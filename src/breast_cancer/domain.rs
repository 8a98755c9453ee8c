//! Ultrasound classes, image decoding and tensor preparation.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::common::error::ValidationError;
use crate::inference::domain::RiskTier;
use crate::model::ImageTensor;

/// Side length the classifier was trained on.
pub const INPUT_SIZE: u32 = 224;

/// Output classes in the order the model reports them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UltrasoundClass {
    Benign,
    Malignant,
    Normal,
}

impl UltrasoundClass {
    pub const ALL: [UltrasoundClass; 3] = [
        UltrasoundClass::Benign,
        UltrasoundClass::Malignant,
        UltrasoundClass::Normal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UltrasoundClass::Benign => "benign",
            UltrasoundClass::Malignant => "malignant",
            UltrasoundClass::Normal => "normal",
        }
    }

    pub fn risk_tier(&self) -> RiskTier {
        match self {
            UltrasoundClass::Malignant => RiskTier::High,
            UltrasoundClass::Benign => RiskTier::Borderline,
            UltrasoundClass::Normal => RiskTier::Low,
        }
    }

    pub fn diagnosis(&self) -> &'static str {
        match self {
            UltrasoundClass::Malignant => {
                "Potential Malignancy Detected. Please consult a specialist immediately."
            }
            UltrasoundClass::Benign => {
                "Benign Findings. Likely non-cancerous, but regular screening is advised."
            }
            UltrasoundClass::Normal => "Normal Ultrasound. No suspicious findings detected.",
        }
    }
}

/// Decode any supported format into 8-bit RGB.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyPayload);
    }
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| ValidationError::UndecodableImage(e.to_string()))
}

/// Bicubic resize to the model's input size, then scale to a batch of one.
pub fn to_tensor(img: &RgbImage) -> ImageTensor {
    let resized = imageops::resize(img, INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);
    ImageTensor::from_rgb(&resized)
}
