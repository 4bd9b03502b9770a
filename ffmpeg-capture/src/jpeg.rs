use anyhow::Context;
use bytes::Bytes;
use jpeg_encoder::{ColorType, Encoder};

use crate::scaler::RgbImage;

/// Encode one RGB image as a baseline JPEG still. `quality` is clamped to 1-100.
pub fn encode_rgb(image: &RgbImage, quality: u8) -> anyhow::Result<Bytes> {
    let width = u16::try_from(image.width)
        .map_err(|_| anyhow::anyhow!("width {} too large for jpeg", image.width))?;
    let height = u16::try_from(image.height)
        .map_err(|_| anyhow::anyhow!("height {} too large for jpeg", image.height))?;

    let mut out = Vec::with_capacity(image.data.len() / 8);
    Encoder::new(&mut out, quality.clamp(1, 100))
        .encode(&image.data, width, height, ColorType::Rgb)
        .context("jpeg encode")?;
    Ok(Bytes::from(out))
}
