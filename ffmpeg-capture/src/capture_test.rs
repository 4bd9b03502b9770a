use ffmpeg_next::{format::Pixel, frame};

use crate::{CaptureInput, RgbImage, Scaler, encode_rgb};

fn grey_yuv420p(width: u32, height: u32) -> frame::Video {
    let mut picture = frame::Video::new(Pixel::YUV420P, width, height);
    picture.data_mut(0).fill(128);
    picture.data_mut(1).fill(128);
    picture.data_mut(2).fill(128);
    picture
}

#[test]
fn test_scaler_packs_rgb_rows() {
    let mut scaler = Scaler::new();
    let rgb = scaler.to_rgb(&grey_yuv420p(66, 48)).unwrap();

    assert_eq!((rgb.width, rgb.height), (66, 48));
    assert_eq!(rgb.data.len(), 66 * 48 * 3, "no stride padding");
    assert!(rgb.data.iter().all(|&c| (110..=150).contains(&c)));
}

#[test]
fn test_scaler_follows_size_change() {
    let mut scaler = Scaler::new();
    scaler.to_rgb(&grey_yuv420p(64, 48)).unwrap();
    let rgb = scaler.to_rgb(&grey_yuv420p(32, 16)).unwrap();
    assert_eq!(rgb.data.len(), 32 * 16 * 3);
}

#[test]
fn test_scaler_rejects_empty_picture() {
    let mut scaler = Scaler::new();
    assert!(scaler.to_rgb(&frame::Video::empty()).is_err());
}

#[test]
fn test_encode_rgb_produces_jpeg() {
    let image = RgbImage {
        width: 16,
        height: 8,
        data: vec![200; 16 * 8 * 3],
    };
    let jpeg = encode_rgb(&image, 85).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
}

#[test]
fn test_encode_rgb_rejects_oversized() {
    let image = RgbImage {
        width: 70_000,
        height: 1,
        data: Vec::new(),
    };
    assert!(encode_rgb(&image, 85).is_err());
}

#[test]
fn test_rtp_input_display() {
    assert_eq!(
        CaptureInput::Rtp { port: 4000 }.to_string(),
        "rtp://0.0.0.0:4000"
    );
}
