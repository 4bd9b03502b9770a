use ffmpeg_next::{
    format::Pixel,
    frame,
    software::scaling::{Context, Flags},
};

/// Tightly packed RGB24 pixels.
#[derive(Clone, Debug)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Converts decoded pictures to RGB24. The conversion context is rebuilt
/// whenever the input format or size changes.
pub struct Scaler {
    context: Option<(Context, Pixel, u32, u32)>,
    rgb: frame::Video,
}

impl Scaler {
    pub fn new() -> Self {
        Self {
            context: None,
            rgb: frame::Video::empty(),
        }
    }

    pub fn to_rgb(&mut self, picture: &frame::Video) -> anyhow::Result<RgbImage> {
        let (format, width, height) = (picture.format(), picture.width(), picture.height());
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("picture without dimensions"));
        }

        let stale = !matches!(&self.context, Some((_, f, w, h)) if (*f, *w, *h) == (format, width, height));
        if stale {
            let context = Context::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                Flags::BILINEAR,
            )?;
            log::debug!("scaler rebuilt for {:?} {}x{}", format, width, height);
            self.context = Some((context, format, width, height));
            self.rgb = frame::Video::empty();
        }
        let Some((context, ..)) = self.context.as_mut() else {
            return Err(anyhow::anyhow!("scaler context missing"));
        };
        context.run(picture, &mut self.rgb)?;

        let row = width as usize * 3;
        let stride = self.rgb.stride(0);
        let plane = self.rgb.data(0);
        let mut data = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            data.extend_from_slice(&plane[y * stride..y * stride + row]);
        }
        Ok(RgbImage {
            width,
            height,
            data,
        })
    }
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for Scaler {}
