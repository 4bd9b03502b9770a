use std::time::{Duration, Instant};

use anyhow::Context;
use bytes::Bytes;
use jpeg_encoder::{ColorType, Encoder};

use crate::relay::{FrameSource, Pull};

const WIDTH: u16 = 320;
const HEIGHT: u16 = 240;

/// Moving colour gradient encoded as JPEG, paced at a fixed frame rate.
pub struct PatternSource {
    quality: u8,
    interval: Option<Duration>,
    limit: Option<u64>,
    produced: u64,
    next_due: Option<Instant>,
    rgb: Vec<u8>,
}

impl PatternSource {
    /// `fps == 0` disables pacing.
    pub fn new(quality: u8, fps: u32, limit: Option<u64>) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            interval: (fps > 0).then(|| Duration::from_secs(1) / fps),
            limit,
            produced: 0,
            next_due: None,
            rgb: vec![0; WIDTH as usize * HEIGHT as usize * 3],
        }
    }

    fn paint(&mut self) {
        let t = self.produced as usize;
        for (i, px) in self.rgb.chunks_exact_mut(3).enumerate() {
            let x = i % WIDTH as usize;
            let y = i / WIDTH as usize;
            px[0] = ((x + t * 4) % 256) as u8;
            px[1] = ((y + t * 2) % 256) as u8;
            px[2] = ((x + y + t) % 256) as u8;
        }
    }

    fn wait_turn(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        let due = *self.next_due.get_or_insert(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        self.next_due = Some(due.max(now) + interval);
    }
}

impl FrameSource for PatternSource {
    fn pull(&mut self) -> anyhow::Result<Pull> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(Pull::End);
        }
        self.wait_turn();
        self.paint();

        let mut jpeg = Vec::new();
        Encoder::new(&mut jpeg, self.quality)
            .encode(&self.rgb, WIDTH, HEIGHT, ColorType::Rgb)
            .context("jpeg encode failed")?;
        self.produced += 1;
        Ok(Pull::Frame(Bytes::from(jpeg)))
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod pattern_test;
