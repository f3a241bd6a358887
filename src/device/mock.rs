//! In-memory device channel for tests and dry runs.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DeviceChannel, DeviceError, DeviceResult};

/// Width and height of a font8x8 glyph
const GLYPH_SIZE: u32 = 8;

/// A canvas for building device screens in tests and dry runs.
///
/// Wraps an `RgbImage`; only the drawing helpers the image crate lacks live here.
#[derive(Debug, Clone)]
pub struct MockScreen {
    image: RgbImage,
}

impl MockScreen {
    /// Black screen of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Draw a filled rectangle, clipped to the screen
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        let right = x.saturating_add(w).min(self.width());
        let bottom = y.saturating_add(h).min(self.height());
        for py in y..bottom {
            for px in x..right {
                self.image.put_pixel(px, py, Rgb(color));
            }
        }
    }

    /// Draw text using 8x8 glyphs, clipped to the screen. Text does not wrap.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width() {
                break;
            }
            self.draw_char(cursor_x, y, ch, fg, bg);
            cursor_x = cursor_x.saturating_add(GLYPH_SIZE);
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row, bits) in (0..GLYPH_SIZE).zip(glyph) {
            let Some(py) = y.checked_add(row).filter(|py| *py < self.height()) else {
                break;
            };
            for bit in 0..GLYPH_SIZE {
                let Some(px) = x.checked_add(bit).filter(|px| *px < self.width()) else {
                    break;
                };
                // font8x8 stores LSB as leftmost pixel
                let color = if (bits >> bit) & 1 == 1 { fg } else { bg };
                self.image.put_pixel(px, py, Rgb(color));
            }
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Copy of the current screen contents
    pub fn to_image(&self) -> RgbImage {
        self.image.clone()
    }
}

/// An action the mock device received, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceAction {
    Install(PathBuf),
    StartActivity(String),
    Touch(i32, i32),
    Sleep(Duration),
    Capture,
}

/// Where a `MockDevice` should simulate a connection failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Install,
    /// Fail the Nth capture (1-based)
    Capture(usize),
}

/// Device channel that serves canned screens and records every action
#[derive(Debug, Clone)]
pub struct MockDevice {
    /// Screen returned when no queued frame is left
    screen: MockScreen,
    /// Frames returned by successive captures
    frames: VecDeque<RgbImage>,
    /// Actions received so far
    actions: Vec<DeviceAction>,
    fail_at: Option<FailPoint>,
    captures: usize,
}

impl MockDevice {
    /// Create a device whose screen is a blank canvas of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_screen(MockScreen::new(width, height))
    }

    pub fn with_screen(screen: MockScreen) -> Self {
        Self {
            screen,
            frames: VecDeque::new(),
            actions: Vec::new(),
            fail_at: None,
            captures: 0,
        }
    }

    /// Queue a frame to be returned by the next unserved capture
    pub fn push_frame(&mut self, frame: RgbImage) {
        self.frames.push_back(frame);
    }

    /// Simulate a connection-class failure at the given point
    pub fn fail_at(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    /// All actions received, in order
    pub fn actions(&self) -> &[DeviceAction] {
        &self.actions
    }
}

impl DeviceChannel for MockDevice {
    fn install(&mut self, apk_path: &Path) -> DeviceResult<()> {
        self.actions.push(DeviceAction::Install(apk_path.to_path_buf()));
        if self.fail_at == Some(FailPoint::Install) {
            return Err(DeviceError::Install {
                path: apk_path.to_path_buf(),
                reason: "simulated install failure".to_string(),
            });
        }
        Ok(())
    }

    fn start_activity(&mut self, component: &str) -> DeviceResult<()> {
        self.actions
            .push(DeviceAction::StartActivity(component.to_string()));
        Ok(())
    }

    fn touch(&mut self, x: i32, y: i32) -> DeviceResult<()> {
        self.actions.push(DeviceAction::Touch(x, y));
        Ok(())
    }

    fn sleep(&mut self, delay: Duration) {
        self.actions.push(DeviceAction::Sleep(delay));
    }

    fn capture_screen(&mut self) -> DeviceResult<RgbImage> {
        self.actions.push(DeviceAction::Capture);
        self.captures += 1;
        if self.fail_at == Some(FailPoint::Capture(self.captures)) {
            return Err(DeviceError::Unreachable("simulated connection drop".to_string()));
        }
        Ok(self
            .frames
            .pop_front()
            .unwrap_or_else(|| self.screen.to_image()))
    }

    fn source_type(&self) -> &str {
        "mock"
    }
}
