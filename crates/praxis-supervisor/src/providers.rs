// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Collaborator Contracts
//!
//! Frame acquisition, detection, text parsing and input injection live outside
//! this crate. The loop sees them only through these traits, held as
//! `Arc<dyn ...>` so perception tasks can run them on worker threads.

use crate::error::PerceptionError;
use ahash::AHasher;
use praxis_humanization::Point2;
use praxis_runtime::Fingerprint;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

/// Frames are sampled at these fractions of width and height
const SAMPLE_POINTS: [(u32, u32); 3] = [(1, 4), (2, 4), (3, 4)];
/// Frames this small or smaller fingerprint on geometry alone
const MIN_SAMPLED_EDGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PixelFormat {
    Gray8 = 0,
    Rgb8 = 1,
    Bgr8 = 2,
    Rgba8 = 3,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// One captured frame, row-major and tightly packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Zero-filled frame of the given size
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self::new(width, height, format, vec![0; len])
    }

    pub fn empty() -> Self {
        Self::new(0, 0, PixelFormat::Bgr8, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Bytes of the pixel at (x, y), `None` when outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        self.data.get(offset..offset + bpp)
    }
}

impl Fingerprint for RawFrame {
    /// Geometry plus three pixels on the diagonal; an empty frame is 0
    fn fingerprint(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }

        let mut hasher = AHasher::default();
        self.width.hash(&mut hasher);
        self.height.hash(&mut hasher);
        (self.format as u8).hash(&mut hasher);

        if self.width > MIN_SAMPLED_EDGE && self.height > MIN_SAMPLED_EDGE {
            for (num, den) in SAMPLE_POINTS {
                let x = self.width * num / den;
                let y = self.height * num / den;
                self.pixel(x, y).hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

/// Axis-aligned screen rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Stone,
    Dirt,
    Wood,
    Leaves,
    CoalOre,
    IronOre,
    GoldOre,
    RedstoneOre,
    EmeraldOre,
    DiamondOre,
    Bedrock,
    Unknown,
}

impl BlockKind {
    pub const ALL: [BlockKind; 12] = [
        BlockKind::Stone,
        BlockKind::Dirt,
        BlockKind::Wood,
        BlockKind::Leaves,
        BlockKind::CoalOre,
        BlockKind::IronOre,
        BlockKind::GoldOre,
        BlockKind::RedstoneOre,
        BlockKind::EmeraldOre,
        BlockKind::DiamondOre,
        BlockKind::Bedrock,
        BlockKind::Unknown,
    ];

    /// Break time at 100% mining speed
    ///
    /// Every kind is finite so a targeted block always completes; bedrock is
    /// kept out of targeting by `avoid_bedrock`, not by its hardness.
    pub fn hardness(&self) -> Duration {
        let ms = match self {
            BlockKind::Leaves => 100,
            BlockKind::Dirt => 250,
            BlockKind::Stone | BlockKind::Unknown => 750,
            BlockKind::Wood => 1000,
            BlockKind::CoalOre
            | BlockKind::IronOre
            | BlockKind::GoldOre
            | BlockKind::RedstoneOre
            | BlockKind::EmeraldOre
            | BlockKind::DiamondOre => 1500,
            BlockKind::Bedrock => 2500,
        };
        Duration::from_millis(ms)
    }

    pub fn is_ore(&self) -> bool {
        matches!(
            self,
            BlockKind::CoalOre
                | BlockKind::IronOre
                | BlockKind::GoldOre
                | BlockKind::RedstoneOre
                | BlockKind::EmeraldOre
                | BlockKind::DiamondOre
        )
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, BlockKind::Wood | BlockKind::Leaves)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockObservation {
    pub kind: BlockKind,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerObservation {
    /// Name tag, when it could be read
    pub name: Option<String>,
    /// Estimated distance in blocks
    pub distance: f64,
    pub bounds: Rect,
}

/// Structured result of the detector
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Block(BlockObservation),
    Player(PlayerObservation),
}

/// One chat line read off the frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedMessage {
    pub sender: String,
    pub text: String,
    pub whisper: bool,
}

impl ParsedMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            whisper: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// Discrete command handed to the [`ActionSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCommand {
    MoveTo(Point2),
    Click(MouseButton),
    Type(String),
    KeyPress(char),
    Wait(Duration),
}

pub trait CaptureProvider: Send + Sync {
    fn capture(&self) -> Result<RawFrame, PerceptionError>;
}

/// Must be a pure function of the frame; results are memoized by fingerprint
pub trait DetectionProvider: Send + Sync {
    fn detect(&self, frame: &RawFrame) -> Result<Vec<Observation>, PerceptionError>;
}

pub trait TextObservationProvider: Send + Sync {
    fn parse(&self, frame: &RawFrame) -> Result<Vec<ParsedMessage>, PerceptionError>;
}

/// Fire-and-forget command consumer. `Wait` commands are expected to block.
pub trait ActionSink: Send + Sync {
    fn dispatch(&self, command: ActionCommand);
}

/// The four collaborators one loop is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub capture: Arc<dyn CaptureProvider>,
    pub detector: Arc<dyn DetectionProvider>,
    pub parser: Arc<dyn TextObservationProvider>,
    pub sink: Arc<dyn ActionSink>,
}

impl Collaborators {
    pub fn new(
        capture: Arc<dyn CaptureProvider>,
        detector: Arc<dyn DetectionProvider>,
        parser: Arc<dyn TextObservationProvider>,
        sink: Arc<dyn ActionSink>,
    ) -> Self {
        Self {
            capture,
            detector,
            parser,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RawFrame {
        let mut frame = RawFrame::blank(width, height, PixelFormat::Gray8);
        for (i, byte) in frame.data.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        frame
    }

    #[test]
    fn test_empty_frame_fingerprints_to_zero() {
        assert_eq!(RawFrame::empty().fingerprint(), 0);
        assert_eq!(RawFrame::new(4, 4, PixelFormat::Rgb8, Vec::new()).fingerprint(), 0);
    }

    #[test]
    fn test_identical_frames_share_fingerprint() {
        assert_eq!(gradient(64, 48).fingerprint(), gradient(64, 48).fingerprint());
    }

    #[test]
    fn test_sampled_pixel_changes_fingerprint() {
        let a = gradient(64, 48);
        let mut b = a.clone();
        // Centre sample at (32, 24)
        let offset = 24 * 64 + 32;
        b.data[offset] = b.data[offset].wrapping_add(1);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_unsampled_pixel_collides() {
        let a = gradient(64, 48);
        let mut b = a.clone();
        b.data[0] = b.data[0].wrapping_add(1);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_small_frame_uses_geometry_only() {
        let a = gradient(8, 8);
        let mut b = a.clone();
        b.data[36] = 200;
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), gradient(8, 9).fingerprint());
    }

    #[test]
    fn test_pixel_bounds() {
        let frame = RawFrame::blank(2, 2, PixelFormat::Rgba8);
        assert_eq!(frame.pixel(1, 1).map(|p| p.len()), Some(4));
        assert!(frame.pixel(2, 0).is_none());
    }

    #[test]
    fn test_block_kinds() {
        assert_eq!(BlockKind::Stone.hardness(), Duration::from_millis(750));
        assert!(BlockKind::ALL
            .iter()
            .all(|kind| BlockKind::Bedrock.hardness() >= kind.hardness()));
        assert!(BlockKind::GoldOre.is_ore());
        assert!(BlockKind::Leaves.is_tree());
        assert!(!BlockKind::Stone.is_ore());
    }

    #[test]
    fn test_rect_center() {
        assert_eq!(Rect::new(10, 20, 40, 30).center(), Point2::new(30.0, 35.0));
    }
}
