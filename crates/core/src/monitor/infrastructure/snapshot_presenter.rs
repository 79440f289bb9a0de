use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};

use crate::monitor::frame_report::{FrameReport, RegionReport};
use crate::monitor::presenter::Presenter;
use crate::shared::frame::Frame;
use crate::shared::region::Rect;

const REGION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ITEM_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LOW_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TALLY_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

const REGION_THICKNESS: u32 = 2;
const ITEM_THICKNESS: u32 = 2;
const LOW_THICKNESS: u32 = 4;

// Tally pips: PIP_SIZE squares every PIP_PITCH pixels, PIP_MARGIN in from
// the region's top-left corner.
const PIP_SIZE: u32 = 5;
const PIP_PITCH: u32 = 8;
const PIP_MARGIN: u32 = 6;

const LABEL_SCALE: f32 = 16.0;
const LABEL_GAP: i32 = 2;

/// Writes annotated PNG snapshots of every `every`-th frame.
///
/// Regions are outlined in green (red and thicker when low) with one yellow
/// pip per counted item along the top edge; each counted item gets a red
/// box. With a font loaded, each region is also labelled `"<name>: <count>"`
/// above and `"LOW!"` below when low.
pub struct SnapshotPresenter {
    dir: PathBuf,
    every: usize,
    written: usize,
    font: Option<FontVec>,
}

impl SnapshotPresenter {
    pub fn new(dir: impl Into<PathBuf>, every: usize) -> Self {
        Self {
            dir: dir.into(),
            every: every.max(1),
            written: 0,
            font: None,
        }
    }

    /// Loads a TrueType/OpenType font used for region labels.
    pub fn with_font_file(mut self, path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read font {}: {e}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("Invalid font {}: {e}", path.display()))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn snapshot_path(&self, frame_index: usize) -> PathBuf {
        self.dir.join(format!("frame_{frame_index:06}.png"))
    }
}

fn draw_outline(img: &mut RgbImage, rect: &Rect, thickness: u32, color: Rgb<u8>) {
    for t in 0..thickness {
        let (w, h) = (
            rect.width.saturating_sub(2 * t),
            rect.height.saturating_sub(2 * t),
        );
        if w == 0 || h == 0 {
            break;
        }
        let inset = imageproc::rect::Rect::at((rect.x + t) as i32, (rect.y + t) as i32).of_size(w, h);
        imageproc::drawing::draw_hollow_rect_mut(img, inset, color);
    }
}

/// How many tally pips fit in one row of a region this wide.
fn tally_capacity(width: u32) -> usize {
    let usable = width.saturating_sub(2 * PIP_MARGIN);
    if usable < PIP_SIZE {
        return 0;
    }
    ((usable - PIP_SIZE) / PIP_PITCH + 1) as usize
}

fn draw_tally(img: &mut RgbImage, rect: &Rect, count: usize) {
    if rect.height < PIP_MARGIN + PIP_SIZE {
        return;
    }
    for i in 0..count.min(tally_capacity(rect.width)) as u32 {
        let pip = imageproc::rect::Rect::at(
            (rect.x + PIP_MARGIN + i * PIP_PITCH) as i32,
            (rect.y + PIP_MARGIN) as i32,
        )
        .of_size(PIP_SIZE, PIP_SIZE);
        imageproc::drawing::draw_filled_rect_mut(img, pip, TALLY_COLOR);
    }
}

/// Top-left corner of the count label: above the region, pushed inside the
/// image when the region touches the top edge.
fn label_above(rect: &Rect, text_height: u32) -> (i32, i32) {
    let y = rect.y as i32 - text_height as i32 - LABEL_GAP;
    (rect.x as i32, y.max(0))
}

fn label_below(rect: &Rect) -> (i32, i32) {
    (rect.x as i32, (rect.y + rect.height) as i32 + LABEL_GAP)
}

fn draw_labels(img: &mut RgbImage, region: &RegionReport, font: &FontVec) {
    let scale = PxScale::from(LABEL_SCALE);
    let text = format!("{}: {}", region.name, region.count);
    let (_, text_height) = imageproc::drawing::text_size(scale, font, &text);
    let (x, y) = label_above(&region.rect, text_height);
    imageproc::drawing::draw_text_mut(img, REGION_COLOR, x, y, scale, font, &text);

    if region.low {
        let (x, y) = label_below(&region.rect);
        imageproc::drawing::draw_text_mut(img, LOW_COLOR, x, y, scale, font, "LOW!");
    }
}

/// Draws the report onto a copy of the frame.
pub fn annotate(
    frame: &Frame,
    report: &FrameReport,
    font: Option<&FontVec>,
) -> Result<RgbImage, Box<dyn std::error::Error>> {
    let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("Failed to create image from frame data")?;

    for region in &report.regions {
        if region.low {
            draw_outline(&mut img, &region.rect, LOW_THICKNESS, LOW_COLOR);
        } else {
            draw_outline(&mut img, &region.rect, REGION_THICKNESS, REGION_COLOR);
        }
        draw_tally(&mut img, &region.rect, region.count);
        for item in region.frame_boxes() {
            draw_outline(&mut img, &item, ITEM_THICKNESS, ITEM_COLOR);
        }
        if let Some(font) = font {
            draw_labels(&mut img, region, font);
        }
    }
    Ok(img)
}

impl Presenter for SnapshotPresenter {
    fn present(
        &mut self,
        frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if report.frame_index % self.every != 0 {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.snapshot_path(report.frame_index);
        annotate(frame, report, self.font.as_ref())?.save(&path)?;
        self.written += 1;
        log::debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}
