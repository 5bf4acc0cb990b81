use crate::common::BoundingBox;
use crate::pipeline::domain::{CycleResult, Identity};
use crate::pipeline::state::SessionSnapshot;
use image::{Rgba, RgbaImage};

const OUTLINE_THICKNESS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayRole {
    KnownFace,
    UnknownFace,
    RaisedHand,
    Hand,
    Object,
}

impl OverlayRole {
    pub fn color(&self) -> Rgba<u8> {
        match self {
            OverlayRole::KnownFace => Rgba([46, 204, 113, 255]),
            OverlayRole::UnknownFace => Rgba([231, 76, 60, 255]),
            OverlayRole::RaisedHand => Rgba([241, 196, 15, 255]),
            OverlayRole::Hand => Rgba([149, 165, 166, 255]),
            OverlayRole::Object => Rgba([52, 152, 219, 255]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub bbox: BoundingBox,
    pub caption: String,
    pub role: OverlayRole,
}

/// Drawable description of one cycle, in the pixel space of its frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayModel {
    pub width: u32,
    pub height: u32,
    pub items: Vec<OverlayItem>,
}

impl OverlayModel {
    pub fn from_result(result: &CycleResult) -> Self {
        let (width, height) = (result.frame_width, result.frame_height);
        let mut items = Vec::new();

        for face in &result.faces {
            let role = match face.identity.identity {
                Identity::Known(_) => OverlayRole::KnownFace,
                Identity::Unknown => OverlayRole::UnknownFace,
            };
            let caption = format!("{} ({:.2})", face.identity.identity, face.identity.distance);
            push_clamped(&mut items, face.bbox, caption, role, width, height);
        }

        for hand in &result.hands {
            let Some(bbox) = hand.bbox else { continue };
            let (caption, role) = if hand.raised {
                ("Hand raised".to_string(), OverlayRole::RaisedHand)
            } else {
                ("Hand".to_string(), OverlayRole::Hand)
            };
            push_clamped(&mut items, bbox, caption, role, width, height);
        }

        if let Some(object) = &result.object {
            if let Some(bbox) = object.bbox {
                let caption = format!("{} {:.0}%", object.label, object.probability * 100.0);
                push_clamped(&mut items, bbox, caption, OverlayRole::Object, width, height);
            }
        }

        Self {
            width,
            height,
            items,
        }
    }

    /// Overlay for the pass that produced `snapshot`, if any cycle has merged.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Option<Self> {
        snapshot
            .latest_result
            .as_deref()
            .map(OverlayModel::from_result)
    }

    /// Strokes every item's outline onto `canvas`, rescaling when the canvas
    /// is not the size of the source frame.
    pub fn draw_onto(&self, canvas: &mut RgbaImage) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let scale_x = canvas.width() as f32 / self.width as f32;
        let scale_y = canvas.height() as f32 / self.height as f32;

        for item in &self.items {
            let scaled = BoundingBox::new(
                item.bbox.x * scale_x,
                item.bbox.y * scale_y,
                item.bbox.width * scale_x,
                item.bbox.height * scale_y,
            );
            if let Some(bbox) = scaled.clamp_to(canvas.width(), canvas.height()) {
                stroke_rect(canvas, bbox, item.role.color());
            }
        }
    }
}

fn push_clamped(
    items: &mut Vec<OverlayItem>,
    bbox: BoundingBox,
    caption: String,
    role: OverlayRole,
    width: u32,
    height: u32,
) {
    if let Some(bbox) = bbox.clamp_to(width, height) {
        items.push(OverlayItem {
            bbox,
            caption,
            role,
        });
    }
}

fn stroke_rect(canvas: &mut RgbaImage, bbox: BoundingBox, color: Rgba<u8>) {
    let left = bbox.x.floor() as u32;
    let top = bbox.y.floor() as u32;
    let right = ((bbox.x + bbox.width).ceil() as u32).min(canvas.width()).saturating_sub(1);
    let bottom = ((bbox.y + bbox.height).ceil() as u32).min(canvas.height()).saturating_sub(1);

    for y in top..=bottom {
        for x in left..=right {
            let on_edge = x < left + OUTLINE_THICKNESS
                || x + OUTLINE_THICKNESS > right
                || y < top + OUTLINE_THICKNESS
                || y + OUTLINE_THICKNESS > bottom;
            if on_edge {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}
