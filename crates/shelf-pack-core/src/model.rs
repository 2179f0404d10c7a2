use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bin: either a number or a string.
///
/// Serialized untagged, so `7` and `"icon"` both round-trip as plain JSON values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinId {
    Num(u32),
    Name(String),
}

impl BinId {
    /// Numeric value, if this is a numeric id.
    pub fn as_num(&self) -> Option<u32> {
        match self {
            BinId::Num(n) => Some(*n),
            BinId::Name(_) => None,
        }
    }
}

impl fmt::Display for BinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinId::Num(n) => write!(f, "{n}"),
            BinId::Name(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<u32> for BinId {
    fn from(n: u32) -> Self {
        BinId::Num(n)
    }
}

impl From<&str> for BinId {
    fn from(s: &str) -> Self {
        BinId::Name(s.to_string())
    }
}

impl From<String> for BinId {
    fn from(s: String) -> Self {
        BinId::Name(s)
    }
}

/// A placed rectangle (pixels). `x,y` is top-left; `w,h` is the current size.
///
/// `maxw`/`maxh` describe the capacity of the physical slot, which can be larger
/// than the current size after the slot was recycled from the free-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    pub id: BinId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub maxw: u32,
    pub maxh: u32,
    pub refcount: u32,
}

impl Bin {
    pub(crate) fn new(id: BinId, x: u32, y: u32, w: u32, h: u32, maxw: u32, maxh: u32) -> Self {
        Self {
            id,
            x,
            y,
            w,
            h,
            maxw,
            maxh,
            refcount: 0,
        }
    }

    /// Area currently in use (`w * h`).
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }

    /// True if the two bins' current rectangles intersect.
    pub fn overlaps(&self, other: &Bin) -> bool {
        let ax2 = self.x + self.w;
        let ay2 = self.y + self.h;
        let bx2 = other.x + other.w;
        let by2 = other.y + other.h;
        !(self.x >= bx2 || other.x >= ax2 || self.y >= by2 || other.y >= ay2)
    }
}

/// One rectangle request for batch packing.
///
/// Accepts either `w`/`h` or `width`/`height` on input; both normalize to `w`/`h`.
/// `x`/`y` are filled in by `ShelfPack::pack` when `in_place` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BinId>,
    #[serde(alias = "width")]
    pub w: u32,
    #[serde(alias = "height")]
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
}

impl BinRequest {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            ..Default::default()
        }
    }

    pub fn with_id(id: impl Into<BinId>, w: u32, h: u32) -> Self {
        Self {
            id: Some(id.into()),
            w,
            h,
            ..Default::default()
        }
    }
}

/// Snapshot of how well the canvas is used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Canvas width and height.
    pub width: u32,
    pub height: u32,
    /// Number of shelves carved so far.
    pub num_shelves: usize,
    /// Number of live bins (refcount >= 1).
    pub num_bins: usize,
    /// Number of vacated slots waiting for reuse.
    pub num_free: usize,
    /// `width * height`.
    pub canvas_area: u64,
    /// Sum of `w * h` over live bins.
    pub used_area: u64,
    /// used_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvas: {}x{}, Shelves: {}, Bins: {}, Free: {}, Occupancy: {:.2}%, Used Area: {} px²",
            self.width,
            self.height,
            self.num_shelves,
            self.num_bins,
            self.num_free,
            self.occupancy * 100.0,
            self.used_area,
        )
    }

    /// Returns unused canvas area in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }
}
