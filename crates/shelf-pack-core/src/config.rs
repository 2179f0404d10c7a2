use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Packer-wide options fixed at construction time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackerOptions {
    /// Grow the canvas on demand when a request does not fit.
    /// Batch packing shrinks the canvas back to its footprint afterwards.
    #[serde(default)]
    pub auto_resize: bool,
}

impl PackerOptions {
    /// Create a fluent builder for `PackerOptions`.
    pub fn builder() -> PackerOptionsBuilder {
        PackerOptionsBuilder::new()
    }
}

/// Builder for `PackerOptions`.
#[derive(Debug, Default, Clone)]
pub struct PackerOptionsBuilder {
    opts: PackerOptions,
}

impl PackerOptionsBuilder {
    pub fn new() -> Self {
        Self {
            opts: PackerOptions::default(),
        }
    }
    pub fn auto_resize(mut self, v: bool) -> Self {
        self.opts.auto_resize = v;
        self
    }
    pub fn build(self) -> PackerOptions {
        self.opts
    }
}

/// Options for `ShelfPack::pack`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchOptions {
    /// Write `x`, `y` and the assigned id back onto each accepted request.
    #[serde(default)]
    pub in_place: bool,
}

/// Request ordering applied before batch packing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Tallest first, ties broken by id. Packs denser shelves.
    #[default]
    HeightDesc,
    /// Keep input order.
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "height_desc" => Ok(Self::HeightDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Options for sprite layout generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Device pixel ratio the item sizes were rendered at. Must be >= 1.
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: u32,
    /// Item ordering before packing.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Largest allowed side in pixels. Oversized items fail the layout unless
    /// `remove_oversized` is set.
    #[serde(default)]
    pub max_item_size: Option<u32>,
    /// Drop oversized items instead of failing.
    #[serde(default)]
    pub remove_oversized: bool,
    /// Carry `content`/`stretchX`/`stretchY`/`placeholder` through to the layout.
    #[serde(default = "default_keep_metadata")]
    pub keep_metadata: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: default_pixel_ratio(),
            sort_order: SortOrder::default(),
            max_item_size: None,
            remove_oversized: false,
            keep_metadata: default_keep_metadata(),
        }
    }
}

impl LayoutOptions {
    /// Validates option values before any packing happens.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::ShelfPackError;

        if self.pixel_ratio == 0 {
            return Err(ShelfPackError::InvalidInput(
                "pixel_ratio must be a positive integer".into(),
            ));
        }
        if self.max_item_size == Some(0) {
            return Err(ShelfPackError::InvalidInput(
                "max_item_size must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

fn default_pixel_ratio() -> u32 {
    1
}

fn default_keep_metadata() -> bool {
    true
}
