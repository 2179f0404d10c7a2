use crate::config::{BatchOptions, LayoutOptions, PackerOptions, SortOrder};
use crate::error::{Result, ShelfPackError};
use crate::model::{BinId, BinRequest};
use crate::packer::ShelfPack;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument, warn};

/// Stretch and text-placeholder hints of a sprite, in sprite pixels.
///
/// The layout never reads these; they are copied to the output per id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// `[left, top, right, bottom]` of the area that may hold content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<[f64; 4]>,
    /// Horizontal `[from, to]` ranges that may be stretched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stretch_x: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stretch_y: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<[f64; 4]>,
}

impl ItemMetadata {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.stretch_x.is_none()
            && self.stretch_y.is_none()
            && self.placeholder.is_none()
    }
}

/// A sprite to lay out: an id plus its rendered size in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub id: String,
    pub width: u32,
    pub height: u32,
    /// Content fingerprint. Items sharing a signature are packed once by
    /// `generate_layout_unique`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(flatten)]
    pub metadata: ItemMetadata,
}

impl LayoutItem {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            signature: None,
            metadata: ItemMetadata::default(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A sprite with its position in the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub metadata: ItemMetadata,
}

/// Sheet dimensions plus every placed sprite, in packing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteLayout {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: u32,
    pub items: Vec<PlacedItem>,
}

/// Per-sprite record of the id-keyed layout format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub pixel_ratio: u32,
    #[serde(flatten)]
    pub metadata: ItemMetadata,
}

/// Sprites keyed by id.
pub type DataLayout = BTreeMap<String, LayoutEntry>;

impl SpriteLayout {
    /// Re-keys the layout by sprite id.
    pub fn to_data_layout(&self) -> DataLayout {
        self.items
            .iter()
            .map(|it| {
                (
                    it.id.clone(),
                    LayoutEntry {
                        width: it.width,
                        height: it.height,
                        x: it.x,
                        y: it.y,
                        pixel_ratio: self.pixel_ratio,
                        metadata: it.metadata.clone(),
                    },
                )
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&PlacedItem> {
        self.items.iter().find(|it| it.id == id)
    }
}

#[instrument(skip_all, fields(items = items.len()))]
/// Packs `items` into the smallest sheet the shelf packer finds.
///
/// Items with a zero side are dropped, as are oversized items when
/// `opts.remove_oversized` is set. Sorting follows `opts.sort_order`
/// (tallest first by default, ties by id). The packer starts at 1x1 and grows
/// on demand; the batch shrink trims the final sheet to its footprint.
pub fn generate_layout(items: &[LayoutItem], opts: &LayoutOptions) -> Result<SpriteLayout> {
    opts.validate()?;
    let packed = pack_items(items.iter().collect(), opts)?;
    Ok(SpriteLayout {
        width: packed.width,
        height: packed.height,
        pixel_ratio: opts.pixel_ratio,
        items: packed.items,
    })
}

#[instrument(skip_all, fields(items = items.len()))]
/// Like `generate_layout`, but items with the same `signature` share one slot.
///
/// The first item of each signature group is packed; the other members are
/// reported right after it at the same position.
pub fn generate_layout_unique(items: &[LayoutItem], opts: &LayoutOptions) -> Result<SpriteLayout> {
    opts.validate()?;

    let mut groups: HashMap<GroupKey<'_>, Vec<&LayoutItem>> = HashMap::new();
    let mut representatives: Vec<&LayoutItem> = Vec::new();
    for item in items {
        let key = group_key(item.signature.as_deref(), &item.id);
        let group = groups.entry(key).or_default();
        if group.is_empty() {
            representatives.push(item);
        }
        group.push(item);
    }
    debug!(
        unique = representatives.len(),
        total = items.len(),
        "deduplicated layout items"
    );

    let packed = pack_items(representatives, opts)?;
    let mut placed = Vec::with_capacity(items.len());
    for rep in packed.items {
        let key = group_key(packed.signatures.get(&rep.id).copied(), &rep.id);
        match groups.get(&key) {
            Some(members) => {
                for member in members {
                    placed.push(PlacedItem {
                        id: member.id.clone(),
                        ..rep.clone()
                    });
                }
            }
            None => placed.push(rep.clone()),
        }
    }
    Ok(SpriteLayout {
        width: packed.width,
        height: packed.height,
        pixel_ratio: opts.pixel_ratio,
        items: placed,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKey<'a> {
    Signature(&'a str),
    Id(&'a str),
}

fn group_key<'a>(signature: Option<&'a str>, id: &'a str) -> GroupKey<'a> {
    match signature {
        Some(sig) => GroupKey::Signature(sig),
        None => GroupKey::Id(id),
    }
}

struct Packed<'a> {
    width: u32,
    height: u32,
    items: Vec<PlacedItem>,
    // id -> signature of the packed item, for regrouping.
    signatures: HashMap<String, &'a str>,
}

fn pack_items<'a>(mut items: Vec<&'a LayoutItem>, opts: &LayoutOptions) -> Result<Packed<'a>> {
    items.retain(|it| it.width > 0 && it.height > 0);
    if let Some(max) = opts.max_item_size {
        if !opts.remove_oversized {
            if let Some(it) = items.iter().find(|it| it.width > max || it.height > max) {
                return Err(ShelfPackError::InvalidInput(format!(
                    "item {:?} is {}x{}, larger than max_item_size {}",
                    it.id, it.width, it.height, max
                )));
            }
        }
        let before = items.len();
        items.retain(|it| it.width <= max && it.height <= max);
        if items.len() < before {
            warn!(removed = before - items.len(), max, "dropped oversized items");
        }
    }
    if opts.sort_order == SortOrder::HeightDesc {
        items.sort_by(|a, b| b.height.cmp(&a.height).then_with(|| a.id.cmp(&b.id)));
    }

    let mut requests: Vec<BinRequest> = items
        .iter()
        .map(|it| BinRequest::with_id(BinId::Name(it.id.clone()), it.width, it.height))
        .collect();
    let mut sprite = ShelfPack::new(1, 1, PackerOptions::builder().auto_resize(true).build())?;
    sprite.pack(&mut requests, BatchOptions { in_place: true })?;

    let mut placed = Vec::with_capacity(items.len());
    let mut signatures = HashMap::new();
    for (&item, req) in items.iter().zip(&requests) {
        let (Some(x), Some(y)) = (req.x, req.y) else {
            continue;
        };
        if let Some(sig) = item.signature.as_deref() {
            signatures.insert(item.id.clone(), sig);
        }
        placed.push(PlacedItem {
            id: item.id.clone(),
            x,
            y,
            width: item.width,
            height: item.height,
            metadata: if opts.keep_metadata {
                item.metadata.clone()
            } else {
                ItemMetadata::default()
            },
        });
    }
    debug!(
        placed = placed.len(),
        width = sprite.width(),
        height = sprite.height(),
        "layout generated"
    );
    Ok(Packed {
        width: sprite.width(),
        height: sprite.height(),
        items: placed,
        signatures,
    })
}
