use crate::layout::{DataLayout, ItemMetadata, SpriteLayout};
use crate::packer::ShelfPack;
use serde_json::{json, Value};

/// Serialize the packer state as `{ width, height, bins, freebins, stats }`.
/// `bins` lists live bins in slot order; `stats` maps height -> live bin count.
pub fn to_json(packer: &ShelfPack) -> Value {
    let bins: Vec<Value> = packer.bins().map(bin_value).collect();
    let freebins: Vec<Value> = packer.freebins().map(bin_value).collect();
    let mut stats = serde_json::Map::new();
    for (h, count) in packer.stats() {
        stats.insert(h.to_string(), json!(count));
    }
    json!({
        "width": packer.width(),
        "height": packer.height(),
        "bins": bins,
        "freebins": freebins,
        "stats": stats,
    })
}

fn bin_value(b: &crate::model::Bin) -> Value {
    json!({
        "id": &b.id,
        "x": b.x,
        "y": b.y,
        "w": b.w,
        "h": b.h,
        "maxw": b.maxw,
        "maxh": b.maxh,
        "refcount": b.refcount,
    })
}

/// Sheet-style layout: `{ width, height, items: [{ id, x, y, width, height }] }`.
pub fn layout_to_json(layout: &SpriteLayout) -> Value {
    let items: Vec<Value> = layout
        .items
        .iter()
        .map(|it| json!({"id": it.id, "x": it.x, "y": it.y, "width": it.width, "height": it.height}))
        .collect();
    json!({
        "width": layout.width,
        "height": layout.height,
        "items": items,
    })
}

/// Id-keyed layout: `{ id: { width, height, x, y, pixelRatio, ...metadata } }`.
/// Metadata keys (`content`, `stretchX`, `stretchY`, `placeholder`) appear only when set.
pub fn data_layout_to_json(layout: &DataLayout) -> Value {
    let mut out = serde_json::Map::new();
    for (id, e) in layout {
        let mut entry = serde_json::Map::new();
        entry.insert("width".into(), json!(e.width));
        entry.insert("height".into(), json!(e.height));
        entry.insert("x".into(), json!(e.x));
        entry.insert("y".into(), json!(e.y));
        entry.insert("pixelRatio".into(), json!(e.pixel_ratio));
        insert_metadata(&mut entry, &e.metadata);
        out.insert(id.clone(), Value::Object(entry));
    }
    Value::Object(out)
}

fn insert_metadata(entry: &mut serde_json::Map<String, Value>, m: &ItemMetadata) {
    if let Some(content) = &m.content {
        entry.insert("content".into(), json!(content));
    }
    if let Some(stretch_x) = &m.stretch_x {
        entry.insert("stretchX".into(), json!(stretch_x));
    }
    if let Some(stretch_y) = &m.stretch_y {
        entry.insert("stretchY".into(), json!(stretch_y));
    }
    if let Some(placeholder) = &m.placeholder {
        entry.insert("placeholder".into(), json!(placeholder));
    }
}
