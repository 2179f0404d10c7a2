//! Shelf-packing allocator for sprite sheets.
//!
//! - `ShelfPack` places rectangles on fixed-height shelves, reuses freed slots and
//!   can grow the canvas on demand (width first, then height)
//! - Bins are reference counted; releasing the last reference parks the slot on a free-list
//! - `layout` builds sprite-sheet layouts on top of the packer; `export` turns them into JSON
//!
//! Quick example:
//! ```
//! use shelf_pack_core::prelude::*;
//! # fn main() -> shelf_pack_core::Result<()> {
//! let mut sprite = ShelfPack::new(64, 64, PackerOptions::default())?;
//! let a = sprite.pack_one(10, 10, None)?.cloned().expect("room for a");
//! let b = sprite.pack_one(10, 10, Some("b".into()))?.cloned().expect("room for b");
//! assert_eq!((a.x, a.y), (0, 0));
//! assert_eq!((b.x, b.y), (10, 0));
//! sprite.unref_bin(&b.id)?;
//! assert_eq!(sprite.freebins().len(), 1);
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod packer;

pub use config::*;
pub use error::*;
pub use export::*;
pub use layout::*;
pub use model::*;
pub use packer::*;

/// Convenience prelude for common types and functions.
/// Importing `shelf_pack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        BatchOptions, LayoutOptions, PackerOptions, PackerOptionsBuilder, SortOrder,
    };
    pub use crate::error::ShelfPackError;
    pub use crate::layout::{
        generate_layout, generate_layout_unique, DataLayout, ItemMetadata, LayoutEntry, LayoutItem,
        PlacedItem, SpriteLayout,
    };
    pub use crate::model::{Bin, BinId, BinRequest, PackStats};
    pub use crate::packer::{Shelf, ShelfPack};
}
