use crate::config::{BatchOptions, PackerOptions};
use crate::error::{Result, ShelfPackError};
use crate::model::{Bin, BinId, BinRequest, PackStats};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument, trace, warn};

pub mod shelf;

pub use shelf::Shelf;

/// Shelf-packing allocator over a growable canvas.
///
/// The packer owns every bin. Callers get borrowed views and address bins by id
/// for `ref_bin`/`unref_bin`. A physical slot, once carved from a shelf, lives
/// for the packer's lifetime (until `clear`) and is either live (reachable by id)
/// or parked on the free-list waiting for reuse.
#[derive(Debug, Clone)]
pub struct ShelfPack {
    w: u32,
    h: u32,
    opts: PackerOptions,
    shelves: Vec<Shelf>,
    // Arena of physical slots; `bins` and `freebins` index into it.
    slots: Vec<Bin>,
    bins: HashMap<BinId, usize>,
    freebins: Vec<usize>,
    stats: BTreeMap<u32, u32>,
    max_id: u32,
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Index into the free-list.
    FreeBin(usize),
    /// Index into the shelf list.
    Shelf(usize),
    NewShelf,
}

impl ShelfPack {
    /// Creates a packer over an empty `w x h` canvas.
    pub fn new(w: u32, h: u32, opts: PackerOptions) -> Result<Self> {
        if w == 0 || h == 0 {
            return Err(ShelfPackError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        Ok(Self {
            w,
            h,
            opts,
            shelves: Vec::new(),
            slots: Vec::new(),
            bins: HashMap::new(),
            freebins: Vec::new(),
            stats: BTreeMap::new(),
            max_id: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.w
    }

    pub fn height(&self) -> u32 {
        self.h
    }

    pub fn options(&self) -> &PackerOptions {
        &self.opts
    }

    /// Live-bin count per bin height. Heights stay listed at zero once seen.
    pub fn stats(&self) -> &BTreeMap<u32, u32> {
        &self.stats
    }

    pub fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }

    /// Vacated slots, least recently freed first.
    pub fn freebins(&self) -> impl ExactSizeIterator<Item = &Bin> + '_ {
        self.freebins.iter().map(move |&slot| &self.slots[slot])
    }

    /// Live bins in the order their slots were carved.
    pub fn bins(&self) -> impl Iterator<Item = &Bin> + '_ {
        self.slots.iter().filter(|b| b.refcount > 0)
    }

    /// Number of live bins.
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn contains(&self, id: &BinId) -> bool {
        self.bins.contains_key(id)
    }

    /// Looks up a live bin.
    pub fn get_bin(&self, id: &BinId) -> Option<&Bin> {
        self.bins.get(id).map(|&slot| &self.slots[slot])
    }

    /// Packs a single `w x h` rectangle.
    ///
    /// If `id` names a live bin, its refcount is bumped and it is returned as-is.
    /// Without an id, the next free numeric id is minted. Returns `Ok(None)` when
    /// there is no room (and auto-resize is off or cannot grow further).
    pub fn pack_one(&mut self, w: u32, h: u32, id: Option<BinId>) -> Result<Option<&Bin>> {
        if w == 0 || h == 0 {
            return Err(ShelfPackError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        if let Some(existing) = id.as_ref().and_then(|id| self.bins.get(id).copied()) {
            let refcount = self.ref_slot(existing);
            trace!(id = %self.slots[existing].id, refcount, "acquired existing bin");
            return Ok(Some(&self.slots[existing]));
        }
        let id = match id {
            Some(id) => id,
            None => BinId::Num(self.next_id()?),
        };

        let (start_w, start_h) = (self.w, self.h);
        loop {
            if let Some(slot) = self.try_place(w, h, &id) {
                if let Some(n) = id.as_num() {
                    self.max_id = self.max_id.max(n);
                }
                return Ok(Some(&self.slots[slot]));
            }
            if !self.opts.auto_resize || !self.grow(w, h) {
                debug!(w, h, canvas_w = self.w, canvas_h = self.h, "no room for bin");
                if (self.w, self.h) != (start_w, start_h) {
                    self.apply_size(start_w, start_h);
                }
                return Ok(None);
            }
        }
    }

    /// Packs a batch of requests in input order.
    ///
    /// A request that cannot be placed is skipped and the rest of the batch
    /// still runs. With `in_place`, accepted requests get their `x`, `y` and
    /// assigned id written back. When the packer auto-resizes, the canvas is
    /// shrunk to its footprint afterwards.
    #[instrument(skip_all, fields(requests = requests.len()))]
    pub fn pack(&mut self, requests: &mut [BinRequest], opts: BatchOptions) -> Result<Vec<Bin>> {
        let mut results = Vec::with_capacity(requests.len());
        for req in requests.iter_mut() {
            if req.w == 0 || req.h == 0 {
                trace!(id = ?req.id, "skipping request with empty side");
                continue;
            }
            let bin = match self.pack_one(req.w, req.h, req.id.clone()) {
                Ok(Some(bin)) => bin,
                Ok(None) => continue,
                Err(err) => {
                    warn!(id = ?req.id, %err, "skipping request");
                    continue;
                }
            };
            if opts.in_place {
                req.x = Some(bin.x);
                req.y = Some(bin.y);
                req.id = Some(bin.id.clone());
            }
            results.push(bin.clone());
        }
        if self.opts.auto_resize {
            self.shrink();
        }
        debug!(
            accepted = results.len(),
            width = self.w,
            height = self.h,
            "batch packed"
        );
        Ok(results)
    }

    /// Adds a reference to a live bin and returns the new refcount.
    pub fn ref_bin(&mut self, id: &BinId) -> Result<u32> {
        match self.bins.get(id).copied() {
            Some(slot) => {
                let refcount = self.ref_slot(slot);
                trace!(%id, refcount, "ref");
                Ok(refcount)
            }
            None if self.is_freed(id) => Err(ShelfPackError::BinNotLive(id.clone())),
            None => Err(ShelfPackError::UnknownBin(id.clone())),
        }
    }

    /// Drops a reference and returns the new refcount.
    ///
    /// At zero the bin stops being reachable by id and its slot joins the
    /// free-list. Releasing an already freed bin is a no-op returning 0.
    pub fn unref_bin(&mut self, id: &BinId) -> Result<u32> {
        let Some(slot) = self.bins.get(id).copied() else {
            if self.is_freed(id) {
                return Ok(0);
            }
            return Err(ShelfPackError::UnknownBin(id.clone()));
        };
        let bin = &mut self.slots[slot];
        bin.refcount -= 1;
        let refcount = bin.refcount;
        if refcount == 0 {
            let h = bin.h;
            if let Some(count) = self.stats.get_mut(&h) {
                *count = count.saturating_sub(1);
            }
            self.bins.remove(id);
            self.freebins.push(slot);
            debug!(%id, free = self.freebins.len(), "bin released to free-list");
        } else {
            trace!(%id, refcount, "unref");
        }
        Ok(refcount)
    }

    /// Sets the canvas size. Every shelf follows the new width.
    ///
    /// Fails if either side is zero or smaller than the placed content.
    pub fn resize(&mut self, w: u32, h: u32) -> Result<()> {
        if w == 0 || h == 0 {
            return Err(ShelfPackError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        let (min_w, min_h) = self.footprint();
        if w < min_w || h < min_h {
            return Err(ShelfPackError::ResizeTooSmall {
                width: w,
                height: h,
                min_width: min_w,
                min_height: min_h,
            });
        }
        self.apply_size(w, h);
        Ok(())
    }

    /// Shrinks the canvas to the bounding box of every carved slot.
    pub fn shrink(&mut self) {
        if self.shelves.is_empty() {
            return;
        }
        let (w, h) = self.footprint();
        self.apply_size(w, h);
    }

    /// Discards all shelves, bins, free slots and stats. The canvas size is kept.
    pub fn clear(&mut self) {
        self.shelves.clear();
        self.slots.clear();
        self.bins.clear();
        self.freebins.clear();
        self.stats.clear();
        self.max_id = 0;
    }

    /// Computes occupancy statistics for the current canvas.
    pub fn pack_stats(&self) -> PackStats {
        let canvas_area = (self.w as u64) * (self.h as u64);
        let used_area: u64 = self.bins().map(Bin::area).sum();
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        PackStats {
            width: self.w,
            height: self.h,
            num_shelves: self.shelves.len(),
            num_bins: self.bins.len(),
            num_free: self.freebins.len(),
            canvas_area,
            used_area,
            occupancy,
        }
    }

    // ---------- placement ----------

    fn try_place(&mut self, w: u32, h: u32, id: &BinId) -> Option<usize> {
        match self.choose(w, h)? {
            Placement::FreeBin(i) => Some(self.alloc_freebin(i, w, h, id.clone())),
            Placement::Shelf(i) => self.alloc_shelf(i, w, h, id.clone()),
            Placement::NewShelf => {
                let y = self.next_shelf_y();
                debug!(y, h, "new shelf");
                self.shelves.push(Shelf::new(y, self.w, h));
                self.alloc_shelf(self.shelves.len() - 1, w, h, id.clone())
            }
        }
    }

    /// Free slots are scored by unused area, shelves by unused height times
    /// width. A shelf only displaces the current best on strictly lower waste.
    fn choose(&self, w: u32, h: u32) -> Option<Placement> {
        let mut best = None;
        let mut best_waste = u64::MAX;

        for (i, &slot) in self.freebins.iter().enumerate() {
            let bin = &self.slots[slot];
            if w > bin.maxw || h > bin.maxh {
                continue;
            }
            if w == bin.maxw && h == bin.maxh {
                return Some(Placement::FreeBin(i));
            }
            let waste = area(bin.maxw, bin.maxh) - area(w, h);
            if waste < best_waste {
                best_waste = waste;
                best = Some(Placement::FreeBin(i));
            }
        }

        for (i, shelf) in self.shelves.iter().enumerate() {
            if w > shelf.free || h > shelf.h {
                continue;
            }
            if h == shelf.h {
                return Some(Placement::Shelf(i));
            }
            let waste = area(shelf.h - h, w);
            if waste < best_waste {
                best_waste = waste;
                best = Some(Placement::Shelf(i));
            }
        }

        if best.is_some() {
            return best;
        }
        let y = self.next_shelf_y();
        if h <= self.h.saturating_sub(y) && w <= self.w {
            return Some(Placement::NewShelf);
        }
        None
    }

    fn alloc_freebin(&mut self, index: usize, w: u32, h: u32, id: BinId) -> usize {
        let slot = self.freebins.remove(index);
        let bin = &mut self.slots[slot];
        debug!(%id, x = bin.x, y = bin.y, maxw = bin.maxw, maxh = bin.maxh, "reusing free slot");
        bin.id = id.clone();
        bin.w = w;
        bin.h = h;
        bin.refcount = 0;
        self.bins.insert(id, slot);
        self.ref_slot(slot);
        slot
    }

    fn alloc_shelf(&mut self, index: usize, w: u32, h: u32, id: BinId) -> Option<usize> {
        let shelf = &mut self.shelves[index];
        let x = shelf.alloc(w, h)?;
        let bin = Bin::new(id.clone(), x, shelf.y, w, h, w, shelf.h);
        let slot = self.slots.len();
        self.slots.push(bin);
        self.bins.insert(id, slot);
        self.ref_slot(slot);
        Some(slot)
    }

    /// First reference of a slot records its height in `stats`.
    fn ref_slot(&mut self, slot: usize) -> u32 {
        let bin = &mut self.slots[slot];
        bin.refcount += 1;
        if bin.refcount == 1 {
            *self.stats.entry(bin.h).or_insert(0) += 1;
        }
        bin.refcount
    }

    // ---------- identifiers ----------

    fn next_id(&self) -> Result<u32> {
        let mut n = self.max_id;
        loop {
            n = n.checked_add(1).ok_or_else(|| {
                ShelfPackError::InvalidInput("numeric bin ids exhausted".into())
            })?;
            if !self.bins.contains_key(&BinId::Num(n)) {
                return Ok(n);
            }
        }
    }

    // Linear in the free-list length; only reached when an id lookup misses.
    fn is_freed(&self, id: &BinId) -> bool {
        self.freebins.iter().any(|&slot| &self.slots[slot].id == id)
    }

    // ---------- geometry ----------

    fn next_shelf_y(&self) -> u32 {
        self.shelves.iter().map(|s| s.h).sum()
    }

    /// Widest shelf cursor and total shelf height.
    fn footprint(&self) -> (u32, u32) {
        let w = self.shelves.iter().map(|s| s.x).max().unwrap_or(0);
        (w, self.next_shelf_y())
    }

    /// Doubles the smaller side (width first on a tie), or whichever side the
    /// request exceeds. Returns false if the canvas cannot grow further.
    fn grow(&mut self, w: u32, h: u32) -> bool {
        let (w1, h1) = (self.w, self.h);
        let mut w2 = w1;
        let mut h2 = h1;
        if w1 <= h1 || w > w1 {
            match w.max(w1).checked_mul(2) {
                Some(v) => w2 = v,
                None => return false,
            }
        }
        if h1 < w1 || h > h1 {
            match h.max(h1).checked_mul(2) {
                Some(v) => h2 = v,
                None => return false,
            }
        }
        debug!(from_w = w1, from_h = h1, to_w = w2, to_h = h2, "auto-resize");
        self.apply_size(w2, h2);
        true
    }

    fn apply_size(&mut self, w: u32, h: u32) {
        self.w = w;
        self.h = h;
        for shelf in &mut self.shelves {
            shelf.resize(w);
        }
    }
}

#[inline]
fn area(w: u32, h: u32) -> u64 {
    (w as u64) * (h as u64)
}
