use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shelf_pack_core::prelude::*;
use std::collections::HashSet;

fn check(s: &ShelfPack) {
    let live: Vec<&Bin> = s.bins().collect();
    assert_eq!(live.len(), s.bin_count());
    for (i, a) in live.iter().enumerate() {
        assert!(a.refcount >= 1);
        assert!(a.w <= a.maxw && a.h <= a.maxh, "capacity violated: {a:?}");
        assert!(a.x + a.w <= s.width() && a.y + a.h <= s.height(), "out of canvas: {a:?}");
        assert_eq!(s.get_bin(&a.id), Some(*a));
        for b in &live[i + 1..] {
            assert!(!a.overlaps(b), "overlap: {a:?} vs {b:?}");
        }
    }
    for f in s.freebins() {
        assert_eq!(f.refcount, 0);
        assert!(f.w <= f.maxw && f.h <= f.maxh);
    }
    let ids: HashSet<&BinId> = live.iter().map(|b| &b.id).collect();
    assert_eq!(ids.len(), live.len());

    let live_per_height: usize = s.stats().values().map(|&c| c as usize).sum();
    assert_eq!(live_per_height, live.len());

    let mut y = 0;
    for sh in s.shelves() {
        assert_eq!(sh.y(), y, "shelves must stack without gaps");
        assert_eq!(sh.width(), s.width());
        assert_eq!(sh.free(), sh.width() - sh.x());
        y += sh.height();
    }
    assert!(y <= s.height());
}

fn churn(seed: u64, opts: PackerOptions, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut s = ShelfPack::new(128, 128, opts).unwrap();
    let mut held: Vec<BinId> = Vec::new();
    for _ in 0..steps {
        if held.is_empty() || rng.gen_bool(0.6) {
            let w = rng.gen_range(1..=24);
            let h = rng.gen_range(1..=24);
            let id = if rng.gen_bool(0.3) {
                Some(BinId::Name(format!("n{}", rng.gen_range(0..40))))
            } else {
                None
            };
            if let Some(b) = s.pack_one(w, h, id).unwrap() {
                held.push(b.id.clone());
            }
        } else {
            let idx = rng.gen_range(0..held.len());
            let id = held.swap_remove(idx);
            s.unref_bin(&id).unwrap();
        }
        check(&s);
    }
}

#[test]
fn random_churn_keeps_invariants_fixed_canvas() {
    for seed in 0..8 {
        churn(seed, PackerOptions::default(), 400);
    }
}

#[test]
fn random_churn_keeps_invariants_auto_resize() {
    for seed in 100..104 {
        churn(seed, PackerOptions::builder().auto_resize(true).build(), 300);
    }
}

#[test]
fn freed_slot_round_trip_reuses_physical_slot() {
    // 22 wide: the second shelf has no room left beside the 12-wide slot.
    let mut s = ShelfPack::new(22, 64, PackerOptions::default()).unwrap();
    s.pack_one(10, 10, Some(BinId::Num(1))).unwrap();
    let slot = s.pack_one(12, 20, Some(BinId::Num(2))).unwrap().cloned().unwrap();
    s.unref_bin(&BinId::Num(2)).unwrap();

    let reused = s.pack_one(11, 18, None).unwrap().cloned().unwrap();
    assert_eq!(
        (reused.x, reused.y, reused.maxw, reused.maxh),
        (slot.x, slot.y, slot.maxw, slot.maxh)
    );
    assert_eq!((reused.w, reused.h), (11, 18));
    assert_eq!(s.shelves().len(), 2);
    assert_eq!(s.freebins().len(), 0);
}

#[test]
fn minted_ids_never_collide_with_live_ids() {
    let mut s = ShelfPack::new(256, 256, PackerOptions::default()).unwrap();
    s.pack_one(4, 4, Some(BinId::Num(3))).unwrap();
    s.pack_one(4, 4, Some("x".into())).unwrap();
    let mut seen = HashSet::new();
    seen.insert(BinId::Num(3));
    for _ in 0..20 {
        let id = s.pack_one(4, 4, None).unwrap().unwrap().id.clone();
        assert!(seen.insert(id));
    }
}
