use shelf_pack_core::prelude::*;

fn bin(id: &str, x: u32, y: u32, w: u32, h: u32, maxh: u32) -> Bin {
    Bin {
        id: id.into(),
        x,
        y,
        w,
        h,
        maxw: w,
        maxh,
        refcount: 1,
    }
}

fn requests(json: &str) -> Vec<BinRequest> {
    serde_json::from_str(json).expect("valid request json")
}

#[test]
fn same_height_bins_share_existing_shelf() {
    let mut s = ShelfPack::new(64, 64, PackerOptions::default()).unwrap();
    let mut reqs = requests(
        r#"[{"id":"a","width":10,"height":10},{"id":"b","width":10,"height":10},{"id":"c","width":10,"height":10}]"#,
    );
    let results = s.pack(&mut reqs, BatchOptions::default()).unwrap();
    assert_eq!(
        results,
        vec![
            bin("a", 0, 0, 10, 10, 10),
            bin("b", 10, 0, 10, 10, 10),
            bin("c", 20, 0, 10, 10, 10),
        ]
    );
    // Without in_place the requests are untouched.
    assert!(reqs.iter().all(|r| r.x.is_none() && r.y.is_none()));
}

#[test]
fn larger_bins_go_on_new_shelves() {
    let mut s = ShelfPack::new(64, 64, PackerOptions::default()).unwrap();
    let mut reqs = requests(r#"[{"id":"a","w":10,"h":10},{"id":"b","w":10,"h":15},{"id":"c","w":10,"h":20}]"#);
    let results = s.pack(&mut reqs, BatchOptions::default()).unwrap();
    assert_eq!(
        results,
        vec![
            bin("a", 0, 0, 10, 10, 10),
            bin("b", 0, 10, 10, 15, 15),
            bin("c", 0, 25, 10, 20, 20),
        ]
    );
}

#[test]
fn shorter_bins_minimize_shelf_waste() {
    let mut s = ShelfPack::new(64, 64, PackerOptions::default()).unwrap();
    let mut reqs = vec![
        BinRequest::with_id("a", 10, 10),
        BinRequest::with_id("b", 10, 15),
        BinRequest::with_id("c", 10, 20),
        BinRequest::with_id("d", 10, 9),
    ];
    let results = s.pack(&mut reqs, BatchOptions::default()).unwrap();
    assert_eq!(results[3], bin("d", 10, 0, 10, 9, 10));
}

#[test]
fn width_height_and_w_h_spellings_are_equivalent() {
    let long = requests(r#"[{"id":"a","width":10,"height":12}]"#);
    let short = requests(r#"[{"id":"a","w":10,"h":12}]"#);
    assert_eq!(long, short);
    assert_eq!((long[0].w, long[0].h), (10, 12));
}

#[test]
fn in_place_writes_positions_back() {
    let mut s = ShelfPack::new(64, 64, PackerOptions::default()).unwrap();
    let mut reqs = requests(r#"[{"id":"a","w":10,"h":10},{"id":"b","w":10,"h":10},{"id":"c","w":10,"h":10}]"#);
    let results = s.pack(&mut reqs, BatchOptions { in_place: true }).unwrap();
    assert_eq!(results.len(), 3);
    let pos: Vec<_> = reqs.iter().map(|r| (r.x, r.y)).collect();
    assert_eq!(
        pos,
        vec![(Some(0), Some(0)), (Some(10), Some(0)), (Some(20), Some(0))]
    );
}

#[test]
fn in_place_assigns_minted_ids() {
    let mut s = ShelfPack::new(64, 64, PackerOptions::default()).unwrap();
    let mut reqs = vec![BinRequest::new(10, 10), BinRequest::new(10, 10)];
    s.pack(&mut reqs, BatchOptions { in_place: true }).unwrap();
    assert_eq!(reqs[0].id, Some(BinId::Num(1)));
    assert_eq!(reqs[1].id, Some(BinId::Num(2)));
}

#[test]
fn skips_bins_if_not_enough_room() {
    let mut s = ShelfPack::new(20, 20, PackerOptions::default()).unwrap();
    let mut reqs = requests(
        r#"[{"id":"a","w":10,"h":10},{"id":"b","w":10,"h":10},{"id":"c","w":10,"h":30},{"id":"d","w":10,"h":10}]"#,
    );
    let results = s.pack(&mut reqs, BatchOptions { in_place: true }).unwrap();
    assert_eq!(
        results,
        vec![
            bin("a", 0, 0, 10, 10, 10),
            bin("b", 10, 0, 10, 10, 10),
            bin("d", 0, 10, 10, 10, 10),
        ]
    );
    assert_eq!((reqs[2].x, reqs[2].y), (None, None));
    assert_eq!((reqs[3].x, reqs[3].y), (Some(0), Some(10)));
    // No auto-resize, so the canvas keeps its size.
    assert_eq!((s.width(), s.height()), (20, 20));
}

#[test]
fn skips_requests_with_an_empty_side() {
    let mut s = ShelfPack::new(20, 20, PackerOptions::default()).unwrap();
    let mut reqs = vec![BinRequest::with_id("a", 0, 10), BinRequest::with_id("b", 10, 10)];
    let results = s.pack(&mut reqs, BatchOptions::default()).unwrap();
    assert_eq!(results, vec![bin("b", 0, 0, 10, 10, 10)]);
}

#[test]
fn auto_resize_batch_results_in_minimal_canvas() {
    let mut s = ShelfPack::new(10, 10, PackerOptions::builder().auto_resize(true).build()).unwrap();
    let mut reqs = requests(
        r#"[{"id":"a","w":10,"h":10},{"id":"b","w":5,"h":15},{"id":"c","w":25,"h":15},{"id":"d","w":10,"h":20}]"#,
    );
    let results = s.pack(&mut reqs, BatchOptions::default()).unwrap();
    assert_eq!(results.len(), 4);
    // Packing one by one grows to 50x60; the final shrink brings it to 30x45.
    assert_eq!((s.width(), s.height()), (30, 45));
}

#[test]
fn repeated_id_in_batch_acquires_the_same_bin() {
    let mut s = ShelfPack::new(64, 64, PackerOptions::default()).unwrap();
    let mut reqs = vec![BinRequest::with_id("a", 10, 10), BinRequest::with_id("a", 10, 10)];
    let results = s.pack(&mut reqs, BatchOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!((results[1].x, results[1].y, results[1].refcount), (0, 0, 2));
    assert_eq!(s.get_bin(&"a".into()).unwrap().refcount, 2);
    assert_eq!(s.shelves()[0].x(), 10);
}

#[test]
fn request_without_a_free_id_is_skipped_and_batch_continues() {
    let opts = PackerOptions::builder().auto_resize(true).build();
    let mut s = ShelfPack::new(64, 64, opts).unwrap();
    let mut reqs = vec![
        BinRequest::with_id(u32::MAX, 4, 4),
        BinRequest::new(4, 4),
        BinRequest::with_id("z", 4, 4),
    ];
    let results = s.pack(&mut reqs, BatchOptions { in_place: true }).unwrap();

    let placed: Vec<_> = results.iter().map(|b| (b.id.clone(), b.x, b.y)).collect();
    assert_eq!(
        placed,
        vec![(BinId::Num(u32::MAX), 0, 0), ("z".into(), 4, 0)]
    );
    assert_eq!((reqs[1].id.clone(), reqs[1].x), (None, None));
    assert_eq!(s.bin_count(), 2);
    // The trailing shrink still runs.
    assert_eq!((s.width(), s.height()), (8, 4));
}
