use std::{rc::Rc, sync::Arc};

use asset_integrity::resources::{
    texture::{ImageBackend, TextureFile},
    texture_store::{TextureStats, TextureStore},
};
use futures::executor::block_on;

use crate::common::test_utils::{CountingBackend, FakeTexture, png_bytes, texture_file};

mod common;

fn stats(entries: &[(&str, usize)]) -> Vec<TextureStats> {
    entries
        .iter()
        .map(|(key, refcount)| TextureStats {
            key: key.to_string(),
            refcount: *refcount,
        })
        .collect()
}

fn fake(label: &str) -> Rc<FakeTexture> {
    Rc::new(FakeTexture {
        label: label.to_string(),
    })
}

#[test]
fn loading_the_same_file_twice_shares_one_resource() {
    let store = TextureStore::new(CountingBackend::new());
    let file = texture_file("wood.png");

    let first = block_on(store.load_from_file(&file, None)).unwrap();
    let second = block_on(store.load_from_file(&file, None)).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(store.backend().decodes.get(), 1);
    assert_eq!(store.stats(), stats(&[("wood.png", 2)]));

    assert!(store.release("wood.png"));
    assert_eq!(store.stats(), stats(&[("wood.png", 1)]));
    assert_eq!(store.backend().disposals.get(), 0);

    assert!(store.release("wood.png"));
    assert!(store.stats().is_empty());
    assert_eq!(store.backend().disposals.get(), 1);
    assert_eq!(store.backend().revocations.get(), 1);
}

#[test]
fn releasing_too_often_never_disposes_twice() {
    let store = TextureStore::new(CountingBackend::new());
    store.add("brick", fake("brick"));

    assert!(store.release("brick"));
    assert!(!store.release("brick"));
    assert!(!store.release("brick"));
    assert_eq!(store.backend().disposals.get(), 1);
    // Added resources never had an object URL.
    assert_eq!(store.backend().revocations.get(), 0);
}

#[test]
fn entry_exists_while_holders_remain() {
    let store = TextureStore::new(CountingBackend::new());
    let mut holders: i64 = 0;
    let ops = ["add", "retain", "add", "release", "retain", "release", "release", "release", "release", "add"];
    for op in ops {
        match op {
            "add" => {
                store.add("stone", fake("stone"));
                holders += 1;
            }
            "retain" => {
                if store.retain("stone") {
                    holders += 1;
                }
            }
            _ => {
                if store.release("stone") {
                    holders -= 1;
                }
            }
        }
        assert!(holders >= 0);
        assert_eq!(store.contains("stone"), holders > 0, "after {op}");
        if holders > 0 {
            assert_eq!(store.stats(), stats(&[("stone", holders as usize)]));
        }
    }
    assert_eq!(store.backend().disposals.get(), 1);
}

#[test]
fn retain_of_unknown_key_is_refused() {
    let store = TextureStore::new(CountingBackend::new());
    assert!(!store.retain("nothing"));
    assert!(store.is_empty());
}

#[test]
fn add_returns_the_cached_resource_for_known_keys() {
    let store = TextureStore::new(CountingBackend::new());
    let original = store.add("grass", fake("first"));
    let again = store.add("grass", fake("second"));
    assert!(Rc::ptr_eq(&original, &again));
    assert_eq!(again.label, "first");
    assert_eq!(store.stats(), stats(&[("grass", 2)]));
}

#[test]
fn get_does_not_change_refcount() {
    let store = TextureStore::new(CountingBackend::new());
    assert!(store.get("sky").is_none());
    let added = store.add("sky", fake("sky"));
    let found = store.get("sky").unwrap();
    assert!(Rc::ptr_eq(&added, &found));
    assert_eq!(store.stats(), stats(&[("sky", 1)]));
}

#[test]
fn dispose_all_ignores_refcounts() {
    let store = TextureStore::new(CountingBackend::new());
    block_on(store.load_from_file(&texture_file("a.png"), None)).unwrap();
    block_on(store.load_from_file(&texture_file("b.png"), None)).unwrap();
    block_on(store.load_from_file(&texture_file("b.png"), None)).unwrap();
    store.add("c", fake("c"));

    store.dispose_all();
    assert!(store.is_empty());
    assert_eq!(store.backend().disposals.get(), 3);
    assert_eq!(store.backend().revocations.get(), 2);
}

#[test]
fn failed_decode_revokes_the_object_url() {
    let store = TextureStore::new(CountingBackend::new());
    let broken = TextureFile::new(Some("broken.png"), Vec::new());

    let err = block_on(store.load_from_file(&broken, None)).unwrap_err();
    assert!(format!("{err:#}").contains("broken.png"));
    assert_eq!(store.backend().urls_created.get(), 1);
    assert_eq!(store.backend().revocations.get(), 1);
    assert_eq!(store.backend().disposals.get(), 0);
    assert!(store.is_empty());
}

#[test]
fn keys_default_to_file_name_then_synthetic() {
    let store = TextureStore::new(CountingBackend::new());
    block_on(store.load_from_file(&texture_file("bark.png"), Some("trees/bark"))).unwrap();
    block_on(store.load_from_file(&TextureFile::new(None, vec![1]), None)).unwrap();
    block_on(store.load_from_file(&TextureFile::new(None, vec![2]), None)).unwrap();

    let keys: Vec<String> = store.stats().into_iter().map(|s| s.key).collect();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"trees/bark".to_string()));
    let synthetic: Vec<&String> = keys.iter().filter(|k| k.starts_with("texture-")).collect();
    assert_eq!(synthetic.len(), 2);
    assert_ne!(synthetic[0], synthetic[1]);
}

#[test]
fn stats_are_sorted_by_key() {
    let store = TextureStore::new(CountingBackend::new());
    for key in ["delta", "alpha", "charlie", "bravo"] {
        store.add(key, fake(key));
    }
    store.retain("charlie");
    assert_eq!(
        store.stats(),
        stats(&[("alpha", 1), ("bravo", 1), ("charlie", 2), ("delta", 1)])
    );
}

#[test]
fn concurrent_loads_of_one_key_end_up_sharing_an_entry() {
    let store = TextureStore::new(CountingBackend::new());
    let file = texture_file("moss.png");

    let (a, b) = block_on(async {
        futures::join!(
            store.load_from_file(&file, None),
            store.load_from_file(&file, None)
        )
    });
    let (a, b) = (a.unwrap(), b.unwrap());

    // Both decodes ran; the late one was thrown away.
    assert_eq!(store.backend().decodes.get(), 2);
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(store.stats(), stats(&[("moss.png", 2)]));
    assert_eq!(store.backend().disposals.get(), 1);
    assert_eq!(store.backend().revocations.get(), 1);

    store.release("moss.png");
    store.release("moss.png");
    assert_eq!(store.backend().disposals.get(), 2);
    assert_eq!(store.backend().revocations.get(), 2);
}

#[test]
fn failing_disposal_still_evicts_the_entry() {
    let store = TextureStore::new(CountingBackend::new());
    store.backend().fail_dispose.set(true);
    store.backend().fail_revoke.set(true);
    block_on(store.load_from_file(&texture_file("lava.png"), None)).unwrap();

    assert!(store.release("lava.png"));
    assert!(!store.contains("lava.png"));
    assert_eq!(store.backend().disposals.get(), 1);
    assert_eq!(store.backend().revocations.get(), 1);
}

#[test]
fn image_backend_decodes_png_files() {
    let store = TextureStore::new(ImageBackend::new());
    let file = TextureFile::new(Some("checker.png"), png_bytes(4, 2));

    let first = block_on(store.load_from_file(&file, None)).unwrap();
    let second = block_on(store.load_from_file(&file, None)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.dimensions(), (4, 2));
    assert_eq!(first.label, "checker.png");

    let garbage = TextureFile::new(Some("garbage.png"), vec![0, 1, 2, 3]);
    assert!(block_on(store.load_from_file(&garbage, None)).is_err());
    assert_eq!(store.stats(), stats(&[("checker.png", 2)]));
}

#[test]
fn format_hint_prefers_mime_type() {
    let named = TextureFile::new(Some("photo.jpg"), Vec::new());
    assert_eq!(named.format_hint(), Some("jpg"));
    let typed = named.with_mime_type("image/png");
    assert_eq!(typed.format_hint(), Some("png"));
    assert_eq!(TextureFile::new(None, Vec::new()).format_hint(), None);
}

#[tokio::test]
async fn loading_a_missing_file_fails() {
    assert!(TextureFile::load("does/not/exist.png").await.is_err());
}
