use std::path::PathBuf;

use feedpoll::{Feed, FeedStore, Item, JsonStore};

fn temp_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "feedpoll_test_{tag}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

fn item(feed_id: &str, id: &str) -> Item {
    Item {
        id: id.into(),
        feed_id: feed_id.into(),
        title: format!("title {id}"),
        link: format!("http://e/{id}"),
        summary: String::new(),
        published_at: None,
        read: false,
        favorite: false,
    }
}

#[tokio::test]
async fn feeds_and_items_survive_a_reload() {
    let dir = temp_dir("reload");

    let store = JsonStore::load_from_dir(&dir).await;
    let feed = Feed::new("Feed 1", "http://example.com/feed");
    store.upsert_feed(feed.clone()).await;
    store
        .put_items(&feed.id, vec![item(&feed.id, "a"), item(&feed.id, "b")])
        .await;

    let reloaded = JsonStore::load_from_dir(&dir).await;
    let feeds = reloaded.list_feeds().await;
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].id, feed.id);
    assert_eq!(reloaded.items(&feed.id).await.len(), 2);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn read_and_favorite_flags_persist() {
    let dir = temp_dir("flags");

    let store = JsonStore::load_from_dir(&dir).await;
    let feed = Feed::new("Feed 1", "http://example.com/feed");
    store.upsert_feed(feed.clone()).await;
    store.put_items(&feed.id, vec![item(&feed.id, "a")]).await;

    store.mark_read(&feed.id, "a").await;
    store.toggle_favorite(&feed.id, "a").await;

    let reloaded = JsonStore::load_from_dir(&dir).await;
    let items = reloaded.items(&feed.id).await;
    assert!(items[0].read);
    assert!(items[0].favorite);

    // Toggling again flips favorite back off; read stays sticky.
    reloaded.toggle_favorite(&feed.id, "a").await;
    reloaded.mark_read(&feed.id, "a").await;
    let items = reloaded.items(&feed.id).await;
    assert!(items[0].read);
    assert!(!items[0].favorite);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn corrupt_main_file_falls_back_to_tmp_then_empty() {
    let dir = temp_dir("corrupt");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    // Corrupt main file, intact tmp file from an interrupted write.
    let feed = Feed::new("Recovered", "http://example.com/feed");
    tokio::fs::write(dir.join("feeds.json"), b"{ not json")
        .await
        .unwrap();
    tokio::fs::write(
        dir.join("feeds.json.tmp"),
        serde_json::to_vec_pretty(&vec![feed.clone()]).unwrap(),
    )
    .await
    .unwrap();

    let store = JsonStore::load_from_dir(&dir).await;
    let feeds = store.list_feeds().await;
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].name, "Recovered");

    // Both files corrupt: empty state, not a panic.
    tokio::fs::write(dir.join("feeds.json.tmp"), b"also bad")
        .await
        .unwrap();
    let store = JsonStore::load_from_dir(&dir).await;
    assert!(store.list_feeds().await.is_empty());

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn removing_a_feed_drops_only_that_feeds_state() {
    let dir = temp_dir("remove");

    let store = JsonStore::load_from_dir(&dir).await;
    let keep = Feed::new("Keep", "http://example.com/keep");
    let drop_me = Feed::new("Drop", "http://example.com/drop");
    store.upsert_feed(keep.clone()).await;
    store.upsert_feed(drop_me.clone()).await;
    store.put_items(&keep.id, vec![item(&keep.id, "k")]).await;
    store
        .put_items(&drop_me.id, vec![item(&drop_me.id, "d")])
        .await;

    store.remove_feed(&drop_me.id).await;
    store.remove_items(&drop_me.id).await;

    let reloaded = JsonStore::load_from_dir(&dir).await;
    assert_eq!(reloaded.list_feeds().await.len(), 1);
    assert!(reloaded.items(&drop_me.id).await.is_empty());
    assert_eq!(reloaded.items(&keep.id).await.len(), 1);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
