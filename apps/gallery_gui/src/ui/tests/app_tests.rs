use super::*;
use crossbeam_channel::bounded;
use shared::domain::Page;

use crate::media::PreviewImage;

fn test_app() -> (GalleryApp, Receiver<BackendCommand>, Sender<UiEvent>) {
    let (cmd_tx, cmd_rx) = bounded(64);
    let (ui_tx, ui_rx) = bounded(64);
    let app = GalleryApp::bootstrap(cmd_tx, ui_rx, StartupConfig::default());
    (app, cmd_rx, ui_tx)
}

fn image(id: &str) -> Image {
    Image {
        id: ImageId(id.to_string()),
        thumbnail_url: format!("https://images.example/{id}/small.jpg"),
        full_url: format!("https://images.example/{id}/regular.jpg"),
        description: Some(format!("photo {id}")),
        alt_description: None,
        author: Some("Ada".to_string()),
        width: Some(640),
        height: Some(480),
        likes: Some(3),
        created_at: None,
    }
}

fn page_of(ids: &[&str]) -> SearchResult {
    SearchResult {
        images: ids.iter().map(|id| image(id)).collect(),
        total: Some(40),
        total_pages: Some(2),
    }
}

fn expect_search(cmd_rx: &Receiver<BackendCommand>) -> FetchTicket {
    match cmd_rx.try_recv().expect("queued command") {
        BackendCommand::Search(ticket) => ticket,
        BackendCommand::FetchImage { .. } => panic!("expected search command"),
    }
}

fn drain_image_requests(cmd_rx: &Receiver<BackendCommand>) -> Vec<(String, ImagePurpose)> {
    let mut out = Vec::new();
    while let Ok(cmd) = cmd_rx.try_recv() {
        match cmd {
            BackendCommand::FetchImage {
                image_id, purpose, ..
            } => out.push((image_id.0, purpose)),
            BackendCommand::Search(_) => panic!("unexpected search command"),
        }
    }
    out
}

fn search_and_settle(
    app: &mut GalleryApp,
    cmd_rx: &Receiver<BackendCommand>,
    ui_tx: &Sender<UiEvent>,
    query: &str,
    ids: &[&str],
) {
    app.query_input = query.to_string();
    app.submit_search();
    let ticket = expect_search(cmd_rx);
    ui_tx
        .send(UiEvent::SearchSettled {
            seq: ticket.seq,
            outcome: Ok(page_of(ids)),
        })
        .expect("send settle");
    app.process_ui_events();
}

#[test]
fn submitting_a_query_queues_first_page_search() {
    let (mut app, cmd_rx, _ui_tx) = test_app();
    app.query_input = "  cats ".to_string();

    app.submit_search();

    let ticket = expect_search(&cmd_rx);
    assert_eq!(ticket.query.as_str(), "cats");
    assert_eq!(ticket.page, Page::FIRST);
    assert!(app.search.state().loading());
    assert_eq!(app.status, "Searching for \"cats\"...");
}

#[test]
fn first_page_result_replaces_gallery_and_requests_thumbnails() {
    let (mut app, cmd_rx, ui_tx) = test_app();

    search_and_settle(&mut app, &cmd_rx, &ui_tx, "cats", &["a", "b", "c"]);

    assert_eq!(app.search.state().images().len(), 3);
    let requested = drain_image_requests(&cmd_rx);
    assert_eq!(
        requested,
        vec![
            ("a".to_string(), ImagePurpose::Thumbnail),
            ("b".to_string(), ImagePurpose::Thumbnail),
            ("c".to_string(), ImagePurpose::Thumbnail),
        ]
    );
    assert!(app.thumbnails.values().all(ImageSlot::is_pending));
}

#[test]
fn load_more_requests_thumbnails_only_for_appended_images() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    search_and_settle(&mut app, &cmd_rx, &ui_tx, "cats", &["a", "b"]);
    drain_image_requests(&cmd_rx);

    app.load_more();
    let ticket = expect_search(&cmd_rx);
    assert_eq!(ticket.page.get(), 2);
    ui_tx
        .send(UiEvent::SearchSettled {
            seq: ticket.seq,
            outcome: Ok(page_of(&["c", "d"])),
        })
        .expect("send settle");
    app.process_ui_events();

    assert_eq!(app.search.state().images().len(), 4);
    let requested: Vec<String> = drain_image_requests(&cmd_rx)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(requested, vec!["c".to_string(), "d".to_string()]);
}

#[test]
fn stale_result_for_superseded_query_is_ignored() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    app.query_input = "cats".to_string();
    app.submit_search();
    let cats = expect_search(&cmd_rx);
    app.query_input = "dogs".to_string();
    app.submit_search();
    let dogs = expect_search(&cmd_rx);

    ui_tx
        .send(UiEvent::SearchSettled {
            seq: cats.seq,
            outcome: Ok(page_of(&["cat-1"])),
        })
        .expect("send settle");
    app.process_ui_events();

    assert!(app.search.state().images().is_empty());
    assert!(app.search.state().loading());
    assert!(drain_image_requests(&cmd_rx).is_empty());

    ui_tx
        .send(UiEvent::SearchSettled {
            seq: dogs.seq,
            outcome: Ok(page_of(&["dog-1"])),
        })
        .expect("send settle");
    app.process_ui_events();
    assert_eq!(app.search.state().images()[0].id.0, "dog-1");
}

#[test]
fn failed_load_more_shows_retryable_banner_and_retry_requests_same_page() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    search_and_settle(&mut app, &cmd_rx, &ui_tx, "cats", &["a"]);
    drain_image_requests(&cmd_rx);

    app.load_more();
    let failed = expect_search(&cmd_rx);
    ui_tx
        .send(UiEvent::SearchSettled {
            seq: failed.seq,
            outcome: Err(SearchError::transport("connection reset")),
        })
        .expect("send settle");
    app.process_ui_events();

    let banner = app.status_banner.clone().expect("error banner");
    assert!(banner.retryable);
    assert_eq!(app.search.state().images().len(), 1);

    app.retry();
    let retried = expect_search(&cmd_rx);
    assert_eq!(retried.page, failed.page);
    assert!(app.status_banner.is_none());
}

#[test]
fn unauthorized_failure_is_not_offered_for_retry() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    app.query_input = "cats".to_string();
    app.submit_search();
    let ticket = expect_search(&cmd_rx);

    ui_tx
        .send(UiEvent::SearchSettled {
            seq: ticket.seq,
            outcome: Err(SearchError::from_status(401, "OAuth error: invalid token")),
        })
        .expect("send settle");
    app.process_ui_events();

    let banner = app.status_banner.clone().expect("error banner");
    assert!(!banner.retryable);
    assert!(app.status.starts_with("Authentication error"));
}

#[test]
fn blank_query_clears_gallery_without_searching() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    search_and_settle(&mut app, &cmd_rx, &ui_tx, "cats", &["a"]);
    drain_image_requests(&cmd_rx);

    app.query_input = "   ".to_string();
    app.submit_search();

    assert!(cmd_rx.try_recv().is_err());
    assert!(app.search.state().images().is_empty());
    assert!(app.thumbnails.is_empty());
    assert!(app.search.state().query().is_none());
}

#[test]
fn disconnected_backend_cancels_the_ticket_and_reports_it() {
    let (cmd_tx, cmd_rx) = bounded(4);
    let (_ui_tx, ui_rx) = bounded(4);
    drop(cmd_rx);
    let mut app = GalleryApp::bootstrap(cmd_tx, ui_rx, StartupConfig::default());
    app.query_input = "cats".to_string();

    app.submit_search();

    assert!(!app.search.state().loading());
    assert!(app.search.in_flight().is_none());
    assert!(app.status_banner.is_some());
    assert!(app.status.contains("disconnected"));
}

#[test]
fn decoded_thumbnail_fills_its_slot_and_unknown_ids_are_dropped() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    search_and_settle(&mut app, &cmd_rx, &ui_tx, "cats", &["a"]);

    for id in ["a", "ghost"] {
        ui_tx
            .send(UiEvent::ImageLoaded {
                image_id: ImageId(id.to_string()),
                purpose: ImagePurpose::Thumbnail,
                image: PreviewImage {
                    width: 1,
                    height: 1,
                    rgba: vec![0, 0, 0, 255],
                },
            })
            .expect("send image");
    }
    app.process_ui_events();

    assert!(matches!(
        app.thumbnails.get(&ImageId("a".to_string())),
        Some(ImageSlot::Decoded(_))
    ));
    assert!(!app.thumbnails.contains_key(&ImageId("ghost".to_string())));
}

#[test]
fn opening_a_preview_fetches_the_full_image_once() {
    let (mut app, cmd_rx, ui_tx) = test_app();
    search_and_settle(&mut app, &cmd_rx, &ui_tx, "cats", &["a"]);
    drain_image_requests(&cmd_rx);

    app.open_preview(0);
    app.close_preview();
    app.open_preview(0);

    assert_eq!(
        drain_image_requests(&cmd_rx),
        vec![("a".to_string(), ImagePurpose::Preview)]
    );
    assert_eq!(
        app.selected.as_ref().map(|image| image.id.0.as_str()),
        Some("a")
    );
}

#[test]
fn startup_configuration_error_shows_banner_without_retry() {
    let (cmd_tx, _cmd_rx) = bounded(4);
    let (_ui_tx, ui_rx) = bounded(4);
    let app = GalleryApp::bootstrap(
        cmd_tx,
        ui_rx,
        StartupConfig {
            initial_query: None,
            startup_error: Some(SearchError::validation(
                "no access key configured; set UNSPLASH_ACCESS_KEY",
            )),
        },
    );

    let banner = app.status_banner.expect("startup banner");
    assert!(!banner.retryable);
    assert!(banner.message.contains("UNSPLASH_ACCESS_KEY"));
}

#[test]
fn initial_query_is_searched_on_startup() {
    let (cmd_tx, cmd_rx) = bounded(4);
    let (_ui_tx, ui_rx) = bounded(4);
    let app = GalleryApp::bootstrap(
        cmd_tx,
        ui_rx,
        StartupConfig {
            initial_query: Some("mountains".to_string()),
            startup_error: None,
        },
    );

    assert_eq!(expect_search(&cmd_rx).query.as_str(), "mountains");
    assert_eq!(app.query_input, "mountains");
}

#[test]
fn result_counter_prefers_reported_total() {
    assert_eq!(result_counter(0, Some(10)), None);
    assert_eq!(
        result_counter(20, Some(133)).as_deref(),
        Some("20 of 133 results")
    );
    assert_eq!(result_counter(5, None).as_deref(), Some("5 results"));
}

#[test]
fn worker_ready_notice_keeps_startup_error_on_status_line() {
    let (cmd_tx, _cmd_rx) = bounded(4);
    let (ui_tx, ui_rx) = bounded(4);
    let mut app = GalleryApp::bootstrap(
        cmd_tx,
        ui_rx,
        StartupConfig {
            initial_query: None,
            startup_error: Some(SearchError::validation("missing API access key")),
        },
    );

    ui_tx
        .send(UiEvent::Info("Ready".to_string()))
        .expect("send info");
    app.process_ui_events();

    assert!(app.status.contains("missing API access key"));
}

#[test]
fn worker_ready_notice_updates_idle_status_line() {
    let (mut app, _cmd_rx, ui_tx) = test_app();

    ui_tx
        .send(UiEvent::Info("Ready".to_string()))
        .expect("send info");
    app.process_ui_events();

    assert_eq!(app.status, "Ready");
}

#[test]
fn published_label_formats_date_in_requested_zone() {
    let created_at = chrono::Utc
        .with_ymd_and_hms(2016, 5, 3, 11, 0, 42)
        .single()
        .expect("timestamp");
    assert_eq!(
        published_label(created_at, &chrono::Utc),
        "Published May 3, 2016"
    );

    let tokyo = chrono::FixedOffset::east_opt(14 * 3600).expect("offset");
    assert_eq!(published_label(created_at, &tokyo), "Published May 4, 2016");
}
