//! Integration test: canned listing site, full walk plus download run.
//!
//! Starts a local HTTP server with two listing pages, three item detail
//! pages and their assets, then drives the walker and the download pipeline
//! against it end to end.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gsd_core::config::{ExtractorRules, GsdConfig};
use gsd_core::control::CancelFlag;
use gsd_core::fetch::{Fetcher, RetryPolicy};
use gsd_core::listing::{PaginationWalker, Termination, WalkError};
use gsd_core::pipeline::process_items;
use gsd_core::session::Session;
use tempfile::tempdir;

use common::site_server::{self, Response};

const UUID_A: &str = "aaaaaaaa-1111-2222-3333-444444444444";
const UUID_B: &str = "bbbbbbbb-1111-2222-3333-444444444444";
const UUID_C: &str = "cccccccc-1111-2222-3333-444444444444";
const UUID_D: &str = "dddddddd-1111-2222-3333-444444444444";
const UUID_E: &str = "eeeeeeee-1111-2222-3333-444444444444";

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn asset_url(base: &str, uuid: &str, variant: &str) -> String {
    format!(
        "{}cdn.cloudfront.net/casting_call/{}-{}.jpg",
        base, uuid, variant
    )
}

fn asset_target(uuid: &str, variant: &str) -> String {
    format!("/cdn.cloudfront.net/casting_call/{}-{}.jpg", uuid, variant)
}

/// Two listing pages, three items, five assets; one asset route answers an
/// HTML body instead of an image.
fn site_routes(base: &str) -> HashMap<String, Response> {
    let mut routes = HashMap::new();
    routes.insert(
        "/".to_string(),
        Response::html("<html>welcome</html>").with_cookie("sid=abc123; Path=/"),
    );
    routes.insert(
        "/list/".to_string(),
        Response::html(format!(
            r#"<html><body>
            <a href="/tal/jane-doe/">Jane Doe</a>
            <a href="/tal/john-roe/">John Roe</a>
            <a href="{}list/?page=2">Next &raquo;</a>
            </body></html>"#,
            base
        )),
    );
    routes.insert(
        "/list/?page=2".to_string(),
        Response::html(
            r#"<html><body>
            <a href="/tal/maria-ortiz/">Maria Ortiz</a>
            </body></html>"#,
        ),
    );
    // Jane: two photos; the first also appears as a thumbnail variant that
    // canonical selection must fold away.
    routes.insert(
        "/tal/jane-doe/".to_string(),
        Response::html(format!(
            r#"<html><body>
            <img src="{full_a}">
            <img src="{thumb_a}">
            <script>{{"photo":"{full_b}"}}</script>
            </body></html>"#,
            full_a = asset_url(base, UUID_A, "bWFpbi"),
            thumb_a = asset_url(base, UUID_A, "c3F1YXJlX3RodW1i"),
            full_b = asset_url(base, UUID_B, "bWFpbi"),
        )),
    );
    routes.insert(
        "/tal/john-roe/".to_string(),
        Response::html(format!(
            r#"<html><body>
            <img src="{good}">
            <img src="{bad}">
            </body></html>"#,
            good = asset_url(base, UUID_C, "bWFpbi"),
            bad = asset_url(base, UUID_D, "bWFpbi"),
        )),
    );
    routes.insert(
        "/tal/maria-ortiz/".to_string(),
        Response::html(format!(
            r#"<html><body><img src="{}"></body></html>"#,
            asset_url(base, UUID_E, "bWFpbi")
        )),
    );
    routes.insert(asset_target(UUID_A, "bWFpbi"), Response::png(png_bytes(150, 150)));
    routes.insert(asset_target(UUID_B, "bWFpbi"), Response::png(png_bytes(200, 120)));
    routes.insert(asset_target(UUID_C, "bWFpbi"), Response::png(png_bytes(150, 150)));
    // Blocked-style response: 200 with an HTML body where an image should be.
    routes.insert(
        asset_target(UUID_D, "bWFpbi"),
        Response::html("<html>verify you are human</html>".repeat(10)),
    );
    routes.insert(asset_target(UUID_E, "bWFpbi"), Response::png(png_bytes(150, 150)));
    routes
}

fn test_config(base: &str, dir: &std::path::Path) -> GsdConfig {
    let rules = ExtractorRules {
        site_prefix: base.trim_end_matches('/').to_string(),
        ..ExtractorRules::default()
    };
    GsdConfig {
        base_listing_url: format!("{}list/", base),
        session_url: base.to_string(),
        output_dir: dir.join("items"),
        items_file: dir.join("all_items.txt"),
        page_delay_secs: 0.0,
        timeout_secs: 5,
        max_attempts: 2,
        min_asset_bytes: 64,
        item_workers: 2,
        asset_workers: 2,
        rules,
        ..GsdConfig::default()
    }
}

fn make_fetcher(cfg: &GsdConfig) -> Fetcher {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let session = Arc::new(Session::new(cfg.session_url.clone(), timeout));
    let policy = RetryPolicy {
        max_attempts: cfg.max_attempts,
        base_delay: Duration::from_millis(10),
    };
    Fetcher::new(session, policy, timeout)
}

#[test]
fn walk_collects_items_across_pages() {
    let dir = tempdir().unwrap();
    let base = site_server::start(site_routes);
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let outcome = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap();
    assert_eq!(outcome.termination, Termination::Done);
    assert_eq!(outcome.pages_visited, 2);
    let names: Vec<&str> = outcome
        .items
        .iter()
        .map(|i| i.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Jane Doe", "John Roe", "Maria Ortiz"]);

    // Item list landed on disk with its header.
    let text = std::fs::read_to_string(&cfg.items_file).unwrap();
    assert!(text.starts_with("# gsd item list: 3 items"), "{}", text);
    assert!(text.contains("/tal/maria-ortiz | Maria Ortiz"));

    // The initial session refresh picked up the site cookie.
    assert_eq!(fetcher.session().cookie_header().as_deref(), Some("sid=abc123"));
}

#[test]
fn full_run_downloads_and_validates_assets() {
    let dir = tempdir().unwrap();
    let base = site_server::start(site_routes);
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let outcome = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap();
    let stats = process_items(outcome.items, &fetcher, &cfg, None);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.assets_found, 5);
    assert_eq!(stats.assets_downloaded, 4);
    assert_eq!(stats.assets_failed, 1);

    let jane = cfg.output_dir.join("jane-doe");
    assert!(jane.join("image_001.jpg").exists());
    assert!(jane.join("image_002.jpg").exists());

    // John's second asset failed validation: no file, no leftover partial.
    let john = cfg.output_dir.join("john-roe");
    assert!(john.join("image_001.jpg").exists());
    assert!(!john.join("image_002.jpg").exists());
    assert!(!john.join("image_002.jpg.part").exists());

    assert!(cfg.output_dir.join("maria-ortiz").join("image_001.jpg").exists());
}

#[test]
fn second_run_skips_items_with_assets_on_disk() {
    let dir = tempdir().unwrap();
    let base = site_server::start(site_routes);
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let outcome = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap();
    let first = process_items(outcome.items.clone(), &fetcher, &cfg, None);
    assert_eq!(first.succeeded, 3);

    let second = process_items(outcome.items, &fetcher, &cfg, None);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.processed, 0);
}

#[test]
fn self_referencing_next_link_trips_loop_guard() {
    let dir = tempdir().unwrap();
    let base = site_server::start(|base| {
        let mut routes = HashMap::new();
        routes.insert("/".to_string(), Response::html("<html>welcome</html>"));
        routes.insert(
            "/list/".to_string(),
            Response::html(format!(
                r#"<a href="/tal/only-one/">Only One</a> <a href="{}list/">Next</a>"#,
                base
            )),
        );
        routes
    });
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let outcome = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap();
    assert_eq!(outcome.termination, Termination::LoopDetected);
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(outcome.items.len(), 1);
}

#[test]
fn empty_later_page_ends_the_walk_cleanly() {
    let dir = tempdir().unwrap();
    let base = site_server::start(|base| {
        let mut routes = HashMap::new();
        routes.insert("/".to_string(), Response::html("<html>welcome</html>"));
        routes.insert(
            "/list/".to_string(),
            Response::html(format!(
                r#"<a href="/tal/jane-doe/">Jane Doe</a> <a href="{}list/?page=2">Next</a>"#,
                base
            )),
        );
        routes.insert(
            "/list/?page=2".to_string(),
            Response::html("<html><body>no items here</body></html>"),
        );
        routes
    });
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    // Page 2 stays empty even after the session-refresh retry: not an
    // error, just the end of the listing. Page 1's items survive.
    let outcome = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap();
    assert_eq!(outcome.termination, Termination::Done);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].display_name, "Jane Doe");
    let text = std::fs::read_to_string(&cfg.items_file).unwrap();
    assert!(text.starts_with("# gsd item list: 1 items"), "{}", text);
}

#[test]
fn zero_asset_item_is_recorded_failed_and_run_continues() {
    let dir = tempdir().unwrap();
    let base = site_server::start(|base| {
        let mut routes = site_routes(base);
        routes.insert(
            "/tal/camera-shy/".to_string(),
            Response::html("<html><body>no photos yet</body></html>"),
        );
        routes
    });
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let mut items = vec![gsd_core::listing::ItemReference {
        url: format!("{}tal/camera-shy/", base),
        display_name: "Camera Shy".to_string(),
    }];
    items.push(gsd_core::listing::ItemReference {
        url: format!("{}tal/maria-ortiz/", base),
        display_name: "Maria Ortiz".to_string(),
    });

    let stats = process_items(items, &fetcher, &cfg, None);
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed_items.len(), 1);
    assert_eq!(stats.failed_items[0].display_name, "Camera Shy");
    assert_eq!(stats.failed_items[0].cause, "no assets found");
    // the empty item left no directory artifacts behind
    assert!(!cfg.output_dir.join("camera-shy").exists());
}

#[test]
fn empty_first_page_is_a_hard_error() {
    let dir = tempdir().unwrap();
    let base = site_server::start(|_| {
        let mut routes = HashMap::new();
        routes.insert("/".to_string(), Response::html("<html>welcome</html>"));
        routes.insert(
            "/list/".to_string(),
            Response::html("<html><body>nothing here</body></html>"),
        );
        routes
    });
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let err = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap_err();
    assert!(matches!(err, WalkError::NoData(_)), "{:?}", err);
}

#[test]
fn page_cap_bounds_the_walk() {
    let dir = tempdir().unwrap();
    let base = site_server::start(site_routes);
    let cfg = GsdConfig {
        page_cap: Some(1),
        ..test_config(&base, dir.path())
    };
    let fetcher = make_fetcher(&cfg);

    let outcome = PaginationWalker::new(&fetcher, &cfg).walk(None).unwrap();
    assert_eq!(outcome.termination, Termination::PageCap);
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(outcome.items.len(), 2);
}

#[test]
fn preset_cancel_flag_stops_the_walk_immediately() {
    let dir = tempdir().unwrap();
    let base = site_server::start(site_routes);
    let cfg = test_config(&base, dir.path());
    let fetcher = make_fetcher(&cfg);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let outcome = PaginationWalker::new(&fetcher, &cfg)
        .walk(Some(&cancel))
        .unwrap();
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(outcome.pages_visited, 0);
    assert!(outcome.items.is_empty());
}
