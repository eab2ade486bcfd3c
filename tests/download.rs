//! End-to-end download tests over a real socket.

use std::time::Instant;

use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn serves_signed_file_with_download_headers() {
    let server = common::spawn_server(|_| {}).await;
    server.write_file("reports/q1.pdf", b"%PDF-1.4 quarterly");

    let res = reqwest::get(server.url(&server.link("reports/q1.pdf", 0)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers().clone();
    assert_eq!(headers["content-type"], "application/pdf");
    assert_eq!(headers["content-disposition"], "attachment; filename=q1.pdf");
    assert_eq!(headers["expires"], "Thu, 19 Nov 1981 08:52:00 GMT");
    assert_eq!(headers["pragma"], "no-cache");
    assert!(headers["cache-control"].to_str().unwrap().contains("no-store"));
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"%PDF-1.4 quarterly");
}

#[tokio::test]
async fn query_string_is_ignored() {
    let server = common::spawn_server(|_| {}).await;
    server.write_file("a.txt", b"a");

    let url = format!("{}?utm_source=mail#top", server.url(&server.link("a.txt", 5)));
    let res = reqwest::get(url).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn names_with_spaces_and_unicode_round_trip() {
    let server = common::spawn_server(|_| {}).await;
    server.write_file("docs/résumé final.txt", b"cv");

    let res = reqwest::get(server.url(&server.link("docs/résumé final.txt", 0)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("filename*=UTF-8''r%C3%A9sum%C3%A9%20final%2Etxt"));
}

#[tokio::test]
async fn each_rejection_class_has_its_status() {
    let server = common::spawn_server(|_| {}).await;
    server.write_file("a.txt", b"a");

    let expired = server.link("a.txt", 3600);
    let missing = server.link("nope.txt", 0);
    let directory = {
        server.write_file("dir/inner.txt", b"x");
        server.link("dir", 0)
    };
    let forged = server.link("a.txt", 0).replace("/a.txt", "/b.txt");

    let client = reqwest::Client::new();
    let cases = [
        (expired.as_str(), StatusCode::GONE),
        (missing.as_str(), StatusCode::NOT_FOUND),
        (directory.as_str(), StatusCode::NOT_FOUND),
        (forged.as_str(), StatusCode::FORBIDDEN),
        ("/dl/abc", StatusCode::BAD_REQUEST),
        ("/elsewhere/abc/ff/a.txt", StatusCode::FORBIDDEN),
    ];
    for (path, status) in cases {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), status, "{path}");
    }
}

#[tokio::test]
async fn error_pages_do_not_leak_details() {
    let server = common::spawn_server(|config| config.download.server = "files/2".into()).await;

    let res = reqwest::get(server.url("/dl/0123/ff/secret-plan.txt")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.headers()["server"], "files/2");
    assert_eq!(res.headers()["content-type"], "text/html");
    let body = res.text().await.unwrap();
    assert!(!body.contains("secret-plan"));
    assert!(!body.contains(common::SECRET));
}

#[tokio::test]
async fn raw_traversal_and_bad_encoding_are_refused() {
    let server = common::spawn_server(|_| {}).await;
    server.write_file("a.txt", b"a");

    assert_eq!(common::raw_get(server.addr, "/dl/../etc/passwd").await, 403);
    assert_eq!(common::raw_get(server.addr, "/dl/abc/ff/../../a.txt").await, 403);
    assert_eq!(common::raw_get(server.addr, "/dl/abc/ff/%2e%2e/a.txt").await, 403);
    // Decodes to `dl/../a.txt`: after the prefix only two fields remain.
    assert_eq!(common::raw_get(server.addr, "/dl/%2e%2e/a.txt").await, 400);
    assert_eq!(common::raw_get(server.addr, "/dl/abc/ff/%zz").await, 400);

    // A signed link still works over the same path.
    let link = server.link("a.txt", 0);
    assert_eq!(common::raw_get(server.addr, &link).await, 200);
}

#[tokio::test]
async fn empty_prefix_serves_from_site_root() {
    let server = common::spawn_server(|config| config.download.uri_prefix = String::new()).await;
    server.write_file("a.txt", b"a");

    let link = server.link("a.txt", 0);
    assert!(!link.starts_with("/dl/"));
    let res = reqwest::get(server.url(&link)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn concurrent_downloads() {
    let server = common::spawn_server(|_| {}).await;
    let payload = vec![b'x'; 256 * 1024];
    server.write_file("big.bin", &payload);
    let url = server.url(&server.link("big.bin", 0));

    let concurrency = 16;
    let requests_per_task = 8;
    let client = reqwest::Client::new();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let mut ok = 0;
            for _ in 0..requests_per_task {
                let res = client.get(&url).send().await.unwrap();
                if res.status() == StatusCode::OK && res.bytes().await.unwrap().len() == 256 * 1024 {
                    ok += 1;
                }
            }
            ok
        }));
    }

    let mut total = 0;
    for task in tasks {
        total += task.await.unwrap();
    }
    println!(
        "{} downloads in {:?}",
        concurrency * requests_per_task,
        start.elapsed()
    );
    assert_eq!(total, concurrency * requests_per_task);
}
