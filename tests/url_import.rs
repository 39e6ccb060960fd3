use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use forge_import::fetch::FetchConfig;
use forge_import::model::ImportOptions;
use forge_import::pipeline::Importer;
use forge_import::ratelimit::FixedWindowLimiter;

const ARTICLE_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <title>Shepherding Through Seasons of Change | Forge Journal</title>
    <meta name="author" content="By Daniel Okafor" />
  </head>
  <body>
    <nav><a href="/">Home</a><a href="/archive">Archive</a></nav>
    <article>
      <h1>Shepherding Through Seasons of Change</h1>
      <p>Every congregation eventually walks through a season that reshapes it.
      The pastor who prepares the church before the season arrives will lead it
      through with far less damage than the one who reacts after the fact.</p>
      <p>"A church that cannot change is a church that has stopped listening."</p>
      <p><img src="/images/seasons.jpg" alt="Autumn trees" /></p>
      <p>Preparation begins with honest preaching about what transition costs
      and what it protects. Congregations follow leaders they trust, and trust
      is built long before the vote is called.</p>
    </article>
    <footer>Copyright Forge Journal</footer>
  </body>
</html>
"#;

struct StubServer {
    base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let (status, body, content_type) = match request.url() {
                    "/article" => (200, ARTICLE_HTML, "text/html; charset=utf-8"),
                    "/feed.json" => (200, r#"{"posts":[]}"#, "application/json"),
                    "/notes.txt" => (200, "plain notes, not markup", "text/plain; charset=utf-8"),
                    "/empty" => (200, "", "text/html"),
                    _ => (404, "not found", "text/html"),
                };

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    content_type.as_bytes(),
                )
                .expect("build header");
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn local_importer() -> Importer {
    let fetch_config = FetchConfig {
        allow_local_hosts: true,
        ..FetchConfig::default()
    };
    Importer::new(fetch_config, None, Arc::new(FixedWindowLimiter::hourly()))
}

#[tokio::test(flavor = "multi_thread")]
async fn url_import_extracts_article_body_and_images() {
    let server = StubServer::spawn();
    let importer = local_importer();
    let options = ImportOptions::default();

    let doc = importer
        .import_from_url("tester", &format!("{}/article", server.base_url), &options)
        .await
        .expect("import article");

    assert_eq!(doc.title, "Shepherding Through Seasons of Change");
    assert_eq!(doc.author.as_deref(), Some("Daniel Okafor"));
    assert!(doc.body.contains("Every congregation eventually walks"));
    assert!(!doc.body.contains("Copyright Forge Journal"));
    assert!(!doc.body.contains("Archive"));

    assert_eq!(doc.images.len(), 1);
    assert_eq!(
        doc.images[0].url,
        format!("{}/images/seasons.jpg", server.base_url)
    );
    assert_eq!(doc.images[0].alt.as_deref(), Some("Autumn trees"));

    assert!(doc.excerpt.is_some());
    assert!(!doc.categories.is_empty());
    assert!(doc.metadata.word_count > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn url_import_reports_http_failures() {
    let server = StubServer::spawn();
    let importer = local_importer();
    let options = ImportOptions::default();

    let err = importer
        .import_from_url("tester", &format!("{}/missing", server.base_url), &options)
        .await
        .expect_err("404 must fail");
    assert_eq!(err.code(), "fetch_failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn url_import_rejects_non_html_content_type() {
    let server = StubServer::spawn();
    let importer = local_importer();
    let options = ImportOptions::default();

    let err = importer
        .import_from_url(
            "tester",
            &format!("{}/feed.json", server.base_url),
            &options,
        )
        .await
        .expect_err("json response must be refused");
    assert_eq!(err.code(), "unsupported_type");

    let err = importer
        .import_from_url(
            "tester",
            &format!("{}/notes.txt", server.base_url),
            &options,
        )
        .await
        .expect_err("plain text over the url path must be refused");
    assert_eq!(err.code(), "unsupported_type");
}

#[tokio::test(flavor = "multi_thread")]
async fn url_import_rejects_empty_pages() {
    let server = StubServer::spawn();
    let importer = local_importer();
    let options = ImportOptions::default();

    let err = importer
        .import_from_url("tester", &format!("{}/empty", server.base_url), &options)
        .await
        .expect_err("empty body must be refused");
    assert_eq!(err.code(), "empty_content");
}

#[tokio::test(flavor = "multi_thread")]
async fn default_config_refuses_local_hosts() {
    let server = StubServer::spawn();
    let importer = Importer::new(
        FetchConfig::default(),
        None,
        Arc::new(FixedWindowLimiter::hourly()),
    );
    let options = ImportOptions::default();

    let err = importer
        .import_from_url("tester", &format!("{}/article", server.base_url), &options)
        .await
        .expect_err("loopback must be refused by default");
    assert_eq!(err.code(), "url_local_host");
}
