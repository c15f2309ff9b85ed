// tests/preview_server.rs

use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use sitepipe::serve::http::{
    content_type, inject_reload_script, parse_request_line, resolve_path, LIVERELOAD_PATH,
    LIVERELOAD_SCRIPT,
};
use sitepipe::serve::PreviewServer;
use sitepipe_test_utils::fixture::SiteFixture;
use sitepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn output_tree() -> SiteFixture {
    let site = SiteFixture::empty();
    site.write("_site/index.html", "<html><body><p>home</p></body></html>");
    site.write("_site/about/index.html", "<p>about</p>");
    site.write("_site/css/main.css", "body{margin:0}");
    site.write("_site/a b.txt", "spaced");
    site.write("secret.txt", "keep out");
    site
}

#[test]
fn request_line_yields_method_and_path() {
    assert_eq!(
        parse_request_line("GET /a.html?x=1 HTTP/1.1\r\nHost: localhost\r\n\r\n"),
        Some(("GET", "/a.html"))
    );
    assert_eq!(parse_request_line("HEAD /#top HTTP/1.1"), Some(("HEAD", "/")));
    assert_eq!(parse_request_line(""), None);
    assert_eq!(parse_request_line("GET"), None);
}

#[test]
fn urls_map_onto_files_under_the_output_root() {
    let site = output_tree();
    let root = site.path("_site");

    assert_eq!(resolve_path(&root, "/"), Some(root.join("index.html")));
    assert_eq!(resolve_path(&root, "/about/"), Some(root.join("about/index.html")));
    assert_eq!(resolve_path(&root, "/about"), Some(root.join("about/index.html")));
    assert_eq!(resolve_path(&root, "/css/main.css"), Some(root.join("css/main.css")));
    assert_eq!(resolve_path(&root, "/a%20b.txt"), Some(root.join("a b.txt")));
    assert_eq!(resolve_path(&root, "/missing.html"), None);
    assert_eq!(resolve_path(&root, "/css"), None);
}

#[test]
fn parent_directory_escapes_are_refused() {
    let site = output_tree();
    let root = site.path("_site");

    assert_eq!(resolve_path(&root, "/../secret.txt"), None);
    assert_eq!(resolve_path(&root, "/css/../../secret.txt"), None);
    assert_eq!(resolve_path(&root, "/%2e%2e/secret.txt"), None);
    assert_eq!(resolve_path(&root, "/%zz"), None);
}

#[test]
fn reload_script_goes_before_the_closing_body_tag() {
    let page = inject_reload_script("<html><body><p>x</p></BODY></html>");
    assert_eq!(
        page,
        format!("<html><body><p>x</p>{LIVERELOAD_SCRIPT}</BODY></html>")
    );

    let fragment = inject_reload_script("<p>x</p>");
    assert_eq!(fragment, format!("<p>x</p>{LIVERELOAD_SCRIPT}"));
}

#[test]
fn content_types_follow_extensions() {
    assert_eq!(content_type(Path::new("a.HTML")), "text/html; charset=utf-8");
    assert_eq!(content_type(Path::new("sw.js")), "application/javascript");
    assert_eq!(content_type(Path::new("logo.png")), "image/png");
    assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
}

async fn request(addr: SocketAddr, raw: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(raw.as_bytes()).await?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn read_until(stream: &mut TcpStream, needle: &str) -> std::io::Result<String> {
    let mut seen = String::new();
    let mut buf = [0u8; 1024];
    while !seen.contains(needle) {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        seen.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    Ok(seen)
}

#[tokio::test]
async fn server_serves_pages_with_the_reload_client() -> TestResult {
    init_tracing();
    let site = output_tree();
    let server = PreviewServer::bind(site.path("_site"), 0).await?;
    let addr = server.local_addr()?;
    let handle = tokio::spawn(server.run());

    let page = with_timeout(request(addr, "GET / HTTP/1.1\r\nHost: x\r\n\r\n")).await?;
    assert!(page.starts_with("HTTP/1.1 200 OK"));
    assert!(page.contains("Content-Type: text/html; charset=utf-8"));
    assert!(page.contains(&format!("<p>home</p>{LIVERELOAD_SCRIPT}</body>")));

    let css = with_timeout(request(addr, "GET /css/main.css HTTP/1.1\r\n\r\n")).await?;
    assert!(css.ends_with("\r\n\r\nbody{margin:0}"));

    let missing = with_timeout(request(addr, "GET /nope HTTP/1.1\r\n\r\n")).await?;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found"));

    let escape = with_timeout(request(addr, "GET /../secret.txt HTTP/1.1\r\n\r\n")).await?;
    assert!(escape.starts_with("HTTP/1.1 404 Not Found"));

    let post = with_timeout(request(addr, "POST / HTTP/1.1\r\n\r\n")).await?;
    assert!(post.starts_with("HTTP/1.1 405"));

    let head = with_timeout(request(addr, "HEAD /css/main.css HTTP/1.1\r\n\r\n")).await?;
    assert!(head.contains("Content-Length: 14"));
    assert!(head.ends_with("\r\n\r\n"));

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn connected_pages_receive_reload_events() -> TestResult {
    init_tracing();
    let site = output_tree();
    let server = PreviewServer::bind(site.path("_site"), 0).await?;
    let addr = server.local_addr()?;
    let reload = server.reload_handle();
    let handle = tokio::spawn(server.run());

    let mut stream = TcpStream::connect(addr).await?;
    stream
        .write_all(format!("GET {LIVERELOAD_PATH} HTTP/1.1\r\n\r\n").as_bytes())
        .await?;
    let head = with_timeout(read_until(&mut stream, ": connected")).await?;
    assert!(head.contains("Content-Type: text/event-stream"));

    assert_eq!(reload.notify(), 1);
    let event = with_timeout(read_until(&mut stream, "event: reload")).await?;
    assert!(event.contains("event: reload\ndata: {}\n\n"));

    handle.abort();
    Ok(())
}
