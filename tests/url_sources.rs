//! Loading images over HTTP
//!
//! A loopback server answers a fixed sequence of requests so the fetch path
//! runs without external network access.

use bgswap::{BgSwapError, ImageHandler, ImageSource, OutputFormat, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 255])));
    ImageHandler::new(image).to_bytes(OutputFormat::Png, 90).unwrap()
}

/// Serve one reply per connection, in order, then stop
fn serve(replies: Vec<Reply>) -> (String, JoinHandle<()>) {
    // Loopback must never be routed through a proxy from the environment
    std::env::set_var("NO_PROXY", "127.0.0.1");
    std::env::set_var("no_proxy", "127.0.0.1");

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        for reply in replies {
            let (mut stream, _) = listener.accept().unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reply.status,
                reply.content_type,
                reply.body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&reply.body).unwrap();
            stream.flush().unwrap();
        }
    });

    (base, handle)
}

#[test]
fn test_fetch_decodes_and_stores_then_reports_not_found() -> Result<()> {
    let (base, server) = serve(vec![
        Reply { status: "200 OK", content_type: "image/png", body: png_bytes(7, 5) },
        Reply { status: "404 Not Found", content_type: "text/plain", body: b"missing".to_vec() },
    ]);
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("downloads").join("fetched.png");

    let handler = ImageHandler::from_url(&format!("{base}/photo.png"), Some(&store_path))?;
    assert_eq!(handler.dimensions(), (7, 5));

    assert!(store_path.exists());
    let stored = ImageHandler::from_path(&store_path)?;
    assert_eq!(stored.image().to_rgba8(), handler.image().to_rgba8());

    let err = ImageHandler::from_url(&format!("{base}/gone.png"), None).unwrap_err();
    assert!(matches!(err, BgSwapError::Io(_)), "got {err:?}");
    assert!(err.to_string().contains("gone.png"));

    server.join().unwrap();
    Ok(())
}

#[test]
fn test_open_url_source_without_store_path() -> Result<()> {
    let (base, server) = serve(vec![Reply {
        status: "200 OK",
        content_type: "image/png",
        body: png_bytes(3, 4),
    }]);

    let source = ImageSource::from_location(&format!("{base}/cat.png"));
    assert!(matches!(source, ImageSource::Url { store_path: None, .. }));

    let handler = ImageHandler::open(source)?;
    assert_eq!(handler.dimensions(), (3, 4));

    server.join().unwrap();
    Ok(())
}

#[test]
fn test_non_image_body_is_decode_error() {
    let (base, server) = serve(vec![Reply {
        status: "200 OK",
        content_type: "text/html",
        body: b"<html>not an image</html>".to_vec(),
    }]);

    let err = ImageHandler::from_url(&format!("{base}/page.html"), None).unwrap_err();
    assert!(matches!(err, BgSwapError::Decode(_)), "got {err:?}");

    server.join().unwrap();
}
