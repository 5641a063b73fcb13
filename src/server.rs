//! HTTP endpoint serving the annotated stream as multipart JPEG.

use std::ops::ControlFlow;
use std::sync::Arc;

use actix_web::web::Bytes;
use actix_web::{App, HttpResponse, HttpServer, http::header, web};
use async_stream::stream;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info};

use crate::config::Config;
use crate::pipeline::{FilePipeline, open_file_pipeline};
use crate::render::Renderer;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head><title>trackstat</title></head>
  <body style="margin:0;background:#111">
    <img src="/stream" style="max-width:100%" alt="annotated stream">
  </body>
</html>
"#;

struct ServerState {
    config: Arc<Config>,
    renderer: Arc<Renderer>,
    /// Held by the worker of the run currently streaming
    run_lock: Arc<Mutex<()>>,
}

/// Serve `/` and `/stream` until the server is stopped.
pub async fn serve(config: Config, renderer: Arc<Renderer>) -> std::io::Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let state = web::Data::new(ServerState {
        config: Arc::new(config),
        renderer,
        run_lock: Arc::new(Mutex::new(())),
    });

    info!("Annotated stream available at http://{host}:{port}/ and /stream");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index_route))
        .route("/stream", web::get().to(stream_handler));
}

/// One multipart part: boundary, JPEG header, payload.
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let mut payload = Vec::with_capacity(jpeg.len() + 64);
    payload.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    payload.extend_from_slice(jpeg);
    payload.extend_from_slice(b"\r\n");
    Bytes::from(payload)
}

async fn index_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

async fn stream_handler(state: web::Data<ServerState>) -> HttpResponse {
    // every run overwrites the same log, so runs do not overlap
    let guard = match Arc::clone(&state.run_lock).try_lock_owned() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::Conflict().body("a run is already streaming"),
    };

    // directory listing, track parsing and log creation all block
    let config = Arc::clone(&state.config);
    let renderer = Arc::clone(&state.renderer);
    let opened = web::block(move || open_file_pipeline(&config, renderer)).await;
    let pipeline = match opened {
        Ok(Ok(pipeline)) => pipeline,
        Ok(Err(err)) => {
            error!("Failed to start run: {err}");
            return HttpResponse::InternalServerError().body(err.to_string());
        }
        Err(err) => {
            error!("Failed to start run: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // capacity 1: a frame is handed off before the next one is read
    let (tx, mut rx) = mpsc::channel::<Bytes>(1);
    let spawned = std::thread::Builder::new()
        .name("trackstat-run".into())
        .spawn(move || {
            let _guard = guard;
            run_to_channel(pipeline, tx);
        });
    if let Err(err) = spawned {
        error!("Failed to spawn run worker: {err}");
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    let body = stream! {
        while let Some(part) = rx.recv().await {
            yield Ok::<Bytes, actix_web::Error>(part);
        }
    };

    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .content_type("multipart/x-mixed-replace; boundary=frame")
        .streaming(body)
}

fn run_to_channel(mut pipeline: FilePipeline, tx: mpsc::Sender<Bytes>) {
    let result = pipeline.run(|frame| match tx.blocking_send(multipart_part(&frame.jpeg)) {
        Ok(()) => ControlFlow::Continue(()),
        Err(_) => {
            info!("Client disconnected at frame {}", frame.index);
            ControlFlow::Break(())
        }
    });

    match result {
        Ok(summary) => info!(
            "Run complete: {} frame(s), {} unique object(s), regions {:?}",
            summary.frames, summary.unique_objects, summary.region_counts
        ),
        Err(err) => error!("Run failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::test;
    use image::{Rgb, RgbImage};

    use super::*;

    #[::core::prelude::v1::test]
    fn test_multipart_part_layout() {
        let part = multipart_part(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let mut expected = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(part.as_ref(), expected.as_slice());
    }

    /// Three frames with object 1 in every one of them.
    fn sample_state(root: &std::path::Path) -> ServerState {
        let frames = root.join("frames");
        std::fs::create_dir_all(&frames).unwrap();
        for i in 1..=3 {
            RgbImage::from_pixel(64, 48, Rgb([30, 30, 30]))
                .save(frames.join(format!("{i:06}.png")))
                .unwrap();
        }
        std::fs::write(
            root.join("tracks.txt"),
            "1,1,10,10,8,8,1\n2,1,14,10,8,8,1\n3,1,18,10,8,8,1\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.input.frames_dir = frames;
        config.input.tracks_file = root.join("tracks.txt");
        config.output.log_path = root.join("object_stats.csv");
        config.output.flush_every = 1;
        ServerState {
            config: Arc::new(config),
            renderer: Arc::new(Renderer::new(None, 20.0, 60)),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn wait_for_idle(run_lock: &Mutex<()>) {
        for _ in 0..200 {
            if run_lock.try_lock().is_ok() {
                return;
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run worker did not release the lock");
    }

    #[actix_web::test]
    async fn test_stream_runs_one_at_a_time() {
        let root = tempfile::tempdir().unwrap();
        let state = sample_state(root.path());
        let run_lock = Arc::clone(&state.run_lock);
        let log_path = state.config.output.log_path.clone();
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let first = test::call_service(&app, test::TestRequest::get().uri("/stream").to_request())
            .await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            first.headers().get(header::CONTENT_TYPE).unwrap(),
            "multipart/x-mixed-replace; boundary=frame"
        );

        let second = test::call_service(&app, test::TestRequest::get().uri("/stream").to_request())
            .await;
        assert_eq!(second.status(), StatusCode::CONFLICT);

        // client goes away without reading: the run stops and the log is closed
        drop(first);
        wait_for_idle(&run_lock).await;
        let log = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines[0], "timestamp,frame_id,object_id,region,speed_kmph");
        assert!(lines.len() >= 2 && lines.len() < 4);

        let third = test::call_service(&app, test::TestRequest::get().uri("/stream").to_request())
            .await;
        assert_eq!(third.status(), StatusCode::OK);
        let body = test::read_body(third).await;
        assert!(body.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n\xFF\xD8"));
        assert_eq!(
            body.windows(b"--frame".len())
                .filter(|w| *w == b"--frame")
                .count(),
            3
        );

        wait_for_idle(&run_lock).await;
        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.lines().count(), 4);
    }

    #[actix_web::test]
    async fn test_stream_start_failure_is_server_error() {
        let root = tempfile::tempdir().unwrap();
        let mut state = sample_state(root.path());
        let mut config = (*state.config).clone();
        config.input.tracks_file = root.path().join("missing.txt");
        state.config = Arc::new(config);
        let run_lock = Arc::clone(&state.run_lock);
        let app =
            test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/stream").to_request())
            .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // the failed start does not hold the run lock
        assert!(run_lock.try_lock().is_ok());
    }
}
