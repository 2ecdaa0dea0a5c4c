//! Static file server with on-demand post generation
//!
//! Serves the generated public directory. A post route with no generated
//! artifact enters the detail rendering state machine: the slug is
//! resolved against the content source while the client sees a transient
//! loading page; once the artifact exists the route serves it like any
//! other static file.

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use crate::cms::{is_valid_slug, CmsClient, CmsError, ContentSource};
use crate::generator::Generator;
use crate::Voyager;

/// Server state
struct ServerState {
    public_dir: PathBuf,
    source: CmsClient,
    generator: Generator,
    loading_html: String,
    /// At most one on-demand resolution runs at a time
    resolve_lock: Mutex<()>,
}

/// What a post route renders
enum DetailView {
    /// The generated artifact
    Ready(String),
    /// Transient fallback while the slug resolves
    Loading,
}

/// Start the server
pub async fn start(app: &Voyager, ip: &str, port: u16, open: bool) -> Result<()> {
    let generator = Generator::new(app)?;
    let loading_html = generator.render_loading_page()?;

    let state = Arc::new(ServerState {
        public_dir: app.public_dir.clone(),
        source: CmsClient::new(&app.config.api),
        generator,
        loading_html,
        resolve_lock: Mutex::new(()),
    });

    let router = Router::new().fallback(fallback_handler).with_state(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Fallback handler that serves files and resolves missing post pages
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    if let Some(slug) = post_slug(request.uri().path()) {
        let file = artifact_path(&state.public_dir, &slug);
        if !file.exists() {
            return match resolve_post(&state, &slug).await {
                DetailView::Ready(html) => Html(html).into_response(),
                DetailView::Loading => Html(state.loading_html.clone()).into_response(),
            };
        }
    }

    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Resolve a not-yet-generated slug against the content source
///
/// Not-found and fetch failures both leave the client on the loading
/// page; no hard error is surfaced for a post route.
async fn resolve_post(state: &ServerState, slug: &str) -> DetailView {
    let _guard = state.resolve_lock.lock().await;

    // Another request may have resolved this slug while we waited
    let file = artifact_path(&state.public_dir, slug);
    if let Ok(html) = tokio::fs::read_to_string(&file).await {
        return DetailView::Ready(html);
    }

    match state.source.get_by_slug(slug).await {
        Ok(post) => match state.generator.generate_post_page(&post) {
            Ok(()) => match tokio::fs::read_to_string(&file).await {
                Ok(html) => {
                    tracing::info!("Generated post `{}` on demand", slug);
                    DetailView::Ready(html)
                }
                Err(e) => {
                    tracing::error!("Generated `{}` but could not read it back: {}", slug, e);
                    DetailView::Loading
                }
            },
            Err(e) => {
                tracing::error!("On-demand generation of `{}` failed: {}", slug, e);
                DetailView::Loading
            }
        },
        Err(CmsError::NotFound(_)) => {
            tracing::debug!("Post `{}` not available yet", slug);
            DetailView::Loading
        }
        Err(e) => {
            tracing::warn!("On-demand fetch of `{}` failed: {}", slug, e);
            DetailView::Loading
        }
    }
}

fn artifact_path(public_dir: &std::path::Path, slug: &str) -> PathBuf {
    public_dir.join("post").join(slug).join("index.html")
}

/// Extract the slug of a `/post/<slug>/` route
fn post_slug(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/post/")?;
    let slug = rest.trim_end_matches("index.html").trim_end_matches('/');
    if slug.contains('/') || !is_valid_slug(slug) {
        return None;
    }
    Some(slug.to_string())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
