//! Preview server for a generated guide
//!
//! Serves the public dir under the configured site root. With watching on,
//! content edits are regenerated incrementally and open pages are told over a
//! websocket which module URLs changed, so only affected tabs reload.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeFile;

use crate::cache::CACHE_DIR;
use crate::commands::generate;
use crate::config::SiteConfig;
use crate::generator::GeneratedPages;
use crate::helpers::url_for;
use crate::{Guide, CONFIG_FILE};

const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Reloads a page when its own URL, or everything, was regenerated
const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(function() {
    var here = location.pathname.replace(/index\.html$/, '');
    if (here.slice(-1) !== '/') here += '/';
    function connect() {
        var ws = new WebSocket('ws://' + location.host + '/__livereload');
        ws.onmessage = function(msg) {
            var notice = JSON.parse(msg.data);
            if (notice.full || notice.pages.indexOf(here) !== -1) location.reload();
        };
        ws.onclose = function() { setTimeout(connect, 1000); };
    }
    connect();
})();
</script>
"#;

/// What a live reload client is told after a regeneration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadNotice {
    pub full: bool,
    /// Site URLs of the pages that were rewritten or removed
    pub pages: Vec<String>,
}

impl ReloadNotice {
    pub fn from_pages(config: &SiteConfig, generated: &GeneratedPages) -> Self {
        let mut pages: Vec<String> = generated
            .paths
            .iter()
            .map(|path| url_for(config, path))
            .collect();
        pages.sort();
        pages.dedup();
        Self {
            full: generated.full,
            pages,
        }
    }
}

struct ServerState {
    public_dir: PathBuf,
    root: String,
    reload_tx: broadcast::Sender<Arc<ReloadNotice>>,
    live_reload: bool,
}

/// Serve the guide, optionally regenerating and reloading on change
pub async fn start(guide: &Guide, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let (reload_tx, _) = broadcast::channel(16);

    let state = Arc::new(ServerState {
        public_dir: guide.public_dir.clone(),
        root: guide.config.root.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: watch,
    });

    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(livereload_handler))
        .fallback(serve_page)
        .with_state(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, url_for(&guide.config, ""));
    println!("Guide available at {}", url);
    if watch {
        println!("Watching {:?} for changes", guide.content_dir);
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let base_dir = guide.base_dir.clone();
        // The debouncer channel blocks, so the watcher gets its own thread
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_regenerate(base_dir, reload_tx) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Regenerate incrementally on content or config edits and notify clients
fn watch_and_regenerate(
    base_dir: PathBuf,
    reload_tx: broadcast::Sender<Arc<ReloadNotice>>,
) -> Result<()> {
    let guide = Guide::new(&base_dir)?;
    let config_path = base_dir.join(CONFIG_FILE);

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(300), tx)?;
    if guide.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&guide.content_dir, RecursiveMode::Recursive)?;
    }
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };
        let changed: Vec<&Path> = events
            .iter()
            .map(|e| e.path.as_path())
            .filter(|path| is_relevant(path, &base_dir))
            .collect();
        if changed.is_empty() {
            continue;
        }
        for path in &changed {
            tracing::info!("Changed: {}", path.display());
        }

        // A fresh Guide picks up config edits
        let outcome = Guide::new(&base_dir).and_then(|guide| {
            let generated = generate::run_with_options(&guide, false)?;
            Ok(ReloadNotice::from_pages(&guide.config, &generated))
        });
        match outcome {
            Ok(notice) if notice.full || !notice.pages.is_empty() => {
                tracing::info!("Regenerated {} pages", notice.pages.len());
                let _ = reload_tx.send(Arc::new(notice));
            }
            Ok(_) => tracing::debug!("Nothing to regenerate"),
            Err(e) => tracing::error!("Generation failed: {}", e),
        }
    }

    Ok(())
}

/// Ignore editor backups and VCS or cache churn inside the site
fn is_relevant(path: &Path, base_dir: &Path) -> bool {
    let path = path.strip_prefix(base_dir).unwrap_or(path);
    let hidden = path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name.starts_with('.') && name != "." && name != ".."
    });
    let name = path.to_string_lossy();
    !hidden && !name.contains(CACHE_DIR) && !name.ends_with('~')
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let notices = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| forward_notices(socket, notices))
}

/// Push each reload notice to one client as JSON until either side goes away
async fn forward_notices(
    mut socket: WebSocket,
    mut notices: broadcast::Receiver<Arc<ReloadNotice>>,
) {
    loop {
        tokio::select! {
            notice = notices.recv() => {
                let notice = match notice {
                    Ok(notice) => notice,
                    Err(broadcast::error::RecvError::Lagged(_)) => Arc::new(ReloadNotice {
                        full: true,
                        pages: Vec::new(),
                    }),
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Ok(text) = serde_json::to_string(notice.as_ref()) else {
                    continue;
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
        }
    }
}

/// Serve a generated page or asset, injecting the reload script into pages
async fn serve_page(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let Some(file) = resolve_page(&state.public_dir, &state.root, request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "No such page in this guide").into_response();
    };

    let is_page = file.extension().map_or(false, |ext| ext == "html");
    if is_page && state.live_reload {
        return match tokio::fs::read_to_string(&file).await {
            Ok(html) => Html(inject_live_reload(&html)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "No such page in this guide").into_response(),
        };
    }

    match ServeFile::new(&file).try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Map a request path under the site root to a file in the public dir
///
/// Module URLs are directories (`/silver/binary-search/`) and resolve to
/// their `index.html`. Paths outside the root or containing `..` resolve
/// to nothing.
fn resolve_page(public_dir: &Path, root: &str, request_path: &str) -> Option<PathBuf> {
    let prefix = root.trim_matches('/');
    let path = request_path.trim_start_matches('/');
    let relative = if prefix.is_empty() {
        path
    } else if path == prefix {
        ""
    } else {
        path.strip_prefix(prefix)?.strip_prefix('/')?
    };

    if relative.split('/').any(|segment| segment == "..") {
        return None;
    }

    let candidate = public_dir.join(relative);
    let file = if candidate.is_dir() {
        candidate.join("index.html")
    } else {
        candidate
    };
    file.is_file().then_some(file)
}

/// Insert the reload script before the last `</body>`, or append it
fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + LIVE_RELOAD_SCRIPT.len());
            out.push_str(&html[..pos]);
            out.push_str(LIVE_RELOAD_SCRIPT);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
    }
}

fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    std::process::Command::new("open").arg(url).spawn()?;

    #[cfg(target_os = "linux")]
    std::process::Command::new("xdg-open").arg(url).spawn()?;

    #[cfg(target_os = "windows")]
    std::process::Command::new("cmd")
        .args(["/c", "start", url])
        .spawn()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn public() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("silver/binary-search")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("silver/binary-search/index.html"), "page").unwrap();
        fs::write(dir.path().join("plot.png"), "png").unwrap();
        dir
    }

    #[test]
    fn test_resolve_module_urls() {
        let dir = public();
        let root = dir.path();
        assert_eq!(resolve_page(root, "/", "/"), Some(root.join("index.html")));
        assert_eq!(
            resolve_page(root, "/", "/silver/binary-search/"),
            Some(root.join("silver/binary-search/index.html"))
        );
        assert_eq!(
            resolve_page(root, "/", "/plot.png"),
            Some(root.join("plot.png"))
        );
        assert_eq!(resolve_page(root, "/", "/gold/missing/"), None);
        assert_eq!(resolve_page(root, "/", "/silver/../../etc/passwd"), None);
    }

    #[test]
    fn test_resolve_under_site_root() {
        let dir = public();
        let root = dir.path();
        assert_eq!(
            resolve_page(root, "/guide/", "/guide"),
            Some(root.join("index.html"))
        );
        assert_eq!(
            resolve_page(root, "/guide/", "/guide/silver/binary-search/"),
            Some(root.join("silver/binary-search/index.html"))
        );
        assert_eq!(resolve_page(root, "/guide/", "/silver/binary-search/"), None);
        assert_eq!(resolve_page(root, "/guide/", "/guidebook/plot.png"), None);
    }

    #[test]
    fn test_reload_notice_uses_site_urls() {
        let config = SiteConfig {
            root: "/guide/".to_string(),
            ..Default::default()
        };
        let generated = GeneratedPages {
            full: false,
            paths: vec![
                "silver/binary-search/".to_string(),
                String::new(),
                "silver/binary-search/".to_string(),
            ],
        };

        let notice = ReloadNotice::from_pages(&config, &generated);
        assert!(!notice.full);
        assert_eq!(
            notice.pages,
            vec!["/guide/", "/guide/silver/binary-search/"]
        );
        assert_eq!(
            serde_json::to_string(&notice).unwrap(),
            r#"{"full":false,"pages":["/guide/","/guide/silver/binary-search/"]}"#
        );
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains(LIVE_RELOAD_PATH));
        assert!(html.ends_with("</body></html>"));
        assert_eq!(html.matches("</body>").count(), 1);

        let fragment = inject_live_reload("<p>fragment</p>");
        assert!(fragment.starts_with("<p>fragment</p><script>"));
    }

    #[test]
    fn test_is_relevant() {
        let base = Path::new("/home/me/.sites/guide");
        assert!(is_relevant(&base.join("content/3_Silver/a.md"), base));
        assert!(is_relevant(&base.join("content/3_Silver/img/plot.png"), base));
        assert!(!is_relevant(&base.join("content/.git/index"), base));
        assert!(!is_relevant(&base.join("content/3_Silver/.a.md.swp"), base));
        assert!(!is_relevant(&base.join("content/a.md~"), base));
    }
}
