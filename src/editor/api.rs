use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Form, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use maud::Markup;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use super::locate::{SourceLocator, SourceReference};
use super::pages::{self, EditorView};
use super::preview::{Converter, Rendered};
use super::runner::{CommandRunner, ShellRunner};
use super::session::{Notice, Session, SessionContext, SessionStore};
use super::workflow::{RegenKind, SaveRequest, Workflow};
use crate::config::EditorConfig;
use crate::errors::{EditorError, ErrorKind};
use crate::util::is_safe_relative;

pub const VIEW_PREFIX: &str = "/_viewer/";
pub const EDIT_PREFIX: &str = "/_editor/";
pub const PDF_PREFIX: &str = "/_pdf/";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub config: Arc<EditorConfig>,
    pub locator: SourceLocator,
    pub workflow: Workflow,
    pub converter: Converter,
    pub sessions: SessionStore,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Arc<EditorConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            locator: SourceLocator::new(config.clone()),
            workflow: Workflow::new(config.clone(), runner),
            converter: Converter::new(config.preview_command.clone(), &config.doc_root),
            sessions: SessionStore::new(config.secret_key.clone()),
            config,
        }
    }

    /// State running real commands in the content root.
    pub fn with_shell(config: Arc<EditorConfig>) -> Self {
        let runner = Arc::new(ShellRunner::new(&config.doc_root));
        Self::new(config, runner)
    }
}

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EditForm {
    #[serde(rename = "editor-content", default)]
    pub content: String,
    #[serde(rename = "editor-comment", default)]
    pub message: String,
    #[serde(rename = "editor-author", default)]
    pub author: String,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn editor_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/_viewer/{*doc_path}", get(handle_viewer))
        .route(
            "/_editor/{*doc_path}",
            get(handle_editor_form).post(handle_editor_save),
        )
        .route("/_pdf/{*module}", get(handle_pdf))
        .route("/_content/{*doc_path}", get(handle_content))
        .route("/_preview", post(handle_preview))
        .route("/_update", get(handle_update))
        .fallback(handle_fallback)
}

// ── Helpers ───────────────────────────────────────────────────────────

fn html(markup: Markup) -> Response {
    Html(markup.into_string()).into_response()
}

/// Store the session and attach its cookie when newly created.
fn finish(state: &AppState, session: Session, mut response: Response) -> Response {
    if let Some(cookie) = state.sessions.save(session) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Log the full failure and queue its sanitized first line as a notice.
fn report(context: &mut SessionContext, err: &EditorError) {
    error!("{}", err);
    context.notify(Notice::error_escaped(err.notice_text()));
}

fn not_found(doc_path: &str, context: &mut SessionContext) -> Response {
    let notices = context.take_notices();
    (
        StatusCode::NOT_FOUND,
        html(pages::not_found_page(doc_path, &notices)),
    )
        .into_response()
}

fn is_page(doc_path: &str) -> bool {
    doc_path.ends_with(".html") || doc_path.ends_with(".htm")
}

async fn serve_file(path: &FsPath) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_string())], bytes).into_response()
        }
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn referer(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::REFERER)?.to_str().ok()
}

/// Local redirect target for a referer: path and query only, never another host.
fn local_target(referer: Option<&str>) -> String {
    let Some(referer) = referer else {
        return "/".to_string();
    };
    match Url::parse(referer) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) if referer.starts_with('/') && !referer.starts_with("//") => referer.to_string(),
        Err(_) => "/".to_string(),
    }
}

/// Source behind `doc_path` if it exists; other failures become notices.
fn editable_source(
    state: &AppState,
    doc_path: &str,
    context: &mut SessionContext,
) -> Option<SourceReference> {
    match state.locator.locate_source(doc_path) {
        Ok(Some(source)) if state.config.doc_root.join(source.relative()).is_file() => {
            Some(source)
        }
        Ok(_) => None,
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            report(context, &err);
            None
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn handle_root(State(state): State<SharedState>) -> Redirect {
    Redirect::to(&format!("{}{}", VIEW_PREFIX, state.config.default_view))
}

async fn handle_fallback(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut session = state.sessions.load(&headers);
    let response = not_found("/", &mut session.context);
    finish(&state, session, response)
}

async fn handle_viewer(
    State(state): State<SharedState>,
    Path(doc_path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut session = state.sessions.load(&headers);
    let response = view_document(&state, &doc_path, &mut session.context).await;
    finish(&state, session, response)
}

async fn view_document(state: &AppState, doc_path: &str, context: &mut SessionContext) -> Response {
    let Some(full_path) = state.locator.document_file(doc_path) else {
        return not_found(doc_path, context);
    };

    if !is_page(doc_path) {
        if doc_path.ends_with(".js") {
            return not_found(doc_path, context);
        }
        return serve_file(&full_path).await;
    }

    let module = state
        .workflow
        .module_for(Some(&format!("{}{}", VIEW_PREFIX, doc_path)));

    match state.workflow.autoupdate(None, RegenKind::Html).await {
        Ok(true) => context.notify(Notice::success("Repository autoupdated")),
        Ok(false) => {}
        Err(err) => report(context, &err),
    }

    debug!("Serving doc page {}", doc_path);
    let source = editable_source(state, doc_path, context).map(|s| s.as_str());
    let edit_url = format!("{}{}", EDIT_PREFIX, doc_path);
    let pdf_url = module.map(|m| format!("{}{}", PDF_PREFIX, m));
    let notices = context.take_notices();

    html(pages::viewer_page(
        doc_path,
        source.as_deref(),
        &edit_url,
        pdf_url.as_deref(),
        &notices,
    ))
}

async fn handle_pdf(
    State(state): State<SharedState>,
    Path(module): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut session = state.sessions.load(&headers);
    let response = serve_pdf(&state, &module, &mut session.context).await;
    finish(&state, session, response)
}

async fn serve_pdf(state: &AppState, module: &str, context: &mut SessionContext) -> Response {
    if module.is_empty() || !is_safe_relative(module) {
        return not_found("/", context);
    }
    debug!("Module is {}", module);

    if let Err(err) = state.workflow.autoupdate(Some(module), RegenKind::Html).await {
        report(context, &err);
    }
    if let Err(err) = state.workflow.regenerate(Some(module), RegenKind::Pdf).await {
        report(context, &err);
        return not_found("/", context);
    }

    match state.locator.find_derived(module) {
        Ok(Some(pdf)) => {
            debug!("Serving pdf page {}", pdf);
            serve_file(&state.config.doc_root.join(pdf.relative())).await
        }
        Ok(None) => not_found("/", context),
        Err(err) => {
            report(context, &err);
            not_found("/", context)
        }
    }
}

async fn handle_editor_form(
    State(state): State<SharedState>,
    Path(doc_path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut session = state.sessions.load(&headers);
    let context = &mut session.context;

    let response = match editable_source(&state, &doc_path, context) {
        None => not_found(&doc_path, context),
        Some(source) => {
            let path = state.config.doc_root.join(source.relative());
            match tokio::fs::read_to_string(&path).await {
                Ok(code) => {
                    debug!("Serving editor page {}", path.display());
                    let author = context.author.clone().unwrap_or_default();
                    render_editor(&doc_path, &source, &author, &code, context)
                }
                Err(e) => {
                    report(context, &EditorError::io(&path, e));
                    not_found(&doc_path, context)
                }
            }
        }
    };
    finish(&state, session, response)
}

fn render_editor(
    doc_path: &str,
    source: &SourceReference,
    author: &str,
    code: &str,
    context: &mut SessionContext,
) -> Response {
    let view_url = format!("{}{}", VIEW_PREFIX, doc_path);
    let edit_url = format!("{}{}", EDIT_PREFIX, doc_path);
    let source = source.as_str();
    let notices = context.take_notices();
    html(pages::editor_page(
        &EditorView {
            doc_path,
            source: &source,
            view_url: &view_url,
            edit_url: &edit_url,
            author,
            code,
        },
        &notices,
    ))
}

async fn handle_editor_save(
    State(state): State<SharedState>,
    Path(doc_path): Path<String>,
    headers: HeaderMap,
    Form(form): Form<EditForm>,
) -> Response {
    let mut session = state.sessions.load(&headers);
    let context = &mut session.context;

    let Some(source) = editable_source(&state, &doc_path, context) else {
        let response = not_found(&doc_path, context);
        return finish(&state, session, response);
    };

    let module = state.workflow.module_for(referer(&headers));
    let request = SaveRequest {
        content: form.content.clone(),
        message: form.message,
        author: form.author.clone(),
    };

    let response = match state
        .workflow
        .save(&source, request, module.as_deref(), context)
        .await
    {
        Ok(()) => {
            context.notify(Notice::success("Document saved and regenerated"));
            Redirect::to(&format!("{}{}", VIEW_PREFIX, doc_path)).into_response()
        }
        Err(err) => {
            report(context, &err);
            render_editor(&doc_path, &source, &form.author, &form.content, context)
        }
    };
    finish(&state, session, response)
}

async fn handle_content(
    State(state): State<SharedState>,
    Path(doc_path): Path<String>,
) -> Response {
    match state.locator.document_file(&doc_path) {
        Some(path) => serve_file(&path).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_preview(State(state): State<SharedState>, body: Bytes) -> Response {
    match state.converter.convert(&body).await {
        Ok(Rendered::Html(html)) => (StatusCode::OK, Html(html)).into_response(),
        Ok(Rendered::Rejected(stderr)) => (StatusCode::BAD_REQUEST, stderr).into_response(),
        Err(err) => {
            error!("Preview failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.notice_text()).into_response()
        }
    }
}

async fn handle_update(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut session = state.sessions.load(&headers);
    let referer = referer(&headers);
    let module = state.workflow.module_for(referer);

    match state
        .workflow
        .update_or_cleanup(module.as_deref(), RegenKind::Html)
        .await
    {
        Ok(()) => {
            info!("Succeeded updated");
            session
                .context
                .notify(Notice::success("Repository updated and regenerated"));
        }
        Err(err) => report(&mut session.context, &err),
    }

    let response = Redirect::to(&local_target(referer)).into_response();
    finish(&state, session, response)
}
