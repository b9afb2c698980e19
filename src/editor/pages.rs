//! Server-rendered pages: viewer, editor and not-found.
//!
//! Uses [maud](https://maud.lambda.xyz/) so every interpolated value is
//! escaped; only notices (escaped when created) are emitted pre-escaped.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use super::session::Notice;

const CSS: &str = r#"
body { margin: 0; font-family: sans-serif; }
.toolbar { display: flex; gap: 1em; align-items: center; padding: .5em 1em; background: #f3f3f3; border-bottom: 1px solid #ddd; }
.toolbar .doc { font-family: monospace; color: #555; }
.notice { padding: .5em 1em; }
.notice.success { background: #dff0d8; color: #3c763d; }
.notice.error { background: #f2dede; color: #a94442; }
iframe.document { border: 0; width: 100%; height: calc(100vh - 3em); }
form.editor { display: flex; flex-direction: column; gap: .5em; padding: 1em; }
form.editor textarea { width: 100%; min-height: 60vh; font-family: monospace; }
.panes { display: grid; grid-template-columns: 1fr 1fr; gap: 1em; }
#preview { border-left: 1px solid #ddd; padding: 0 1em; overflow: auto; max-height: 70vh; }
"#;

const PREVIEW_JS: &str = r#"
document.getElementById('preview-button').addEventListener('click', function () {
  var source = document.getElementById('editor-content').value;
  fetch('/_preview', { method: 'POST', body: source })
    .then(function (r) { return r.text().then(function (t) { return [r.ok, t]; }); })
    .then(function (res) {
      var pane = document.getElementById('preview');
      if (res[0]) { pane.innerHTML = res[1]; } else { pane.textContent = res[1]; }
    });
});
"#;

/// Values shown by the editor form.
pub struct EditorView<'a> {
    pub doc_path: &'a str,
    pub source: &'a str,
    pub view_url: &'a str,
    pub edit_url: &'a str,
    pub author: &'a str,
    pub code: &'a str,
}

fn base_document(title: &str, notices: &[Notice], toolbar: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                nav.toolbar { (toolbar) }
                (render_notices(notices))
                (content)
            }
        }
    }
}

fn render_notices(notices: &[Notice]) -> Markup {
    html! {
        @for notice in notices {
            div class={ "notice " (notice.level.as_str()) } { (PreEscaped(&notice.text)) }
        }
    }
}

pub fn viewer_page(
    doc_path: &str,
    source: Option<&str>,
    edit_url: &str,
    pdf_url: Option<&str>,
    notices: &[Notice],
) -> Markup {
    let toolbar = html! {
        span.doc { (doc_path) }
        @if let Some(source) = source {
            a href=(edit_url) title=(source) { "Edit" }
        } @else {
            span { "View only" }
        }
        @if let Some(pdf_url) = pdf_url {
            a href=(pdf_url) { "PDF" }
        }
        a href="/_update" { "Update" }
    };
    let content = html! {
        iframe.document src={ "/_content/" (doc_path) } {}
    };
    base_document(doc_path, notices, toolbar, content)
}

pub fn editor_page(view: &EditorView<'_>, notices: &[Notice]) -> Markup {
    let toolbar = html! {
        span.doc { (view.source) }
        a href=(view.view_url) { "View" }
    };
    let content = html! {
        form.editor method="post" action=(view.edit_url) {
            div.panes {
                textarea id="editor-content" name="editor-content" { (view.code) }
                div id="preview" {}
            }
            input type="text" name="editor-comment" placeholder="Commit message";
            input type="text" name="editor-author" placeholder="Your name" value=(view.author);
            div {
                button type="button" id="preview-button" { "Preview" }
                " "
                button type="submit" { "Save" }
            }
        }
        script { (PreEscaped(PREVIEW_JS)) }
    };
    base_document(&format!("Edit {}", view.doc_path), notices, toolbar, content)
}

pub fn not_found_page(doc_path: &str, notices: &[Notice]) -> Markup {
    let toolbar = html! {
        a href="/" { "Home" }
    };
    let content = html! {
        main.notice.error {
            "Document " code { (doc_path) } " is not found"
        }
    };
    base_document("Not found", notices, toolbar, content)
}
