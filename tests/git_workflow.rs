//! Update and save pipelines against real Git repositories.
//!
//! Each test builds a bare remote plus two clones: `editor` is the working
//! copy the workflow drives, `other` plays a second contributor. Tests return
//! early when `git` is not installed.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;

use weditor::config::EditorConfig;
use weditor::editor::locate::SourceReference;
use weditor::editor::runner::ShellRunner;
use weditor::editor::session::SessionContext;
use weditor::editor::vcs::VcsKind;
use weditor::editor::workflow::{RegenKind, SaveRequest, Workflow};
use weditor::errors::ErrorKind;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn identify(dir: &Path, name: &str) {
    git(dir, &["config", "user.name", name]);
    git(dir, &["config", "user.email", "dev@example.com"]);
}

struct Repos {
    _tmp: TempDir,
    editor: std::path::PathBuf,
    other: std::path::PathBuf,
}

fn repos() -> Repos {
    let tmp = TempDir::new().unwrap();
    let seed = tmp.path().join("seed");
    fs::create_dir_all(seed.join("source")).unwrap();
    git(&seed, &["init", "-q"]);
    identify(&seed, "Seed");
    fs::write(seed.join("source/intro.rst"), "Intro\n=====\n\nFirst line.\n").unwrap();
    fs::write(seed.join(".gitignore"), "build/\n").unwrap();
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "-q", "-m", "seed"]);

    let remote = tmp.path().join("remote.git");
    git(tmp.path(), &["clone", "-q", "--bare", "seed", "remote.git"]);
    let remote = remote.to_string_lossy().into_owned();

    let editor = tmp.path().join("editor");
    let other = tmp.path().join("other");
    git(tmp.path(), &["clone", "-q", &remote, "editor"]);
    git(tmp.path(), &["clone", "-q", &remote, "other"]);
    identify(&editor, "Editor");
    identify(&other, "Other");

    Repos {
        _tmp: tmp,
        editor,
        other,
    }
}

fn workflow(root: &Path, allow_push: bool) -> Workflow {
    let config = EditorConfig {
        doc_root: root.to_path_buf(),
        vcs: VcsKind::Git,
        regen_script: Some("mkdir -p build && touch build/regenerated".into()),
        allow_push,
        ..EditorConfig::default()
    };
    Workflow::new(Arc::new(config), Arc::new(ShellRunner::new(root)))
}

fn push_change(other: &Path, content: &str) {
    fs::write(other.join("source/intro.rst"), content).unwrap();
    git(other, &["commit", "-q", "-am", "upstream edit"]);
    git(other, &["push", "-q"]);
}

fn request(content: &str) -> SaveRequest {
    SaveRequest {
        content: content.to_string(),
        message: "Fix intro".to_string(),
        author: "Jane".to_string(),
    }
}

#[tokio::test]
async fn update_pulls_remote_changes_and_regenerates() {
    if !git_available() {
        return;
    }
    let repos = repos();
    push_change(&repos.other, "Intro\n=====\n\nUpstream line.\n");

    workflow(&repos.editor, false)
        .update(None, RegenKind::Html)
        .await
        .unwrap();

    let text = fs::read_to_string(repos.editor.join("source/intro.rst")).unwrap();
    assert!(text.contains("Upstream line."));
    assert!(repos.editor.join("build/regenerated").exists());
}

#[tokio::test]
async fn update_discards_local_modifications() {
    if !git_available() {
        return;
    }
    let repos = repos();
    fs::write(repos.editor.join("source/intro.rst"), "scribble\n").unwrap();
    fs::write(repos.editor.join("stray.txt"), "junk").unwrap();

    workflow(&repos.editor, false)
        .update(None, RegenKind::Html)
        .await
        .unwrap();

    let text = fs::read_to_string(repos.editor.join("source/intro.rst")).unwrap();
    assert!(text.contains("First line."));
    assert!(!repos.editor.join("stray.txt").exists());
}

#[tokio::test]
async fn save_commits_and_pushes() {
    if !git_available() {
        return;
    }
    let repos = repos();
    let mut session = SessionContext::default();

    workflow(&repos.editor, true)
        .save(
            &SourceReference::from("source/intro.rst"),
            request("Intro\r\n=====\r\n\r\nEdited line.\r\n"),
            None,
            &mut session,
        )
        .await
        .unwrap();

    assert_eq!(session.author.as_deref(), Some("Jane"));
    let log = git(&repos.editor, &["log", "-1", "--format=%an|%s"]);
    assert_eq!(log.trim(), "Jane|Fix intro");

    git(&repos.other, &["pull", "-q"]);
    let text = fs::read_to_string(repos.other.join("source/intro.rst")).unwrap();
    assert_eq!(text, "Intro\n=====\n\nEdited line.\n");
}

#[tokio::test]
async fn save_of_unchanged_content_is_rejected() {
    if !git_available() {
        return;
    }
    let repos = repos();
    let mut session = SessionContext::default();

    let err = workflow(&repos.editor, false)
        .save(
            &SourceReference::from("source/intro.rst"),
            request("Intro\n=====\n\nFirst line.\n"),
            None,
            &mut session,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "Nothing to commit and generate");
}

#[tokio::test]
async fn conflicting_save_fails_and_cleanup_restores_working_copy() {
    if !git_available() {
        return;
    }
    let repos = repos();
    push_change(&repos.other, "Intro\n=====\n\nTheir line.\n");
    let flow = workflow(&repos.editor, false);
    let mut session = SessionContext::default();

    let err = flow
        .save(
            &SourceReference::from("source/intro.rst"),
            request("Intro\n=====\n\nMy line.\n"),
            None,
            &mut session,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Error: Update conflict");

    flow.cleanup().await.unwrap();
    let status = git(&repos.editor, &["status", "--porcelain"]);
    assert!(status.trim().is_empty(), "dirty after cleanup: {}", status);
}

#[tokio::test]
async fn update_conflict_aborts_and_leaves_clean_tree() {
    if !git_available() {
        return;
    }
    let repos = repos();
    push_change(&repos.other, "Intro\n=====\n\nTheir line.\n");
    fs::write(
        repos.editor.join("source/intro.rst"),
        "Intro\n=====\n\nLocal line.\n",
    )
    .unwrap();
    git(&repos.editor, &["commit", "-q", "-am", "diverging edit"]);

    let err = workflow(&repos.editor, false)
        .update_or_cleanup(None, RegenKind::Html)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Error: Update conflict");
    let status = git(&repos.editor, &["status", "--porcelain"]);
    assert!(status.trim().is_empty(), "dirty after cleanup: {}", status);
    assert!(!repos.editor.join(".git/MERGE_HEAD").exists());
    assert!(!repos.editor.join("build/regenerated").exists());
}
