//! End-to-end pipeline tests against a scriptable fake container runtime.
//!
//! Nothing here touches Docker: the fake records every runtime call and
//! plays the engine's part by writing the output PDF into the bind-mounted
//! directory, so the full render → rewrite → tempdoc → engine path runs as
//! it would in production while staying hermetic and fast.

use inkpress::{
    render_pdf, BindMount, ContainerRuntime, ConvertConfig, EngineOptions, FnTemplateEngine,
    InkpressError, PdfRequest, RuntimeError,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

const FAKE_PDF: &[u8] = b"%PDF-1.4 fake output";

/// One recorded `run` invocation.
#[derive(Debug, Clone)]
struct RunCall {
    name: String,
    mounts: Vec<BindMount>,
    command: Vec<String>,
}

/// Scriptable [`ContainerRuntime`] double.
#[derive(Default)]
struct FakeRuntime {
    /// Runtime unreachable: every ping fails.
    daemon_down: bool,
    /// Image lookup reports the image as absent.
    image_absent: bool,
    /// Pulling the absent image fails.
    pull_fails: bool,
    /// The engine run exits abnormally.
    run_fails: bool,
    /// Engine exits cleanly but writes no output file.
    no_output: bool,
    /// Echo the first input file's contents into the output PDF, so tests
    /// can observe exactly what markup the engine was given.
    echo_input: bool,

    /// Names of containers currently in existence.
    containers: Mutex<HashSet<String>>,
    pulled: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    runs: Mutex<Vec<RunCall>>,
}

impl FakeRuntime {
    fn new() -> Self {
        Self::default()
    }

    fn with_stale_container(self, name: &str) -> Self {
        self.containers.lock().unwrap().insert(name.to_string());
        self
    }

    fn runs(&self) -> Vec<RunCall> {
        self.runs.lock().unwrap().clone()
    }

    fn remaining_containers(&self) -> HashSet<String> {
        self.containers.lock().unwrap().clone()
    }

    /// Host path of the `./name` the command refers to, resolved through the
    /// recorded bind mount.
    fn host_path(call: &RunCall, arg: &str) -> PathBuf {
        let relative = arg.strip_prefix("./").expect("engine paths are relative");
        call.mounts[0].host.join(relative)
    }
}

impl ContainerRuntime for FakeRuntime {
    fn ping(&self) -> Result<(), RuntimeError> {
        if self.daemon_down {
            return Err(RuntimeError::Unavailable {
                detail: "cannot connect to the daemon socket".into(),
            });
        }
        Ok(())
    }

    fn image_exists(&self, image: &str) -> Result<bool, RuntimeError> {
        let _ = image;
        Ok(!self.image_absent)
    }

    fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.pull_fails {
            return Err(RuntimeError::CommandFailed {
                command: format!("pull {image}"),
                status: "exit status: 1".into(),
                stderr: "manifest unknown".into(),
            });
        }
        self.pulled.lock().unwrap().push(image.to_string());
        Ok(())
    }

    fn run(
        &self,
        _image: &str,
        name: &str,
        mounts: &[BindMount],
        command: &[String],
    ) -> Result<(), RuntimeError> {
        self.containers.lock().unwrap().insert(name.to_string());
        let call = RunCall {
            name: name.to_string(),
            mounts: mounts.to_vec(),
            command: command.to_vec(),
        };
        self.runs.lock().unwrap().push(call.clone());

        if self.run_fails {
            return Err(RuntimeError::CommandFailed {
                command: format!("run --name {name}"),
                status: "exit status: 2".into(),
                stderr: "engine crashed".into(),
            });
        }

        if !self.no_output {
            let output = Self::host_path(&call, call.command.last().unwrap());
            let mut bytes = FAKE_PDF.to_vec();
            if self.echo_input {
                let input = Self::host_path(&call, &call.command[call.command.len() - 2]);
                bytes.extend_from_slice(&std::fs::read(input).unwrap());
            }
            std::fs::write(output, bytes).unwrap();
        }
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<bool, RuntimeError> {
        self.removed.lock().unwrap().push(name.to_string());
        Ok(self.containers.lock().unwrap().remove(name))
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

fn static_engine(markup: &'static str) -> impl inkpress::TemplateEngine {
    FnTemplateEngine(move |_t: &str, _c: &Value| Ok(markup.to_string()))
}

fn config_in(dir: &std::path::Path) -> ConvertConfig {
    ConvertConfig::builder().temp_dir(dir).build().unwrap()
}

fn temp_dir_entries(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

// ── Pipeline happy paths ─────────────────────────────────────────────────────

#[test]
fn main_template_only_produces_pdf_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = static_engine("<h1>hello</h1>");

    let bytes = render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap();

    assert_eq!(bytes, FAKE_PDF);

    let runs = runtime.runs();
    assert_eq!(runs.len(), 1);
    let command = &runs[0].command;
    // engine binary + exactly one input + the output: no cover, no options
    assert_eq!(command.len(), 3);
    assert_eq!(command[0], "athenapdf");
    assert!(command[1].starts_with("./inkpress"), "got: {command:?}");
    assert!(!command.iter().any(|a| a == "--has-cover"));
    assert!(!command.iter().any(|a| a == "--header-html"));
    assert!(!command.iter().any(|a| a == "--footer-html"));

    // container removed, rendered temp file and engine output both gone
    assert!(runtime.remaining_containers().is_empty());
    assert_eq!(temp_dir_entries(dir.path()), Vec::<String>::new());
}

#[test]
fn cover_template_goes_first_and_sets_flag() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        echo_input: true,
        ..FakeRuntime::new()
    };
    let engine = FnTemplateEngine(|template: &str, _c: &Value| Ok(format!("<p>{template}</p>")));

    let request = PdfRequest::new("main.html").cover("cover.html");
    let bytes = render_pdf(&engine, &runtime, &request, &config_in(dir.path())).unwrap();

    let runs = runtime.runs();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].command.iter().any(|a| a == "--has-cover"));

    // The embedded input is the cover document, the first of [cover, main].
    let echoed = String::from_utf8_lossy(&bytes);
    assert!(echoed.contains("<p>cover.html</p>"), "got: {echoed}");
    assert!(!echoed.contains("<p>main.html</p>"), "got: {echoed}");
}

#[test]
fn header_and_footer_paths_clobber_request_options() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = FnTemplateEngine(|template: &str, _c: &Value| Ok(format!("<p>{template}</p>")));

    let mut options = EngineOptions::new();
    options.set("header_html", "/srv/static/hardcoded-header.html");

    let request = PdfRequest::new("main.html")
        .header("header.html")
        .footer("footer.html")
        .options(options);
    render_pdf(&engine, &runtime, &request, &config_in(dir.path())).unwrap();

    let command = &runtime.runs()[0].command;
    let header_value = command
        .iter()
        .position(|a| a == "--header-html")
        .map(|i| command[i + 1].clone())
        .unwrap();
    assert_ne!(header_value, "/srv/static/hardcoded-header.html");
    assert!(header_value.contains("inkpress"), "got: {header_value}");
    assert!(command.iter().any(|a| a == "--footer-html"));
    assert!(!command.iter().any(|a| a == "--has-cover"));
}

#[test]
fn hardcoded_header_survives_when_no_template_given() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = static_engine("<p>body</p>");

    let mut options = EngineOptions::new();
    options.set("header_html", "/srv/static/hardcoded-header.html");

    let request = PdfRequest::new("main.html").options(options);
    render_pdf(&engine, &runtime, &request, &config_in(dir.path())).unwrap();

    let command = &runtime.runs()[0].command;
    let header_value = command
        .iter()
        .position(|a| a == "--header-html")
        .map(|i| command[i + 1].clone())
        .unwrap();
    assert_eq!(header_value, "/srv/static/hardcoded-header.html");
}

#[test]
fn asset_references_reach_the_engine_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        echo_input: true,
        ..FakeRuntime::new()
    };
    let engine = static_engine(r#"<img src="/media/logo.png">"#);

    let config = ConvertConfig::builder()
        .temp_dir(dir.path())
        .media_root("/srv/media/")
        .media_url("/media/")
        .build()
        .unwrap();

    let bytes = render_pdf(&engine, &runtime, &PdfRequest::new("main.html"), &config).unwrap();
    let echoed = String::from_utf8_lossy(&bytes);
    assert!(
        echoed.contains(r#"<img src="file:///srv/media/logo.png">"#),
        "got: {echoed}"
    );
    assert!(!echoed.contains(r#""/media/"#));
}

// ── Instance lifecycle ───────────────────────────────────────────────────────

#[test]
fn stale_fixed_name_instance_is_cleared_and_none_remains() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new().with_stale_container("athena-html-to-pdf");
    let engine = static_engine("<p>x</p>");

    let config = ConvertConfig::builder()
        .temp_dir(dir.path())
        .container_name("athena-html-to-pdf")
        .build()
        .unwrap();

    render_pdf(&engine, &runtime, &PdfRequest::new("main.html"), &config).unwrap();

    // Removed twice: once pre-run (stale), once post-run (ours).
    let removed = runtime.removed.lock().unwrap().clone();
    assert_eq!(removed, vec!["athena-html-to-pdf", "athena-html-to-pdf"]);
    assert!(runtime.remaining_containers().is_empty());
}

#[test]
fn generated_names_differ_between_conversions() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = static_engine("<p>x</p>");
    let config = config_in(dir.path());

    render_pdf(&engine, &runtime, &PdfRequest::new("a.html"), &config).unwrap();
    render_pdf(&engine, &runtime, &PdfRequest::new("b.html"), &config).unwrap();

    let runs = runtime.runs();
    assert_eq!(runs.len(), 2);
    assert_ne!(runs[0].name, runs[1].name);
}

#[test]
fn instance_is_removed_even_when_the_run_fails() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        run_fails: true,
        ..FakeRuntime::new()
    };
    let engine = static_engine("<p>x</p>");

    let err = render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap_err();

    assert!(matches!(err, InkpressError::ConversionFailed { .. }));
    assert!(runtime.remaining_containers().is_empty());
    // Rendered temp files are released on the failure path too.
    assert_eq!(temp_dir_entries(dir.path()), Vec::<String>::new());
}

// ── Image handling ───────────────────────────────────────────────────────────

#[test]
fn absent_image_is_pulled_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        image_absent: true,
        ..FakeRuntime::new()
    };
    let engine = static_engine("<p>x</p>");

    render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap();

    let pulled = runtime.pulled.lock().unwrap().clone();
    assert_eq!(pulled, vec!["arachnysdocker/athenapdf"]);
}

#[test]
fn present_image_is_not_pulled() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = static_engine("<p>x</p>");

    render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap();

    assert!(runtime.pulled.lock().unwrap().is_empty());
}

#[test]
fn pull_failure_surfaces_as_image_pull_error() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        image_absent: true,
        pull_fails: true,
        ..FakeRuntime::new()
    };
    let engine = static_engine("<p>x</p>");

    let err = render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap_err();

    match err {
        InkpressError::ImagePullFailed { image, .. } => {
            assert_eq!(image, "arachnysdocker/athenapdf");
        }
        other => panic!("expected ImagePullFailed, got {other:?}"),
    }
    assert!(runtime.runs().is_empty());
}

// ── Failure modes ────────────────────────────────────────────────────────────

#[test]
fn unreachable_daemon_surfaces_as_engine_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        daemon_down: true,
        ..FakeRuntime::new()
    };
    let engine = static_engine("<p>x</p>");

    let err = render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap_err();
    assert!(matches!(err, InkpressError::EngineUnavailable { .. }));
}

#[test]
fn clean_exit_without_output_is_missing_output() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        no_output: true,
        ..FakeRuntime::new()
    };
    let engine = static_engine("<p>x</p>");

    let err = render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap_err();
    assert!(matches!(err, InkpressError::MissingOutput { .. }));
}

#[test]
fn render_failure_stops_before_the_runtime_is_touched() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = FnTemplateEngine(|_t: &str, _c: &Value| Err("template blew up".into()));

    let err = render_pdf(
        &engine,
        &runtime,
        &PdfRequest::new("main.html"),
        &config_in(dir.path()),
    )
    .unwrap_err();

    assert!(matches!(err, InkpressError::RenderFailed { .. }));
    assert!(runtime.runs().is_empty());
    assert_eq!(temp_dir_entries(dir.path()), Vec::<String>::new());
}

#[test]
fn header_render_failure_releases_the_main_document() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = FnTemplateEngine(|template: &str, _c: &Value| {
        if template == "header.html" {
            Err("header blew up".into())
        } else {
            Ok("<p>main</p>".to_string())
        }
    });

    let request = PdfRequest::new("main.html").header("header.html");
    let err = render_pdf(&engine, &runtime, &request, &config_in(dir.path())).unwrap_err();

    assert!(matches!(err, InkpressError::RenderFailed { .. }));
    assert_eq!(temp_dir_entries(dir.path()), Vec::<String>::new());
}

// ── Debug retention ──────────────────────────────────────────────────────────

#[test]
fn keep_rendered_files_retains_inputs_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime::new();
    let engine = static_engine("<p>kept</p>");

    let config = ConvertConfig::builder()
        .temp_dir(dir.path())
        .keep_rendered_files(true)
        .build()
        .unwrap();

    render_pdf(&engine, &runtime, &PdfRequest::new("main.html"), &config).unwrap();

    let entries = temp_dir_entries(dir.path());
    assert!(
        entries.iter().any(|name| name.ends_with(".html")),
        "rendered input should survive, got: {entries:?}"
    );
    assert!(
        entries.iter().any(|name| name.ends_with(".pdf")),
        "engine output should survive, got: {entries:?}"
    );
}

// ── Context plumbing ─────────────────────────────────────────────────────────

#[test]
fn context_reaches_the_template_engine() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = FakeRuntime {
        echo_input: true,
        ..FakeRuntime::new()
    };
    let engine = FnTemplateEngine(|_t: &str, context: &Value| {
        Ok(format!("<h1>{}</h1>", context["title"].as_str().unwrap()))
    });

    let request = PdfRequest::new("main.html").context(json!({"title": "Quarterly Report"}));
    let bytes = render_pdf(&engine, &runtime, &request, &config_in(dir.path())).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("<h1>Quarterly Report</h1>"));
}
