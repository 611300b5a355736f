//! Engine invocation: drive the containerized converter and collect its PDF.
//!
//! One call is one container: the invoker checks the runtime is reachable,
//! makes sure the engine image exists (pulling it on first use), clears any
//! stale instance holding the chosen name, runs the conversion with the temp
//! directory bind-mounted into the container, removes the instance, and reads
//! the output file back into memory.
//!
//! Instance names are unique per call by default
//! (`<prefix>-<pid>-<sequence>`), so concurrent conversions in one process
//! cannot remove each other's in-flight containers. The pre-run removal is
//! still performed for the chosen name: if an earlier run died between its
//! run and remove steps, the leftover instance would otherwise block this one.

use crate::config::ConvertConfig;
use crate::error::InkpressError;
use crate::options::EngineOptions;
use crate::runtime::{BindMount, ContainerRuntime};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

static JOB_SEQ: AtomicU64 = AtomicU64::new(0);

/// Convert rendered documents to PDF bytes via the external engine.
///
/// `inputs` is ordered: the first path (cover when present, main body
/// otherwise) is the one embedded in the invocation command; header, footer
/// and cover are communicated through `options`. Every input must live under
/// `config.temp_dir`, which is the directory the container sees.
///
/// # Errors
/// [`InkpressError::EngineUnavailable`] when the runtime cannot be reached,
/// [`InkpressError::ImagePullFailed`] when the image is absent and cannot be
/// pulled, [`InkpressError::ConversionFailed`] when the engine exits
/// abnormally, and [`InkpressError::MissingOutput`] when it exits cleanly
/// without producing the output file. Nothing is retried.
pub fn convert_documents(
    runtime: &dyn ContainerRuntime,
    inputs: &[&Path],
    options: &EngineOptions,
    config: &ConvertConfig,
) -> Result<Vec<u8>, InkpressError> {
    let first: &Path = inputs
        .first()
        .copied()
        .ok_or_else(|| InkpressError::Internal("no input documents to convert".into()))?;

    runtime
        .ping()
        .map_err(|e| InkpressError::EngineUnavailable {
            detail: e.to_string(),
        })?;

    ensure_image(runtime, &config.image)?;

    let name = instance_name(config);
    remove_stale_instance(runtime, &name);

    let output_name = format!("{name}.pdf");
    let command = build_command(first, &output_name, options, config)?;
    let mounts = [BindMount::read_write(
        &config.temp_dir,
        config.container_mount.as_str(),
    )];

    info!(
        image = %config.image,
        instance = %name,
        inputs = inputs.len(),
        "running conversion"
    );
    let run_result = runtime.run(&config.image, &name, &mounts, &command);

    // Remove the instance whether or not the run succeeded; a failure here
    // is logged, and the next run's pre-removal covers the leftover.
    if let Err(e) = runtime.remove_container(&name) {
        if !e.is_not_found() {
            warn!(instance = %name, error = %e, "failed to remove engine instance");
        }
    }

    run_result.map_err(|e| InkpressError::ConversionFailed {
        detail: e.to_string(),
    })?;

    read_output(&config.temp_dir.join(&output_name), config)
}

/// Look the image up by name, pulling it when absent.
fn ensure_image(runtime: &dyn ContainerRuntime, image: &str) -> Result<(), InkpressError> {
    let present = match runtime.image_exists(image) {
        Ok(present) => present,
        Err(e) if e.is_not_found() => false,
        Err(e) => {
            return Err(InkpressError::EngineUnavailable {
                detail: e.to_string(),
            })
        }
    };
    if present {
        return Ok(());
    }
    info!(image, "engine image not present, pulling");
    runtime
        .pull_image(image)
        .map_err(|e| InkpressError::ImagePullFailed {
            image: image.to_string(),
            detail: e.to_string(),
        })
}

/// Clear any stale instance with our name. Absence is the normal case.
fn remove_stale_instance(runtime: &dyn ContainerRuntime, name: &str) {
    match runtime.remove_container(name) {
        Ok(true) => warn!(instance = %name, "removed stale engine instance"),
        Ok(false) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => warn!(instance = %name, error = %e, "stale-instance cleanup failed"),
    }
}

fn instance_name(config: &ConvertConfig) -> String {
    match &config.container_name {
        Some(name) => name.clone(),
        None => format!(
            "{}-{}-{}",
            config.container_prefix,
            std::process::id(),
            JOB_SEQ.fetch_add(1, Ordering::Relaxed)
        ),
    }
}

/// Assemble the in-container command: engine binary, serialised options, the
/// first input relativised into the mount, and the output filename.
fn build_command(
    input: &Path,
    output_name: &str,
    options: &EngineOptions,
    config: &ConvertConfig,
) -> Result<Vec<String>, InkpressError> {
    let relative = input.strip_prefix(&config.temp_dir).map_err(|_| {
        InkpressError::Internal(format!(
            "input '{}' is outside the mounted directory '{}'",
            input.display(),
            config.temp_dir.display()
        ))
    })?;

    let mut command = Vec::with_capacity(options.len() * 2 + 3);
    command.push(config.engine_command.clone());
    command.extend(options.to_args());
    command.push(format!("./{}", relative.display()));
    command.push(format!("./{output_name}"));
    Ok(command)
}

/// Read the engine's output file and, unless rendered files are being kept
/// for debugging, delete it so repeated conversions do not accumulate.
fn read_output(path: &Path, config: &ConvertConfig) -> Result<Vec<u8>, InkpressError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InkpressError::MissingOutput {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(InkpressError::ConversionFailed {
                detail: format!("cannot read output '{}': {e}", path.display()),
            })
        }
    };

    if !config.keep_rendered_files {
        if let Err(e) = std::fs::remove_file(path) {
            debug!(path = %path.display(), error = %e, "could not delete engine output");
        }
    }

    info!(bytes = bytes.len(), "conversion produced PDF");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EngineOptions;

    fn test_config(temp_dir: &Path) -> ConvertConfig {
        ConvertConfig::builder().temp_dir(temp_dir).build().unwrap()
    }

    #[test]
    fn command_embeds_relative_input_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let input = dir.path().join("inkpress-abc.html");

        let command =
            build_command(&input, "inkpress-1-0.pdf", &EngineOptions::new(), &config).unwrap();
        assert_eq!(
            command,
            vec!["athenapdf", "./inkpress-abc.html", "./inkpress-1-0.pdf"]
        );
    }

    #[test]
    fn command_places_options_before_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let input = dir.path().join("doc.html");

        let mut options = EngineOptions::new();
        options.set_flag("grayscale");
        options.set("header_html", "/tmp/h.html");

        let command = build_command(&input, "out.pdf", &options, &config).unwrap();
        assert_eq!(
            command,
            vec![
                "athenapdf",
                "--grayscale",
                "--header-html",
                "/tmp/h.html",
                "./doc.html",
                "./out.pdf"
            ]
        );
    }

    #[test]
    fn input_outside_mount_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let err = build_command(
            Path::new("/elsewhere/doc.html"),
            "out.pdf",
            &EngineOptions::new(),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, InkpressError::Internal(_)));
    }

    #[test]
    fn generated_instance_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let a = instance_name(&config);
        let b = instance_name(&config);
        assert_ne!(a, b);
        assert!(a.starts_with("inkpress-"), "got: {a}");
    }

    #[test]
    fn fixed_instance_name_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig::builder()
            .temp_dir(dir.path())
            .container_name("athena-html-to-pdf")
            .build()
            .unwrap();
        assert_eq!(instance_name(&config), "athena-html-to-pdf");
        assert_eq!(instance_name(&config), "athena-html-to-pdf");
    }

    #[test]
    fn missing_output_maps_to_dedicated_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let err = read_output(&dir.path().join("absent.pdf"), &config).unwrap_err();
        assert!(matches!(err, InkpressError::MissingOutput { .. }));
    }

    #[test]
    fn output_is_consumed_after_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let out = dir.path().join("job.pdf");
        std::fs::write(&out, b"%PDF-1.4 test").unwrap();

        let bytes = read_output(&out, &config).unwrap();
        assert_eq!(bytes, b"%PDF-1.4 test");
        assert!(!out.exists());
    }

    #[test]
    fn output_is_retained_when_keeping_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig::builder()
            .temp_dir(dir.path())
            .keep_rendered_files(true)
            .build()
            .unwrap();
        let out = dir.path().join("job.pdf");
        std::fs::write(&out, b"%PDF-1.4 test").unwrap();

        read_output(&out, &config).unwrap();
        assert!(out.exists());
    }
}
