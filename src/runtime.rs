//! Container runtime abstraction and the Docker CLI implementation.
//!
//! The pipeline only needs five operations from the runtime: a liveness
//! check, image lookup and pull, a blocking run, and removal by name.
//! [`ContainerRuntime`] captures exactly that surface so tests can substitute
//! a fake and the engine invoker stays free of Docker specifics.
//!
//! [`DockerCli`] drives the system `docker` binary through
//! [`std::process::Command`] with captured output, the same way a shell user
//! would. Not-found conditions (no such image, no such container) are
//! distinguished from real failures because the invoker treats them as
//! expected: a missing image triggers a pull, a missing instance during
//! pre-run cleanup is simply a clean host.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by a [`ContainerRuntime`] implementation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime itself cannot be reached (daemon down, binary missing).
    #[error("container runtime unavailable: {detail}")]
    Unavailable { detail: String },

    /// The named image or container does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A runtime command ran but exited abnormally.
    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("container runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// True for the swallowed-by-design lookups: missing image before a
    /// pull, missing instance during pre-run cleanup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound { .. })
    }
}

/// A host directory exposed inside the container at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host: PathBuf,
    pub container: String,
    pub read_only: bool,
}

impl BindMount {
    /// Read-write bind of `host` at `container`.
    pub fn read_write(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    fn to_volume_arg(&self) -> String {
        let mode = if self.read_only { "ro" } else { "rw" };
        format!("{}:{}:{}", self.host.display(), self.container, mode)
    }
}

/// The container-runtime operations the pipeline consumes.
///
/// `run` blocks until the container's process exits; no timeout or
/// cancellation is defined at this layer.
pub trait ContainerRuntime {
    /// Check the runtime can be reached at all.
    fn ping(&self) -> Result<(), RuntimeError>;

    /// Look up an image by name.
    fn image_exists(&self, image: &str) -> Result<bool, RuntimeError>;

    /// Pull an image by name.
    fn pull_image(&self, image: &str) -> Result<(), RuntimeError>;

    /// Run a named container from `image` with the given bind mounts and
    /// command, blocking until it exits.
    fn run(
        &self,
        image: &str,
        name: &str,
        mounts: &[BindMount],
        command: &[String],
    ) -> Result<(), RuntimeError>;

    /// Remove a container by name. Returns `Ok(false)` when no container
    /// with that name exists.
    fn remove_container(&self, name: &str) -> Result<bool, RuntimeError>;
}

/// [`ContainerRuntime`] backed by the `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different client binary, e.g. `podman`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn exec<S: AsRef<std::ffi::OsStr> + std::fmt::Debug>(
        &self,
        args: &[S],
    ) -> Result<Output, RuntimeError> {
        debug!(program = %self.program, ?args, "running runtime command");
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RuntimeError::Unavailable {
                    detail: format!("'{}' not found on PATH", self.program),
                },
                _ => RuntimeError::Io(e),
            })
    }

    fn command_failed(args: &[&str], output: &Output) -> RuntimeError {
        RuntimeError::CommandFailed {
            command: args.join(" "),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl ContainerRuntime for DockerCli {
    fn ping(&self) -> Result<(), RuntimeError> {
        let args = ["version", "--format", "{{.Server.Version}}"];
        let output = self.exec(&args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RuntimeError::Unavailable {
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn image_exists(&self, image: &str) -> Result<bool, RuntimeError> {
        let args = ["image", "inspect", image];
        let output = self.exec(&args)?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such image") {
            Ok(false)
        } else {
            Err(Self::command_failed(&args, &output))
        }
    }

    fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        let args = ["pull", image];
        let output = self.exec(&args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Self::command_failed(&args, &output))
        }
    }

    fn run(
        &self,
        image: &str,
        name: &str,
        mounts: &[BindMount],
        command: &[String],
    ) -> Result<(), RuntimeError> {
        let mut args: Vec<OsString> = vec!["run".into(), "--name".into(), name.into()];
        for mount in mounts {
            args.push("-v".into());
            args.push(mount.to_volume_arg().into());
        }
        args.push(image.into());
        args.extend(command.iter().map(OsString::from));

        let output = self.exec(&args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RuntimeError::CommandFailed {
                command: format!("run --name {name} ... {image}"),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn remove_container(&self, name: &str) -> Result<bool, RuntimeError> {
        let args = ["rm", "-f", name];
        let output = self.exec(&args)?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such container") {
            Ok(false)
        } else {
            Err(Self::command_failed(&args, &output))
        }
    }
}
