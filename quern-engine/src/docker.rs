//! Docker container management
//!
//! Drives the container lifecycle for job execution through the docker
//! CLI: listing candidate images, creating the job container with its
//! bind mounts, starting it, streaming its stdout for diagnostics,
//! waiting for the exit code, and removing the container afterwards.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::staging::Bind;

/// Checks that docker is installed and responding
pub fn check_available() -> Result<()> {
    let output = std::process::Command::new("docker")
        .arg("--version")
        .output()
        .context("failed to execute 'docker --version'. Is docker installed?")?;

    if !output.status.success() {
        anyhow::bail!("docker is not working correctly");
    }

    let version = String::from_utf8_lossy(&output.stdout);
    info!("docker is available: {}", version.trim());

    Ok(())
}

/// A locally available image, as reported by `docker images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub id: String,
    /// `repository:tag` form
    pub reference: String,
}

/// Thin wrapper over the docker CLI
#[derive(Debug, Clone, Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    /// Lists local images whose repository matches `name`.
    pub async fn list_images(&self, name: &str) -> Result<Vec<ImageEntry>> {
        let stdout = self
            .run(&[
                "images",
                "--filter",
                &format!("reference={name}"),
                "--format",
                "{{.ID}}\t{{.Repository}}:{{.Tag}}",
            ])
            .await?;

        Ok(stdout
            .lines()
            .filter_map(|line| {
                let (id, reference) = line.split_once('\t')?;
                Some(ImageEntry {
                    id: id.to_string(),
                    reference: reference.to_string(),
                })
            })
            .collect())
    }

    /// Creates a container from `image` with the job's bind mounts and
    /// command line. Returns the container id.
    pub async fn create(&self, image: &str, command: &str, binds: &[Bind]) -> Result<String> {
        debug!("creating container from {image} with command '{command}'");

        let mut args: Vec<String> = vec!["create".to_string()];
        for bind in binds {
            args.push("-v".to_string());
            let mut spec = format!("{}:{}", bind.host.display(), bind.container);
            if bind.read_only {
                spec.push_str(":ro");
            }
            args.push(spec);
        }
        args.push(image.to_string());
        args.extend(command.split_whitespace().map(str::to_string));

        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.run(&refs).await?;

        let id = stdout
            .lines()
            .last()
            .unwrap_or_default()
            .trim()
            .to_string();
        if id.is_empty() {
            anyhow::bail!("docker create returned no container id");
        }
        Ok(id)
    }

    /// Starts a created container.
    pub async fn start(&self, container_id: &str) -> Result<()> {
        debug!("starting container {container_id}");
        self.run(&["start", container_id]).await?;
        Ok(())
    }

    /// Streams the container's stdout, line by line, at debug verbosity.
    ///
    /// Purely diagnostic: consumes `docker logs --follow` until the
    /// container exits. Stderr is not followed.
    pub async fn stream_stdout(&self, container_id: &str) -> Result<()> {
        let mut child = Command::new("docker")
            .args(["logs", "--follow", container_id])
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("failed to execute 'docker logs'")?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                debug!("[{container_id}] {line}");
            }
        }

        child.wait().await.context("'docker logs' did not exit")?;
        Ok(())
    }

    /// Blocks until the container exits and returns its exit code.
    pub async fn wait(&self, container_id: &str) -> Result<i64> {
        let stdout = self.run(&["wait", container_id]).await?;
        stdout
            .trim()
            .parse::<i64>()
            .with_context(|| format!("unexpected 'docker wait' output: {stdout:?}"))
    }

    /// Removes the container and its writable layer.
    pub async fn remove(&self, container_id: &str) -> Result<()> {
        debug!("removing container {container_id}");
        self.run(&["rm", "-v", container_id]).await?;
        Ok(())
    }

    /// Runs one docker command to completion, returning its stdout.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("docker")
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to execute 'docker {}'", args.join(" ")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "'docker {}' failed: exit_code={}, stderr='{}'",
                args.join(" "),
                exit_code,
                stderr.trim()
            );
        }

        if !stderr.trim().is_empty() {
            debug!("docker {} stderr: {}", args[0], stderr.trim());
        }

        Ok(stdout)
    }
}
