//! Docker and compose checks.

use async_trait::async_trait;

use super::{CheckContext, CheckOutcome, ProjectCheck};
use crate::process;

/// Instructions a Dockerfile line may start with.
const DOCKER_INSTRUCTIONS: &[&str] = &[
    "FROM",
    "RUN",
    "CMD",
    "LABEL",
    "EXPOSE",
    "ENV",
    "ADD",
    "COPY",
    "ENTRYPOINT",
    "VOLUME",
    "USER",
    "WORKDIR",
    "ARG",
    "ONBUILD",
    "STOPSIGNAL",
    "HEALTHCHECK",
    "SHELL",
];

/// Instructions every station Dockerfile must contain.
const REQUIRED_INSTRUCTIONS: &[&str] = &["FROM", "WORKDIR", "CMD"];

const COMPOSE_FILE: &str = "docker-compose.yml";

/// `docker-compose config` accepts the compose file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerComposeSyntax;

#[async_trait]
impl ProjectCheck for DockerComposeSyntax {
    fn name(&self) -> &'static str {
        "docker-compose-syntax"
    }

    fn description(&self) -> &'static str {
        "docker-compose config parses the compose file"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        if !tokio::fs::try_exists(ctx.path(COMPOSE_FILE))
            .await
            .unwrap_or(false)
        {
            return CheckOutcome::skipped(format!("no {COMPOSE_FILE}"));
        }

        match process::run(
            "docker-compose",
            &["config", "--quiet"],
            Some(ctx.root()),
            ctx.command_timeout(),
        )
        .await
        {
            Ok(output) if output.success() => CheckOutcome::Passed,
            Ok(output) => CheckOutcome::failed(format!(
                "Docker Compose syntax error: {}",
                output.stderr.trim()
            )),
            Err(err) => CheckOutcome::from_command_error(&err),
        }
    }
}

/// The Dockerfile exists and every instruction line is recognised.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerfileSyntax;

impl DockerfileSyntax {
    /// Check Dockerfile text.
    #[must_use]
    pub fn check_content(content: &str) -> CheckOutcome {
        for required in REQUIRED_INSTRUCTIONS {
            if !content.contains(required) {
                return CheckOutcome::failed(format!("Dockerfile missing {required} instruction"));
            }
        }

        let mut continued = false;
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let is_continuation = continued;
            continued = trimmed.ends_with('\\');
            if is_continuation || line.starts_with([' ', '\t']) {
                continue;
            }

            let keyword = trimmed
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            if !DOCKER_INSTRUCTIONS.contains(&keyword.as_str()) {
                return CheckOutcome::failed(format!(
                    "Invalid Docker instruction at line {}: {line}",
                    idx + 1
                ));
            }
        }

        CheckOutcome::Passed
    }
}

#[async_trait]
impl ProjectCheck for DockerfileSyntax {
    fn name(&self) -> &'static str {
        "dockerfile-syntax"
    }

    fn description(&self) -> &'static str {
        "Dockerfile has FROM, WORKDIR, CMD and only valid instructions"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        match tokio::fs::read_to_string(ctx.path("Dockerfile")).await {
            Ok(content) => Self::check_content(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                CheckOutcome::failed("Dockerfile not found")
            }
            Err(err) => CheckOutcome::failed(format!("cannot read Dockerfile: {err}")),
        }
    }
}

/// docker-compose.yml sets the station's essential variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentVariables;

#[async_trait]
impl ProjectCheck for EnvironmentVariables {
    fn name(&self) -> &'static str {
        "environment-variables"
    }

    fn description(&self) -> &'static str {
        "docker-compose.yml mentions every essential station variable"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Ok(content) = tokio::fs::read_to_string(ctx.path(COMPOSE_FILE)).await else {
            return CheckOutcome::Passed;
        };

        let missing: Vec<&str> = ctx
            .config()
            .essential_env_vars
            .iter()
            .map(String::as_str)
            .filter(|var| !content.contains(var))
            .collect();

        if missing.is_empty() {
            CheckOutcome::Passed
        } else {
            CheckOutcome::failed(format!(
                "essential environment variables not found in {COMPOSE_FILE}: {}",
                missing.join(", ")
            ))
        }
    }
}

/// `docker build --dry-run` reports no errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerBuild;

#[async_trait]
impl ProjectCheck for DockerBuild {
    fn name(&self) -> &'static str {
        "docker-build"
    }

    fn description(&self) -> &'static str {
        "docker can parse the Dockerfile"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        match process::run(
            "docker",
            &["build", "--dry-run", "."],
            Some(ctx.root()),
            ctx.docker_build_timeout(),
        )
        .await
        {
            Ok(output) if output.stderr.to_uppercase().contains("ERROR") => {
                CheckOutcome::failed(format!("docker build reported: {}", output.stderr.trim()))
            }
            Ok(_) => CheckOutcome::Passed,
            Err(err) => CheckOutcome::from_command_error(&err),
        }
    }
}
