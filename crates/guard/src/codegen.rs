use crate::{GuardError, Result};
use async_trait::async_trait;
use specguard_protocol::{write_text_atomic, GeneratorCommand};
use specguard_spec::SpecificationEntry;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// One missing handler to produce.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub unit: &'a str,
    pub entry: &'a SpecificationEntry,
    /// Absolute path of the file to write
    pub target: PathBuf,
}

/// Produces the body of one missing handler file.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<()>;
}

/// Runs an external program once per entry. The entry is passed through
/// `SPECGUARD_*` environment variables and its body text on stdin; whatever
/// the program prints becomes the file body. A program that writes the
/// target itself may print nothing.
pub struct CommandGenerator {
    command: GeneratorCommand,
    root: PathBuf,
    limit: Duration,
}

impl CommandGenerator {
    pub fn new(command: GeneratorCommand, root: impl Into<PathBuf>, limit: Duration) -> Self {
        Self {
            command,
            root: root.into(),
            limit,
        }
    }
}

#[async_trait]
impl CodeGenerator for CommandGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<()> {
        let target = request.target.display().to_string();
        let fail = |message: String| GuardError::Generator {
            target: target.clone(),
            message,
        };

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .current_dir(&self.root)
            .env("SPECGUARD_UNIT", request.unit)
            .env("SPECGUARD_METHOD", request.entry.method.as_str())
            .env("SPECGUARD_ROUTE", &request.entry.route)
            .env("SPECGUARD_PATH", &request.entry.path)
            .env("SPECGUARD_TARGET", &request.target)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fail(format!("cannot start {}: {e}", self.command.program)))?;

        // Feeding stdin runs alongside the wait, so a program that never
        // reads its input still hits the limit.
        let stdin = child.stdin.take();
        let body = request.entry.body_text.as_bytes();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(body).await {
                    log::debug!("Generator closed stdin early: {e}");
                }
            }
        };
        let exchange = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = timeout(self.limit, exchange)
            .await
            .map_err(|_| fail(format!("timed out after {}s", self.limit.as_secs())))?
            .map_err(|e| fail(e.to_string()))?;
        if !output.status.success() {
            return Err(fail(format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if !output.stdout.is_empty() {
            write_text_atomic(&request.target, &String::from_utf8_lossy(&output.stdout))?;
        }
        if !request.target.is_file() {
            return Err(fail("generator produced no output".to_string()));
        }
        Ok(())
    }
}

/// Writes a handler that answers the declared method with 501. Used when no
/// external generator is configured.
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    pub fn render(request: &GenerationRequest<'_>) -> String {
        let method = request.entry.method.as_str();
        format!(
            "// Generated by specguard from {unit}: {method} {route}\n\
             export default async function handler(req, res) {{\n\
             \x20 if (req.method !== '{method}') {{\n\
             \x20   return res.status(405).end();\n\
             \x20 }}\n\
             \x20 return res.status(501).json({{ error: 'Not implemented' }});\n\
             }}\n",
            unit = request.unit,
            route = request.entry.route,
        )
    }
}

#[async_trait]
impl CodeGenerator for PlaceholderGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<()> {
        write_text_atomic(&request.target, &Self::render(request))?;
        Ok(())
    }
}

pub fn generator_from_config(
    command: Option<&GeneratorCommand>,
    root: &Path,
    limit: Duration,
) -> Box<dyn CodeGenerator> {
    match command {
        Some(command) => Box::new(CommandGenerator::new(command.clone(), root, limit)),
        None => Box::new(PlaceholderGenerator),
    }
}
