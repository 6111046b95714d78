//! Convert HTML to PDF with an external command that reads HTML on stdin
//! and writes PDF to stdout (`wkhtmltopdf --quiet - -` by default).

use std::process::Stdio;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::config::{DEFAULT_PDF_COMMAND, split_command};
use crate::mail::{Blob, DocumentRenderer};

#[derive(Clone, Debug)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("PDF command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Default for CommandRenderer {
    fn default() -> Self {
        let mut command = split_command(DEFAULT_PDF_COMMAND).into_iter();
        Self {
            program: command.next().unwrap_or_default(),
            args: command.collect(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for CommandRenderer {
    async fn html_to_pdf(&self, html: &Blob) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("No stdin for {}", self.program))?;
        let input = html.bytes.clone();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        let written = writer.await?;

        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {} ({})",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        written.context("Failed to write HTML to renderer")?;
        tracing::debug!("Rendered {} into {} bytes", html.name, output.stdout.len());

        Ok(output.stdout)
    }
}
