//! Physics engine run as a child process.
//!
//! The engine reads one JSON [`EngineInput`] document on stdin and writes
//! one JSON [`EngineOutput`] document on stdout.

use log::{debug, info};
use roadcast_data::engine::{EngineInput, EngineOutput, PhysicsEngine};
use roadcast_data::error::{ProcessError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, Clone)]
pub struct ExternalEngine {
    program: String,
    args: Vec<String>,
}

impl ExternalEngine {
    /// Split `command_line` on whitespace into a program and its arguments.
    pub fn new(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(ExternalEngine {
            program,
            args: parts.collect(),
        })
    }
}

fn engine_error(context: &str, e: impl std::fmt::Display) -> ProcessError {
    ProcessError::Engine(format!("{}: {}", context, e))
}

impl PhysicsEngine for ExternalEngine {
    fn run(&mut self, input: &EngineInput) -> Result<EngineOutput> {
        info!("Starting engine '{}'", self.program);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| engine_error(&format!("cannot start '{}'", self.program), e))?;

        let payload =
            serde_json::to_vec(input).map_err(|e| engine_error("cannot encode input", e))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::Engine("engine stdin unavailable".to_string()))?;
        // stdout is drained while the input is written
        let writer = thread::spawn(move || stdin.write_all(&payload).and_then(|_| stdin.flush()));

        let output = child
            .wait_with_output()
            .map_err(|e| engine_error("engine did not finish", e))?;
        let written = writer
            .join()
            .map_err(|_| ProcessError::Engine("input writer panicked".to_string()))?;
        if !output.status.success() {
            return Err(ProcessError::Engine(format!(
                "'{}' exited with {}",
                self.program, output.status
            )));
        }
        written.map_err(|e| engine_error("cannot send input", e))?;
        debug!("Engine wrote {} bytes", output.stdout.len());
        serde_json::from_slice(&output.stdout).map_err(|e| engine_error("invalid engine output", e))
    }
}
