//! Best-effort desktop integration.
//!
//! Everything here shells out to whatever tools are installed and falls
//! through to the next strategy on failure:
//! - selection copy: `xdotool key ctrl+c`, or nothing
//! - clipboard write: `xclip` → `wl-copy` → `pbcopy` → `clip` → fallback file
//! - clipboard read: `xclip -o` → `wl-paste` → `pbpaste`

pub mod clipboard;
pub mod selection;

pub use clipboard::{ClipboardChain, ClipboardTool, Delivery};
pub use selection::SelectionCopier;

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

/// Whether `program` resolves on `PATH`.
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

fn spawn_tool(
    program: &OsStr,
    args: &[&str],
    stdin: Option<&str>,
    stdout: Stdio,
) -> Result<Child> {
    Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(stdout)
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {}", program.to_string_lossy()))
}

async fn feed_stdin(child: &mut Child, program: &OsStr, input: &str) -> Result<()> {
    let mut pipe = child.stdin.take().context("stdin not captured")?;
    pipe.write_all(input.as_bytes())
        .await
        .with_context(|| format!("failed to write to {}", program.to_string_lossy()))?;
    // Close stdin so the tool sees EOF.
    drop(pipe);
    Ok(())
}

/// Run `program args...`, optionally feeding `stdin`, and return stdout.
///
/// A non-zero exit status is an error. Only for tools that exit once their
/// output is written: a forked background child holding stdout open would
/// block this until it exits.
pub(crate) async fn run_tool(
    program: impl AsRef<OsStr>,
    args: &[&str],
    stdin: Option<&str>,
) -> Result<String> {
    let program = program.as_ref();
    let mut child = spawn_tool(program, args, stdin, Stdio::piped())?;
    if let Some(input) = stdin {
        feed_stdin(&mut child, program, input).await?;
    }

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("failed to wait for {}", program.to_string_lossy()))?;
    if !output.status.success() {
        bail!("{} exited with {}", program.to_string_lossy(), output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run `program args...` for its side effect, discarding output.
///
/// Waits for the direct child only. `xclip` and `wl-copy` fork a process
/// that keeps serving the selection after the parent exits.
pub(crate) async fn run_detached(
    program: impl AsRef<OsStr>,
    args: &[&str],
    stdin: Option<&str>,
) -> Result<()> {
    let program = program.as_ref();
    let mut child = spawn_tool(program, args, stdin, Stdio::null())?;
    if let Some(input) = stdin {
        feed_stdin(&mut child, program, input).await?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("failed to wait for {}", program.to_string_lossy()))?;
    if !status.success() {
        bail!("{} exited with {status}", program.to_string_lossy());
    }
    Ok(())
}
