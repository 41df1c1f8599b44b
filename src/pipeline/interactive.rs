//! Terminal front end: type text, get the improved version on the clipboard.

use super::{CycleOutcome, PipelineOrchestrator};
use crate::desktop::Delivery;
use anyhow::Result;
use console::style;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::sync::CancellationToken;

/// Number of consecutive blank lines that ends a block of input.
pub const END_OF_INPUT_BLANKS: usize = 2;

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

/// Read lines until two consecutive blank lines.
///
/// A single blank line is kept as a paragraph break. The result is trimmed.
/// Returns `None` if the reader is exhausted before any line arrives; an
/// input that ends mid-block yields what was collected.
pub async fn read_multiline<R>(lines: &mut Lines<R>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut collected: Vec<String> = Vec::new();
    let mut blanks = 0;
    let mut saw_line = false;

    while let Some(line) = lines.next_line().await? {
        saw_line = true;
        if line.trim().is_empty() {
            blanks += 1;
            if blanks >= END_OF_INPUT_BLANKS {
                break;
            }
        } else {
            blanks = 0;
        }
        collected.push(line);
    }

    if !saw_line {
        return Ok(None);
    }
    Ok(Some(collected.join("\n").trim().to_string()))
}

impl PipelineOrchestrator {
    /// Prompt, read, improve, print and deliver until `quit`, end of input
    /// or cancellation.
    pub async fn run_interactive<R, W>(
        &self,
        reader: R,
        mut out: W,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = reader.lines();

        writeln!(out, "{}", style("Writing Assistant").bold())?;
        writeln!(
            out,
            "Model {} at {}. Type 'quit' to exit.\n",
            self.client.model(),
            self.client.base_url()
        )?;

        loop {
            write!(out, "Press ENTER to start writing: ")?;
            out.flush()?;

            let start = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(start) = start else { break };
            if is_quit(&start) {
                break;
            }

            writeln!(out, "Enter your text (press ENTER twice when finished):")?;
            out.flush()?;
            let text = tokio::select! {
                _ = cancel.cancelled() => break,
                text = read_multiline(&mut lines) => text?,
            };
            let Some(text) = text else { break };
            if is_quit(&text) {
                break;
            }
            if text.is_empty() {
                writeln!(out, "{}\n", style("No text entered. Try again.").yellow())?;
                continue;
            }

            writeln!(out, "Improving your text...")?;
            out.flush()?;
            match self.process_text(&text).await {
                CycleOutcome::Delivered {
                    text: improved,
                    delivery,
                } => {
                    writeln!(out, "\n{}", style("ORIGINAL").bold().dim())?;
                    writeln!(out, "{text}")?;
                    writeln!(out, "\n{}", style("IMPROVED").bold().green())?;
                    writeln!(out, "{improved}\n")?;
                    match delivery {
                        Delivery::Clipboard(tool) => {
                            writeln!(out, "Copied to clipboard ({tool}).\n")?
                        }
                        Delivery::File(path) => {
                            writeln!(out, "No clipboard tool found, saved to {}\n", path.display())?
                        }
                    }
                }
                CycleOutcome::Skipped => {
                    writeln!(out, "{}\n", style("Nothing to improve.").yellow())?
                }
                CycleOutcome::Failed => writeln!(
                    out,
                    "{}\n",
                    style("Could not improve the text. Is Ollama running?").red()
                )?,
                CycleOutcome::Idle => {}
            }
        }

        writeln!(out, "\nGoodbye!")?;
        out.flush()?;
        Ok(())
    }
}
