//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`] which handles format switching.
//! Reports go to stdout; logs go to stderr, so `--output json` stays parseable.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use vmprep_core::step::{RunReport, StepOutcome};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Abstraction for writing CLI output in different formats.
///
/// Subcommand handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer with the specified format.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vmprep_cli::cli::OutputFormat;
    /// use vmprep_cli::output::OutputWriter;
    ///
    /// let writer = OutputWriter::new(OutputFormat::Text);
    /// ```
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(&mut handle, payload)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// For `Text` format, delegates to `Render::render_text()`.
    /// For `Json` format, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} {}", "Pipeline:".bold(), self.pipeline)?;
        for record in &self.steps {
            let marker = match record.outcome {
                StepOutcome::Succeeded => "ok".green().bold(),
                StepOutcome::Tolerated { .. } => "ignored".yellow().bold(),
                StepOutcome::Probed { .. } => "probe".cyan(),
            };
            write!(
                w,
                "  [{marker}] {:<22} {}",
                record.step,
                record.command.dimmed()
            )?;
            match record.outcome {
                StepOutcome::Tolerated { exit_code } | StepOutcome::Probed { exit_code } => {
                    write!(w, " (exit {exit_code})")?;
                }
                StepOutcome::Succeeded => {}
            }
            writeln!(w)?;
        }

        let tolerated = self.tolerated_count();
        writeln!(
            w,
            "{} {} steps, {} ignored failures",
            "Done:".green().bold(),
            self.steps.len(),
            tolerated
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use vmprep_core::step::StepRecord;

    use super::*;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new("provision");
        report.steps.push(StepRecord {
            step: "prerequisite-query".to_owned(),
            command: "rpm -q beakerlib".to_owned(),
            outcome: StepOutcome::Probed { exit_code: 1 },
            duration_ms: 3,
        });
        report.steps.push(StepRecord {
            step: "erase".to_owned(),
            command: "rpm -e foo".to_owned(),
            outcome: StepOutcome::Tolerated { exit_code: 1 },
            duration_ms: 5,
        });
        report.steps.push(StepRecord {
            step: "install".to_owned(),
            command: "yum install -y foo-1.2-3.x86_64.rpm".to_owned(),
            outcome: StepOutcome::Succeeded,
            duration_ms: 900,
        });
        report
    }

    #[test]
    fn test_run_report_render_text() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        sample_report()
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Pipeline: provision"));
        assert!(output.contains("[ignored] erase"));
        assert!(output.contains("rpm -e foo (exit 1)"));
        assert!(output.contains("[ok] install"));
        assert!(output.contains("3 steps, 1 ignored failures"));
    }

    #[test]
    fn test_output_writer_json_format() {
        let writer = OutputWriter::new(OutputFormat::Json);
        let mut buffer = Vec::new();
        writer
            .render_to(&mut buffer, &sample_report())
            .expect("json rendering should succeed");

        let parsed: serde_json::Value =
            serde_json::from_slice(&buffer).expect("output should be valid JSON");
        assert_eq!(parsed["pipeline"], "provision");
        assert_eq!(parsed["steps"][1]["outcome"]["status"], "tolerated");
        assert_eq!(parsed["steps"][1]["outcome"]["exit_code"], 1);
        assert_eq!(parsed["steps"][2]["outcome"]["status"], "succeeded");
    }

    #[test]
    fn test_output_writer_json_is_pretty() {
        let writer = OutputWriter::new(OutputFormat::Json);
        let mut buffer = Vec::new();
        writer
            .render_to(&mut buffer, &RunReport::new("dispatch"))
            .expect("json rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains('\n'), "pretty JSON should contain newlines");
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_output_writer_text_format() {
        colored::control::set_override(false);
        let writer = OutputWriter::new(OutputFormat::Text);
        let mut buffer = Vec::new();
        writer
            .render_to(&mut buffer, &RunReport::new("dispatch"))
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Pipeline: dispatch"));
        assert!(output.contains("0 steps"));
    }
}
