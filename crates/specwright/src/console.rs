//! Console reporter with coloured, indented output.
//!
//! ```text
//! StackSpec
//!   ✓ A Stack should pop the last pushed value
//!   ✗ A Stack should refuse a pop when empty
//!     Error: expected None
//!   - A Stack should grow without bound (ignored)
//! ```

use crate::event::{Event, EventKind};
use crate::reporter::{Reporter, RunSummary};
use colored::{ColoredString, Colorize};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

/// Writes a human-readable line per event and a summary at the end.
pub struct ConsoleReporter<W = io::Stdout> {
    out: W,
    color: bool,
    summary: RunSummary,
}

impl ConsoleReporter<io::Stdout> {
    /// Report to stdout, coloured when stdout is a terminal and `NO_COLOR`
    /// is unset.
    pub fn new() -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        ConsoleReporter::with_writer(io::stdout(), color)
    }
}

impl Default for ConsoleReporter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn with_writer(out: W, color: bool) -> Self {
        ConsoleReporter {
            out,
            color,
            summary: RunSummary::default(),
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print PASS/FAIL, the totals, and every failure message.
    pub fn print_summary(&mut self, elapsed: Duration) {
        let summary = self.summary.clone();
        let parts: Vec<String> = [
            (summary.succeeded > 0)
                .then(|| self.paint(&format!("{} passed", summary.succeeded), |s| s.green())),
            (summary.failed > 0)
                .then(|| self.paint(&format!("{} failed", summary.failed), |s| s.red())),
            (summary.pending > 0)
                .then(|| self.paint(&format!("{} pending", summary.pending), |s| s.yellow())),
            (summary.ignored > 0)
                .then(|| self.paint(&format!("{} ignored", summary.ignored), |s| s.dimmed())),
        ]
        .into_iter()
        .flatten()
        .collect();

        let elapsed = self.paint(&format!("{:.3}s", elapsed.as_secs_f64()), |s| s.dimmed());
        let totals = if parts.is_empty() {
            format!("no tests run ({elapsed})")
        } else {
            format!("{} ({elapsed})", parts.join(", "))
        };

        self.line(String::new());
        if summary.all_passed() {
            let pass = self.paint("PASS", |s| s.green());
            self.line(pass);
            self.line(totals);
        } else {
            let fail = self.paint("FAIL", |s| s.red());
            self.line(fail);
            self.line(totals);
            self.line(String::new());
            self.line("Failures:".to_string());
            for (i, failure) in summary.failures.iter().enumerate() {
                self.line(format!("  {}. {failure}", i + 1));
            }
            self.line(String::new());
        }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: String) {
        if let Err(err) = writeln!(self.out, "{text}") {
            tracing::warn!(%err, "console reporter failed to write");
        }
    }

    fn timing(&self, event: &Event) -> String {
        match event.duration() {
            Some(d) if d.as_millis() > 100 => {
                format!(" {}", self.paint(&format!("({}ms)", d.as_millis()), |s| s.dimmed()))
            }
            _ => String::new(),
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn test_starting(&mut self, _event: &Event) {}

    fn test_succeeded(&mut self, event: &Event) {
        self.summary.record(EventKind::TestSucceeded, event);
        let mark = self.paint("✓", |s| s.green());
        let timing = self.timing(event);
        self.line(format!("  {mark} {}{timing}", event.name()));
    }

    fn test_failed(&mut self, event: &Event) {
        self.summary.record(EventKind::TestFailed, event);
        let mark = self.paint("✗", |s| s.red());
        let name = self.paint(event.name(), |s| s.red());
        let timing = self.timing(event);
        let error = self.paint(&format!("Error: {}", event.message()), |s| s.red());
        self.line(format!("  {mark} {name}{timing}"));
        self.line(format!("    {error}"));
    }

    fn test_ignored(&mut self, event: &Event) {
        self.summary.record(EventKind::TestIgnored, event);
        let mark = self.paint("-", |s| s.yellow());
        let name = self.paint(&format!("{} (ignored)", event.name()), |s| s.dimmed());
        self.line(format!("  {mark} {name}"));
    }

    fn test_pending(&mut self, event: &Event) {
        self.summary.record(EventKind::TestPending, event);
        let mark = self.paint("~", |s| s.yellow());
        let name = self.paint(&format!("{} (pending)", event.name()), |s| s.dimmed());
        self.line(format!("  {mark} {name}"));
    }

    fn suite_starting(&mut self, event: &Event) {
        let header = self.paint(event.name(), |s| s.bold());
        self.line(String::new());
        self.line(header);
    }

    fn info_provided(&mut self, event: &Event) {
        let message = self.paint(&format!("+ {}", event.message()), |s| s.dimmed());
        self.line(format!("    {message}"));
    }
}
