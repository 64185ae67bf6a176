#![forbid(unsafe_code)]

//! Human-readable import report formatter

use crate::report::{ImportReport, Report};
use crate::types::ImportStatus;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Colored, line-oriented rendering of an import report
pub struct HumanFormatter {
    color: ColorChoice,
}

impl HumanFormatter {
    pub fn new(color: ColorChoice) -> Self {
        HumanFormatter { color }
    }

    /// Writes the report to any color-capable writer
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the writer.
    pub fn write(&self, out: &mut impl WriteColor, report: &ImportReport) -> io::Result<()> {
        let mut errors: Vec<_> = report
            .object_reports()
            .into_iter()
            .flat_map(|object| {
                object
                    .error_reports()
                    .iter()
                    .map(move |error| (object, error))
            })
            .collect();
        errors.sort_by_key(|(object, _)| object.index());

        for (object, error) in &errors {
            let color = if error.is_error() { Color::Red } else { Color::Yellow };
            out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            write!(out, "{}", error.severity.as_str())?;
            out.reset()?;
            write!(
                out,
                " {} {}[{}]",
                error.error_code,
                object.object_type(),
                object.index()
            )?;
            if let Some(uid) = object.uid() {
                write!(out, " {}", uid)?;
            }
            writeln!(out, ": {}", error.message)?;
        }
        if !errors.is_empty() {
            writeln!(out)?;
        }

        for type_report in report.type_reports().iter() {
            let stats = type_report.stats();
            writeln!(
                out,
                "{}: {} created, {} updated, {} deleted, {} ignored",
                type_report.object_type(),
                stats.created(),
                stats.updated(),
                stats.deleted(),
                stats.ignored()
            )?;
        }

        let stats = report.stats();
        let status = report.status();
        let color = match status {
            ImportStatus::Ok => Color::Green,
            ImportStatus::Warning => Color::Yellow,
            ImportStatus::Error => Color::Red,
        };
        write!(out, "Import ")?;
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{}", status)?;
        out.reset()?;
        writeln!(out, " ({} objects)", stats.total())?;
        Ok(())
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, report: &ImportReport) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(self.color);
        self.write(&mut stdout, report)?;
        stdout.flush()
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}
