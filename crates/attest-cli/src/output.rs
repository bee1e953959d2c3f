use std::io::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use time::format_description::well_known::Rfc3339;

use attest_core::aggregate::InspectReport;
use attest_core::errors::{ItemError, Severity};
use attest_core::model::{Status, VerificationRecord};
use attest_core::outcome::{Verdict, VerifyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    #[default]
    Plain,
    Json,
}

impl OutputMode {
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

fn color_stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

pub fn inspect(mode: OutputMode, report: &InspectReport) -> Result<()> {
    if mode.is_json() {
        return print_json(report);
    }
    let mut out = color_stdout();
    write_inspect(&mut out, report)?;
    Ok(())
}

pub fn verify(mode: OutputMode, outcome: &VerifyOutcome) -> Result<()> {
    if mode.is_json() {
        return print_json(outcome);
    }
    let mut out = color_stdout();
    write_verify(&mut out, outcome)?;
    Ok(())
}

pub fn write_inspect<W: WriteColor>(w: &mut W, report: &InspectReport) -> io::Result<()> {
    match &report.signer {
        None => writeln!(w, "no signer ID provided. Full history of the item is returned")?,
        Some(s) => {
            write!(w, "current signerID ")?;
            w.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            writeln!(w, "{s}")?;
            w.reset()?;
        }
    }
    writeln!(w, "{} notarizations found for \"{}\"", report.total(), report.fingerprint)?;
    writeln!(w)?;

    for row in &report.results {
        match &row.record {
            Some(r) => writeln!(w, "{}", record_line(r))?,
            None => writeln!(w, "<unreadable entry>")?,
        }
        for e in &row.errors {
            write_error(w, e)?;
        }
    }

    let s = &report.summary;
    if s.with_errors > 0 {
        writeln!(w)?;
        writeln!(
            w,
            "{} of {} entries have errors ({} out of sync, {} malformed, {} failed verification)",
            s.with_errors, s.total, s.mismatched, s.malformed, s.not_verified
        )?;
    }
    Ok(())
}

pub fn write_verify<W: WriteColor>(w: &mut W, outcome: &VerifyOutcome) -> io::Result<()> {
    match outcome.verdict {
        Verdict::NotNotarized => {
            w.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            writeln!(w, "{} was not notarized", outcome.fingerprint)?;
            w.reset()?;
        }
        Verdict::Compromised => {
            w.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            writeln!(
                w,
                "the ledger is compromised. Please contact the ledger administrators"
            )?;
            w.reset()?;
        }
        Verdict::Notarized => {}
    }

    if let Some(r) = outcome.record() {
        writeln!(w, "hash:     {}", r.fingerprint)?;
        if let Some(n) = &r.name {
            writeln!(w, "name:     {n}")?;
        }
        if let Some(s) = &r.signer {
            writeln!(w, "signer:   {s}")?;
        }
        writeln!(w, "level:    {}", r.level)?;
        writeln!(w, "date:     {}", format_time(r))?;
    }
    write!(w, "status:   ")?;
    w.set_color(ColorSpec::new().set_fg(Some(status_color(outcome.status))))?;
    writeln!(w, "{}", outcome.status)?;
    w.reset()?;

    for e in outcome.result.errors.iter().filter(|e| !matches!(e, ItemError::NotVerified)) {
        write_error(w, e)?;
    }
    Ok(())
}

fn record_line(r: &VerificationRecord) -> String {
    let mut line = format!("tx {:<6} {}  {:<14} level {}", r.tx, format_time(r), r.status.as_str(), r.level);
    if let Some(s) = &r.signer {
        line.push_str(&format!("  signer {s}"));
    }
    if let Some(n) = &r.name {
        line.push_str(&format!("  {n}"));
    }
    line
}

fn format_time(r: &VerificationRecord) -> String {
    r.timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| r.timestamp.unix_timestamp().to_string())
}

fn write_error<W: WriteColor>(w: &mut W, e: &ItemError) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    match e.severity() {
        Severity::Critical => spec.set_fg(Some(Color::Red)).set_bold(true),
        Severity::Error => spec.set_fg(Some(Color::Red)),
        Severity::Warning => spec.set_fg(Some(Color::Yellow)),
    };
    w.set_color(&spec)?;
    writeln!(w, "  [{}] {}", e.code(), e)?;
    w.reset()
}

fn status_color(s: Status) -> Color {
    match s {
        Status::Trusted => Color::Green,
        Status::Untrusted | Status::ApikeyRevoked => Color::Red,
        Status::Unknown | Status::Unsupported => Color::Yellow,
    }
}
