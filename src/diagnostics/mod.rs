use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::span::Loc;
use crate::visit::WalkError;

#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Syntax(Box<SyntaxError>),

    #[error("unknown node type '{kind}'")]
    UnknownNodeType { kind: String, loc: Option<Loc> },
}

impl PassError {
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) => Some(err.as_ref()),
            Self::UnknownNodeType { .. } => None,
        }
    }
}

impl From<WalkError> for PassError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::UnknownNodeType { kind, loc } => Self::UnknownNodeType { kind, loc },
        }
    }
}

impl From<SyntaxError> for PassError {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(Box::new(err))
    }
}

/// A fatal error raised by a handler. Carries the source text so it can be
/// rendered without the caller keeping the options around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub loc: Option<Loc>,
    pub description: String,
    pub source: String,
    pub filename: String,
}

impl SyntaxError {
    pub fn new(
        loc: Option<Loc>,
        description: impl Into<String>,
        source: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            loc,
            description: description.into(),
            source: source.into(),
            filename: filename.into(),
        }
    }

    /// Full rendering with a source excerpt and a caret under the location.
    pub fn render(&self) -> String {
        render_report(
            ariadne::ReportKind::Error,
            "syntax error",
            &self.filename,
            &self.source,
            self.loc,
            &self.description,
        )
    }
}

impl std::error::Error for SyntaxError {}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_located(f, &self.filename, self.loc)?;
        write!(f, "{}", self.description)
    }
}

/// A non-fatal diagnostic collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub loc: Option<Loc>,
    pub filename: String,
    pub description: String,
}

impl Warning {
    pub fn new(loc: Option<Loc>, filename: impl Into<String>, description: impl Into<String>) -> Self {
        Self { loc, filename: filename.into(), description: description.into() }
    }

    pub fn render(&self, source: &str) -> String {
        render_report(
            ariadne::ReportKind::Warning,
            "warning",
            &self.filename,
            source,
            self.loc,
            &self.description,
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_located(f, &self.filename, self.loc)?;
        write!(f, "warning: {}", self.description)
    }
}

fn write_located(f: &mut fmt::Formatter<'_>, filename: &str, loc: Option<Loc>) -> fmt::Result {
    match loc {
        Some(loc) => write!(f, "{}:{}:{}: ", filename, loc.start.line, loc.start.column + 1),
        None => write!(f, "{}: ", filename),
    }
}

/// Render a diagnostic with ariadne. Colour is off so the output is stable
/// when captured.
fn render_report(
    kind: ariadne::ReportKind<'_>,
    heading: &str,
    filename: &str,
    source: &str,
    loc: Option<Loc>,
    description: &str,
) -> String {
    use ariadne::{Config, Label, Report, Source};

    let Some(loc) = loc else {
        return format!("{heading}: {description}\n  --> {filename}\n");
    };
    // ariadne spans count chars.
    let bytes = loc.byte_range(source);
    let char_at = |byte: usize| source.char_indices().take_while(|(i, _)| *i < byte).count();
    let range = char_at(bytes.start)..char_at(bytes.end);
    let mut out = Vec::new();
    let written = Report::build(kind, filename, range.start)
        .with_config(Config::default().with_color(false))
        .with_message(format!("{heading} in {filename}"))
        .with_label(Label::new((filename, range)).with_message(description))
        .finish()
        .write((filename, Source::from(source)), &mut out);
    match written {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => format!("{heading}: {description}\n  --> {filename}:{}:{}\n", loc.start.line, loc.start.column + 1),
    }
}

/// Render any pass error for a terminal.
pub fn render_error(err: &PassError) -> String {
    match err {
        PassError::Syntax(err) => err.render(),
        PassError::UnknownNodeType { kind, loc } => match loc {
            Some(loc) => format!(
                "error: unknown node type '{kind}' at {}:{}\n",
                loc.start.line,
                loc.start.column + 1
            ),
            None => format!("error: unknown node type '{kind}'\n"),
        },
    }
}
