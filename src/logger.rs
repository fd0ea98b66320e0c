use std::{
    collections::HashMap,
    fmt::Write as _,
    fs::{File, OpenOptions},
    io::Write as _,
    path::{Path, PathBuf},
};
use nu_ansi_term::{Color, Style};
use serde::Deserialize;
use termcolor::ColorChoice;
use tracing::{field::{Field, Visit}, Level};
use tracing_log::NormalizeEvent;
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    fmt::FormatEvent,
    prelude::*,
};

use crate::{prelude::*, args::Args};


#[derive(Debug, Clone, confique::Config)]
pub(crate) struct LogConfig {
    /// Minimum log level per module path prefix.
    ///
    /// The entry with the longest prefix matching a message's module path
    /// decides whether that message is emitted. Messages without any matching
    /// entry are dropped. Levels: "off", "error", "warn", "info", "debug",
    /// "trace".
    ///
    /// Example: ≥"info" from memberhub, ≥"trace" from its store layer and
    /// ≥"debug" from the HTTP library:
    ///
    ///    [log]
    ///    filters.memberhub = "info"
    ///    filters."memberhub::db::store" = "trace"
    ///    filters.hyper = "debug"
    #[config(default = { "memberhub": "debug" })]
    pub(crate) filters: Filters,

    /// Optional log file that messages are appended to. `${cmd}` is replaced
    /// by the subcommand, e.g. "/var/log/memberhub-${cmd}.log".
    pub(crate) file: Option<PathBuf>,

    /// Whether to log to stdout.
    #[config(default = true)]
    pub(crate) stdout: bool,

    /// Log the headers of every HTTP request at "trace" level.
    #[config(default = false)]
    pub(crate) log_http_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub(crate) struct Filters(HashMap<String, LevelFilter>);

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;
    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        value.into_iter()
            .map(|(prefix, level)| Ok((prefix, parse_level_filter(&level)?)))
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl Filters {
    /// Returns the level filter of the longest prefix matching `target`.
    fn level_for(&self, target: &str) -> Option<LevelFilter> {
        self.0.iter()
            .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| *level)
    }
}

fn parse_level_filter(s: &str) -> Result<LevelFilter, String> {
    match s {
        "off" => Ok(LevelFilter::OFF),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!("invalid log level '{other}'")),
    }
}

/// Installs our logger globally. Must only be called once!
pub(crate) fn init(config: &LogConfig, args: &Args, cmd: &str) -> Result<()> {
    let filters = config.filters.clone();
    let max_level = filters.0.values().max().copied().unwrap_or(LevelFilter::OFF);
    let filter = FilterFn::new(move |metadata| {
        filters.level_for(metadata.target())
            .is_some_and(|level| metadata.level() <= &level)
    }).with_max_level_hint(max_level);

    let stdout_output = config.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(EventFormatter(args.color()))
            .with_writer(std::io::stdout)
    });

    let file_output = config.file.as_deref()
        .map(|path| open_log_file(path, cmd))
        .transpose()?
        .map(|file| tracing_subscriber::fmt::layer()
            .event_format(EventFormatter(args.color()))
            .with_writer(file)
            .with_ansi(args.color() == ColorChoice::Always));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(stdout_output)
        .init();

    Ok(())
}

fn open_log_file(path: &Path, cmd: &str) -> Result<File> {
    let path = path.to_str()
        .ok_or_else(|| anyhow!("log file path '{}' is not UTF-8", path.display()))?
        .replace("${cmd}", cmd);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file '{path}'"))?;

    // Separates the output of consecutive runs.
    writeln!(file).context("cannot write to log file")?;
    Ok(file)
}

type TracingWriter<'a> = tracing_subscriber::fmt::format::Writer<'a>;

/// Prints `<time> <level> <target> >  <message> ~~ key=value ...`, colored
/// by level if ANSI output is enabled.
#[derive(Clone, Copy)]
struct EventFormatter(ColorChoice);

impl<S, N> FormatEvent<S, N> for EventFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: TracingWriter<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let use_ansi = self.0 == ColorChoice::Always
            || (writer.has_ansi_escapes() && self.0 != ColorChoice::Never);

        let normalized_metadata = event.normalized_metadata();
        let metadata = normalized_metadata.as_ref().unwrap_or(event.metadata());

        let dim_style = Style::new().dimmed();
        let (level_style, body_style) = match *metadata.level() {
            Level::ERROR => (Style::new().fg(Color::Red).bold(), Style::new().fg(Color::Red)),
            Level::WARN => (Style::new().fg(Color::Yellow).bold(), Style::new().fg(Color::Yellow)),
            Level::INFO => (Style::new().fg(Color::Green), Style::new()),
            Level::DEBUG => (Style::new().fg(Color::Blue), Style::new().dimmed()),
            Level::TRACE => (Style::new().fg(Color::Magenta), Style::new().fg(Color::DarkGray)),
        };

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f");
        with_style(&mut writer, use_ansi, dim_style, |w| write!(w, "{now} "))?;
        with_style(&mut writer, use_ansi, level_style, |w| write!(w, "{:5}", metadata.level()))?;
        with_style(&mut writer, use_ansi, dim_style, |w| write!(w, " {} >  ", metadata.target()))?;
        with_style(&mut writer, use_ansi, body_style, |w| write!(w, "{}", fields.message))?;
        if !fields.rest.is_empty() {
            with_style(&mut writer, use_ansi, level_style, |w| write!(w, " ~~"))?;
            with_style(&mut writer, use_ansi, body_style, |w| write!(w, "{}", fields.rest))?;
        }

        writeln!(writer)
    }
}

/// Splits the fields of an event into the message and everything else.
#[derive(Default)]
struct FieldCollector {
    message: String,
    rest: String,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let name = field.name();
        if name == "message" {
            let _ = write!(self.message, "{value:?}");
        } else if !name.starts_with("log.") {
            let _ = write!(self.rest, " {name}={value:?}");
        }
    }
}

fn with_style(
    out: &mut TracingWriter<'_>,
    use_ansi: bool,
    style: Style,
    f: impl FnOnce(&mut TracingWriter<'_>) -> std::fmt::Result,
) -> std::fmt::Result {
    if use_ansi {
        write!(out, "{}", style.prefix())?;
    }
    f(out)?;
    if use_ansi {
        write!(out, "{}", style.suffix())?;
    }
    Ok(())
}
