//! Placeholder templates for log lines and the tracing formatter that
//! renders them.
//!
//! | placeholder | renders |
//! |---|---|
//! | `%{id}` | per-logger sequence number, from 1 |
//! | `%{time}` / `%{time:<strftime>}` | local timestamp |
//! | `%{module}` | logger name |
//! | `%{file}` / `%{filename}` | caller path / caller file name |
//! | `%{line}` | caller line |
//! | `%{level}` | `CRITICAL` .. `DEBUG` |
//! | `%{category}` | entry category |
//! | `%{message}` | entry text |

use std::fmt::{self, Write as _};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

use crate::error::LogError;
use crate::level::LogLevel;

const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %z";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Id,
    Time(String),
    Module,
    File,
    FileName,
    Line,
    Level,
    Category,
    Message,
}

/// A parsed log line template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

/// Everything a template can refer to.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub id: u64,
    pub time: DateTime<Local>,
    pub module: &'a str,
    pub file: &'a str,
    pub line: u32,
    pub level: LogLevel,
    pub category: &'a str,
    pub message: &'a str,
}

impl Template {
    pub fn parse(template: &str) -> Result<Self, LogError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find("%{") {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after.find('}').ok_or_else(|| {
                LogError::Template(format!("unterminated placeholder in {:?}", template))
            })?;
            let placeholder = &after[..close];

            match Self::placeholder(placeholder)? {
                Some(segment) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                None => {
                    literal.push_str("%{");
                    literal.push_str(placeholder);
                    literal.push('}');
                }
            }
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// `Ok(None)` for unknown names, which are kept as literal text.
    fn placeholder(name: &str) -> Result<Option<Segment>, LogError> {
        let segment = match name {
            "id" => Segment::Id,
            "time" => Segment::Time(DEFAULT_TIME_FORMAT.to_string()),
            "module" => Segment::Module,
            "file" => Segment::File,
            "filename" => Segment::FileName,
            "line" => Segment::Line,
            "level" => Segment::Level,
            "category" => Segment::Category,
            "message" => Segment::Message,
            _ => match name.strip_prefix("time:") {
                Some(layout) => {
                    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
                        return Err(LogError::Template(format!(
                            "invalid time layout {:?}",
                            layout
                        )));
                    }
                    Segment::Time(layout.to_string())
                }
                None => return Ok(None),
            },
        };
        Ok(Some(segment))
    }

    pub fn render(&self, record: &Record<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            // Writing to a String cannot fail.
            let _ = match segment {
                Segment::Literal(text) => out.write_str(text),
                Segment::Id => write!(out, "{}", record.id),
                Segment::Time(layout) => write!(out, "{}", record.time.format(layout)),
                Segment::Module => out.write_str(record.module),
                Segment::File => out.write_str(record.file),
                Segment::FileName => out.write_str(
                    Path::new(record.file)
                        .file_name()
                        .and_then(|name| name.to_str())
                        .unwrap_or(record.file),
                ),
                Segment::Line => write!(out, "{}", record.line),
                Segment::Level => out.write_str(record.level.as_str()),
                Segment::Category => out.write_str(record.category),
                Segment::Message => out.write_str(record.message),
            };
        }
        out
    }
}

impl FromStr for Template {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Fields the logger attaches to every event.
#[derive(Default)]
struct EventFields {
    message: String,
    category: String,
    severity: Option<LogLevel>,
    module: String,
    file: String,
    line: u32,
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "category" => self.category = value.to_string(),
            "severity" => self.severity = value.parse().ok(),
            "module" => self.module = value.to_string(),
            "caller_file" => self.file = value.to_string(),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "caller_line" {
            self.line = u32::try_from(value).unwrap_or(u32::MAX);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

/// Renders events through a [`Template`].
pub(crate) struct TemplateFormat {
    template: Template,
    sequence: AtomicU64,
}

impl TemplateFormat {
    pub(crate) fn new(template: Template) -> Self {
        Self {
            template,
            sequence: AtomicU64::new(0),
        }
    }
}

impl<S, N> FormatEvent<S, N> for TemplateFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let metadata = event.metadata();
        let file = if fields.file.is_empty() {
            metadata.file().unwrap_or_default().to_string()
        } else {
            fields.file
        };
        let line = if fields.line == 0 {
            metadata.line().unwrap_or_default()
        } else {
            fields.line
        };

        let record = Record {
            id: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            time: Local::now(),
            module: &fields.module,
            file: &file,
            line,
            level: fields
                .severity
                .unwrap_or_else(|| LogLevel::from_tracing(metadata.level())),
            category: &fields.category,
            message: &fields.message,
        };

        writeln!(writer, "{}", self.template.render(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record<'a>(message: &'a str) -> Record<'a> {
        Record {
            id: 7,
            time: Local.with_ymd_and_hms(2026, 1, 20, 10, 0, 0).unwrap(),
            module: "importer",
            file: "src/jobs/import.rs",
            line: 42,
            level: LogLevel::Warning,
            category: "DB",
            message,
        }
    }

    #[test]
    fn test_render_all_placeholders() {
        let template = Template::parse(
            "#%{id} [%{module}] %{filename} %{file}:%{line} %{level} %{category}: %{message}",
        )
        .unwrap();
        assert_eq!(
            template.render(&record("slow query")),
            "#7 [importer] import.rs src/jobs/import.rs:42 WARNING DB: slow query"
        );
    }

    #[test]
    fn test_render_time_layouts() {
        let template = Template::parse("%{time:%H:%M} | %{time:%Y}").unwrap();
        assert_eq!(template.render(&record("")), "10:00 | 2026");
    }

    #[test]
    fn test_unknown_placeholder_kept_verbatim() {
        let template = Template::parse("%{pid} %{message}").unwrap();
        assert_eq!(template.render(&record("hi")), "%{pid} hi");
    }

    #[test]
    fn test_plain_text_and_stray_percent() {
        let template = Template::parse("100% done: %{message}").unwrap();
        assert_eq!(template.render(&record("ok")), "100% done: ok");
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert!(matches!(
            Template::parse("%{level"),
            Err(LogError::Template(_))
        ));
    }

    #[test]
    fn test_invalid_time_layout() {
        assert!(Template::parse("%{time:%Q}").is_err());
    }
}
