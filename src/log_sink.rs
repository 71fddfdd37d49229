//! A `tracing` layer that stores log events in the `logs` table.

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDateTime, Utc};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::database::Database;
use crate::error::SqlMyError;
use crate::types::QueryParams;

const JST_OFFSET_SECS: i32 = 9 * 3600;

const INSERT_LOG: &str = "INSERT INTO logs (timestamp, log_level, message, logger_name, stack_trace) \
     VALUES (:timestamp, :log_level, :message, :logger_name, :stack_trace)";

thread_local! {
    static EMITTING: Cell<bool> = const { Cell::new(false) };
}

/// Wall-clock time in Japan (UTC+9), without offset.
#[must_use]
pub fn current_japan_time() -> NaiveDateTime {
    let now = Utc::now();
    FixedOffset::east_opt(JST_OFFSET_SECS)
        .map_or(now.naive_utc(), |jst| now.with_timezone(&jst).naive_local())
}

/// The five columns written per event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub log_level: String,
    pub message: String,
    pub logger_name: String,
    pub stack_trace: Option<String>,
}

impl LogRecord {
    fn params(&self) -> QueryParams {
        QueryParams::new()
            .bind("timestamp", self.timestamp)
            .bind("log_level", self.log_level.clone())
            .bind("message", self.message.clone())
            .bind("logger_name", self.logger_name.clone())
            .bind("stack_trace", self.stack_trace.clone())
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    extra: String,
    stack_trace: Option<String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message.push_str(value),
            "stack_trace" => self.stack_trace = Some(value.to_owned()),
            name => {
                let _ = write!(self.extra, " {name}={value}");
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                let _ = write!(self.message, "{value:?}");
            }
            "stack_trace" => self.stack_trace = Some(format!("{value:?}")),
            name => {
                let _ = write!(self.extra, " {name}={value:?}");
            }
        }
    }
}

/// Writes one `logs` row per event through the shared manager.
///
/// Events from this crate are skipped so the sink never logs its own
/// database traffic, and so is anything emitted while a write is in flight
/// on the same thread. Each write holds the manager's write lock, so it
/// serializes with `execute_query_with_transaction` and `df_to_sql`. Scopes
/// opened by hand with `start_transaction` on another thread are not
/// covered by that lock.
#[derive(Debug, Clone)]
pub struct DatabaseLogLayer {
    database: Arc<Database>,
}

impl DatabaseLogLayer {
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Store one record.
    ///
    /// Backend failures (integrity, connectivity, generic) are reported on
    /// stderr and swallowed; other errors are returned.
    ///
    /// # Errors
    /// `StateError` / `ValueError` raised while bracketing the insert.
    pub fn emit(&self, record: &LogRecord) -> Result<(), SqlMyError> {
        match self.write(record) {
            Err(err) if err.is_backend_failure() => {
                eprintln!("database log sink dropped a record: {err}");
                Ok(())
            }
            other => other,
        }
    }

    fn write(&self, record: &LogRecord) -> Result<(), SqlMyError> {
        // held across connect and disconnect so no other writer's bracket
        // is open when the sink closes a connection it opened
        let _guard = self.database.write_guard();
        let opened_here = !self.database.is_initialized();
        self.database.connect()?;
        let result = self
            .database
            .bracketed(INSERT_LOG, &record.params())
            .map(|_| ());
        if opened_here {
            self.database.disconnect();
        }
        result
    }
}

fn is_own_target(target: &str) -> bool {
    const CRATE: &str = env!("CARGO_CRATE_NAME");
    target
        .strip_prefix(CRATE)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<S> Layer<S> for DatabaseLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_own_target(meta.target()) {
            return;
        }
        if EMITTING.with(|flag| flag.replace(true)) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        visitor.message.push_str(&visitor.extra);
        let record = LogRecord {
            timestamp: current_japan_time(),
            log_level: meta.level().to_string(),
            message: visitor.message,
            logger_name: meta.target().to_owned(),
            stack_trace: visitor.stack_trace,
        };
        if let Err(err) = self.emit(&record) {
            eprintln!("database log sink failed: {err}");
        }

        EMITTING.with(|flag| flag.set(false));
    }
}

/// Install a global subscriber that sends events at DEBUG and above to the database.
///
/// # Errors
/// `ConfigError` if a global subscriber is already installed.
pub fn setup_logging(database: Arc<Database>) -> Result<(), SqlMyError> {
    let subscriber = tracing_subscriber::registry()
        .with(DatabaseLogLayer::new(database).with_filter(LevelFilter::DEBUG));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| SqlMyError::ConfigError(format!("cannot install log sink: {err}")))
}
