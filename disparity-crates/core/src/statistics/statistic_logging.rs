//! The process-wide sink for statistics.
//!
//! Statistics are written as `PREFIX name=value` lines. Nothing is written until the sink is
//! configured with [`configure_statistic_logging`], and only the first configuration counts.

use std::fmt::Display;
use std::io::stdout;
use std::io::Write;
use std::sync::Mutex;
use std::sync::OnceLock;

use convert_case::Case;
use convert_case::Casing;

struct StatisticSink {
    prefix: &'static str,
    closing_line: Option<&'static str>,
    casing: Option<Case>,
    writer: Box<dyn Write + Send + Sync>,
}

static STATISTIC_SINK: OnceLock<Mutex<StatisticSink>> = OnceLock::new();

/// Start logging statistics.
///
/// Every statistic line starts with `prefix`, and [`log_statistic_postfix`] ends a block of
/// statistics with `closing_line`. Names are converted to `casing` when it is given. Without a
/// `writer` the statistics go to stdout.
pub fn configure_statistic_logging(
    prefix: &'static str,
    closing_line: Option<&'static str>,
    casing: Option<Case>,
    writer: Option<Box<dyn Write + Send + Sync>>,
) {
    let _ = STATISTIC_SINK.get_or_init(|| {
        Mutex::new(StatisticSink {
            prefix,
            closing_line,
            casing,
            writer: writer.unwrap_or_else(|| Box::new(stdout())),
        })
    });
}

fn with_sink(action: impl FnOnce(&mut StatisticSink)) {
    if let Some(Ok(mut sink)) = STATISTIC_SINK.get().map(Mutex::lock) {
        action(&mut sink);
    }
}

pub fn log_statistic(name: impl Display, value: impl Display) {
    with_sink(|sink| {
        let name = statistic_name(name, sink.casing);
        let _ = writeln!(sink.writer, "{} {name}={value}", sink.prefix);
    });
}

/// Close a block of statistics and flush the sink.
pub fn log_statistic_postfix() {
    with_sink(|sink| {
        if let Some(closing_line) = sink.closing_line {
            let _ = writeln!(sink.writer, "{closing_line}");
        }
        let _ = sink.writer.flush();
    });
}

pub fn should_log_statistics() -> bool {
    STATISTIC_SINK.get().is_some()
}

fn statistic_name(name: impl Display, casing: Option<Case>) -> String {
    match casing {
        Some(casing) => name.to_string().to_case(casing),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_converted_to_the_casing() {
        assert_eq!(
            "backendRemovedNodes",
            statistic_name("backend_removed_nodes", Some(Case::Camel))
        );
        assert_eq!(
            "backend_removed_nodes",
            statistic_name("backend_removed_nodes", None)
        );
    }
}
