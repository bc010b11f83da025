//! Prometheus metrics collection for botcmd.
//!
//! - `botcmd_command_total{command,scope}` - Commands dispatched by name and scope
//! - `botcmd_command_duration_seconds{command,phase}` - Latency of argument
//!   parsing (`parse`) and of the handler plus reply routing (`handler`)
//! - `botcmd_command_errors_total{command,error}` - Failed dispatches by kind
//! - `botcmd_lines_ignored_total{reason}` - Lines that reached no command

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Commands dispatched by primary name and scope.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command latency by primary name and phase.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by name and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Lines ignored before reaching a command, by reason.
pub static LINES_IGNORED: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Recording before `init` is a no-op. Only the first call registers.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(register_all);
}

fn register_all() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("botcmd_command_total", "Commands dispatched by name and scope"), &["command", "scope"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("botcmd_command_duration_seconds", "Command latency by name and phase")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command", "phase"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("botcmd_command_errors_total", "Command errors by name and kind"), &["command", "error"]));
    register!(LINES_IGNORED, IntCounterVec::new(Opts::new("botcmd_lines_ignored_total", "Lines that reached no command"), &["reason"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a dispatched command.
#[inline]
pub fn record_command(command: &str, scope: &str) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command, scope]).inc();
    }
}

/// Record the latency of one dispatch phase.
#[inline]
pub fn record_phase(command: &str, phase: &str, duration_secs: f64) {
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command, phase]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record a line that reached no command.
#[inline]
pub fn record_ignored(reason: &str) {
    if let Some(c) = LINES_IGNORED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("roll", "shared");
        record_phase("roll", "parse", 0.002);
        record_command_error("roll", "invalid_parameter");
        record_ignored("no_prefix");

        let output = gather_metrics();
        assert!(output.contains("botcmd_command_total"));
        assert!(output.contains("phase=\"parse\""));
        assert!(output.contains("botcmd_command_errors_total"));
        assert!(output.contains("reason=\"no_prefix\""));
    }
}
