//! Command-line front end for the built-in conversions.
//!
//! ## Usage
//!
//! ```bash
//! to_convert <value> <str|int|float|bool> [--trace]
//! ```
//!
//! The value is always read as a string. `--trace` prints the routes tried
//! as JSON on stderr.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default: warn)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)

use std::process::ExitCode;

use tracing::{debug, error};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use conversion_graph::facade::default_conversions;
use conversion_graph::{ConvertRequest, TypeKey, Value};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "to_convert=warn,conversion_graph=warn".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn target_type(name: &str) -> Option<TypeKey> {
    match name {
        "str" | "string" => Some(TypeKey::of::<String>()),
        "int" => Some(TypeKey::of::<i64>()),
        "float" => Some(TypeKey::of::<f64>()),
        "bool" => Some(TypeKey::of::<bool>()),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value.downcast_ref::<String>() {
        Some(s) => s.clone(),
        None => value.to_string(),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let traced = args.iter().any(|a| a == "--trace");
    let positional: Vec<&String> = args.iter().filter(|a| *a != "--trace").collect();

    let (input, wanted) = match positional.as_slice() {
        [input, wanted] => (input.to_string(), wanted.as_str()),
        _ => {
            eprintln!("usage: to_convert <value> <str|int|float|bool> [--trace]");
            return ExitCode::from(2);
        }
    };
    let Some(type_want) = target_type(wanted) else {
        eprintln!("unknown target type: {}", wanted);
        return ExitCode::from(2);
    };

    let conversions = default_conversions();
    debug!(
        edges = conversions.num_edges(),
        registry_fingerprint = %conversions.fingerprint(),
        policy = conversions.policy().policy_id(),
        "builtin registry ready"
    );

    let request = ConvertRequest::new(type_want).debug(traced);
    let (result, trace) = conversions.convert_traced(Value::new(input), &request);
    if traced {
        eprintln!("{}", trace.to_json());
    }

    match result {
        Ok(value) => {
            println!("{}", render(&value));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "conversion failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
