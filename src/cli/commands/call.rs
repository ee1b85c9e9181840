use serde_json::{Map, Value};
use tracing::info;

use crate::cli::error::{CliError, CliResult};
use crate::tools::ToolRegistry;

/// Parse `--args`; a missing value means no arguments.
pub fn parse_args(raw: Option<&str>) -> CliResult<Value> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Value::Object(Map::new()));
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(CliError::InvalidJson {
            message: format!("expected an object, got {}", kind_of(&other)),
        }),
        Err(e) => Err(CliError::InvalidJson {
            message: e.to_string(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Run a single tool and return its pretty-printed result
pub async fn call_tool(registry: &ToolRegistry, name: &str, args: Option<&str>) -> CliResult<String> {
    let args = parse_args(args)?;
    info!(tool = name, "calling tool from the command line");

    let output = registry.execute(name, args).await?;
    serde_json::to_string_pretty(&output).map_err(|e| CliError::Output {
        message: e.to_string(),
    })
}
