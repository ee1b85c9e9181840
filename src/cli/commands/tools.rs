use crate::cli::commands::OutputFormat;
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{apply_table_style, format_list, truncate_with_ellipsis};
use crate::tools::ToolDefinition;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ToolDisplay {
    #[tabled(rename = "Tool")]
    name: String,
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ToolDefinition> for ToolDisplay {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            name: definition.name.to_string(),
            family: definition.family.to_string(),
            required: format_list(&definition.required_fields()),
            description: truncate_with_ellipsis(definition.description, 60),
        }
    }
}

/// List tool definitions, optionally restricted to one family
pub fn list_tools(
    definitions: &[ToolDefinition],
    family: Option<&str>,
    format: OutputFormat,
) -> CliResult<String> {
    let selected: Vec<&ToolDefinition> = match family {
        Some(family) => {
            let matching: Vec<_> = definitions.iter().filter(|d| d.family == family).collect();
            if matching.is_empty() {
                return Err(CliError::UnknownFamily {
                    family: family.to_string(),
                    known: known_families(definitions).join(", "),
                });
            }
            matching
        }
        None => definitions.iter().collect(),
    };

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&selected).map_err(|e| CliError::Output {
                message: e.to_string(),
            })
        }
        OutputFormat::Table => {
            if selected.is_empty() {
                return Ok("No tools registered.".to_string());
            }
            let rows: Vec<ToolDisplay> = selected.iter().map(|d| ToolDisplay::from(*d)).collect();
            let mut table = Table::new(rows);
            apply_table_style(&mut table);
            Ok(format!("{table}\n{} tools", selected.len()))
        }
    }
}

fn known_families(definitions: &[ToolDefinition]) -> Vec<&'static str> {
    let mut families: Vec<&'static str> = Vec::new();
    for definition in definitions {
        if !families.contains(&definition.family) {
            families.push(definition.family);
        }
    }
    families
}
