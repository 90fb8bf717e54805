//! Serialization of the generated object list.

use appforge_generate::List;
use clap::ValueEnum;

/// Wire format for the emitted object list.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML document (default).
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Renders the object list in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(list: &List, format: OutputFormat) -> anyhow::Result<String> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(list)?,
        OutputFormat::Json => serde_json::to_string_pretty(list)?,
    };
    Ok(rendered)
}
