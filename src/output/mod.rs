use anyhow::Result;

use crate::cli::OutputFormat;
use crate::pipeline::PipelineResult;

/// Render the pipeline result in the requested format
pub fn render(result: &PipelineResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_as_text(result)),
    }
}

/// Print the pipeline result to the console
pub fn print_to_console(result: &PipelineResult, format: &OutputFormat) -> Result<()> {
    println!("{}", render(result, format)?);
    Ok(())
}

fn format_as_text(result: &PipelineResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("ok: {}\n", result.ok));

    if let Some(error) = &result.error {
        out.push_str(&format!("error: {}\n", error));
    }

    if let Some(transcript) = &result.transcript_en {
        out.push_str("\n--- English transcript ---\n");
        out.push_str(transcript);
        out.push('\n');
    }

    if let Some(translation) = &result.transcript_es {
        out.push_str("\n--- Spanish translation ---\n");
        out.push_str(translation);
        out.push('\n');
    }

    out
}
