//! Run command - create a response and download the files it produced

use crate::api::Client;
use crate::commands::{load_service_settings, print_kv, print_report, print_step, verify};
use anyhow::{Context, Result};
use cifetch_core::{
    collect_file_references, reference_table, Materializer, ResponseRequest, ResponseSummary,
    Settings,
};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

const TOTAL_STEPS: usize = 5;
const PREVIEW_CHARS: usize = 120;

pub struct RunOptions {
    pub prompt: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub show_output: bool,
}

pub async fn execute(config_path: Option<&Path>, options: RunOptions) -> Result<()> {
    let settings = load_service_settings(config_path)?;
    run_with_settings(settings, options).await
}

pub async fn run_with_settings(mut settings: Settings, options: RunOptions) -> Result<()> {
    if let Some(model) = options.model {
        settings.deployment = model;
    }
    if let Some(prompt) = options.prompt {
        settings.prompt = prompt;
    }
    if let Some(instructions) = options.instructions {
        settings.instructions = instructions;
    }
    if let Some(download_dir) = options.download_dir {
        settings.download_dir = download_dir;
    }

    print_step(1, TOTAL_STEPS, "Initialize client and show config");
    print_kv("Endpoint", settings.normalized_endpoint());
    print_kv("API version", &settings.api_version);
    print_kv("Deployment", &settings.deployment);
    print_kv("Auth", settings.auth);
    let client = Client::from_settings(&settings)?;

    print_step(2, TOTAL_STEPS, "Create response (Code Interpreter: auto container)");
    let request = ResponseRequest::code_interpreter(
        settings.deployment.as_str(),
        settings.instructions.as_str(),
        settings.prompt.as_str(),
    );
    let document = client
        .create_response(&request)
        .await
        .context("Failed to create response")?;

    let summary = ResponseSummary::from_document(&document);
    print_kv("Response ID", summary.id.as_deref().unwrap_or("<unknown>"));
    if let Some(preview) = summary.preview(PREVIEW_CHARS) {
        print_kv("Assistant says", preview);
    }

    let output = document.get("output").unwrap_or(&document);
    if options.show_output {
        println!("{}", "Full response output:".cyan());
        println!("{}", serde_json::to_string_pretty(output)?);
    }

    print_step(3, TOTAL_STEPS, "Scan annotations for created files");
    let references = collect_file_references(output);
    if references.is_empty() {
        anyhow::bail!("No files found in annotations");
    }
    info!("Found {} file reference(s)", references.len());
    println!("{}", reference_table(&references));

    print_step(
        4,
        TOTAL_STEPS,
        &format!(
            "Retrieve file content and save to {}",
            settings.download_dir.display()
        ),
    );
    let materializer = Materializer::new(&settings.download_dir);
    let report = materializer
        .materialize(&client, &references)
        .await
        .with_context(|| {
            format!(
                "Failed to prepare download directory {}",
                settings.download_dir.display()
            )
        })?;
    print_report(&report);

    print_step(5, TOTAL_STEPS, "Quick verification");
    verify::print_previews(materializer.download_dir()).await;

    if report.all_failed() {
        anyhow::bail!(
            "None of the {} referenced file(s) could be downloaded",
            report.total()
        );
    }

    println!("{}", "Done.".green().bold());
    Ok(())
}
