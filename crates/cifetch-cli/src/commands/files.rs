//! Files command - list the files stored in a container

use crate::api::Client;
use crate::commands::load_service_settings;
use anyhow::Result;
use cifetch_core::container_file_table;
use colored::Colorize;
use std::path::Path;

pub async fn execute(config_path: Option<&Path>, container_id: &str) -> Result<()> {
    let settings = load_service_settings(config_path)?;
    let client = Client::from_settings(&settings)?;

    let files = client.list_container_files(container_id).await?;
    println!(
        "{}",
        format!("Container {}: {} file(s)", container_id, files.len())
            .blue()
            .bold()
    );
    println!("{}", container_file_table(&files));

    Ok(())
}
