//! Container listing and lifecycle commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, ContainerView};
use crate::output::{
    color_state, format_bytes, format_timestamp, print_success, print_warning, OutputFormat,
};

/// Row for the container table
#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl ContainerRow {
    fn from_view(view: &ContainerView) -> Self {
        let (cpu, memory) = match &view.stats {
            Some(stats) => (
                format!("{:.2}%", stats.cpu.usage_percent),
                format!(
                    "{} / {}",
                    format_bytes(stats.memory.usage),
                    format_bytes(stats.memory.limit)
                ),
            ),
            None => ("-".to_string(), "-".to_string()),
        };

        Self {
            name: view.display_name().to_string(),
            image: view.image.clone(),
            state: color_state(&view.state),
            status: view.status.clone(),
            cpu,
            memory,
            created: format_timestamp(view.created),
        }
    }
}

/// List all containers
pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let raw: serde_json::Value = client.get("api/containers").await?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        OutputFormat::Table => {
            let containers: Vec<ContainerView> = client.get("api/containers").await?;
            if containers.is_empty() {
                print_warning("No containers found");
                return Ok(());
            }

            let rows: Vec<ContainerRow> = containers.iter().map(ContainerRow::from_view).collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} containers", containers.len());
        }
    }

    Ok(())
}

/// Show one container in detail
pub async fn inspect(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let path = format!("api/containers/{}", id);

    match format {
        OutputFormat::Json => {
            let raw: serde_json::Value = client.get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        OutputFormat::Table => {
            let view: ContainerView = client.get(&path).await?;

            println!("Name:    {}", view.display_name());
            println!("ID:      {}", view.id);
            println!("Image:   {}", view.image);
            println!("State:   {}", color_state(&view.state));
            println!("Status:  {}", view.status);
            println!("Created: {}", format_timestamp(view.created));
            if let Some(stats) = &view.stats {
                println!(
                    "CPU:     {:.2}% ({} cores)",
                    stats.cpu.usage_percent, stats.cpu.cores
                );
                println!(
                    "Memory:  {} / {}",
                    format_bytes(stats.memory.usage),
                    format_bytes(stats.memory.limit)
                );
            }
        }
    }

    Ok(())
}

/// Start a container
pub async fn start(client: &ApiClient, id: &str) -> Result<()> {
    client.post(&format!("api/containers/{}/start", id)).await?;
    print_success(&format!("Start requested for {}", id));
    Ok(())
}

/// Stop a container
pub async fn stop(client: &ApiClient, id: &str) -> Result<()> {
    client.post(&format!("api/containers/{}/stop", id)).await?;
    print_success(&format!("Stop requested for {}", id));
    Ok(())
}
