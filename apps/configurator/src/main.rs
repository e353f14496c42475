use std::{convert::Infallible, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::load_settings,
    editor,
    import::import_transducers,
    HttpTransport, SaveOutcome, SyncStore,
};
use serde_json::{json, Map, Value};
use shared::domain::LengthScale;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Edit the transducer array held by the simulation backend")]
struct Cli {
    /// Overrides `server_url` from settings.
    #[arg(long)]
    server_url: Option<String>,
    /// Display units per metre for table values.
    #[arg(long)]
    scale: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Show {
        #[arg(long)]
        json: bool,
    },
    Validate,
    SetTransducer {
        #[arg(long)]
        row: usize,
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        fields: Vec<(String, String)>,
    },
    AddTransducer {
        #[arg(long = "set", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    RemoveTransducer {
        #[arg(required = true)]
        rows: Vec<usize>,
    },
    SetGeometry {
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Replaces the transducer list with a JSON array read from FILE.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(scale) = cli.scale {
        settings.length_scale = scale;
    }
    let scale = settings.length_scale();

    let transport = HttpTransport::new(&settings.server_url, settings.request_timeout())?;
    info!(endpoint = %transport.endpoint(), "configurator: using backend");
    let store =
        SyncStore::with_save_error_cooldown(Arc::new(transport), settings.save_error_cooldown());
    store
        .load()
        .await
        .with_context(|| format!("loading configuration from {}", settings.server_url))?;

    match cli.command {
        Command::Show { json } => show(&store, scale, json).await?,
        Command::Validate => {
            let configuration = store.snapshot().await;
            match configuration.validate() {
                Ok(_) => println!(
                    "configuration is valid ({} transducers)",
                    configuration.transducers.len()
                ),
                Err(err) => bail!("configuration is invalid: {err}"),
            }
        }
        Command::SetTransducer { row, fields } => {
            let fields = fields_object(fields);
            let outcome = store
                .modify(|configuration| {
                    editor::edit_transducer_row(configuration, row, &fields, scale)
                })
                .await?;
            report(outcome)?;
        }
        Command::AddTransducer { fields } => {
            let fields = fields_object(fields);
            let outcome = store
                .modify(|configuration| {
                    let added = editor::add_transducer(configuration);
                    let last = added.transducers.len() - 1;
                    editor::edit_transducer_row(&added, last, &fields, scale)
                })
                .await?;
            report(outcome)?;
        }
        Command::RemoveTransducer { rows } => {
            let outcome = store
                .modify(|configuration| editor::remove_transducers(configuration, &rows))
                .await?;
            report(outcome)?;
        }
        Command::SetGeometry { fields } => {
            let fields = fields_object(fields);
            let outcome = store
                .modify(|configuration| {
                    Ok::<_, Infallible>(editor::edit_geometry_row(configuration, &fields, scale))
                })
                .await?;
            report(outcome)?;
        }
        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let transducers = import_transducers(&text)?;
            let outcome = store
                .modify(|configuration| {
                    Ok::<_, Infallible>(editor::replace_transducers(configuration, transducers))
                })
                .await?;
            report(outcome)?;
        }
    }

    Ok(())
}

async fn show(store: &SyncStore, scale: LengthScale, as_json: bool) -> Result<()> {
    let configuration = store.snapshot().await;
    let rows = editor::transducer_rows(&configuration, scale);
    let geometry = editor::geometry_row(&configuration, scale);

    if as_json {
        let view = json!({ "transducers": rows, "simulation_geometry": geometry });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("transducers (x{} per metre):", scale.factor());
    for (index, row) in rows.iter().enumerate() {
        println!(
            "  [{index}] {} pos=({}, {}, {}) target=({}, {}, {}) r={} phase={} loss={} power={} wavelength={}",
            row.id,
            row.position_x,
            row.position_y,
            row.position_z,
            row.target_x,
            row.target_y,
            row.target_z,
            row.radius,
            row.phase_shift,
            row.loss_factor,
            row.output_power,
            row.wavelength,
        );
    }
    println!(
        "simulation: plane={} begin=({}, {}, {}) end=({}, {}, {}) cell_size={} consts=({}, {})",
        geometry.plane,
        geometry.begin_x,
        geometry.begin_y,
        geometry.begin_z,
        geometry.end_x,
        geometry.end_y,
        geometry.end_z,
        geometry.cell_size,
        geometry.potential_compute_const_1,
        geometry.potential_compute_const_2,
    );
    Ok(())
}

fn report(outcome: SaveOutcome) -> Result<()> {
    match outcome {
        SaveOutcome::Saved => {
            println!("saved");
            Ok(())
        }
        SaveOutcome::Superseded => {
            println!("saved with a newer change");
            Ok(())
        }
        SaveOutcome::Locked => bail!("server update in progress; change not saved"),
        SaveOutcome::Invalid(reason) => bail!("change kept locally but not saved: {reason}"),
        SaveOutcome::Failed(message) => bail!(message),
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

/// Cell edits arrive as text, the way a grid editor hands them over.
fn fields_object(fields: Vec<(String, String)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<Map<String, Value>>(),
    )
}
