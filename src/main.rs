//! snow - command-line client for ServiceNow ITSM
//!
//! Lists, reads, creates, updates and deletes incidents, change requests
//! and standard change templates through the JSONv2 web service. Records
//! are printed to stdout as pretty JSON; logs go to stderr.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `SERVICENOW_BASE_URL`: Base URL of your instance
//! - `SERVICENOW_USERNAME`: User for HTTP Basic authentication
//! - `SERVICENOW_PASSWORD`: Password for HTTP Basic authentication
//!
//! # Usage
//!
//! ```bash
//! snow list incidents --limit 10 -f active=true -f priority!=5
//! snow get changes CHG0030001 --display-value true
//! snow create-incident --short-description "Mail server down"
//! snow update-incident INC0010001 --state 6 --close-code Solved
//! ```

use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use servicenow::models::{ChangeRequest, Incident, Record, StandardChangeTemplate};
use servicenow::options::{
    CreateOptions, DeleteOptions, DisplayValue, Filter, GetOptions, ListOptions, UpdateOptions,
};
use servicenow::{Config, Context, ServiceNowClient};

use crate::cli::{Args, Command, Resource};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // stdout carries the JSON output, so logs go to stderr
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("servicenow=info,snow=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::debug!("Configuration loaded, base_url: {}", config.base_url);

    let client =
        ServiceNowClient::from_config(&config).context("Failed to create ServiceNow client")?;

    let (mut ctx, canceller) = Context::with_cancel();
    if let Some(secs) = args.deadline {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling request");
            canceller.cancel();
        }
    });

    match args.command {
        Command::List {
            resource,
            limit,
            display_value,
            filters,
        } => {
            let opts = list_options(limit, display_value, filters);
            match resource {
                Resource::Incidents => list::<Incident>(&client, &ctx, opts).await,
                Resource::Changes => list::<ChangeRequest>(&client, &ctx, opts).await,
                Resource::Templates => list::<StandardChangeTemplate>(&client, &ctx, opts).await,
            }
        }
        Command::Get {
            resource,
            number,
            display_value,
        } => {
            let mut opts = GetOptions::new();
            if let Some(dv) = display_value {
                opts = opts.with_display_value(dv);
            }
            let number = number.trim();
            match resource {
                Resource::Incidents => get::<Incident>(&client, &ctx, number, opts).await,
                Resource::Changes => get::<ChangeRequest>(&client, &ctx, number, opts).await,
                Resource::Templates => {
                    get::<StandardChangeTemplate>(&client, &ctx, number, opts).await
                }
            }
        }
        Command::CreateIncident(create) => {
            let mut incident = create.to_incident();
            config.incident_defaults.apply(&mut incident);

            let created = client
                .incidents()
                .create(&ctx, &incident, CreateOptions::new())
                .await
                .context("Failed to create incident")?;

            tracing::info!(number = ?created.number(), "Incident created");
            print_json(&created)
        }
        Command::UpdateIncident(update) => {
            if update.is_empty() {
                bail!("nothing to update: pass at least one field");
            }

            let updated = client
                .incidents()
                .update(
                    &ctx,
                    update.number.trim(),
                    &update.to_incident(),
                    UpdateOptions::new(),
                )
                .await
                .context("Failed to update incident")?;

            tracing::info!(number = %update.number.trim(), "Incident updated");
            print_json(&updated)
        }
        Command::Delete { resource, sys_id } => {
            let sys_id = sys_id.trim();
            match resource {
                Resource::Incidents => delete::<Incident>(&client, &ctx, sys_id).await,
                Resource::Changes => delete::<ChangeRequest>(&client, &ctx, sys_id).await,
                Resource::Templates => {
                    delete::<StandardChangeTemplate>(&client, &ctx, sys_id).await
                }
            }
        }
    }
}

fn list_options(
    limit: Option<u32>,
    display_value: Option<DisplayValue>,
    filters: Vec<Filter>,
) -> ListOptions {
    let mut opts = ListOptions::new();
    if let Some(limit) = limit {
        opts = opts.with_limit(limit);
    }
    if let Some(dv) = display_value {
        opts = opts.with_display_value(dv);
    }
    filters.into_iter().fold(opts, ListOptions::with_filter)
}

async fn list<R: Record>(client: &ServiceNowClient, ctx: &Context, opts: ListOptions) -> Result<()> {
    let records = client
        .records::<R>()
        .list(ctx, opts)
        .await
        .with_context(|| format!("Failed to list {} records", R::KIND))?;

    tracing::info!("{} {} record(s)", records.len(), R::KIND);
    print_json(&records)
}

async fn get<R: Record>(
    client: &ServiceNowClient,
    ctx: &Context,
    number: &str,
    opts: GetOptions,
) -> Result<()> {
    let record = client
        .records::<R>()
        .get(ctx, number, opts)
        .await
        .with_context(|| format!("Failed to get {} {}", R::KIND, number))?;

    // An unknown number yields an empty record rather than an error
    if record.sys_id().is_none() {
        bail!("{} {} not found", R::KIND, number);
    }
    print_json(&record)
}

async fn delete<R: Record>(client: &ServiceNowClient, ctx: &Context, sys_id: &str) -> Result<()> {
    let echoed = client
        .records::<R>()
        .delete(ctx, sys_id, DeleteOptions::new())
        .await
        .with_context(|| format!("Failed to delete {} {}", R::KIND, sys_id))?;

    tracing::info!(sys_id = %sys_id, "Deleted {}", R::KIND);
    print_json(&echoed)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", json);
    Ok(())
}
