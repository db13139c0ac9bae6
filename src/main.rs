//! `skytap` - command-line access to the Skytap REST API.
//!
//! Resources are printed as pretty JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skytap::api::resolve_credentials;
use skytap::config::{Args, ClientConfig};
use skytap::context::Context;
use skytap::convergence::RunState;
use skytap::error::Result;
use skytap::service::{Client, VmKey};
use skytap::VERSION;

#[derive(Parser, Debug)]
#[command(name = "skytap", version, about = "Skytap cloud API client")]
struct Cli {
    #[command(flatten)]
    args: Args,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),
    /// Manage VMs
    #[command(subcommand)]
    Vm(VmCommand),
    /// Inspect projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Inspect networks
    #[command(subcommand)]
    Network(NetworkCommand),
}

#[derive(Subcommand, Debug)]
enum EnvCommand {
    Get { id: String },
    List,
    Start { id: String },
    Stop { id: String },
    Suspend { id: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum VmCommand {
    Get { environment_id: String, vm_id: String },
    Start { environment_id: String, vm_id: String },
    Stop { environment_id: String, vm_id: String },
    /// Power-cycle and wait for the VM to come back
    Reset { environment_id: String, vm_id: String },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    List,
    Get { id: String },
}

#[derive(Subcommand, Debug)]
enum NetworkCommand {
    List { environment_id: String },
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.args.debug { "skytap=debug" } else { "skytap=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    debug!("skytap v{}", VERSION);

    let config = ClientConfig::load(cli.args.config.as_deref())
        .await?
        .apply_args(&cli.args);
    let credentials = resolve_credentials(cli.args.username.as_deref(), cli.args.api_token.as_deref())?;
    let client = Client::new(&config, Arc::from(credentials))?;
    debug!("Using {}", client.api().base_url());

    // Ctrl-C aborts any retry or poll in progress
    let ctx = Context::background();
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    match cli.command {
        Command::Env(command) => run_env(&ctx, &client, command).await,
        Command::Vm(command) => run_vm(&ctx, &client, command).await,
        Command::Project(command) => {
            let projects = client.projects();
            match command {
                ProjectCommand::List => print(&projects.list(&ctx).await?),
                ProjectCommand::Get { id } => print(&projects.get(&ctx, &id).await?),
            }
        }
        Command::Network(NetworkCommand::List { environment_id }) => {
            print(&client.networks().list(&ctx, &environment_id).await?)
        }
    }
}

async fn run_env(ctx: &Context, client: &Client, command: EnvCommand) -> Result<()> {
    let environments = client.environments();
    match command {
        EnvCommand::Get { id } => print(&environments.get(ctx, &id).await?),
        EnvCommand::List => print(&environments.list(ctx).await?),
        EnvCommand::Start { id } => print(&environments.set_runstate(ctx, &id, RunState::Running).await?),
        EnvCommand::Stop { id } => print(&environments.set_runstate(ctx, &id, RunState::Stopped).await?),
        EnvCommand::Suspend { id } => {
            print(&environments.set_runstate(ctx, &id, RunState::Suspended).await?)
        }
        EnvCommand::Delete { id } => {
            environments.delete(ctx, &id).await?;
            info!("Deleted environment {}", id);
            Ok(())
        }
    }
}

async fn run_vm(ctx: &Context, client: &Client, command: VmCommand) -> Result<()> {
    let vms = client.vms();
    match command {
        VmCommand::Get { environment_id, vm_id } => {
            print(&vms.get(ctx, &VmKey::new(environment_id, vm_id)).await?)
        }
        VmCommand::Start { environment_id, vm_id } => {
            let key = VmKey::new(environment_id, vm_id);
            print(&vms.set_runstate(ctx, &key, RunState::Running).await?)
        }
        VmCommand::Stop { environment_id, vm_id } => {
            let key = VmKey::new(environment_id, vm_id);
            print(&vms.set_runstate(ctx, &key, RunState::Stopped).await?)
        }
        VmCommand::Reset { environment_id, vm_id } => {
            print(&vms.reset(ctx, &VmKey::new(environment_id, vm_id)).await?)
        }
    }
}
