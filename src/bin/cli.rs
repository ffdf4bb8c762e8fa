//! Escrow CLI tool for inspecting escrows and driving their lifecycle through the escrow service.
//!
//! # Examples
//!
//! Show the state of an escrow:
//! ```sh
//! escrow-cli show 748516324 --rpc-url http://localhost:9120
//! ```
//!
//! Compose an approval for an external wallet, then submit the signed group:
//! ```sh
//! escrow-cli prepare approve 748516324 --sender <CLIENT_ADDRESS> -r http://localhost:9120
//! escrow-cli submit approve 748516324 <SIGNED_TX_1> <SIGNED_TX_2> -r http://localhost:9120
//! ```

use algo_escrow::{
    rpc::EscrowApiClient,
    types::{
        Address, AppId, EscrowAction,
        rpc::{EscrowDetails, PrepareActionParameters, SubmitActionParameters},
    },
};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Serialize;

/// Main CLI structure for the escrow CLI tool.
#[derive(Parser)]
#[command(name = "escrow-cli")]
#[command(about = "Escrow CLI - Inspect and settle escrow contracts", long_about = None)]
struct Cli {
    /// RPC URL of the escrow service
    #[arg(long, short, global = true, default_value = "http://localhost:9120")]
    rpc_url: String,
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands available in the escrow CLI.
#[derive(Subcommand)]
enum Commands {
    /// Show the decoded state of an escrow
    Show {
        /// The escrow application id
        app_id: AppId,
    },
    /// List the escrows created by a client
    List {
        /// The client address
        client: Address,
    },
    /// Compose the unsigned transactions of an action
    Prepare(ActionCommand),
    /// Submit transactions signed by an external wallet
    Submit {
        /// The action the transactions perform (`approve` or `cancel`)
        action: EscrowAction,
        /// The escrow application id
        app_id: AppId,
        /// Base64 encoded signed transactions, in group order
        #[arg(required = true)]
        signed_transactions: Vec<String>,
    },
    /// Sign with the service wallet and submit an action
    Execute(ActionCommand),
}

/// An action performed by a sender on an escrow.
#[derive(Parser)]
struct ActionCommand {
    /// The action to perform (`approve` or `cancel`)
    action: EscrowAction,
    /// The escrow application id
    app_id: AppId,
    /// Account sending the transactions
    #[arg(long)]
    sender: Address,
}

impl From<ActionCommand> for PrepareActionParameters {
    fn from(ActionCommand { action, app_id, sender }: ActionCommand) -> Self {
        Self { app_id, action, sender }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc_url)?;

    match cli.command {
        Commands::Show { app_id } => show(&client, app_id).await?,
        Commands::List { client: address } => list(&client, address).await?,
        Commands::Prepare(command) => print_json(&client.prepare_action(command.into()).await?)?,
        Commands::Submit { action, app_id, signed_transactions } => {
            let signed_transactions = signed_transactions
                .iter()
                .map(|tx| STANDARD.decode(tx).wrap_err("signed transactions must be base64"))
                .collect::<Result<Vec<_>>>()?;
            let params = SubmitActionParameters { app_id, action, signed_transactions };
            print_json(&client.submit_action(params).await?)?
        }
        Commands::Execute(command) => print_json(&client.execute_action(command.into()).await?)?,
    }

    Ok(())
}

async fn show(client: &HttpClient, app_id: AppId) -> Result<()> {
    let details = client.get_escrow(app_id).await?;
    print_details(&details);
    Ok(())
}

async fn list(client: &HttpClient, address: Address) -> Result<()> {
    let escrows = client.get_client_escrows(address).await?;
    if escrows.is_empty() {
        println!("No escrows for {address}");
        return Ok(());
    }

    println!("Escrows for {address}:");
    for details in &escrows {
        println!();
        print_details(details);
    }
    Ok(())
}

fn print_details(details: &EscrowDetails) {
    let snapshot = &details.snapshot;
    let unset = || "-".to_string();
    println!("Escrow {}", snapshot.application_id);
    println!("  status:     {}", details.status);
    println!("  amount:     {}", details.amount);
    println!("  client:     {}", snapshot.client_address.map_or_else(unset, |a| a.to_string()));
    println!("  freelancer: {}", snapshot.freelancer_address.map_or_else(unset, |a| a.to_string()));
    if !snapshot.is_native_asset() {
        println!("  asset:      {}", snapshot.asset_id);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
