//! # relayctl
//!
//! Thin client for the relay's ingestion routes. Prints whatever the relay
//! answers; JSON answers are pretty printed.
use anyhow::{Error, bail};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde_json::{Value, json};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the relay.
    #[arg(long, env = "RELAY_URL", default_value = DEFAULT_SERVER)]
    pub server: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an ingestion run.
    Trigger { message: String },

    /// Look up a run by the backend's process id.
    Status { process_id: String },

    /// List every tracked run.
    List,

    /// Forget a run by its record id.
    Remove { id: String },
}

pub async fn run(args: Args) -> Result<String, Error> {
    let client = Client::new();
    let server = args.server.as_str();

    let res = match &args.command {
        Command::Trigger { message } => {
            client
                .post(endpoint(server, "ingestion/trigger"))
                .json(&json!({ "message": message }))
                .send()
                .await?
        }
        Command::Status { process_id } => {
            client
                .get(endpoint(server, &format!("ingestion/status/{process_id}")))
                .send()
                .await?
        }
        Command::List => client.get(endpoint(server, "ingestion/all")).send().await?,
        Command::Remove { id } => client.delete(endpoint(server, &format!("ingestion/{id}"))).send().await?,
    };

    render(res).await
}

async fn render(res: Response) -> Result<String, Error> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        bail!("{status}: {body}");
    }

    Ok(pretty(&body))
}

fn pretty(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string())
        }
        _ => body.to_string(),
    }
}

pub fn endpoint(server: &str, path: &str) -> String {
    format!("{}/{}", server.trim_end_matches('/'), path.trim_start_matches('/'))
}
