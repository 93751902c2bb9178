use clap::Parser;

use relayctl::{Args, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{}", run(args).await?);

    Ok(())
}
