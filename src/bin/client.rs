use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use quorumkv::cluster::KvClient;
use quorumkv::config::ClusterConfig;

#[derive(Parser, Debug)]
#[command(name = "quorumkv-client", about = "quorumkv command-line client")]
struct CliArgs {
    #[arg(long)]
    config: PathBuf,

    // Only meaningful for the blocking protocol; defaults to the process id.
    #[arg(long)]
    client_id: Option<i32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Read { key: String },
    Write { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = CliArgs::parse();
    let config = ClusterConfig::load(&args.config)?;
    let client_id = args.client_id.unwrap_or(std::process::id() as i32);
    let client = KvClient::from_config(&config, client_id);

    match args.command {
        Some(Command::Read { key }) => {
            let value = client.read(&key).await?;
            println!("{value}");
        }
        Some(Command::Write { key, value }) => {
            client.write(&key, &value).await?;
            println!("write ok");
        }
        None => interactive(&client).await?,
    }

    Ok(())
}

async fn interactive(client: &KvClient) -> anyhow::Result<()> {
    println!("commands: read <key>, write <key> <value>, quit");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let mut parts = line.splitn(3, ' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("quit"), _, _) | (Some("exit"), _, _) => break,
            (Some("read"), Some(key), _) => match client.read(key).await {
                Ok(value) => println!("{value}"),
                Err(err) => eprintln!("read failed: {err}"),
            },
            (Some("write"), Some(key), Some(value)) => match client.write(key, value).await {
                Ok(()) => println!("write ok"),
                Err(err) => eprintln!("write failed: {err}"),
            },
            (Some(""), _, _) | (None, _, _) => {}
            _ => eprintln!("usage: read <key> | write <key> <value> | quit"),
        }
    }
    Ok(())
}
