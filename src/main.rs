use clap::{Parser, Subcommand};
use ringd::config::Config;
use ringd::errors::Result;
use ringd::utils::get_config_path;
use ringd::{daemon, link};

#[derive(Parser, Debug)]
#[command(name = "ringd")]
#[command(about = "Gesture daemon for BlueX RF03 smart rings")]
struct Args {
    #[arg(long)]
    daemon: bool,

    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for nearby rings and print their advertised name and address.
    ScanDevices,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => std::path::PathBuf::from(path),
        None => get_config_path()?,
    };

    if let Some(command) = args.command {
        match command {
            Command::ScanDevices => {
                let link = link::Link::new().await?;
                let rings = link.scan(None).await?;
                if rings.is_empty() {
                    println!("No rings found");
                } else {
                    for ring in rings {
                        println!("{}  {}", ring.address, ring.name);
                    }
                }
            }
        }
        return Ok(());
    }

    if args.daemon {
        let config = Config::load_or_default(&config_path).await?;
        daemon::run(config).await?
    }

    Ok(())
}
