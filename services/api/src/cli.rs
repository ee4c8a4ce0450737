use crate::demo::{run_demo, run_process, DemoArgs, ProcessArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use form_relay::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Form Relay",
    about = "Turn form submissions into redacted case payloads and hand them downstream",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Process one submission event from a JSON file
    Process(ProcessArgs),
    /// Run sample submissions through in-memory collaborators
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Process(args) => {
            tokio::task::spawn_blocking(move || run_process(args))
                .await
                .map_err(|err| AppError::Io(std::io::Error::other(err)))?
        }
        Command::Demo(args) => run_demo(args),
    }
}
