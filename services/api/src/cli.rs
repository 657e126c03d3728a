use crate::report::{run_categories, run_recommend, CategoriesArgs, RecommendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use diabcare::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DiabCare",
    about = "Serve or query glycemic-index aware food recommendations",
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
    /// Print personalised food recommendations for one profile
    Recommend(RecommendArgs),
    /// List catalog categories with item counts
    Categories(CategoriesArgs),
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
        Command::Recommend(args) => run_recommend(args),
        Command::Categories(args) => run_categories(args),
    }
}
