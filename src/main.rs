use clap::Parser;
use tracing_subscriber::EnvFilter;

use mixnote::{app::AppFactory, cli};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let base_path = match args.base_dir {
        Some(path) => path,
        None => AppFactory::get_base_path()?,
    };
    let mut service = AppFactory::create_service(&base_path)?;

    match args.command {
        cli::Command::Add { id, text, file } => cli::handle_add(&mut service, id, text, file),
        cli::Command::Search { query, top_k } => cli::handle_search(&service, query, top_k),
        cli::Command::List {} => cli::handle_list(&service),
        cli::Command::Remove { id } => cli::handle_remove(&mut service, id),
        cli::Command::Rebuild {} => cli::handle_rebuild(&mut service),
        cli::Command::Stats {} => cli::handle_stats(&service),
    }
}
