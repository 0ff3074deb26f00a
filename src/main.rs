mod agent;
mod app;
mod categorize;
mod chat;
mod cli;
mod config;
mod error;
mod github;
mod llm;
mod prompt;
mod providers;
mod session;
#[cfg(test)]
mod test_helpers;
mod tools;
mod usage;

use clap::Parser;

use app::{App, GlobalOptions};
use cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let global = GlobalOptions {
        config: cli.config,
        github_url: cli.github_url,
    };

    match cli.command {
        Command::Ask { question, model } => chat::ask(&global, &model, &question).await,
        Command::Chat { model } => chat::repl(&global, &model).await,
        Command::Health => {
            let mut app = App::load(&global)?;
            println!("{}", app.health_dashboard().await);
            Ok(())
        }
        Command::Tool { name, args } => {
            let app = App::load(&global)?;
            let result = app.run_tool(&name, &args).await?;
            println!("{}", result.content);
            Ok(())
        }
        Command::Init { force } => {
            let dir = std::env::current_dir().map_err(error::Error::from)?;
            let path = config::init(&dir, force)?;
            eprintln!("Created {}", path.display());
            Ok(())
        }
        Command::Usage(usage) => usage.run(),
    }
}
