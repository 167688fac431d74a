//! kiln CLI entry point.

use clap::Parser;
use colored::Colorize;

use kiln::cli::{Cli, Commands, InitTarget};
use kiln::commands::{self, Context};
use kiln::utils::env::Environment;
use kiln::utils::signal::CancelToken;

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let cancel = CancelToken::new();
    if let Err(e) = cancel.install() {
        log::warn!("cannot install signal handler: {e}");
    }

    let ctx = Context {
        env: Environment::capture(),
        cancel,
        config_override: cli.config,
        key_override: cli.key,
        verbose: cli.verbose,
    };

    let result: anyhow::Result<i32> = match cli.command {
        Commands::Init { target } => match target {
            InitTarget::Key {
                path,
                encrypt,
                force,
            } => commands::init::run_key(&ctx, path, encrypt, force).map(|_| 0),
            InitTarget::Config {
                path,
                recipients,
                force,
            } => commands::init::run_config(&ctx, path, recipients, force).map(|_| 0),
        },

        Commands::Set {
            name,
            value,
            file,
            from_file,
        } => commands::set::run(&ctx, name, value, &file, from_file.as_deref()).map(|_| 0),

        Commands::Get { name, file, format } => {
            commands::get::run(&ctx, &name, &file, &format).map(|_| 0)
        }

        Commands::Edit { file, editor } => commands::edit::run(&ctx, &file, editor).map(|_| 0),

        Commands::Export { file, format } => {
            commands::export::run(&ctx, &file, &format).map(|_| 0)
        }

        Commands::Apply {
            template,
            file,
            output,
            strict,
            left_delimiter,
            right_delimiter,
        } => commands::apply::run(
            &ctx,
            &template,
            &file,
            output.as_deref(),
            strict,
            left_delimiter,
            right_delimiter,
        )
        .map(|_| 0),

        Commands::Run {
            argv,
            file,
            dry_run,
            timeout,
            workdir,
            shell,
        } => commands::run::run(&ctx, argv, &file, dry_run, timeout, workdir, shell),

        Commands::Rekey {
            file,
            add_recipient,
            force,
        } => commands::rekey::run(&ctx, &file, add_recipient, force).map(|_| 0),

        Commands::Info { file, verify } => {
            commands::info::run(&ctx, &file, verify).map(|_| 0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red());
            std::process::exit(1);
        }
    }
}
