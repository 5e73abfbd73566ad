use clap::Parser;
use idrotate::cleanup::CleanupStatus;
use idrotate::cli::{Cli, Commands};
use idrotate::commands;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Rotate {
            app_stopped,
            no_registry,
        }) => {
            let stopped = commands::confirm_stopped(app_stopped)?;
            let (_, result, log) = commands::rotate(&stopped, no_registry)?.into_parts();

            for line in &log {
                println!("{line}");
            }

            match result {
                Ok(identity) => {
                    println!();
                    println!("New identity:");
                    for (name, value) in identity.fields() {
                        println!("  {name}: {value}");
                    }
                    Ok(())
                }
                Err(reason) => anyhow::bail!("Rotation failed at {reason}"),
            }
        }
        Some(Commands::Clean { app_stopped }) => {
            let stopped = commands::confirm_stopped(app_stopped)?;
            let results = commands::clean(&stopped)?;
            let mut failed = false;

            for (target, status) in results {
                let path = target.path.display();
                match status {
                    CleanupStatus::Removed => println!("Deleted: {path}"),
                    CleanupStatus::Emptied(count) => println!("Emptied: {path} ({count} entries)"),
                    CleanupStatus::Missing => println!("Not found: {path}"),
                    CleanupStatus::Failed(reasons) => {
                        failed = true;
                        eprintln!("Failed: {path}\n  {}", reasons.join("\n  "));
                    }
                }
            }

            if failed {
                anyhow::bail!("Cleanup finished with errors");
            }
            Ok(())
        }
        Some(Commands::Show) => {
            for (name, value) in commands::show()? {
                println!("{name}: {}", value.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
        Some(Commands::Paths) => {
            for (label, path) in commands::paths()? {
                let marker = if path.exists() { "" } else { " (missing)" };
                println!("{label:<15} {}{marker}", path.display());
            }
            Ok(())
        }
        Some(Commands::InitConfig) => {
            let (path, written) = commands::init_config()?;
            if written {
                println!("Created default config: {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
            Ok(())
        }
        None => {
            Cli::parse_from(["idrotate", "--help"]);
            Ok(())
        }
    }
}
