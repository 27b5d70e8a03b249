pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "balloonbot",
    about = "Balloonbot operator CLI",
    long_about = "Inspect balloonbot configuration, check bot readiness, \
                  and run helium estimates offline.",
    after_help = "Examples:\n  balloonbot doctor --json\n  balloonbot config\n  \
                  balloonbot estimate latex --size 12 --price 4500"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read this config file instead of balloonbot.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and bot token readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Compute a helium estimate with the bot's calculator")]
    Estimate(EstimateArgs),
    #[command(about = "Print the latex and foil helium coefficient tables")]
    Tables,
}

#[derive(Debug, Args)]
struct EstimateArgs {
    #[arg(long, global = true, help = "Emit machine-readable JSON output")]
    json: bool,
    #[command(subcommand)]
    model: EstimateModel,
}

#[derive(Debug, Subcommand)]
enum EstimateModel {
    #[command(about = "Latex balloon by diameter label")]
    Latex {
        #[arg(long)]
        size: String,
        #[arg(long, help = "Price of one helium tank")]
        price: f64,
    },
    #[command(about = "Foil balloon by form and size in inches")]
    Foil {
        #[arg(long, help = "circle|heart|star or круг|сердце|звезда")]
        form: String,
        #[arg(long)]
        size: String,
        #[arg(long, help = "Price of one helium tank")]
        price: f64,
    },
    #[command(about = "Foil figure by height and width in centimeters")]
    Figure {
        #[arg(long)]
        height: f64,
        #[arg(long)]
        width: f64,
        #[arg(long, help = "Price of one helium tank")]
        price: f64,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(cli.config),
        Command::Doctor { json } => commands::doctor::run(cli.config, json),
        Command::Estimate(EstimateArgs { json, model }) => match model {
            EstimateModel::Latex { size, price } => commands::estimate::latex(&size, price, json),
            EstimateModel::Foil { form, size, price } => {
                commands::estimate::foil(&form, &size, price, json)
            }
            EstimateModel::Figure { height, width, price } => {
                commands::estimate::figure(height, width, price, json)
            }
        },
        Command::Tables => commands::tables::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, EstimateArgs, EstimateModel};

    #[test]
    fn estimate_json_flag_is_accepted_after_the_model() {
        let cli = Cli::try_parse_from([
            "balloonbot",
            "estimate",
            "foil",
            "--form",
            "heart",
            "--size",
            "32",
            "--price",
            "4500",
            "--json",
        ])
        .expect("parse");

        match cli.command {
            Command::Estimate(EstimateArgs { json, model: EstimateModel::Foil { form, .. } }) => {
                assert!(json);
                assert_eq!(form, "heart");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_path_is_global() {
        let cli = Cli::try_parse_from(["balloonbot", "doctor", "--config", "custom.toml"])
            .expect("parse");

        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
        assert!(matches!(cli.command, Command::Doctor { json: false }));
    }
}
