use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ftml")]
#[command(about = "Package authoring HTML exports as Fluid Topics archives and publish them")]
#[command(version)]
pub struct Cli {
    /// RON configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity level (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write the log to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build and verify one archive per language folder
    Convert(ConvertArgs),
    /// Build the archives, then upload each one to the portal
    Publish(PublishArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Export root holding one folder per language
    pub root: PathBuf,

    /// Customer tag injected as `customer` meta and used as upload prefix
    #[arg(long)]
    pub customer: Option<String>,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    #[command(flatten)]
    pub convert: ConvertArgs,

    /// Portal base URL
    #[arg(long)]
    pub portal: Option<String>,

    /// Login used on the portal
    #[arg(long)]
    pub user: Option<String>,

    /// Portal password
    #[arg(long, env = "FTML_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Identifier of the destination source
    #[arg(long)]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn publish_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ftml", "-vv", "publish", "out", "--portal", "https://p.example.com", "--user", "bot",
            "--source", "paligo", "--customer", "acme",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Publish(args) => {
                assert_eq!(args.convert.root.to_str(), Some("out"));
                assert_eq!(args.convert.customer.as_deref(), Some("acme"));
                assert_eq!(args.source.as_deref(), Some("paligo"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
