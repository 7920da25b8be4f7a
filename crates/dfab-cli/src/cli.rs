use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docfabric",
    about = "DocFabric -- document ingestion, conversion and random-access reading",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root, overriding the configuration file
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Ingest a file
    Add(AddArgs),
    /// List documents, newest first
    List(ListArgs),
    /// Show a document's record
    Show(IdArgs),
    /// Print converted text, optionally a character window
    Cat(CatArgs),
    /// Show the heading outline
    Outline(OutlineArgs),
    /// Write the original bytes
    Original(OriginalArgs),
    /// Replace a document's content
    Update(UpdateArgs),
    /// Delete a document
    Rm(IdArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address, overriding the configuration file
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    pub path: PathBuf,
    /// Content type; guessed from the extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,
    /// Metadata entry as key=value; repeatable
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct CatArgs {
    pub id: String,
    #[arg(long)]
    pub offset: Option<usize>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct OutlineArgs {
    pub id: String,
    /// Nest sections under their parents
    #[arg(long)]
    pub tree: bool,
}

#[derive(Args)]
pub struct OriginalArgs {
    pub id: String,
    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    pub path: PathBuf,
    #[arg(long)]
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["docfabric", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.bind.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_bind() {
        let cli = Cli::try_parse_from(["docfabric", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_add_with_meta() {
        let cli = Cli::try_parse_from([
            "docfabric", "add", "paper.pdf", "--meta", "author=ada", "--meta", "year=1843",
        ])
        .unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("paper.pdf"));
            assert_eq!(args.meta, vec!["author=ada", "year=1843"]);
            assert!(args.content_type.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_defaults() {
        let cli = Cli::try_parse_from(["docfabric", "list"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.limit, 20);
            assert_eq!(args.offset, 0);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_paging() {
        let cli = Cli::try_parse_from(["docfabric", "list", "-n", "5", "--offset", "10"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.limit, 5);
            assert_eq!(args.offset, 10);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_cat_window() {
        let cli =
            Cli::try_parse_from(["docfabric", "cat", "abc", "--offset", "3", "--limit", "7"])
                .unwrap();
        if let Command::Cat(args) = cli.command {
            assert_eq!(args.id, "abc");
            assert_eq!(args.offset, Some(3));
            assert_eq!(args.limit, Some(7));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_outline_tree() {
        let cli = Cli::try_parse_from(["docfabric", "outline", "abc", "--tree"]).unwrap();
        if let Command::Outline(args) = cli.command {
            assert!(args.tree);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_original_output() {
        let cli = Cli::try_parse_from(["docfabric", "original", "abc", "-o", "out.pdf"]).unwrap();
        if let Command::Original(args) = cli.command {
            assert_eq!(args.output, Some(PathBuf::from("out.pdf")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_rm() {
        let cli = Cli::try_parse_from(["docfabric", "rm", "abc"]).unwrap();
        assert!(matches!(cli.command, Command::Rm(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docfabric", "list", "--format", "json", "--storage", "/tmp/s", "-v",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/s")));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["docfabric", "--config", "d.toml", "config"]).unwrap();
        assert!(matches!(cli.command, Command::Config));
        assert_eq!(cli.config, Some(PathBuf::from("d.toml")));
    }
}
