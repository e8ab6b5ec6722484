#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use libshelf_core::ErrorCode;
use libshelf_core::catalog::CatalogError;
use libshelf_core::extract::ExtractError;
use libshelf_core::snapshot::SnapshotError;
use libshelf_graph::GraphError;
use output::{CliError, OutputMode, render_error};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cmd::{ConfigFailure, Session};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "libshelf: infer link dependencies between native libraries",
    long_about = None
)]
struct Cli {
    /// Snapshot file (default: $LIBSHELF_PROJECT, then ./libshelf.json).
    #[arg(short, long, global = true, value_name = "PATH")]
    project: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode requested on the command line, if any.
    fn format_flag(&self) -> Option<OutputMode> {
        self.format.or(self.json.then_some(OutputMode::Json))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Catalog",
        about = "Analyze libraries and infer their dependencies",
        after_help = "EXAMPLES:\n    # Analyze a build tree\n    libshelf analyze build/lib\n\n    # Register system libraries\n    libshelf analyze /usr/lib/x86_64-linux-gnu/libm.so.6 --system"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Declare dependencies explicitly",
        after_help = "EXAMPLES:\n    # app loads plugin with dlopen\n    libshelf declare app plugin"
    )]
    Declare(cmd::declare::DeclareArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Remove libraries from the catalog",
        after_help = "EXAMPLES:\n    libshelf forget libold.so"
    )]
    Forget(cmd::forget::ForgetArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Group libraries into a component",
        after_help = "EXAMPLES:\n    # Every OpenSSL library in one component\n    libshelf component openssl 'libssl*' 'libcrypto*'\n\n    # Dissolve it again\n    libshelf component openssl --remove"
    )]
    Component(cmd::component::ComponentArgs),

    #[command(
        next_help_heading = "Queries",
        about = "Sort libraries in link order",
        after_help = "EXAMPLES:\n    # Link line for app\n    libshelf sort app --quote '-l' --sep ' '\n\n    # One file name per line\n    libshelf sort app --names full --sep '\\n'"
    )]
    Sort(cmd::sort::SortArgs),

    #[command(
        next_help_heading = "Queries",
        about = "Find the library defining a symbol",
        after_help = "EXAMPLES:\n    libshelf find 'deflateInit_'"
    )]
    Find(cmd::find::FindArgs),

    #[command(
        next_help_heading = "Queries",
        about = "List the dependencies of libraries",
        after_help = "EXAMPLES:\n    # Minimal direct requirements\n    libshelf dependencies app --minimize\n\n    # Everything, in link order\n    libshelf dependencies app -r"
    )]
    Dependencies(cmd::dependencies::DependenciesArgs),

    #[command(
        next_help_heading = "Queries",
        about = "List defined or pending symbols",
        after_help = "EXAMPLES:\n    libshelf symbols --undefined\n    libshelf symbols --library libz.so"
    )]
    Symbols(cmd::symbols::SymbolsArgs),

    #[command(
        next_help_heading = "Export",
        about = "Print the dependency graph",
        after_help = "EXAMPLES:\n    libshelf graph app --show-components | dot -Tsvg > deps.svg"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Export",
        about = "Print a Conan package_info template",
        after_help = "EXAMPLES:\n    libshelf cppinfo mypackage --minimize --indent 4"
    )]
    Cppinfo(cmd::cppinfo::CppinfoArgs),
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("LIBSHELF_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "libshelf=info,warn",
            1 => "libshelf=debug,info",
            _ => "debug",
        })
    });

    let format = env::var("LIBSHELF_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Stable error code for the first typed error in `err`'s chain.
fn error_code_of(err: &anyhow::Error) -> Option<ErrorCode> {
    if err.downcast_ref::<ConfigFailure>().is_some() {
        return Some(ErrorCode::ConfigParseError);
    }
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<GraphError>() {
            Some(e.error_code())
        } else if let Some(e) = cause.downcast_ref::<CatalogError>() {
            Some(e.error_code())
        } else if let Some(e) = cause.downcast_ref::<SnapshotError>() {
            Some(e.error_code())
        } else {
            cause.downcast_ref::<ExtractError>().map(ExtractError::error_code)
        }
    })
}

/// The error chain joined with `: `, skipping causes whose text an outer
/// layer already includes.
fn error_message(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}

fn cli_error(err: &anyhow::Error) -> CliError {
    let message = error_message(err);
    match error_code_of(err) {
        Some(code) => CliError::with_code(message, code),
        None => CliError::new(message),
    }
}

fn run(cli: &Cli, session: &mut Session) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, session),
        Commands::Declare(args) => cmd::declare::run_declare(args, session),
        Commands::Forget(args) => cmd::forget::run_forget(args, session),
        Commands::Component(args) => cmd::component::run_component(args, session),
        Commands::Sort(args) => cmd::sort::run_sort(args, session),
        Commands::Find(args) => cmd::find::run_find(args, session),
        Commands::Dependencies(args) => cmd::dependencies::run_dependencies(args, session),
        Commands::Symbols(args) => cmd::symbols::run_symbols(args, session),
        Commands::Graph(args) => cmd::graph::run_graph(args, session),
        Commands::Cppinfo(args) => cmd::cppinfo::run_cppinfo(args, session),
    }
}

fn fail(mode: OutputMode, err: &anyhow::Error) -> ExitCode {
    let _ = render_error(mode, &cli_error(err));
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut session = match Session::open(cli.project.as_deref(), cli.format_flag()) {
        Ok(session) => session,
        Err(err) => return fail(cli.format_flag().unwrap_or(OutputMode::Text), &err),
    };
    debug!(command = ?cli.command, "dispatching");

    match run(&cli, &mut session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(session.output, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["libshelf", "sort", "app", "--json", "-p", "x.json", "-vv"]);
        assert!(cli.json);
        assert_eq!(cli.project, Some(PathBuf::from("x.json")));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format_flag(), Some(OutputMode::Json));
    }

    #[test]
    fn format_flag_wins_over_json_alias() {
        let cli = Cli::parse_from(["libshelf", "--format", "text", "--json", "symbols"]);
        assert_eq!(cli.format_flag(), Some(OutputMode::Text));
    }

    #[test]
    fn no_format_flag_by_default() {
        let cli = Cli::parse_from(["libshelf", "symbols"]);
        assert_eq!(cli.format_flag(), None);
    }

    #[test]
    fn sort_options_parse() {
        let cli = Cli::parse_from([
            "libshelf", "sort", "a", "b", "--sep", "\\n", "--names", "full", "--quote", "'", "--no-deps",
        ]);
        let Commands::Sort(args) = cli.command else {
            panic!("expected sort");
        };
        assert_eq!(args.libs, ["a", "b"]);
        assert_eq!(args.sep.as_deref(), Some("\\n"));
        assert_eq!(args.names.names, Some(libshelf_core::config::NameStyle::Full));
        assert_eq!(args.names.quote.as_deref(), Some("'"));
        assert!(args.no_deps);
    }

    #[test]
    fn minimize_and_recursive_conflict() {
        let result = Cli::try_parse_from(["libshelf", "dependencies", "a", "--minimize", "-r"]);
        assert!(result.is_err());
    }

    #[test]
    fn commands_require_arguments() {
        for args in [
            vec!["libshelf", "analyze"],
            vec!["libshelf", "sort"],
            vec!["libshelf", "declare", "app"],
            vec!["libshelf", "component", "core"],
            vec!["libshelf", "cppinfo"],
        ] {
            assert!(Cli::try_parse_from(&args).is_err(), "{args:?} should fail");
        }
    }

    #[test]
    fn component_remove_takes_no_patterns() {
        let result = Cli::try_parse_from(["libshelf", "component", "core", "lib*", "--remove"]);
        assert!(result.is_err());
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["libshelf", "analyze", "lib"],
            vec!["libshelf", "analyze", "lib", "--system", "--package", "zlib"],
            vec!["libshelf", "declare", "app", "plugin"],
            vec!["libshelf", "forget", "app"],
            vec!["libshelf", "component", "core", "lib*"],
            vec!["libshelf", "component", "core", "--remove"],
            vec!["libshelf", "sort", "app"],
            vec!["libshelf", "find", "main"],
            vec!["libshelf", "dependencies", "app", "--sort"],
            vec!["libshelf", "symbols", "--undefined"],
            vec!["libshelf", "symbols", "--library", "app"],
            vec!["libshelf", "graph", "app", "--show-components", "--minimize"],
            vec!["libshelf", "cppinfo", "app", "--indent", "4"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "Failed to parse: {args:?} — error: {:?}", result.err());
        }
    }

    #[test]
    fn config_failures_map_to_config_code() {
        let err = anyhow::anyhow!("bad toml").context(ConfigFailure);
        assert_eq!(error_code_of(&err), Some(ErrorCode::ConfigParseError));
    }

    #[test]
    fn typed_errors_keep_their_code() {
        let err = anyhow::Error::from(GraphError::Catalog(CatalogError::NotFound("x".into())));
        assert_eq!(error_code_of(&err), Some(ErrorCode::LibraryNotFound));
        let cli = cli_error(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert_eq!(cli.message, "'x' is not a library");
    }

    #[test]
    fn error_message_skips_repeated_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = anyhow::Error::from(SnapshotError::Io {
            path: PathBuf::from("x.json"),
            source: io,
        });
        assert_eq!(
            error_message(&err),
            "failed to access snapshot x.json: no such file"
        );

        let err = anyhow::anyhow!("expected `=`").context(ConfigFailure);
        assert_eq!(error_message(&err), "failed to load configuration: expected `=`");
    }

    #[test]
    fn untyped_errors_have_no_code() {
        let err = anyhow::anyhow!("symbol 'foo' not found");
        assert!(cli_error(&err).error_code.is_none());
    }
}
