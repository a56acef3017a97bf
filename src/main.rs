use clap::{ArgAction, CommandFactory, Parser};
use gomono::{BindingMap, GenError, GenerateOptions, Manifest, Verbosity, generate, logger};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "gomono")]
#[command(about = "Generate a concrete Go package from a template", long_about = None)]
#[command(disable_help_flag = true)]
#[command(override_usage = "gomono [-q] [-v] [-h] [--no-gi] [--config FILE] -o OUT_DIR IN_MODULE [Key=Value ...]")]
struct Cli {
    /// Output directory; its base name becomes the package name
    #[arg(short = 'o', value_name = "OUT_DIR")]
    output: Option<PathBuf>,

    /// Suppress logging output
    #[arg(short = 'q')]
    quiet: bool,

    /// Increase logging output
    #[arg(short = 'v')]
    verbose: bool,

    /// Do not write a .gitignore into the output directory
    #[arg(long = "no-gi")]
    no_gi: bool,

    /// Project settings (defaults to ./gomono.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print help
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    help: bool,

    /// Import path or directory of the template package
    #[arg(value_name = "IN_MODULE")]
    template: Option<String>,

    /// Identifier renames
    #[arg(value_name = "Key=Value")]
    bindings: Vec<String>,
}

fn usage() -> ExitCode {
    let help = Cli::command().render_help();
    eprintln!("{}", help);
    ExitCode::from(gomono::error::EXIT_USAGE)
}

fn options(cli: Cli) -> Result<(GenerateOptions, Verbosity), GenError> {
    let (Some(output), Some(template)) = (cli.output, cli.template) else {
        return Err(GenError::Usage("-o OUT_DIR and IN_MODULE are required".to_string()));
    };

    let mut options = GenerateOptions::new(template, output);
    options.bindings = BindingMap::parse(&cli.bindings)?;
    options.gitignore = !cli.no_gi;

    let cwd = std::env::current_dir().map_err(|e| GenError::io(".", e))?;
    let manifest = Manifest::discover(cli.config.as_deref(), &cwd)?;
    manifest.apply(&mut options, std::env::var_os("GOPATH"));

    Ok((options, Verbosity::from_flags(cli.quiet, cli.verbose)))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{}", e.render());
            return ExitCode::from(gomono::error::EXIT_USAGE);
        }
    };
    if cli.help {
        return usage();
    }

    let (options, verbosity) = match options(cli) {
        Ok(parsed) => parsed,
        Err(e @ GenError::Usage(_)) => {
            eprintln!("{}", e);
            return usage();
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    logger::init(verbosity);

    match generate(&options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
