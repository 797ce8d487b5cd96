//! Edit and inspect water network documents on the command line

use clap::Parser as _;

use hydronet_cli::CliArgs;

fn main() {
    let args = CliArgs::parse();
    let verbosity = args.verbosity().clone();
    tracing_subscriber::fmt()
        .with_max_level(verbosity.tracing_level_filter())
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let result = match args {
        CliArgs::Validate(mut args) => args.run(),
        CliArgs::Describe(mut args) => args.run_describe(),
        CliArgs::Apply(mut args) => args.run_apply(),
        _ => {
            eprintln!("Unknown command");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        if !verbosity.is_silent() {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
