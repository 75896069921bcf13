use clap::Parser;
use paramatch::cli::Cli;
use paramatch::output::Output;
use paramatch::runner::{build_pattern, read_inputs, render, run};
use tracing::Level;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Ok(true) when every input matched and bound cleanly.
fn execute(cli: &Cli) -> anyhow::Result<bool> {
    let use_color = !cli.no_color && atty::is(atty::Stream::Stdout);
    let mut output = Output::new(use_color, cli.quiet);

    let builder = build_pattern(cli)?;

    if !cli.render.is_empty() {
        let rendered = render(&builder, &cli.render)?;
        output.print_rendered(&rendered)?;
        return Ok(true);
    }

    let inputs = read_inputs(cli)?;
    if inputs.is_empty() {
        eprintln!("No inputs given");
        return Ok(false);
    }

    let result = run(&builder, &inputs, cli.sequential);
    output.print_results(&result)?;
    Ok(result.passed())
}
