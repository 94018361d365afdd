use argh::FromArgs;
use minishell::Interpreter;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal command interpreter reading one command line at a time.
struct Args {
    #[argh(switch, short = 'd')]
    /// print each parsed command chain before executing it.
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    // Logs go to stderr so standard output only carries command output.
    let filter =
        EnvFilter::try_from_env("MINISHELL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Interpreter::default().with_debug(args.debug).repl()?;
    Ok(())
}
