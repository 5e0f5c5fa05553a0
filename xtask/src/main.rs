use clap::{Parser, Subcommand};
#[cfg(not(test))]
use xtask::*;

#[derive(Parser)]
#[command(author, version, about = "Development tasks for qstft")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Build,
    Test,
    /// Build the library without the standard library
    #[command(name = "no-std")]
    NoStd,
    Clippy,
    Fmt,
    /// fmt, then clippy
    Analyze,
    Bench,
    Demo {
        /// Run the per-frame trace demo instead of the pipeline demo
        #[arg(long)]
        verbose: bool,
    },
}

#[cfg(not(test))]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = detect_config();

    match cli.command {
        Commands::Build => run(build_command(&cfg)),
        Commands::Test => run(test_command(&cfg)),
        Commands::NoStd => run(no_std_command()),
        Commands::Clippy => run(clippy_command()),
        Commands::Fmt => run(fmt_command()),
        Commands::Analyze => {
            run(fmt_command())?;
            run(clippy_command())
        }
        Commands::Bench => run(bench_command(&cfg)),
        Commands::Demo { verbose } => run(demo_command(&cfg, verbose)),
    }
}
