use clap::Parser;
use dhf::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Validate(args) => dhf::cli::commands::validate::run(args, &global),
        Commands::Score(args) => dhf::cli::commands::score::run(args, &global),
        Commands::List(args) => dhf::cli::commands::list::run(args, &global),
        Commands::Show(args) => dhf::cli::commands::show::run(args, &global),
        Commands::Remove(args) => dhf::cli::commands::remove::run(args, &global),
        Commands::Trace(cmd) => dhf::cli::commands::trace::run(cmd, &global),
    }
}
