// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::op::{ExitStatus, Op, OpContext};
use cli::{args::Args, Get, Init, List, Meta, Put, Serve, Version};

command_enum! {
    (Init, Init),
    (Get, Get),
    (List, List),
    (Meta, Meta),
    (Put, Put),
    (Serve, Serve),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guard = img_store_cli::process::init_logging(args.log_level);

    let ctx = OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}", e);
            let code = e.exit_code();
            // Flush buffered logs before exiting
            drop(guard);
            std::process::exit(code);
        }
    }
}
