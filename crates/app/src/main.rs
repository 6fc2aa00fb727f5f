// CLI modules
mod args;
mod config;
mod logging;
mod notify;
mod op;
mod ops;

use args::{Args, Parser};
use config::Config;
use op::{Op, OpContext};
use ops::Check;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = logging::init_logging(args.log_level);

    // Environment problems are fatal before any remote call
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            drop(guard);
            std::process::exit(1);
        }
    };

    let ctx = OpContext::new(config);

    // Check streams its lines to stdout as it goes
    let code = match Check.execute(&ctx).await {
        Ok(output) => {
            tracing::debug!(total = output.report.total, "check complete");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    drop(guard);
    std::process::exit(code);
}
