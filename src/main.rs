mod allot;
mod args;

use clap::Parser;
use log::{info, LevelFilter};

use crate::allot::RunOverrides;
use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    info!("args: {:?}", args);

    let overrides = RunOverrides {
        out_dir: args.out.clone(),
        roll_start: args.roll_start,
        buffer_fraction: args.buffer_fraction,
    };

    match allot::run_allotment_files(args.config.clone(), &overrides, args.reference.clone()) {
        Ok(out_dir) => {
            info!("Outputs written to {}", out_dir.display());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = std::error::Error::source(e.as_ref());
            while let Some(s) = source {
                eprintln!("  caused by: {}", s);
                source = s.source();
            }
            std::process::exit(1);
        }
    }
}
