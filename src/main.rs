use clap::Parser;
use modverify::cli::RootArgs;
use modverify::{logging, workflow};

fn main() {
    let args = RootArgs::parse();
    logging::init_tracing(args.verbose);

    let code = match workflow::dispatch(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}
