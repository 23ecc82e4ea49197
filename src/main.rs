use ralloc::cli::Cli;
use ralloc::driver;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(err) = driver::run(&cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
