mod cli;

fn main() {
    env_logger::init();
    let code = match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("caliper: {e:#}");
            2
        }
    };
    std::process::exit(code);
}
