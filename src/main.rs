use colored::Colorize;
use logtag::LogTagError;

fn main() {
    if let Err(err) = logtag::run() {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        let code = err
            .downcast_ref::<LogTagError>()
            .map(LogTagError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
