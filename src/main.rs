use colored::Colorize;

fn main() {
    if let Err(e) = intros::app::run_cli() {
        eprintln!(
            "{}{}{} {}",
            "[".bold().white(),
            "ERR".bold().red(),
            "]".bold().white(),
            e.red()
        );
        std::process::exit(1);
    }
}
