fn main() {
    if let Err(err) = pgload::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
