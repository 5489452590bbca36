fn main() {
    if let Err(err) = packshot::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
