fn main() {
    if let Err(e) = fault_sieve::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
