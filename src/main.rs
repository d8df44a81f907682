fn main() {
    if let Err(err) = yt_mini_analytics::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
