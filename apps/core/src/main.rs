fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match inline_results_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("[inline-results] {error}");
            std::process::exit(2);
        }
    };

    if let Err(error) = inline_results_core::runtime::run_with_options(options) {
        inline_results_core::logging::error(&format!("runtime failed: {error}"));
        std::process::exit(1);
    }
}
