#[tokio::main]
async fn main() {
    // Run the shared main function
    let exit_code = covagg::run_main().await;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
