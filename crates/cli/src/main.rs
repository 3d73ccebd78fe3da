use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    plangate_cli::run().await
}
