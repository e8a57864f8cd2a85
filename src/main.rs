use clap::Parser;
use gpmarket::adapter::inbound::cli::{command::Cli, dispatch, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = dispatch::execute(&cli).await {
        output::failure(Some(e.code()), &e.to_string());
        std::process::exit(exit_code(e.code()));
    }
}

/// Rejections the caller can fix exit with 2; everything else with 1.
fn exit_code(code: &str) -> i32 {
    match code {
        "storage" | "consistency_violation" | "config" => 1,
        _ => 2,
    }
}
