use hires_timers_bench::run_benchmark;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // The summary table uses box-drawing characters; switch the console to UTF-8.
    #[cfg(windows)]
    {
        if !std::process::Command::new("cmd")
            .args(["/C", "chcp", "65001"])
            .stdout(std::process::Stdio::null())
            .status()
            .map_or(false, |s| s.success())
        {
            log::warn!("failed to set console codepage to UTF-8");
        }
    }

    if let Err(e) = run_benchmark().await {
        eprintln!("Fatal error: {}", e);
        std::process::exit(1);
    }
}
