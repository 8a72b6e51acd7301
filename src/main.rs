//! Terminal entry point: reads commands from stdin, logs to stderr.

use chessuranga::frontend::text_loop::run_stdio_loop;
use chessuranga::game::config::GameConfig;

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if std::env::args().skip(1).any(|arg| arg == "--help" || arg == "-h") {
        println!("usage: chessuranga");
        println!("configuration is read from CHESSURANGA_* environment variables");
        return Ok(());
    }

    let config = GameConfig::from_env();
    tracing::info!(engine = %config.bot_engine, seed = ?config.seed, "starting chessuranga");
    run_stdio_loop(config).map_err(|err| format!("stdio loop failed: {err}"))
}
