use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// コンソール向けのログを初期化
///
/// `RUST_LOG` があればそれを使い、なければ `verbose` に応じて info / debug。
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pricing_auto={0},pricing_auto_common={0}", default_level)));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // 二重初期化（テストなど）は無視
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
