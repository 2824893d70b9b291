//! Entry point for the Language Server Protocol implementation.

use qt_linguist_language_server::Backend;
use tower_lsp::{
    LspService,
    Server,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// ログファイルの出力先ディレクトリ（未設定なら stderr）
const LOG_DIR_ENV: &str = "QT_LINGUIST_LS_LOG_DIR";

/// stdout は LSP 通信に使うため、ログは stderr かファイルに出す
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if let Some(log_dir) = std::env::var_os(LOG_DIR_ENV) {
        let appender = tracing_appender::rolling::daily(log_dir, "qt-linguist-language-server.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        return Some(guard);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    None
}

/// Serves the LSP over stdio.
#[tokio::main]
async fn main() {
    let _guard = init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Qt Linguist language server");

    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());
    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
