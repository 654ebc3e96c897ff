use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `OI_LOG=oi=debug`.
pub const LOG_ENV: &str = "OI_LOG";

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "oi=debug"
    } else {
        "warn"
    }
}

/// stderr 로그 초기화. stdout은 커밋 메시지와 리뷰 출력에 사용
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    // 이미 설치된 경우(테스트 등)는 무시
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
