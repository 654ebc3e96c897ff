use once_cell::sync::Lazy;
use std::env;
use std::fmt;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// 프로세스 시작 후 처음 접근할 때 한 번만 읽는 환경 스냅샷
static CURRENT: Lazy<AiEnvironment> = Lazy::new(AiEnvironment::capture);

/// Environment signals that drive provider selection.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AiEnvironment {
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
}

impl AiEnvironment {
    /// Snapshot of the process environment, taken once per process.
    pub fn current() -> &'static AiEnvironment {
        &CURRENT
    }

    /// Read the variables now. Empty values count as unset.
    pub fn capture() -> Self {
        Self::new(env::var(OPENAI_API_KEY_ENV).ok(), env::var(OPENAI_BASE_URL_ENV).ok())
    }

    pub fn new(openai_api_key: Option<String>, openai_base_url: Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: non_empty(openai_api_key),
            openai_base_url: non_empty(openai_base_url),
        }
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref()
    }

    pub fn openai_base_url(&self) -> Option<&str> {
        self.openai_base_url.as_deref()
    }

    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl fmt::Debug for AiEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiEnvironment")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_counts_as_missing() {
        let environment = AiEnvironment::new(Some("   ".to_string()), None);
        assert!(!environment.has_openai_key());
    }

    #[test]
    fn test_debug_redacts_key() {
        let environment = AiEnvironment::new(Some("sk-secret".to_string()), None);
        let rendered = format!("{:?}", environment);
        assert!(environment.has_openai_key());
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_current_is_stable() {
        let first = AiEnvironment::current() as *const AiEnvironment;
        let second = AiEnvironment::current() as *const AiEnvironment;
        assert_eq!(first, second);
    }
}
