use crate::error::{OiError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// oi 사용자 설정
///
/// 설정 파일은 ~/.config/oi/config.toml에 저장됩니다. 모든 필드는 생략 가능합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// 리뷰에 사용할 claude 모델 (더 깊은 추론)
    #[serde(default = "default_review_model")]
    pub review_model: String,

    /// 커밋 메시지 생성에 사용할 claude 모델 (더 빠르고 저렴)
    #[serde(default = "default_commit_model")]
    pub commit_model: String,

    /// OPENAI_API_KEY가 있을 때 사용할 OpenAI 모델
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// claude CLI 실행 명령 (예: ["npx", "@anthropic-ai/claude-code"])
    #[serde(default = "default_claude_command")]
    pub claude_command: Vec<String>,

    /// 리뷰 컨텍스트로 전달할 최근 커밋 수
    #[serde(default = "default_recent_commits")]
    pub recent_commits: usize,
}

fn default_review_model() -> String {
    "opus".to_string()
}

fn default_commit_model() -> String {
    "sonnet".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_claude_command() -> Vec<String> {
    vec!["claude".to_string()]
}

fn default_recent_commits() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            review_model: default_review_model(),
            commit_model: default_commit_model(),
            openai_model: default_openai_model(),
            claude_command: default_claude_command(),
            recent_commits: default_recent_commits(),
        }
    }
}

impl Config {
    /// 설정 파일 경로 가져오기
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| OiError::ConfigError("Could not find config directory".to_string()))?;
        Ok(dir.join("oi").join("config.toml"))
    }

    /// 설정 파일에서 로드 (없으면 기본값 사용)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| OiError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        Ok(config)
    }

    /// 설정을 파일에 저장
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| OiError::ConfigError(e.to_string()))?;
        fs::write(path, toml_string)?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.claude_command.iter().all(|part| part.trim().is_empty()) {
            return Err(OiError::ConfigError(
                "claude_command must name a program".to_string(),
            ));
        }
        Ok(())
    }
}
