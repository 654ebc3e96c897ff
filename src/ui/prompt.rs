use crate::error::{OiError, Result};
use dialoguer::Confirm;

pub struct ConfirmPrompt;

impl ConfirmPrompt {
    pub fn new() -> Self {
        Self
    }

    /// Ask whether to commit despite review warnings. Defaults to no.
    pub fn confirm_with_warnings(&self) -> Result<bool> {
        let result = Confirm::new()
            .with_prompt("Warnings found. Continue with commit?")
            .default(false)
            .interact()
            .map_err(|_| OiError::UserCancelled)?;

        Ok(result)
    }
}

impl Default for ConfirmPrompt {
    fn default() -> Self {
        Self::new()
    }
}
