//! Session credential handling for the evaluation site.
//!
//! The site is protected by a session cookie, not an API key: the operator
//! logs in with a browser and hands the cookie value to this tool. The
//! credential lives only in memory, is replaced in place when the site
//! invalidates it mid-run, and is never persisted to disk.

use std::io::{self, Write};

use anyhow::{bail, Result};
use tokio::sync::RwLock;

/// Environment variable that seeds the session token at startup.
pub const TOKEN_ENV_VAR: &str = "PHPSESSID";

/// Obtains a session token from the operator.
///
/// Implemented by the interactive stdin prompt in production and by
/// scripted stubs in tests. Either method must return a non-empty token
/// or an error; there is no retry below this seam.
pub trait TokenPrompt: Send + Sync {
    /// First-run prompt, used when the environment provides no token.
    fn initial_token(&self) -> Result<String>;

    /// Mid-run prompt after the site invalidated the current session.
    fn reauth_token(&self) -> Result<String>;
}

/// The process-wide session token.
///
/// Single writer (the ingestion controller, on detecting expiry), many
/// readers (every fetch reads the current value at dispatch time). A fetch
/// already in flight may have been dispatched with a token that has since
/// been replaced; that staleness surfaces as the expiry outcome the
/// controller already handles.
pub struct SessionStore {
    token: RwLock<String>,
}

impl SessionStore {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("{} is required", TOKEN_ENV_VAR);
        }
        Ok(Self {
            token: RwLock::new(token),
        })
    }

    /// Seed the store from the environment, falling back to the prompt.
    pub fn from_env_or_prompt(prompt: &dyn TokenPrompt) -> Result<Self> {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => Self::new(token),
            _ => Self::new(prompt.initial_token()?),
        }
    }

    pub async fn current(&self) -> String {
        self.token.read().await.clone()
    }

    /// Swap in a replacement token. Visible to every fetch dispatched
    /// after this call returns.
    pub async fn replace(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("{} is required", TOKEN_ENV_VAR);
        }
        *self.token.write().await = token;
        Ok(())
    }
}

/// Interactive prompt on stdin/stdout.
///
/// Blocking by design: an expired session pauses the whole run until the
/// operator supplies a fresh cookie.
pub struct StdinPrompt {
    base_url: String,
}

impl StdinPrompt {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl TokenPrompt for StdinPrompt {
    fn initial_token(&self) -> Result<String> {
        println!("{} not found in environment variables.", TOKEN_ENV_VAR);
        println!();
        println!("Follow these steps to find your {}:", TOKEN_ENV_VAR);
        println!("1. Visit {}", self.base_url);
        println!("2. Open your browser's developer tools (right-click the page and choose Inspect)");
        println!("3. Open the Application tab");
        println!("4. Expand Cookies in the left sidebar and select the site URL");
        println!("5. Find the cookie named {}", TOKEN_ENV_VAR);
        println!("6. Copy the value (not the name) of that cookie");
        println!("7. Paste it below");
        read_token(&format!("Please enter your {}: ", TOKEN_ENV_VAR))
    }

    fn reauth_token(&self) -> Result<String> {
        read_token(&format!(
            "Token expired. Please enter your {} ({}): ",
            TOKEN_ENV_VAR, self.base_url
        ))
    }
}

fn read_token(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    let token = line.trim().to_string();
    if token.is_empty() {
        bail!("{} is required", TOKEN_ENV_VAR);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        assert!(SessionStore::new("").is_err());
        assert!(SessionStore::new("   ").is_err());
    }

    #[tokio::test]
    async fn test_replace_is_visible_to_later_reads() {
        let store = SessionStore::new("first").unwrap();
        assert_eq!(store.current().await, "first");

        store.replace("second").await.unwrap();
        assert_eq!(store.current().await, "second");
    }

    #[tokio::test]
    async fn test_replace_with_empty_token_rejected() {
        let store = SessionStore::new("first").unwrap();
        assert!(store.replace("").await.is_err());
        assert_eq!(store.current().await, "first");
    }
}
