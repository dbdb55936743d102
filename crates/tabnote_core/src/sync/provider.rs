//! Cloud storage provider seam.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Provider-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// No usable credentials.
    Unauthorized,
    /// Remote call failed.
    Transport(String),
}

impl Display for CloudError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "cloud provider is not authorized"),
            Self::Transport(message) => write!(f, "cloud transfer failed: {message}"),
        }
    }
}

impl Error for CloudError {}

/// Stores one backup document per account.
pub trait CloudProvider {
    /// Stable provider id used in log lines.
    fn provider_id(&self) -> &str;
    /// Creates or replaces the backup document.
    fn upload(&mut self, document: &str) -> Result<(), CloudError>;
    /// Returns the backup document, or `None` when none exists yet.
    fn download(&mut self) -> Result<Option<String>, CloudError>;
}

/// Provider keeping the document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCloudProvider {
    document: Option<String>,
    failure: Option<CloudError>,
}

impl MemoryCloudProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
            failure: None,
        }
    }

    /// Makes every call fail with `failure` until cleared with `None`.
    pub fn fail_with(&mut self, failure: Option<CloudError>) {
        self.failure = failure;
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    fn check(&self) -> Result<(), CloudError> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

impl CloudProvider for MemoryCloudProvider {
    fn provider_id(&self) -> &str {
        "memory"
    }

    fn upload(&mut self, document: &str) -> Result<(), CloudError> {
        self.check()?;
        self.document = Some(document.to_string());
        Ok(())
    }

    fn download(&mut self) -> Result<Option<String>, CloudError> {
        self.check()?;
        Ok(self.document.clone())
    }
}
