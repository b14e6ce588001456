use crate::error::RefineError;
use url::Url;

pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_BEARER_HEADER: &str = "Authorization";
pub const DEFAULT_BEARER_PREFIX: &str = "Bearer ";

/// Settings for one refinement run against a live service.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineConfig {
    pub base_url: Url,
    /// Upper bound on iterations, the example iteration included.
    pub max_iterations: usize,
    pub bearer_header: String,
    pub bearer_prefix: String,
}

impl RefineConfig {
    pub fn builder(base_url: impl Into<String>) -> RefineConfigBuilder {
        RefineConfigBuilder::new(base_url)
    }

    /// Strips the bearer prefix from a header value, `None` when it is missing.
    pub fn strip_bearer<'a>(&self, value: &'a str) -> Option<&'a str> {
        value.strip_prefix(self.bearer_prefix.as_str())
    }

    /// Adds the bearer prefix unless the token already carries it.
    pub fn bearer_value(&self, token: &str) -> String {
        if token.starts_with(self.bearer_prefix.as_str()) {
            token.to_string()
        } else {
            format!("{}{}", self.bearer_prefix, token)
        }
    }
}

pub struct RefineConfigBuilder {
    base_url: String,
    max_iterations: usize,
    bearer_header: String,
    bearer_prefix: String,
}

impl RefineConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            bearer_header: DEFAULT_BEARER_HEADER.to_string(),
            bearer_prefix: DEFAULT_BEARER_PREFIX.to_string(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_bearer_header(mut self, header: &str) -> Self {
        self.bearer_header = header.to_string();
        self
    }

    pub fn with_bearer_prefix(mut self, prefix: &str) -> Self {
        self.bearer_prefix = prefix.to_string();
        self
    }

    pub fn build(self) -> Result<RefineConfig, RefineError> {
        if self.max_iterations == 0 {
            return Err(RefineError::InvalidIterationCap(self.max_iterations));
        }
        let base_url = Url::parse(&self.base_url).map_err(|e| RefineError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RefineError::InvalidBaseUrl {
                url: self.base_url,
                message: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(RefineConfig {
            base_url,
            max_iterations: self.max_iterations,
            bearer_header: self.bearer_header,
            bearer_prefix: self.bearer_prefix,
        })
    }
}
