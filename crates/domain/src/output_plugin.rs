use std::fmt::{Display, Formatter};

use logscope_core::{AppError, AppResult, NonEmptyString};
use uuid::Uuid;

/// Maximum identifier length accepted by the shipping agent.
pub const OUTPUT_PLUGIN_ID_MAX_LENGTH: usize = 63;

/// Identifier of an output plugin in the shipping agent's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputPluginId(String);

impl OutputPluginId {
    /// Creates a validated identifier of up to 63 ASCII letters, digits,
    /// `.`, `_` or `-`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let value = value.trim();

        if value.is_empty() {
            return Err(AppError::Validation(
                "output plugin id must not be empty".to_owned(),
            ));
        }

        if value.len() > OUTPUT_PLUGIN_ID_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "output plugin id must not exceed {OUTPUT_PLUGIN_ID_MAX_LENGTH} characters"
            )));
        }

        if !value
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-'))
        {
            return Err(AppError::Validation(format!(
                "output plugin id '{value}' may only contain letters, digits, '.', '_' and '-'"
            )));
        }

        Ok(Self(value.to_owned()))
    }

    /// Creates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OutputPluginId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<OutputPluginId> for String {
    fn from(value: OutputPluginId) -> Self {
        value.0
    }
}

/// One `name value` line of an output plugin section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPluginParameter {
    name: NonEmptyString,
    value: String,
}

impl OutputPluginParameter {
    /// Creates a parameter; the name must not be blank.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> AppResult<Self> {
        let name = NonEmptyString::new(name.into().trim().to_owned()).map_err(|_| {
            AppError::Validation("output plugin parameter name must not be empty".to_owned())
        })?;

        Ok(Self {
            name,
            value: value.into(),
        })
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the parameter value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}

/// Output plugin configuration stored by the shipping agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPluginConfig {
    id: OutputPluginId,
    plugin_type: NonEmptyString,
    parameters: Vec<OutputPluginParameter>,
    enabled: bool,
}

impl OutputPluginConfig {
    /// Creates a validated configuration. Parameter order is preserved.
    pub fn new(
        id: OutputPluginId,
        plugin_type: impl Into<String>,
        parameters: Vec<OutputPluginParameter>,
        enabled: bool,
    ) -> AppResult<Self> {
        let plugin_type = NonEmptyString::new(plugin_type.into().trim().to_owned())
            .map_err(|_| AppError::Validation("output plugin type must not be empty".to_owned()))?;

        Ok(Self {
            id,
            plugin_type,
            parameters,
            enabled,
        })
    }

    /// Returns a copy carrying another identifier.
    #[must_use]
    pub fn with_id(mut self, id: OutputPluginId) -> Self {
        self.id = id;
        self
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &OutputPluginId {
        &self.id
    }

    /// Returns the plugin type, e.g. `es` or `kafka`.
    #[must_use]
    pub fn plugin_type(&self) -> &str {
        self.plugin_type.as_str()
    }

    /// Returns parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[OutputPluginParameter] {
        &self.parameters
    }

    /// Returns whether the agent should ship to this output.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}
