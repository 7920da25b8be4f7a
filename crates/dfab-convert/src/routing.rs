use async_trait::async_trait;

use crate::command::CommandConverter;
use crate::error::{ConversionError, ConversionResult};
use crate::passthrough::PassthroughConverter;
use crate::traits::{ConversionSource, Converter};

/// Default converter: text goes through [`PassthroughConverter`], everything
/// else through the configured [`CommandConverter`], if any.
#[derive(Clone, Debug, Default)]
pub struct RoutingConverter {
    passthrough: PassthroughConverter,
    command: Option<CommandConverter>,
}

impl RoutingConverter {
    /// A router that only handles text inputs.
    pub fn text_only() -> Self {
        Self::default()
    }

    /// A router that sends non-text inputs to `command`.
    pub fn with_command(command: CommandConverter) -> Self {
        Self {
            passthrough: PassthroughConverter,
            command: Some(command),
        }
    }

    pub fn command(&self) -> Option<&CommandConverter> {
        self.command.as_ref()
    }
}

#[async_trait]
impl Converter for RoutingConverter {
    fn name(&self) -> &str {
        "routing"
    }

    async fn convert(&self, source: &ConversionSource<'_>) -> ConversionResult<String> {
        if self.passthrough.accepts(source) {
            return self.passthrough.convert(source).await;
        }
        match &self.command {
            Some(command) => command.convert(source).await,
            None => Err(ConversionError::Unsupported {
                content_type: source.content_type.to_string(),
                filename: source.filename().to_string(),
            }),
        }
    }
}
