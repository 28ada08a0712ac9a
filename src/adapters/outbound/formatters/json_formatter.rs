use crate::ports::outbound::TemplateFormatter;
use crate::provisioning::template::Template;
use crate::shared::error::StackError;
use crate::shared::Result;

/// JsonFormatter adapter for CloudFormation JSON templates
///
/// Pretty output is meant for reading and diffing; compact output keeps
/// the body under the inline `TemplateBody` limit when deploying.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateFormatter for JsonFormatter {
    fn format(&self, template: &Template) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(template)
        } else {
            serde_json::to_string(template)
        };
        rendered.map_err(|e| {
            StackError::TemplateError {
                details: format!("JSON serialization failed: {}", e),
            }
            .into()
        })
    }
}
