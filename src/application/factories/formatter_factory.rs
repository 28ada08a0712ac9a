use crate::adapters::outbound::formatters::{JsonFormatter, YamlFormatter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::TemplateFormatter;

/// Factory for creating template formatters
///
/// Picks the formatter adapter for a requested output format. Deployment
/// always goes through compact JSON.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter for `synth` output
    ///
    /// # Examples
    /// ```
    /// use cms_stack::application::dto::OutputFormat;
    /// use cms_stack::application::factories::FormatterFactory;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::Yaml);
    /// ```
    pub fn create(format: OutputFormat) -> Box<dyn TemplateFormatter> {
        match format {
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Yaml => Box::new(YamlFormatter::new()),
        }
    }

    /// Creates the formatter used to build the `TemplateBody` of a deployment
    pub fn for_deploy() -> Box<dyn TemplateFormatter> {
        Box::new(JsonFormatter::compact())
    }

    /// Returns the progress message for the specified output format
    ///
    /// # Examples
    /// ```
    /// use cms_stack::application::dto::OutputFormat;
    /// use cms_stack::application::factories::FormatterFactory;
    ///
    /// let message = FormatterFactory::progress_message(OutputFormat::Json);
    /// assert_eq!(message, "📝 Rendering CloudFormation JSON template...");
    /// ```
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Rendering CloudFormation JSON template...",
            OutputFormat::Yaml => "📝 Rendering CloudFormation YAML template...",
        }
    }
}
