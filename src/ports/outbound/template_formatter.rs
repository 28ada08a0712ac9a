use crate::provisioning::template::Template;
use crate::shared::Result;

/// TemplateFormatter port for rendering a template document
///
/// This port abstracts the serialization format (JSON, YAML) of the
/// synthesized CloudFormation template.
pub trait TemplateFormatter {
    /// Renders the template
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, template: &Template) -> Result<String>;
}
