use crate::ports::outbound::TemplateFormatter;
use crate::provisioning::template::Template;
use crate::shared::error::StackError;
use crate::shared::Result;

/// YamlFormatter adapter for CloudFormation YAML templates
///
/// Intrinsic functions are written in their long form (`Fn::GetAtt: [...]`)
/// so the output needs no custom YAML tags.
pub struct YamlFormatter;

impl YamlFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YamlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateFormatter for YamlFormatter {
    fn format(&self, template: &Template) -> Result<String> {
        serde_yaml_ng::to_string(template).map_err(|e| {
            StackError::TemplateError {
                details: format!("YAML serialization failed: {}", e),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::template::{Expr, LogicalId, Output, Resource, Resources};
    use serde_json::json;

    #[test]
    fn test_yaml_output_uses_long_form_intrinsics() {
        let bucket = LogicalId::new("Bucket").unwrap();
        let mut resources = Resources::new();
        resources
            .insert(
                bucket.clone(),
                Resource::new("AWS::S3::Bucket", &json!({})).unwrap(),
            )
            .unwrap();
        let mut template = Template::new("yaml test");
        template.add_resources(resources).unwrap();
        template
            .add_output(
                &LogicalId::new("BucketArn").unwrap(),
                Output::new(Expr::get_att(&bucket, "Arn")),
            )
            .unwrap();

        let output = YamlFormatter::new().format(&template).unwrap();
        assert!(output.contains("Type: AWS::S3::Bucket"));

        let parsed: serde_json::Value = serde_yaml_ng::from_str(&output).unwrap();
        assert_eq!(parsed["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(parsed["Outputs"]["BucketArn"]["Value"]["Fn::GetAtt"][1], "Arn");
    }
}
