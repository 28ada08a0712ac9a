use super::LogicalId;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// A CloudFormation property value: either a literal or an intrinsic function.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Ref(LogicalId),
    GetAtt(LogicalId, String),
    /// `Fn::Sub` over a string containing `${Name}` or `${Name.Attr}` placeholders
    Sub(String),
    Select(usize, Box<Expr>),
    /// `Fn::GetAZs ""` (availability zones of the stack's region)
    GetAzs,
    Join(String, Vec<Expr>),
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn reference(id: &LogicalId) -> Self {
        Expr::Ref(id.clone())
    }

    pub fn get_att(id: &LogicalId, attribute: &str) -> Self {
        Expr::GetAtt(id.clone(), attribute.to_string())
    }

    /// The `index`-th availability zone of the current region
    pub fn availability_zone(index: usize) -> Self {
        Expr::Select(index, Box::new(Expr::GetAzs))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Ref(id) => json!({ "Ref": id.as_str() }),
            Expr::GetAtt(id, attribute) => json!({ "Fn::GetAtt": [id.as_str(), attribute] }),
            Expr::Sub(template) => json!({ "Fn::Sub": template }),
            Expr::Select(index, inner) => json!({ "Fn::Select": [index, inner.to_json()] }),
            Expr::GetAzs => json!({ "Fn::GetAZs": "" }),
            Expr::Join(delimiter, parts) => {
                let parts: Vec<Value> = parts.iter().map(Expr::to_json).collect();
                json!({ "Fn::Join": [delimiter, parts] })
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Str(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Str(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Collects the logical IDs referenced anywhere inside a rendered JSON value.
///
/// Recognises `Ref`, `Fn::GetAtt` and `${Name}` placeholders in `Fn::Sub`.
/// Pseudo parameters (`AWS::Region`, ...) are not logical IDs and are skipped.
pub fn collect_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                if !target.starts_with("AWS::") {
                    out.push(target.clone());
                }
            }
            if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                if let Some(Value::String(target)) = parts.first() {
                    out.push(target.clone());
                }
            }
            if let Some(Value::String(template)) = map.get("Fn::Sub") {
                out.extend(sub_placeholders(template));
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

fn sub_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        let placeholder = &after[..end];
        // `${!Literal}` is an escaped literal
        if !placeholder.starts_with('!') && !placeholder.starts_with("AWS::") {
            let name = placeholder.split('.').next().unwrap_or(placeholder);
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}
