use crate::provisioning::domain::environment::{
    ADMIN_JWT_SECRET, API_TOKEN_SALT, APP_KEYS, JWT_SECRET,
};
use crate::provisioning::domain::ApplicationName;
use crate::provisioning::template::{LogicalId, Resource, Resources};
use crate::shared::Result;
use serde_json::json;

const GENERATED_LENGTH: u32 = 32;

/// What an application secret is used for by the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecretPurpose {
    JwtSecret,
    AppKeys,
    ApiTokenSalt,
    AdminJwtSecret,
}

impl SecretPurpose {
    pub const ALL: [SecretPurpose; 4] = [
        SecretPurpose::JwtSecret,
        SecretPurpose::AppKeys,
        SecretPurpose::ApiTokenSalt,
        SecretPurpose::AdminJwtSecret,
    ];

    /// Environment variable the secret is injected as
    pub fn env_name(self) -> &'static str {
        match self {
            SecretPurpose::JwtSecret => JWT_SECRET,
            SecretPurpose::AppKeys => APP_KEYS,
            SecretPurpose::ApiTokenSalt => API_TOKEN_SALT,
            SecretPurpose::AdminJwtSecret => ADMIN_JWT_SECRET,
        }
    }

    fn name_suffix(self) -> &'static str {
        match self {
            SecretPurpose::JwtSecret => "",
            SecretPurpose::AppKeys => "-app-keys",
            SecretPurpose::ApiTokenSalt => "-api-token-salt",
            SecretPurpose::AdminJwtSecret => "-admin-jwt",
        }
    }

    fn id_suffix(self) -> &'static str {
        match self {
            SecretPurpose::JwtSecret => "JwtSecret",
            SecretPurpose::AppKeys => "AppKeys",
            SecretPurpose::ApiTokenSalt => "ApiTokenSalt",
            SecretPurpose::AdminJwtSecret => "AdminJwtSecret",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSecret {
    pub id: LogicalId,
    pub name: String,
    pub purpose: SecretPurpose,
}

/// Signing material for the CMS, one generated secret per purpose
#[derive(Debug, Clone)]
pub struct ApplicationSecrets {
    pub secrets: Vec<ApplicationSecret>,
    pub resources: Resources,
}

impl ApplicationSecrets {
    /// Declares `<app>-strapi-secret` and its three siblings. Values are
    /// generated by Secrets Manager and never appear in the template.
    pub fn provision(application_name: &ApplicationName) -> Result<Self> {
        let base_name = application_name.application_secret_name();
        let mut resources = Resources::new();
        let mut secrets = Vec::with_capacity(SecretPurpose::ALL.len());

        for purpose in SecretPurpose::ALL {
            let id = LogicalId::scoped("ApplicationSecret", purpose.id_suffix())?;
            let name = format!("{}{}", base_name, purpose.name_suffix());
            resources.insert(
                id.clone(),
                Resource::new(
                    "AWS::SecretsManager::Secret",
                    &json!({
                        "Name": name,
                        "Description": format!("{} for {}", purpose.env_name(), application_name),
                        "GenerateSecretString": {
                            "PasswordLength": GENERATED_LENGTH,
                            "ExcludePunctuation": true,
                            "IncludeSpace": false,
                        },
                    }),
                )?,
            )?;
            secrets.push(ApplicationSecret { id, name, purpose });
        }

        Ok(Self { secrets, resources })
    }

    pub fn get(&self, purpose: SecretPurpose) -> Option<&ApplicationSecret> {
        self.secrets.iter().find(|s| s.purpose == purpose)
    }
}
