//! Registration of department OAuth2 integrations with the OAuth manager server.

use crate::manager::RegistryManager;
use motus_oauth::{standard_provider, InjectionOutcome, OAuthDescriptor};
use motus_types::entity::{Department, Integration};
use motus_types::naming::kebab_case;
use tracing::{info, warn};

/// What happened to one integration during registration.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Applied {
        name: String,
        outcome: InjectionOutcome,
    },
    /// Neither a well-known provider nor an explicit `authUrl`.
    NoDescriptor { name: String },
    Failed { name: String, error: String },
}

/// Build the injector descriptor for an integration: the well-known provider
/// entry with any explicit fields from the integration laid over it.
pub fn descriptor_for(integration: &Integration) -> Option<OAuthDescriptor> {
    let mut desc = match standard_provider(&integration.name) {
        Some(provider) => provider.descriptor(&integration.name, &integration.env_vars),
        None => OAuthDescriptor {
            id: kebab_case(&integration.name),
            name: integration.name.clone(),
            icon: None,
            env_vars: integration.env_vars.clone(),
            auth_url: integration.auth_url.clone()?,
            token_url: String::new(),
            scopes: Vec::new(),
        },
    };
    if let Some(id) = &integration.id {
        desc.id = id.clone();
    }
    if let Some(icon) = &integration.icon {
        desc.icon = Some(icon.clone());
    }
    if let Some(auth_url) = &integration.auth_url {
        desc.auth_url = auth_url.clone();
    }
    if let Some(token_url) = &integration.token_url {
        desc.token_url = token_url.clone();
    }
    if let Some(scopes) = &integration.scopes {
        desc.scopes = scopes.clone();
    }
    Some(desc)
}

impl RegistryManager {
    /// Patch every `oauth2` integration of `department` into the OAuth server.
    /// Failures are logged and reported, never raised.
    pub async fn register_integrations(&self, department: &Department) -> Vec<Registration> {
        let mut results = Vec::new();
        for integration in department.integrations.iter().filter(|i| i.is_oauth()) {
            let name = integration.name.clone();
            let Some(desc) = descriptor_for(integration) else {
                info!(integration = %name, "No OAuth provider config, skipping");
                results.push(Registration::NoDescriptor { name });
                continue;
            };
            match self.injector.add_integration(&desc).await {
                Ok(outcome) => results.push(Registration::Applied { name, outcome }),
                Err(e) => {
                    warn!(
                        integration = %name,
                        department = %department.name,
                        error = %e,
                        "Failed to register OAuth integration"
                    );
                    results.push(Registration::Failed {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
        if !results.is_empty() {
            info!(
                department = %department.name,
                count = results.len(),
                "OAuth integration registration complete"
            );
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motus_types::entity::IntegrationKind;

    fn oauth(name: &str) -> Integration {
        Integration::new(
            name,
            IntegrationKind::OAuth2,
            vec!["X_CLIENT_ID".into(), "X_CLIENT_SECRET".into()],
        )
    }

    #[test]
    fn standard_provider_is_the_base() {
        let desc = descriptor_for(&oauth("Slack")).unwrap();
        assert_eq!(desc.id, "slack");
        assert_eq!(desc.auth_url, "https://slack.com/oauth/v2/authorize");
        assert_eq!(desc.env_vars, vec!["X_CLIENT_ID", "X_CLIENT_SECRET"]);
    }

    #[test]
    fn explicit_fields_override() {
        let mut integration = oauth("Slack");
        integration.scopes = Some(vec!["chat:write".into()]);
        integration.id = Some("team-slack".into());
        let desc = descriptor_for(&integration).unwrap();
        assert_eq!(desc.id, "team-slack");
        assert_eq!(desc.scopes, vec!["chat:write"]);
    }

    #[test]
    fn unknown_provider_needs_an_auth_url() {
        assert!(descriptor_for(&oauth("Strava")).is_none());
        assert!(descriptor_for(&oauth("Twitter API")).is_none());

        let mut integration = oauth("Strava");
        integration.auth_url = Some("https://www.strava.com/oauth/authorize".into());
        integration.token_url = Some("https://www.strava.com/oauth/token".into());
        let desc = descriptor_for(&integration).unwrap();
        assert_eq!(desc.id, "strava");
        assert!(desc.validate().is_ok());
    }
}
