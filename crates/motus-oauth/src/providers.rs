//! Well-known OAuth2 providers, keyed by the integration name departments use.

use crate::OAuthDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardProvider {
    /// Integration name as it appears in a department record.
    pub service: &'static str,
    pub id: &'static str,
    pub icon: &'static str,
    pub auth_url: &'static str,
    pub token_url: &'static str,
    pub scopes: &'static [&'static str],
}

pub const STANDARD_PROVIDERS: &[StandardProvider] = &[
    StandardProvider {
        service: "Facebook API",
        id: "facebook",
        icon: "📘",
        auth_url: "https://www.facebook.com/v12.0/dialog/oauth",
        token_url: "https://graph.facebook.com/v12.0/oauth/access_token",
        scopes: &["email", "public_profile"],
    },
    StandardProvider {
        service: "LinkedIn API",
        id: "linkedin",
        icon: "💼",
        auth_url: "https://www.linkedin.com/oauth/v2/authorization",
        token_url: "https://www.linkedin.com/oauth/v2/accessToken",
        scopes: &["r_liteprofile", "r_emailaddress"],
    },
    StandardProvider {
        service: "Google Analytics",
        id: "google-analytics",
        icon: "📊",
        auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        scopes: &["https://www.googleapis.com/auth/analytics.readonly"],
    },
    StandardProvider {
        service: "Slack",
        id: "slack",
        icon: "💬",
        auth_url: "https://slack.com/oauth/v2/authorize",
        token_url: "https://slack.com/api/oauth.v2.access",
        scopes: &["channels:read", "chat:write"],
    },
    StandardProvider {
        service: "Notion",
        id: "notion",
        icon: "📝",
        auth_url: "https://api.notion.com/v1/oauth/authorize",
        token_url: "https://api.notion.com/v1/oauth/token",
        scopes: &[],
    },
];

/// Services that authenticate with a static API key and never go through OAuth.
pub const KEY_ONLY_SERVICES: &[&str] = &["Twitter API", "Buffer"];

pub fn standard_provider(service: &str) -> Option<&'static StandardProvider> {
    STANDARD_PROVIDERS.iter().find(|p| p.service == service)
}

pub fn is_key_only(service: &str) -> bool {
    KEY_ONLY_SERVICES.contains(&service)
}

impl StandardProvider {
    /// Full descriptor for this provider with the department's display name
    /// and credential variables.
    pub fn descriptor(&self, name: &str, env_vars: &[String]) -> OAuthDescriptor {
        OAuthDescriptor {
            id: self.id.to_string(),
            name: name.to_string(),
            icon: Some(self.icon.to_string()),
            env_vars: env_vars.to_vec(),
            auth_url: self.auth_url.to_string(),
            token_url: self.token_url.to_string(),
            scopes: self.scopes.iter().map(|s| s.to_string()).collect(),
        }
    }
}
