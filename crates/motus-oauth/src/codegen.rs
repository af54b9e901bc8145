//! JavaScript fragments spliced into the OAuth manager server.

use crate::OAuthDescriptor;
use motus_types::naming;

const DEFAULT_ICON: &str = "🔗";

/// Single-quoted JS string literal.
pub(crate) fn js_str(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Text safe inside a JS template literal.
fn js_template(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

fn js_list(items: &[String]) -> String {
    items.iter().map(|s| js_str(s)).collect::<Vec<_>>().join(", ")
}

/// True when `id` can appear unquoted as a property name.
pub fn is_js_identifier(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !id.starts_with(|c: char| c.is_ascii_digit())
}

/// Object-literal key for `id`: bare when it is an identifier, quoted otherwise.
pub fn object_key(id: &str) -> String {
    if is_js_identifier(id) {
        id.to_string()
    } else {
        js_str(id)
    }
}

/// `object.id`, or `object['id']` when the id is not a bare identifier.
pub fn member(object: &str, id: &str) -> String {
    if is_js_identifier(id) {
        format!("{object}.{id}")
    } else {
        format!("{object}[{}]", js_str(id))
    }
}

pub fn init_function_name(desc: &OAuthDescriptor) -> String {
    format!("init{}OAuth", naming::pascal_case(&desc.id))
}

/// Entry for the `OAUTH_CONFIGS` table, indented two spaces, no trailing comma.
pub fn service_config(desc: &OAuthDescriptor, token_dir: &str) -> String {
    let mut lines = vec![
        format!("  {}: {{", desc.config_key()),
        format!("    name: {},", js_str(&desc.name)),
        format!(
            "    icon: {},",
            js_str(desc.icon.as_deref().unwrap_or(DEFAULT_ICON))
        ),
    ];
    if !desc.scopes.is_empty() {
        lines.push(format!("    scopes: [{}],", js_list(&desc.scopes)));
    }
    lines.push(format!("    authorizationBaseUrl: {},", js_str(&desc.auth_url)));
    lines.push(format!("    tokenUrl: {},", js_str(&desc.token_url)));
    lines.push(format!("    requiredEnvVars: [{}],", js_list(&desc.env_vars)));
    lines.push(format!(
        "    tokenFile: path.join(process.env.HOME, {}, {})",
        js_str(token_dir),
        js_str(&format!("{}-token.json", desc.id))
    ));
    lines.push("  }".to_string());
    lines.join("\n")
}

/// Client initialiser plus the statement that installs it in `oauthClients`.
pub fn initializer(desc: &OAuthDescriptor) -> String {
    let config = member("OAUTH_CONFIGS", &desc.id);
    let client = member("oauthClients", &desc.id);
    let func = init_function_name(desc);
    let vars: Vec<&str> = desc
        .env_vars
        .iter()
        .take(2)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .collect();

    let guard = vars
        .iter()
        .map(|v| format!("!process.env.{v}"))
        .collect::<Vec<_>>()
        .join(" || ");

    let mut out = vec![
        format!("// Initialize {} OAuth client", desc.name),
        format!("function {func}() {{"),
        format!("  if ({guard}) {{"),
        "    return null;".to_string(),
        "  }".to_string(),
        String::new(),
        "  return {".to_string(),
    ];
    if let Some(id_var) = vars.first() {
        out.push(format!("    clientId: process.env.{id_var},"));
    }
    if let Some(secret_var) = vars.get(1) {
        out.push(format!("    clientSecret: process.env.{secret_var},"));
    }
    out.push(format!(
        "    redirectUri: `http://localhost:${{PORT}}/callback/{}`,",
        js_template(&desc.id)
    ));
    out.push(format!("    authorizationBaseUrl: {config}.authorizationBaseUrl,"));
    out.push(format!("    tokenUrl: {config}.tokenUrl"));
    out.push("  };".to_string());
    out.push("}".to_string());

    format!("\n\n{}\n\n{client} = {func}();", out.join("\n"))
}

/// ` else if` branch for the connect route, closed with `  }`.
pub fn connect_branch(desc: &OAuthDescriptor) -> String {
    let client = member("oauthClients", &desc.id);
    let scope = if desc.scopes.is_empty() {
        String::new()
    } else {
        format!("&scope={}", js_template(&desc.scopes.join(",")))
    };
    [
        format!(" else if (service === {} && {client}) {{", js_str(&desc.id)),
        format!("    const state = {} + Date.now();", js_str(&format!("{}_", desc.id))),
        format!("    const redirectEncoded = encodeURIComponent({client}.redirectUri);"),
        format!(
            "    const authUrl = `{}?client_id=${{{client}.clientId}}&state=${{state}}&redirect_uri=${{redirectEncoded}}&response_type=code{scope}`;",
            js_template(&desc.auth_url)
        ),
        String::new(),
        "    res.json({ authUrl });".to_string(),
        "  }".to_string(),
    ]
    .join("\n")
}

/// ` else if` branch for the callback route: exchanges the code and stores tokens.
pub fn callback_branch(desc: &OAuthDescriptor) -> String {
    let client = member("oauthClients", &desc.id);
    let config = member("OAUTH_CONFIGS", &desc.id);
    [
        format!(" else if (service === {} && {client}) {{", js_str(&desc.id)),
        "    try {".to_string(),
        "      const tokenParams = new URLSearchParams({".to_string(),
        "        grant_type: 'authorization_code',".to_string(),
        "        code: code,".to_string(),
        format!("        client_id: {client}.clientId,"),
        format!("        client_secret: {client}.clientSecret,"),
        format!("        redirect_uri: {client}.redirectUri"),
        "      });".to_string(),
        String::new(),
        format!("      const tokenResponse = await fetch({client}.tokenUrl, {{"),
        "        method: 'POST',".to_string(),
        "        headers: {".to_string(),
        "          'Content-Type': 'application/x-www-form-urlencoded'".to_string(),
        "        },".to_string(),
        "        body: tokenParams".to_string(),
        "      });".to_string(),
        String::new(),
        "      if (!tokenResponse.ok) {".to_string(),
        "        throw new Error(`Token exchange failed: ${tokenResponse.status}`);".to_string(),
        "      }".to_string(),
        String::new(),
        "      const tokens = await tokenResponse.json();".to_string(),
        String::new(),
        format!("      const tokenDir = path.dirname({config}.tokenFile);"),
        "      await fs.mkdir(tokenDir, { recursive: true });".to_string(),
        format!("      await fs.writeFile({config}.tokenFile, JSON.stringify(tokens, null, 2));"),
        String::new(),
        "      res.redirect('/?success=true');".to_string(),
        "    } catch (error) {".to_string(),
        format!(
            "      console.error({}, error);",
            js_str(&format!("{} OAuth callback error:", desc.name))
        ),
        "      res.redirect('/?error=token_exchange_failed');".to_string(),
        "    }".to_string(),
        "  }".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ga() -> OAuthDescriptor {
        OAuthDescriptor {
            id: "google-analytics".into(),
            name: "Google Analytics".into(),
            icon: Some("📊".into()),
            env_vars: vec!["GA_CLIENT_ID".into(), "GA_CLIENT_SECRET".into()],
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            scopes: vec!["https://www.googleapis.com/auth/analytics.readonly".into()],
        }
    }

    #[test]
    fn member_access_brackets_hyphenated_ids() {
        assert_eq!(member("oauthClients", "slack"), "oauthClients.slack");
        assert_eq!(
            member("oauthClients", "google-analytics"),
            "oauthClients['google-analytics']"
        );
    }

    #[test]
    fn object_keys_follow_member_access() {
        for id in ["slack", "google-analytics", "google.analytics", "365news", "linked_in"] {
            let quoted = object_key(id).starts_with('\'');
            let bracketed = member("OAUTH_CONFIGS", id).contains('[');
            assert_eq!(quoted, bracketed, "{id}");
        }
        assert_eq!(object_key("google.analytics"), "'google.analytics'");
        assert_eq!(object_key("linked_in"), "linked_in");
    }

    #[test]
    fn service_config_shape() {
        let cfg = service_config(&ga(), ".motus");
        assert!(cfg.starts_with("  'google-analytics': {\n    name: 'Google Analytics',\n"));
        assert!(cfg.contains("    requiredEnvVars: ['GA_CLIENT_ID', 'GA_CLIENT_SECRET'],\n"));
        assert!(cfg.contains(
            "tokenFile: path.join(process.env.HOME, '.motus', 'google-analytics-token.json')"
        ));
        assert!(cfg.ends_with("\n  }"));
    }

    #[test]
    fn default_icon_and_no_scopes() {
        let mut desc = ga();
        desc.icon = None;
        desc.scopes.clear();
        let cfg = service_config(&desc, ".motus");
        assert!(cfg.contains("icon: '🔗'"));
        assert!(!cfg.contains("scopes"));
        assert!(!connect_branch(&desc).contains("&scope="));
    }

    #[test]
    fn initializer_guards_only_present_vars() {
        let mut desc = ga();
        desc.env_vars = vec!["GA_TOKEN".into()];
        let init = initializer(&desc);
        assert!(init.contains("  if (!process.env.GA_TOKEN) {"));
        assert!(!init.contains("clientSecret"));
        assert!(init.ends_with("oauthClients['google-analytics'] = initGoogleAnalyticsOAuth();"));
        assert!(init.contains("redirectUri: `http://localhost:${PORT}/callback/google-analytics`"));
    }

    #[test]
    fn connect_branch_builds_auth_url() {
        let branch = connect_branch(&ga());
        assert!(branch.starts_with(" else if (service === 'google-analytics' && oauthClients['google-analytics']) {"));
        assert!(branch.contains("const state = 'google-analytics_' + Date.now();"));
        assert!(branch.contains(
            "`https://accounts.google.com/o/oauth2/v2/auth?client_id=${oauthClients['google-analytics'].clientId}&state=${state}"
        ));
        assert!(branch.contains("&response_type=code&scope=https://www.googleapis.com/auth/analytics.readonly`"));
        assert!(branch.ends_with("\n  }"));
    }

    #[test]
    fn names_are_escaped() {
        let mut desc = ga();
        desc.name = "O'Reilly".into();
        assert!(service_config(&desc, ".motus").contains("name: 'O\\'Reilly',"));
        assert!(callback_branch(&desc).contains("console.error('O\\'Reilly OAuth callback error:', error);"));
    }
}
