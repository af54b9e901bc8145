//! Anchor-based source patching of the OAuth manager server.
//!
//! Each fragment is spliced relative to a literal anchor string. A missing
//! anchor never fails the call: the fragment is skipped, a warning is logged
//! and the anchor is reported in the [`InjectionOutcome`].

use crate::codegen;
use crate::{OAuthDescriptor, OAuthError, OAuthResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bumped whenever the default anchor strings change.
pub const ANCHOR_SET_VERSION: u32 = 1;

/// Literal markers the injector expects in the server source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchors {
    /// Opening of the config table.
    pub config_start: String,
    /// Marker after the last config entry; new entries go right before it.
    pub config_end: String,
    /// Statement after which new initialisers are appended.
    pub initializer: String,
    /// End of the first connect route branch.
    pub connect: String,
    /// Start of the callback route; the callback anchors are searched after it.
    pub callback_route: String,
    /// Start of the callback branch new branches follow.
    pub callback_branch: String,
    /// Failure redirect inside that callback branch.
    pub callback_failure: String,
    /// Closing of a route branch at two-space indent.
    pub branch_close: String,
}

impl Default for Anchors {
    fn default() -> Self {
        Self {
            config_start: "const OAUTH_CONFIGS = {".to_string(),
            config_end: "\n  // Future services".to_string(),
            initializer: "oauthClients.oura = initOuraOAuth();".to_string(),
            connect: "res.json({ authUrl });\n  }".to_string(),
            callback_route: "app.get('/callback/:service'".to_string(),
            callback_branch: "} else if (service === 'oura'".to_string(),
            callback_failure: "res.redirect('/?error=token_exchange_failed');".to_string(),
            branch_close: "\n  }".to_string(),
        }
    }
}

/// Which fragment an anchor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    Config,
    Initializer,
    Connect,
    Callback,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Initializer => write!(f, "initializer"),
            Self::Connect => write!(f, "connect"),
            Self::Callback => write!(f, "callback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// The config entry was written. `missing` lists fragments that had no anchor.
    Injected { missing: Vec<AnchorKind> },
    /// The service id is already present; nothing was written.
    AlreadyRegistered,
    /// The config anchor is missing; nothing was written.
    Skipped { missing: Vec<AnchorKind> },
}

impl InjectionOutcome {
    /// True when the source file changed.
    pub fn wrote(&self) -> bool {
        matches!(self, Self::Injected { .. })
    }
}

impl Anchors {
    fn config_insert_at(&self, source: &str) -> Option<usize> {
        let start = source.find(&self.config_start)?;
        let from = start + self.config_start.len();
        source[from..].find(&self.config_end).map(|i| from + i)
    }

    fn initializer_insert_at(&self, source: &str) -> Option<usize> {
        source
            .find(&self.initializer)
            .map(|i| i + self.initializer.len())
    }

    fn connect_insert_at(&self, source: &str) -> Option<usize> {
        source.find(&self.connect).map(|i| i + self.connect.len())
    }

    fn callback_insert_at(&self, source: &str) -> Option<usize> {
        let route = source.find(&self.callback_route)?;
        let branch = route + source[route..].find(&self.callback_branch)?;
        let failure = branch + source[branch..].find(&self.callback_failure)?;
        let after_failure = failure + self.callback_failure.len();
        let close = after_failure + source[after_failure..].find(&self.branch_close)?;
        Some(close + self.branch_close.len())
    }
}

/// Anchors absent from `source`, in splice order.
pub fn preflight(source: &str, anchors: &Anchors) -> Vec<AnchorKind> {
    let mut missing = Vec::new();
    if anchors.config_insert_at(source).is_none() {
        missing.push(AnchorKind::Config);
    }
    if anchors.initializer_insert_at(source).is_none() {
        missing.push(AnchorKind::Initializer);
    }
    if anchors.connect_insert_at(source).is_none() {
        missing.push(AnchorKind::Connect);
    }
    if anchors.callback_insert_at(source).is_none() {
        missing.push(AnchorKind::Callback);
    }
    missing
}

/// Whether a config entry keyed by `id` exists in `source`.
///
/// Only entries starting a line at two-space indent count, so commented-out
/// placeholders such as `  // slack: { ... },` do not.
pub fn is_registered(source: &str, id: &str) -> bool {
    let key = codegen::object_key(id);
    source.contains(&format!("\n  {key}: {{"))
}

/// Splice every fragment for `desc` into `source`.
///
/// Returns the patched source (identical to the input unless the outcome is
/// `Injected`) and the outcome.
pub fn inject(
    source: &str,
    desc: &OAuthDescriptor,
    anchors: &Anchors,
    token_dir: &str,
) -> (String, InjectionOutcome) {
    if is_registered(source, &desc.id) {
        return (source.to_string(), InjectionOutcome::AlreadyRegistered);
    }

    let missing = preflight(source, anchors);
    if missing.contains(&AnchorKind::Config) {
        return (source.to_string(), InjectionOutcome::Skipped { missing });
    }

    let mut out = source.to_string();

    if let Some(at) = anchors.config_insert_at(&out) {
        let record = format!(",\n{}", codegen::service_config(desc, token_dir));
        out.insert_str(at, &record);
    }
    if let Some(at) = anchors.initializer_insert_at(&out) {
        out.insert_str(at, &codegen::initializer(desc));
    }
    if let Some(at) = anchors.connect_insert_at(&out) {
        out.insert_str(at, &codegen::connect_branch(desc));
    }
    if let Some(at) = anchors.callback_insert_at(&out) {
        out.insert_str(at, &codegen::callback_branch(desc));
    }

    (out, InjectionOutcome::Injected { missing })
}

/// Applies descriptors to a server source file on disk.
#[derive(Debug, Clone)]
pub struct IntegrationInjector {
    server_path: PathBuf,
    anchors: Anchors,
    token_dir: String,
}

impl IntegrationInjector {
    pub fn new(server_path: impl Into<PathBuf>) -> Self {
        Self {
            server_path: server_path.into(),
            anchors: Anchors::default(),
            token_dir: ".motus".to_string(),
        }
    }

    pub fn with_anchors(mut self, anchors: Anchors) -> Self {
        self.anchors = anchors;
        self
    }

    /// Directory under `$HOME` the generated code stores tokens in.
    pub fn with_token_dir(mut self, token_dir: impl Into<String>) -> Self {
        self.token_dir = token_dir.into();
        self
    }

    pub fn server_path(&self) -> &Path {
        &self.server_path
    }

    pub fn anchors(&self) -> &Anchors {
        &self.anchors
    }

    async fn read_source(&self) -> OAuthResult<String> {
        match tokio::fs::read_to_string(&self.server_path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OAuthError::ServerNotFound(self.server_path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn integration_exists(&self, id: &str) -> OAuthResult<bool> {
        let source = self.read_source().await?;
        Ok(is_registered(&source, id))
    }

    /// Missing anchors in the current server source.
    pub async fn preflight(&self) -> OAuthResult<Vec<AnchorKind>> {
        let source = self.read_source().await?;
        Ok(preflight(&source, &self.anchors))
    }

    /// Register `desc` with the server. The file is only rewritten when a
    /// config entry was added.
    pub async fn add_integration(&self, desc: &OAuthDescriptor) -> OAuthResult<InjectionOutcome> {
        desc.validate()?;
        let source = self.read_source().await?;
        let (patched, outcome) = inject(&source, desc, &self.anchors, &self.token_dir);

        match &outcome {
            InjectionOutcome::AlreadyRegistered => {
                info!(service = %desc.id, "{} already registered in OAuth manager", desc.name);
            }
            InjectionOutcome::Skipped { missing } => {
                warn!(
                    service = %desc.id,
                    path = %self.server_path.display(),
                    ?missing,
                    "Could not find insertion point in OAUTH_CONFIGS, skipping"
                );
            }
            InjectionOutcome::Injected { missing } => {
                for anchor in missing {
                    warn!(
                        service = %desc.id,
                        anchor = %anchor,
                        "Anchor not found in OAuth server source, fragment not added"
                    );
                }
                tokio::fs::write(&self.server_path, patched).await?;
                info!(service = %desc.id, "Added {} to OAuth manager", desc.name);
            }
        }
        debug!(path = %self.server_path.display(), ?outcome, "OAuth injection finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "const OAUTH_CONFIGS = {
  oura: {
    name: 'Oura Ring'
  }
  // Future services can be added here
};

oauthClients.oura = initOuraOAuth();

app.post('/api/connect/:service', (req, res) => {
  if (service === 'google' && oauthClients.google) {
    res.json({ authUrl });
  } else if (service === 'oura' && oauthClients.oura) {
    res.json({ authUrl });
  } else {
    res.status(400).json({ error: 'Service not configured' });
  }
});

app.get('/callback/:service', async (req, res) => {
  if (service === 'google' && oauthClients.google) {
    res.redirect('/?success=true');
  } else if (service === 'oura' && oauthClients.oura) {
    try {
      res.redirect('/?success=true');
    } catch (error) {
      res.redirect('/?error=token_exchange_failed');
    }
  } else {
    res.redirect('/?error=unknown_service');
  }
});
";

    fn slack() -> OAuthDescriptor {
        crate::providers::standard_provider("Slack")
            .unwrap()
            .descriptor("Slack", &["SLACK_CLIENT_ID".into(), "SLACK_CLIENT_SECRET".into()])
    }

    #[test]
    fn preflight_on_complete_source() {
        assert!(preflight(SERVER, &Anchors::default()).is_empty());
        let missing = preflight("const x = 1;", &Anchors::default());
        assert_eq!(
            missing,
            vec![
                AnchorKind::Config,
                AnchorKind::Initializer,
                AnchorKind::Connect,
                AnchorKind::Callback
            ]
        );
    }

    #[test]
    fn injects_all_fragments() {
        let (out, outcome) = inject(SERVER, &slack(), &Anchors::default(), ".motus");
        assert_eq!(outcome, InjectionOutcome::Injected { missing: vec![] });

        assert!(out.contains("  },\n  slack: {\n    name: 'Slack',"));
        assert!(out.contains("  }\n  // Future services"));
        assert!(out.contains(
            "oauthClients.oura = initOuraOAuth();\n\n// Initialize Slack OAuth client\nfunction initSlackOAuth() {"
        ));
        assert!(out.contains("oauthClients.slack = initSlackOAuth();"));

        // Connect branch chains off the first branch's closing brace.
        assert!(out.contains(
            "    res.json({ authUrl });\n  } else if (service === 'slack' && oauthClients.slack) {"
        ));
        assert!(out.contains("    res.json({ authUrl });\n  } else if (service === 'oura'"));

        // Callback branch follows the oura branch, before the final else.
        let oura = out.find("} else if (service === 'oura' && oauthClients.oura) {\n    try").unwrap();
        let slack = out.rfind("} else if (service === 'slack' && oauthClients.slack)").unwrap();
        let fallback = out.find("} else {\n    res.redirect('/?error=unknown_service');").unwrap();
        assert!(oura < slack && slack < fallback);
        assert!(out.contains(
            "      res.redirect('/?error=token_exchange_failed');\n    }\n  } else if (service === 'slack'"
        ));
    }

    #[test]
    fn second_injection_is_a_no_op() {
        let (once, _) = inject(SERVER, &slack(), &Anchors::default(), ".motus");
        let (twice, outcome) = inject(&once, &slack(), &Anchors::default(), ".motus");
        assert_eq!(outcome, InjectionOutcome::AlreadyRegistered);
        assert_eq!(once, twice);
    }

    #[test]
    fn hyphenated_ids_are_detected_when_quoted() {
        let ga = crate::providers::standard_provider("Google Analytics")
            .unwrap()
            .descriptor("Google Analytics", &["GA_ID".into(), "GA_SECRET".into()]);
        let (once, _) = inject(SERVER, &ga, &Anchors::default(), ".motus");
        assert!(once.contains("  'google-analytics': {"));
        assert!(once.contains("oauthClients['google-analytics'] = initGoogleAnalyticsOAuth();"));
        assert!(is_registered(&once, "google-analytics"));
        let (_, outcome) = inject(&once, &ga, &Anchors::default(), ".motus");
        assert_eq!(outcome, InjectionOutcome::AlreadyRegistered);
    }

    #[test]
    fn dotted_ids_are_quoted_and_detected() {
        let mut desc = slack();
        desc.id = "acme.chat".into();
        let (once, _) = inject(SERVER, &desc, &Anchors::default(), ".motus");
        assert!(once.contains("\n  'acme.chat': {"));
        assert!(!once.contains("\n  acme.chat: {"));
        assert!(once.contains("oauthClients['acme.chat'] = initAcmeChatOAuth();"));
        assert!(is_registered(&once, "acme.chat"));
        let (_, outcome) = inject(&once, &desc, &Anchors::default(), ".motus");
        assert_eq!(outcome, InjectionOutcome::AlreadyRegistered);
    }

    #[test]
    fn missing_config_anchor_skips_everything() {
        let source = SERVER.replace("  // Future services can be added here\n", "");
        let (out, outcome) = inject(&source, &slack(), &Anchors::default(), ".motus");
        assert_eq!(out, source);
        assert_eq!(
            outcome,
            InjectionOutcome::Skipped {
                missing: vec![AnchorKind::Config]
            }
        );
    }

    #[test]
    fn missing_secondary_anchor_is_reported() {
        let source = SERVER.replace("oauthClients.oura = initOuraOAuth();", "");
        let (out, outcome) = inject(&source, &slack(), &Anchors::default(), ".motus");
        assert_eq!(
            outcome,
            InjectionOutcome::Injected {
                missing: vec![AnchorKind::Initializer]
            }
        );
        assert!(out.contains("slack: {"));
        assert!(!out.contains("initSlackOAuth"));
    }

    #[tokio::test]
    async fn add_integration_writes_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.js");
        std::fs::write(&path, SERVER).unwrap();
        let injector = IntegrationInjector::new(&path);

        assert!(!injector.integration_exists("slack").await.unwrap());
        let outcome = injector.add_integration(&slack()).await.unwrap();
        assert!(outcome.wrote());
        assert!(injector.integration_exists("slack").await.unwrap());

        let after_first = std::fs::read_to_string(&path).unwrap();
        let outcome = injector.add_integration(&slack()).await.unwrap();
        assert_eq!(outcome, InjectionOutcome::AlreadyRegistered);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    }

    #[tokio::test]
    async fn missing_server_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let injector = IntegrationInjector::new(dir.path().join("nope.js"));
        let err = injector.add_integration(&slack()).await.unwrap_err();
        assert!(matches!(err, OAuthError::ServerNotFound(_)));
    }

    #[tokio::test]
    async fn invalid_descriptor_is_rejected_before_reading() {
        let injector = IntegrationInjector::new("/does/not/matter.js");
        let mut desc = slack();
        desc.env_vars.clear();
        let err = injector.add_integration(&desc).await.unwrap_err();
        assert!(matches!(err, OAuthError::InvalidDescriptor(_)));
    }
}
