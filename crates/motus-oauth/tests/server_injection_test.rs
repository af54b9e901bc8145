//! Injection against a copy of the real OAuth manager server source.

use motus_oauth::injector::{inject, is_registered, preflight};
use motus_oauth::{standard_provider, Anchors, InjectionOutcome, IntegrationInjector};

const SERVER: &str = include_str!("fixtures/server.js");

fn env(prefix: &str) -> Vec<String> {
    vec![format!("{prefix}_CLIENT_ID"), format!("{prefix}_CLIENT_SECRET")]
}

#[test]
fn default_anchors_match_the_server() {
    assert!(preflight(SERVER, &Anchors::default()).is_empty());
}

#[test]
fn commented_placeholders_do_not_count_as_registered() {
    assert!(SERVER.contains("// slack: { ... },"));
    assert!(!is_registered(SERVER, "slack"));
    assert!(is_registered(SERVER, "oura"));
    assert!(is_registered(SERVER, "google"));
}

#[test]
fn several_services_chain_cleanly() {
    let anchors = Anchors::default();
    let mut source = SERVER.to_string();
    for (service, prefix) in [
        ("Slack", "SLACK"),
        ("Google Analytics", "GA"),
        ("Notion", "NOTION"),
    ] {
        let desc = standard_provider(service).unwrap().descriptor(service, &env(prefix));
        let (next, outcome) = inject(&source, &desc, &anchors, ".motus");
        assert_eq!(outcome, InjectionOutcome::Injected { missing: vec![] }, "{service}");
        source = next;
    }

    for key in ["\n  slack: {", "\n  'google-analytics': {", "\n  notion: {"] {
        assert_eq!(source.matches(key).count(), 1, "{key}");
    }

    // The anchors survive so later services can still be added.
    assert!(preflight(&source, &anchors).is_empty());

    // Connect branches hang off the google branch and keep the oura branch.
    assert!(source.contains("} else if (service === 'oura' && oauthClients.oura) {\n    // Use exact format"));
    assert!(source.contains("} else if (service === 'notion' && oauthClients.notion) {\n    const state = 'notion_' + Date.now();"));

    // Every callback branch sits before the unknown-service fallback.
    let fallback = source.find("res.redirect('/?error=unknown_service');").unwrap();
    for id in ["'slack'", "'google-analytics'", "'notion'"] {
        let needle = format!("}} else if (service === {id} && ");
        let last = source.rfind(&needle).unwrap();
        assert!(last < fallback, "{id}");
    }

    // Braces stay balanced.
    let opens = source.matches('{').count();
    let closes = source.matches('}').count();
    assert_eq!(opens, closes);
}

#[tokio::test]
async fn injector_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth-manager").join("server.js");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, SERVER).unwrap();

    let injector = IntegrationInjector::new(&path).with_token_dir(".motus-test");
    assert!(injector.preflight().await.unwrap().is_empty());

    let desc = standard_provider("LinkedIn API")
        .unwrap()
        .descriptor("LinkedIn API", &env("LINKEDIN"));
    let first = injector.add_integration(&desc).await.unwrap();
    assert!(first.wrote());

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("path.join(process.env.HOME, '.motus-test', 'linkedin-token.json')"));
    assert!(written.contains("scopes: ['r_liteprofile', 'r_emailaddress'],"));

    let second = injector.add_integration(&desc).await.unwrap();
    assert_eq!(second, InjectionOutcome::AlreadyRegistered);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
}
