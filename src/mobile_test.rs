use super::*;

fn bundled() -> ShellConfig {
    ShellConfig::bundled().expect("bundled shell config should be valid")
}

#[test]
fn bundled_config_matches_release_shell() {
    let config = bundled();
    assert_eq!(config.app_id, "com.bestmealmate.app");
    assert_eq!(config.app_name, "BestMealMate");
    assert_eq!(config.server.url, "https://www.bestmealmate.com");
    assert!(!config.server.cleartext);
    assert!(!config.android.allow_mixed_content);
    assert_eq!(config.android.build_options.release_type, ReleaseType::Aab);

    let splash = config.plugins.splash_screen.as_ref().unwrap();
    assert_eq!(splash.launch_show_duration, 2000);
    assert!(!splash.show_spinner);
    assert_eq!(config.plugins.keyboard.as_ref().unwrap().resize, "body");
}

#[test]
fn serialized_config_keeps_plugin_names() {
    let json = serde_json::to_value(bundled()).unwrap();
    assert_eq!(json["plugins"]["SplashScreen"]["backgroundColor"], "#10B981");
    assert_eq!(json["plugins"]["Keyboard"]["resizeOnFullScreen"], true);
    assert_eq!(json["android"]["buildOptions"]["releaseType"], "AAB");
}

#[test]
fn cleartext_is_rejected() {
    let mut config = bundled();
    config.server.cleartext = true;
    assert!(matches!(config.validate(), Err(ShellConfigError::Invalid(_))));
}

#[test]
fn mixed_content_is_rejected() {
    let mut config = bundled();
    config.android.allow_mixed_content = true;
    assert!(config.validate().is_err());
}

#[test]
fn plain_http_server_url_is_rejected() {
    let mut config = bundled();
    config.server.url = "http://www.bestmealmate.com".into();
    assert!(config.validate().is_err());

    config.server.url = "not a url".into();
    assert!(config.validate().is_err());
}

#[test]
fn blank_app_id_is_rejected() {
    let mut config = bundled();
    config.app_id = "  ".into();
    assert!(config.validate().is_err());
}

#[test]
fn unknown_release_type_fails_to_parse() {
    let raw = BUNDLED_CONFIG.replace("\"AAB\"", "\"ZIP\"");
    assert!(matches!(ShellConfig::parse(&raw), Err(ShellConfigError::Parse(_))));
}

#[test]
fn host_mismatch_detection() {
    let config = bundled();
    assert_eq!(config.host().as_deref(), Some("www.bestmealmate.com"));
    assert!(config.host_mismatch("https://www.bestmealmate.com").is_none());
    assert_eq!(
        config.host_mismatch("http://localhost:3000"),
        Some(("www.bestmealmate.com".to_owned(), "localhost".to_owned()))
    );
    // Unset app URL is not a mismatch.
    assert!(config.host_mismatch("").is_none());
}
