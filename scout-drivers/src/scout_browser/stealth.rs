use serde::{Deserialize, Serialize};

use super::fingerprint::UserAgentProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Whether the session hides common automation signals.
pub enum StealthProfile {
    /// Stock headless Chrome.
    #[default]
    Plain,
    /// Hide `navigator.webdriver` and the automation blink feature.
    Stealth,
}

/// Construct Chrome command-line arguments for a session.
pub fn build_chrome_arguments(
    profile: StealthProfile,
    user_profile: &UserAgentProfile,
    headless: bool,
) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-infobars".to_string(),
        "--disable-extensions".to_string(),
        format!("--user-agent={}", user_profile.user_agent),
        format!(
            "--window-size={},{}",
            user_profile.viewport.0, user_profile.viewport.1
        ),
        format!("--lang={}", user_profile.languages.join(",")),
    ];
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    if profile == StealthProfile::Stealth {
        args.push("--disable-blink-features=AutomationControlled".to_string());
    }
    args
}

/// Script run after navigation for [`StealthProfile::Stealth`] sessions.
pub fn webdriver_evasion_script() -> &'static str {
    r#"
        Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
        if (!window.chrome) window.chrome = { runtime: {} };
    "#
}
