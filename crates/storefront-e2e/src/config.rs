// Configuration - settings resolved from the environment
//
// Each setting is read from an environment variable, then from an optional
// local TOML override file, then falls back to a default. Values that do not
// parse fall through to the next source without an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the local override file
pub const CONFIG_FILE_ENV: &str = "STOREFRONT_CONFIG";

/// Override file looked up in the working directory when `STOREFRONT_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "storefront.local.toml";

/// Default site under test
pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com/";

/// Default timeout for element actions (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default bound for waiting on video finalisation (15 seconds)
pub const DEFAULT_ARTIFACT_TIMEOUT_MS: u64 = 15_000;

/// Where one setting is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    /// Environment variables, first non-empty one wins
    pub env: &'static [&'static str],
    /// Key in the override file
    pub file: &'static str,
}

/// Sources of every setting.
///
/// | setting               | env var                                 | file key              | default                      |
/// |-----------------------|-----------------------------------------|-----------------------|------------------------------|
/// | `base_url`            | `BASE_URL`                              | `base_url`            | `https://www.saucedemo.com/` |
/// | `browser`             | `BROWSER`                               | `browser`             | `chromium`                   |
/// | `headed`              | `HEADED`                                | `headed`              | `true`                       |
/// | `slow_mo_ms`          | `SLOW_MO`                               | `slow_mo_ms`          | `0`                          |
/// | `viewport_width`      | `VIEWPORT_WIDTH`                        | `viewport_width`      | `1280`                       |
/// | `viewport_height`     | `VIEWPORT_HEIGHT`                       | `viewport_height`     | `720`                        |
/// | `video_width`         | `VIDEO_WIDTH`                           | `video_width`         | `1280`                       |
/// | `video_height`        | `VIDEO_HEIGHT`                          | `video_height`        | `720`                        |
/// | `record_video`        | `RECORD_VIDEO`                          | `record_video`        | `true`                       |
/// | `record_trace`        | `RECORD_TRACE`                          | `record_trace`        | `true`                       |
/// | `keep_artifacts`      | `KEEP_ARTIFACTS`                        | `keep_artifacts`      | `false`                      |
/// | `attach_on_failure`   | `ATTACH_ON_FAILURE`                     | `attach_on_failure`   | `true`                       |
/// | `video_dir`           | `VIDEO_DIR`                             | `video_dir`           | `artifacts/videos`           |
/// | `trace_dir`           | `TRACE_DIR`                             | `trace_dir`           | `artifacts/traces`           |
/// | `results_dir`         | `RESULTS_DIR`                           | `results_dir`         | `artifacts/results`          |
/// | `report_dir`          | `REPORT_DIR`                            | `report_dir`          | `artifacts/report`           |
/// | `generate_report`     | `GENERATE_REPORT`                       | `generate_report`     | `false`                      |
/// | `report_command`      | `REPORT_COMMAND`                        | `report_command`      | `allure`                     |
/// | `worker_id`           | `WORKER_ID`                             | `worker_id`           | `main`                       |
/// | `attempt_id`          | `RUN_ATTEMPT`, then `GITHUB_RUN_ATTEMPT`| `attempt_id`          | `1`                          |
/// | `action_timeout_ms`   | `ACTION_TIMEOUT_MS`                     | `action_timeout_ms`   | `5000`                       |
/// | `artifact_timeout_ms` | `ARTIFACT_TIMEOUT_MS`                   | `artifact_timeout_ms` | `15000`                      |
pub mod keys {
    use super::Key;

    const fn key(env: &'static [&'static str], file: &'static str) -> Key {
        Key { env, file }
    }

    pub const BASE_URL: Key = key(&["BASE_URL"], "base_url");
    pub const BROWSER: Key = key(&["BROWSER"], "browser");
    pub const HEADED: Key = key(&["HEADED"], "headed");
    pub const SLOW_MO: Key = key(&["SLOW_MO"], "slow_mo_ms");
    pub const VIEWPORT_WIDTH: Key = key(&["VIEWPORT_WIDTH"], "viewport_width");
    pub const VIEWPORT_HEIGHT: Key = key(&["VIEWPORT_HEIGHT"], "viewport_height");
    pub const VIDEO_WIDTH: Key = key(&["VIDEO_WIDTH"], "video_width");
    pub const VIDEO_HEIGHT: Key = key(&["VIDEO_HEIGHT"], "video_height");
    pub const RECORD_VIDEO: Key = key(&["RECORD_VIDEO"], "record_video");
    pub const RECORD_TRACE: Key = key(&["RECORD_TRACE"], "record_trace");
    pub const KEEP_ARTIFACTS: Key = key(&["KEEP_ARTIFACTS"], "keep_artifacts");
    pub const ATTACH_ON_FAILURE: Key = key(&["ATTACH_ON_FAILURE"], "attach_on_failure");
    pub const VIDEO_DIR: Key = key(&["VIDEO_DIR"], "video_dir");
    pub const TRACE_DIR: Key = key(&["TRACE_DIR"], "trace_dir");
    pub const RESULTS_DIR: Key = key(&["RESULTS_DIR"], "results_dir");
    pub const REPORT_DIR: Key = key(&["REPORT_DIR"], "report_dir");
    pub const GENERATE_REPORT: Key = key(&["GENERATE_REPORT"], "generate_report");
    pub const REPORT_COMMAND: Key = key(&["REPORT_COMMAND"], "report_command");
    pub const WORKER_ID: Key = key(&["WORKER_ID"], "worker_id");
    pub const ATTEMPT_ID: Key = key(&["RUN_ATTEMPT", "GITHUB_RUN_ATTEMPT"], "attempt_id");
    pub const ACTION_TIMEOUT_MS: Key = key(&["ACTION_TIMEOUT_MS"], "action_timeout_ms");
    pub const ARTIFACT_TIMEOUT_MS: Key = key(&["ARTIFACT_TIMEOUT_MS"], "artifact_timeout_ms");

    pub const ALL: &[Key] = &[
        BASE_URL,
        BROWSER,
        HEADED,
        SLOW_MO,
        VIEWPORT_WIDTH,
        VIEWPORT_HEIGHT,
        VIDEO_WIDTH,
        VIDEO_HEIGHT,
        RECORD_VIDEO,
        RECORD_TRACE,
        KEEP_ARTIFACTS,
        ATTACH_ON_FAILURE,
        VIDEO_DIR,
        TRACE_DIR,
        RESULTS_DIR,
        REPORT_DIR,
        GENERATE_REPORT,
        REPORT_COMMAND,
        WORKER_ID,
        ATTEMPT_ID,
        ACTION_TIMEOUT_MS,
        ARTIFACT_TIMEOUT_MS,
    ];
}

/// Resolved suite settings
///
/// `browser` is kept as the raw string; an unsupported name is rejected when
/// the session launches.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub browser: String,
    pub headed: bool,
    pub slow_mo_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub video_width: u32,
    pub video_height: u32,
    pub record_video: bool,
    pub record_trace: bool,
    /// Keep videos and traces of passing tests too
    pub keep_artifacts: bool,
    /// Copy a failing test's artifacts into `results_dir`
    pub attach_on_failure: bool,
    pub video_dir: PathBuf,
    pub trace_dir: PathBuf,
    pub results_dir: PathBuf,
    pub report_dir: PathBuf,
    pub generate_report: bool,
    pub report_command: String,
    pub worker_id: String,
    pub attempt_id: String,
    pub action_timeout_ms: u64,
    pub artifact_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: "chromium".to_string(),
            headed: true,
            slow_mo_ms: 0,
            viewport_width: 1280,
            viewport_height: 720,
            video_width: 1280,
            video_height: 720,
            record_video: true,
            record_trace: true,
            keep_artifacts: false,
            attach_on_failure: true,
            video_dir: PathBuf::from("artifacts/videos"),
            trace_dir: PathBuf::from("artifacts/traces"),
            results_dir: PathBuf::from("artifacts/results"),
            report_dir: PathBuf::from("artifacts/report"),
            generate_report: false,
            report_command: "allure".to_string(),
            worker_id: "main".to_string(),
            attempt_id: "1".to_string(),
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            artifact_timeout_ms: DEFAULT_ARTIFACT_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Resolves settings from the process environment and the override file.
    pub fn from_env() -> Self {
        let file = std::env::var_os(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let overrides = load_overrides(&file);
        Self::resolve(|var| std::env::var(var).ok(), &overrides)
    }

    /// Resolves settings from an arbitrary variable lookup and file overrides.
    ///
    /// The lookup wins over `overrides`, which win over the defaults.
    pub fn resolve<F>(lookup: F, overrides: &HashMap<String, String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let src = Source { lookup, overrides };
        let d = Settings::default();

        Self {
            base_url: src.string(keys::BASE_URL, d.base_url),
            browser: src.string(keys::BROWSER, d.browser).to_lowercase(),
            headed: src.flag(keys::HEADED, d.headed),
            slow_mo_ms: src.number(keys::SLOW_MO, d.slow_mo_ms),
            viewport_width: src.number(keys::VIEWPORT_WIDTH, d.viewport_width),
            viewport_height: src.number(keys::VIEWPORT_HEIGHT, d.viewport_height),
            video_width: src.number(keys::VIDEO_WIDTH, d.video_width),
            video_height: src.number(keys::VIDEO_HEIGHT, d.video_height),
            record_video: src.flag(keys::RECORD_VIDEO, d.record_video),
            record_trace: src.flag(keys::RECORD_TRACE, d.record_trace),
            keep_artifacts: src.flag(keys::KEEP_ARTIFACTS, d.keep_artifacts),
            attach_on_failure: src.flag(keys::ATTACH_ON_FAILURE, d.attach_on_failure),
            video_dir: src.path(keys::VIDEO_DIR, d.video_dir),
            trace_dir: src.path(keys::TRACE_DIR, d.trace_dir),
            results_dir: src.path(keys::RESULTS_DIR, d.results_dir),
            report_dir: src.path(keys::REPORT_DIR, d.report_dir),
            generate_report: src.flag(keys::GENERATE_REPORT, d.generate_report),
            report_command: src.string(keys::REPORT_COMMAND, d.report_command),
            worker_id: sanitize_component(&src.string(keys::WORKER_ID, d.worker_id)),
            attempt_id: sanitize_component(&src.string(keys::ATTEMPT_ID, d.attempt_id)),
            action_timeout_ms: src.number(keys::ACTION_TIMEOUT_MS, d.action_timeout_ms),
            artifact_timeout_ms: src.number(keys::ARTIFACT_TIMEOUT_MS, d.artifact_timeout_ms),
        }
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn artifact_timeout(&self) -> Duration {
        Duration::from_millis(self.artifact_timeout_ms)
    }
}

/// Reads the override file into a flat key/value map.
///
/// A missing file yields an empty map. A file that cannot be read or parsed
/// is logged and ignored.
pub fn load_overrides(path: &Path) -> HashMap<String, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read config override file");
            return HashMap::new();
        }
    };

    match parse_overrides(&content) {
        Ok(map) => {
            tracing::debug!(path = %path.display(), keys = map.len(), "Loaded config overrides");
            map
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config override file");
            HashMap::new()
        }
    }
}

/// Parses TOML override content; nested tables are not supported and skipped.
pub fn parse_overrides(content: &str) -> Result<HashMap<String, String>, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(table
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => return None,
            };
            Some((key, value))
        })
        .collect())
}

/// Parses the boolean spellings accepted for flags.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Restricts a value to characters safe inside a single path component.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        s => s.to_string(),
    }
}

struct Source<'a, F> {
    lookup: F,
    overrides: &'a HashMap<String, String>,
}

impl<F> Source<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Candidate raw values in precedence order (env first, then file).
    fn raw(&self, key: Key) -> impl Iterator<Item = String> {
        let env: Vec<String> = key
            .env
            .iter()
            .filter_map(|var| (self.lookup)(var))
            .filter(|v| !v.trim().is_empty())
            .collect();
        let file = self.overrides.get(key.file).cloned();
        env.into_iter().chain(file)
    }

    fn string(&self, key: Key, default: String) -> String {
        self.raw(key).next().unwrap_or(default)
    }

    fn path(&self, key: Key, default: PathBuf) -> PathBuf {
        self.raw(key).next().map(PathBuf::from).unwrap_or(default)
    }

    fn flag(&self, key: Key, default: bool) -> bool {
        self.raw(key)
            .find_map(|raw| parse_flag(&raw))
            .unwrap_or(default)
    }

    fn number<T: std::str::FromStr>(&self, key: Key, default: T) -> T {
        self.raw(key)
            .find_map(|raw| raw.trim().parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(env: &[(&str, &str)], file: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let file: HashMap<String, String> = file
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::resolve(|var| env.get(var).cloned(), &file)
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = resolve(&[], &[]);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(settings.headed);
        assert!(!settings.keep_artifacts);
        assert_eq!(settings.action_timeout(), Duration::from_secs(5));
        assert_eq!(settings.artifact_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let settings = resolve(
            &[
                ("BROWSER", "Firefox"),
                ("HEADED", "false"),
                ("SLOW_MO", "50"),
                ("KEEP_ARTIFACTS", "yes"),
                ("WORKER_ID", "gw3"),
                ("RUN_ATTEMPT", "2"),
            ],
            &[],
        );
        assert_eq!(settings.browser, "firefox");
        assert!(!settings.headed);
        assert_eq!(settings.slow_mo_ms, 50);
        assert!(settings.keep_artifacts);
        assert_eq!(settings.worker_id, "gw3");
        assert_eq!(settings.attempt_id, "2");
    }

    #[test]
    fn test_unparsable_number_falls_back() {
        let settings = resolve(&[("SLOW_MO", "fast"), ("VIEWPORT_WIDTH", "-3")], &[]);
        assert_eq!(settings.slow_mo_ms, 0);
        assert_eq!(settings.viewport_width, 1280);
    }

    #[test]
    fn test_unparsable_env_falls_through_to_file() {
        let settings = resolve(&[("SLOW_MO", "fast")], &[("slow_mo_ms", "25")]);
        assert_eq!(settings.slow_mo_ms, 25);
    }

    #[test]
    fn test_env_beats_file() {
        let settings = resolve(
            &[("BASE_URL", "http://127.0.0.1:8080/")],
            &[("base_url", "http://file.example/"), ("headed", "false")],
        );
        assert_eq!(settings.base_url, "http://127.0.0.1:8080/");
        assert!(!settings.headed);
    }

    #[test]
    fn test_attempt_falls_back_to_ci_variable() {
        let settings = resolve(&[("GITHUB_RUN_ATTEMPT", "4")], &[]);
        assert_eq!(settings.attempt_id, "4");
    }

    #[test]
    fn test_identifiers_are_sanitized() {
        let settings = resolve(&[("WORKER_ID", "../../etc"), ("RUN_ATTEMPT", "a/b")], &[]);
        assert!(!settings.worker_id.contains('/'));
        assert!(!settings.worker_id.starts_with('.'));
        assert_eq!(settings.attempt_id, "a_b");
    }

    #[test]
    fn test_every_setting_reads_its_file_key() {
        let settings = resolve(
            &[],
            &[
                ("base_url", "http://file.example/"),
                ("browser", "webkit"),
                ("headed", "false"),
                ("slow_mo_ms", "10"),
                ("viewport_width", "800"),
                ("viewport_height", "600"),
                ("video_width", "640"),
                ("video_height", "480"),
                ("record_video", "false"),
                ("record_trace", "false"),
                ("keep_artifacts", "true"),
                ("attach_on_failure", "false"),
                ("video_dir", "v"),
                ("trace_dir", "t"),
                ("results_dir", "r"),
                ("report_dir", "h"),
                ("generate_report", "true"),
                ("report_command", "reporter"),
                ("worker_id", "gw9"),
                ("attempt_id", "7"),
                ("action_timeout_ms", "1234"),
                ("artifact_timeout_ms", "4321"),
            ],
        );
        assert_eq!(
            settings,
            Settings {
                base_url: "http://file.example/".into(),
                browser: "webkit".into(),
                headed: false,
                slow_mo_ms: 10,
                viewport_width: 800,
                viewport_height: 600,
                video_width: 640,
                video_height: 480,
                record_video: false,
                record_trace: false,
                keep_artifacts: true,
                attach_on_failure: false,
                video_dir: "v".into(),
                trace_dir: "t".into(),
                results_dir: "r".into(),
                report_dir: "h".into(),
                generate_report: true,
                report_command: "reporter".into(),
                worker_id: "gw9".into(),
                attempt_id: "7".into(),
                action_timeout_ms: 1234,
                artifact_timeout_ms: 4321,
            }
        );
    }

    #[test]
    fn test_key_table_is_unambiguous() {
        let mut files: Vec<&str> = keys::ALL.iter().map(|k| k.file).collect();
        let mut envs: Vec<&str> = keys::ALL.iter().flat_map(|k| k.env.iter().copied()).collect();
        let (file_count, env_count) = (files.len(), envs.len());
        files.sort_unstable();
        files.dedup();
        envs.sort_unstable();
        envs.dedup();
        assert_eq!(files.len(), file_count);
        assert_eq!(envs.len(), env_count);
        assert_eq!(keys::SLOW_MO.file, "slow_mo_ms");
        assert_eq!(keys::ATTEMPT_ID.env, &["RUN_ATTEMPT", "GITHUB_RUN_ATTEMPT"]);
    }

    #[test]
    fn test_parse_flag_spellings() {
        for raw in ["1", "TRUE", "yes", " on "] {
            assert_eq!(parse_flag(raw), Some(true), "{raw}");
        }
        for raw in ["0", "False", "NO", "off"] {
            assert_eq!(parse_flag(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_parse_overrides_flattens_scalars() {
        let map = parse_overrides(
            r#"
base_url = "http://localhost:3000/"
slow_mo_ms = 100
headed = false

[nested]
ignored = true
"#,
        )
        .unwrap();
        assert_eq!(map.get("base_url").map(String::as_str), Some("http://localhost:3000/"));
        assert_eq!(map.get("slow_mo_ms").map(String::as_str), Some("100"));
        assert_eq!(map.get("headed").map(String::as_str), Some("false"));
        assert!(!map.contains_key("nested"));
    }

    #[test]
    fn test_load_overrides_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_overrides(&dir.path().join("absent.toml")).is_empty());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "base_url = ").unwrap();
        assert!(load_overrides(&bad).is_empty());
    }
}
