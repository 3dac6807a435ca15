//! Nginx reverse-proxy configuration generation
//!
//! Produces a single `server` block for a domain. Nginx picks the first
//! matching prefix location in emission order here, so locations are written
//! longest path first; a catch-all `/` block is appended when none is given.

use crate::command::{
    Arg, CommandDefinition, CommandKind, CommandScripts, Icon, Invocation, Script, Step,
};
use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

const DEFAULT_LISTEN_PORT: u16 = 80;
const SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
const SITES_ENABLED: &str = "/etc/nginx/sites-enabled";

/// One path rule of the virtual host
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NginxLocation {
    pub path: String,
    #[serde(default)]
    pub proxy_pass: Option<String>,
    #[serde(default)]
    pub is_static: Option<bool>,
    /// Stored with the record; static locations are proxied to the app port.
    #[serde(default)]
    pub root: Option<String>,
}

impl NginxLocation {
    pub fn proxy(path: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            proxy_pass: Some(upstream.into()),
            ..Default::default()
        }
    }

    pub fn static_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: Some(true),
            ..Default::default()
        }
    }

    /// Parses `PATH=TARGET`, e.g. `/api=localhost:5000`
    pub fn from_rule(rule: &str) -> Result<Self, InputError> {
        let (path, upstream) = rule
            .split_once('=')
            .ok_or_else(|| InputError::LocationRule(rule.to_string()))?;
        let (path, upstream) = (path.trim(), upstream.trim());
        if !path.starts_with('/') || upstream.is_empty() {
            return Err(InputError::LocationRule(rule.to_string()));
        }
        Ok(Self::proxy(path, upstream))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NginxConfigInput {
    pub domain: String,
    /// Listen port, 80 when absent
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub locations: Vec<NginxLocation>,
    #[serde(default)]
    pub main_app_port: Option<u16>,
}

impl NginxConfigInput {
    /// Loads input from a `.yaml`/`.yml` or JSON file
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let content = fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| InputError::Parse {
                path: path.to_path_buf(),
                format: "YAML",
                message: e.to_string(),
            })
        } else {
            serde_json::from_str(&content).map_err(|e| InputError::Parse {
                path: path.to_path_buf(),
                format: "JSON",
                message: e.to_string(),
            })
        }
    }
}

/// What a location block forwards to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Upstream(String),
    Placeholder,
}

fn upstream_url(proxy_pass: &str) -> String {
    let proxy_pass = proxy_pass.trim();
    if proxy_pass.contains("://") {
        proxy_pass.to_string()
    } else {
        format!("http://{}", proxy_pass)
    }
}

fn target(location: &NginxLocation, main_app_port: u16) -> Target {
    match location.proxy_pass.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(upstream) => Target::Upstream(upstream_url(upstream)),
        None if location.is_static.unwrap_or(false) => {
            Target::Upstream(format!("http://localhost:{}", main_app_port))
        }
        None => Target::Placeholder,
    }
}

/// Longest path first; ties ordered by content so input order never matters
fn precedence(a: &NginxLocation, b: &NginxLocation) -> Ordering {
    b.path.len().cmp(&a.path.len()).then_with(|| a.cmp(b))
}

fn write_proxy_block(f: &mut fmt::Formatter<'_>, path: &str, upstream: &str) -> fmt::Result {
    writeln!(f, "    location {} {{", path)?;
    writeln!(f, "        proxy_pass {};", upstream)?;
    writeln!(f, "        proxy_http_version 1.1;")?;
    writeln!(f, "        proxy_set_header Upgrade $http_upgrade;")?;
    writeln!(f, "        proxy_set_header Connection 'upgrade';")?;
    writeln!(f, "        proxy_set_header Host $host;")?;
    writeln!(f, "        proxy_set_header X-Real-IP $remote_addr;")?;
    writeln!(
        f,
        "        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;"
    )?;
    writeln!(f, "        proxy_set_header X-Forwarded-Proto $scheme;")?;
    writeln!(f, "        proxy_cache_bypass $http_upgrade;")?;
    writeln!(f, "    }}")
}

/// A normalized view of the input, rendered through `Display`
struct ServerBlock<'a> {
    domain: &'a str,
    listen: u16,
    main_app_port: u16,
    locations: Vec<&'a NginxLocation>,
    has_root: bool,
}

impl<'a> ServerBlock<'a> {
    fn new(input: &'a NginxConfigInput, default_app_port: u16) -> Self {
        let mut locations: Vec<&NginxLocation> = input.locations.iter().collect();
        locations.sort_by(|a, b| precedence(a, b));

        Self {
            domain: &input.domain,
            listen: input.port.unwrap_or(DEFAULT_LISTEN_PORT),
            main_app_port: input.main_app_port.unwrap_or(default_app_port),
            has_root: locations.iter().any(|l| l.path == "/"),
            locations,
        }
    }
}

impl fmt::Display for ServerBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "server {{")?;
        writeln!(f, "    listen {};", self.listen)?;
        writeln!(f, "    listen [::]:{};", self.listen)?;
        writeln!(f, "    server_name {};", self.domain)?;

        for location in &self.locations {
            writeln!(f)?;
            match target(location, self.main_app_port) {
                Target::Upstream(upstream) => write_proxy_block(f, &location.path, &upstream)?,
                Target::Placeholder => {
                    writeln!(f, "    location {} {{", location.path)?;
                    writeln!(
                        f,
                        "        # No proxy target configured for {}",
                        location.path
                    )?;
                    writeln!(f, "    }}")?;
                }
            }
        }

        if !self.has_root {
            writeln!(f)?;
            write_proxy_block(
                f,
                "/",
                &format!("http://localhost:{}", self.main_app_port),
            )?;
        }

        writeln!(f, "}}")
    }
}

/// Renders the `server` block for `input`
///
/// `default_app_port` is used when the input has no `mainAppPort`.
pub fn generate_nginx_config(input: &NginxConfigInput, default_app_port: u16) -> String {
    let block = ServerBlock::new(input, default_app_port);
    debug!(
        domain = %block.domain,
        locations = block.locations.len(),
        main_app_port = block.main_app_port,
        "Generating nginx config"
    );
    block.to_string()
}

/// Command that installs a generated config as a site and reloads nginx
pub fn install_command(domain: &str, config: &str) -> CommandDefinition {
    let available = format!("{}/{}", SITES_AVAILABLE, domain);
    let enabled = format!("{}/{}", SITES_ENABLED, domain);

    let main = Script::strict()
        .step(Step::WriteFile {
            path: available.clone(),
            lines: config.lines().map(Arg::lit).collect(),
            sudo: true,
        })
        .run(
            Invocation::new("sudo")
                .args(["ln", "-sf"])
                .arg(available)
                .arg(enabled),
        );
    let post = Script::strict()
        .run(Invocation::new("sudo").args(["nginx", "-t"]))
        .run(Invocation::new("sudo").args(["systemctl", "reload", "nginx"]));

    CommandDefinition::new(
        "Apply Nginx Config",
        format!("Install the reverse-proxy site for {} and reload nginx", domain),
        Icon::Server,
        CommandKind::Normal,
        CommandScripts::main(&main).with_post(&post),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(locations: Vec<NginxLocation>) -> NginxConfigInput {
        NginxConfigInput {
            domain: "app.example.com".to_string(),
            port: None,
            locations,
            main_app_port: Some(4000),
        }
    }

    #[test]
    fn test_longer_paths_emitted_first() {
        let config = generate_nginx_config(
            &input(vec![
                NginxLocation::static_path("/"),
                NginxLocation::proxy("/api", "localhost:5000"),
            ]),
            3000,
        );
        let api = config.find("location /api {").unwrap();
        let root = config.find("location / {").unwrap();
        assert!(api < root);
    }

    #[test]
    fn test_default_root_block_appended() {
        let config = generate_nginx_config(
            &input(vec![NginxLocation::proxy("/api", "localhost:5000")]),
            3000,
        );
        let root = config.find("location / {").unwrap();
        assert!(config[root..].contains("proxy_pass http://localhost:4000;"));
        assert_eq!(config.matches("location / {").count(), 1);
    }

    #[test]
    fn test_existing_root_not_duplicated() {
        let config = generate_nginx_config(
            &input(vec![NginxLocation::proxy("/", "localhost:8080")]),
            3000,
        );
        assert_eq!(config.matches("location / {").count(), 1);
        assert!(config.contains("proxy_pass http://localhost:8080;"));
        assert!(!config.contains("localhost:4000"));
    }

    #[test]
    fn test_output_independent_of_input_order() {
        let locations = vec![
            NginxLocation::proxy("/api", "localhost:5000"),
            NginxLocation::proxy("/ws", "localhost:6000"),
            NginxLocation::static_path("/app"),
            NginxLocation {
                path: "/docs".to_string(),
                ..Default::default()
            },
        ];
        let mut reversed = locations.clone();
        reversed.reverse();

        let a = generate_nginx_config(&input(locations), 3000);
        let b = generate_nginx_config(&input(reversed), 3000);
        assert_eq!(a, b);
        let docs = a.find("location /docs {").unwrap();
        let api = a.find("location /api {").unwrap();
        let app = a.find("location /app {").unwrap();
        let ws = a.find("location /ws {").unwrap();
        assert!(docs < api && api < app && app < ws);
    }

    #[test]
    fn test_static_proxies_to_main_app_port() {
        let config = generate_nginx_config(&input(vec![NginxLocation::static_path("/assets")]), 3000);
        let block = config.find("location /assets {").unwrap();
        assert!(config[block..].starts_with(
            "location /assets {\n        proxy_pass http://localhost:4000;"
        ));
    }

    #[test]
    fn test_placeholder_when_no_target() {
        let config = generate_nginx_config(
            &input(vec![NginxLocation {
                path: "/todo".to_string(),
                ..Default::default()
            }]),
            3000,
        );
        assert!(config.contains("# No proxy target configured for /todo"));
    }

    #[test]
    fn test_upstream_with_scheme_kept() {
        let config = generate_nginx_config(
            &input(vec![NginxLocation::proxy("/api", "https://backend.internal")]),
            3000,
        );
        assert!(config.contains("proxy_pass https://backend.internal;"));
    }

    #[test]
    fn test_listen_port_and_default_app_port() {
        let config = generate_nginx_config(
            &NginxConfigInput {
                domain: "example.org".to_string(),
                port: Some(8080),
                locations: vec![],
                main_app_port: None,
            },
            3100,
        );
        assert!(config.starts_with("server {\n    listen 8080;\n    listen [::]:8080;\n    server_name example.org;\n"));
        assert!(config.contains("proxy_pass http://localhost:3100;"));
        assert!(config.ends_with("}\n"));
    }

    #[test]
    fn test_input_from_yaml() {
        let yaml = r#"
domain: shop.example.com
mainAppPort: 4000
locations:
  - path: /api
    proxyPass: localhost:5000
  - path: /static
    isStatic: true
"#;
        let parsed: NginxConfigInput = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.locations.len(), 2);
        assert_eq!(parsed.locations[1].is_static, Some(true));
    }

    #[test]
    fn test_location_rule() {
        let location = NginxLocation::from_rule("/api=localhost:5000").unwrap();
        assert_eq!(location, NginxLocation::proxy("/api", "localhost:5000"));
        assert!(NginxLocation::from_rule("/api").is_err());
        assert!(NginxLocation::from_rule("api=localhost:5000").is_err());
        assert!(NginxLocation::from_rule("/api=").is_err());
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("site.json");
        fs::write(
            &json_path,
            r#"{"domain":"a.example.com","locations":[{"path":"/api","proxyPass":"localhost:5000"}]}"#,
        )
        .unwrap();
        let yaml_path = dir.path().join("site.yml");
        fs::write(&yaml_path, "domain: a.example.com\nmainAppPort: 4100\n").unwrap();

        let from_json = NginxConfigInput::from_file(&json_path).unwrap();
        assert_eq!(from_json.locations[0].path, "/api");
        let from_yaml = NginxConfigInput::from_file(&yaml_path).unwrap();
        assert_eq!(from_yaml.main_app_port, Some(4100));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NginxConfigInput::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, InputError::Read { .. }));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let err = NginxConfigInput::from_file(&bad).unwrap_err();
        assert!(err.to_string().contains("as JSON"));
    }

    #[test]
    fn test_install_command() {
        let config = generate_nginx_config(&input(vec![]), 3000);
        let def = install_command("app.example.com", &config);
        let main = def.main_command();
        assert!(main.contains("sudo tee /etc/nginx/sites-available/app.example.com >/dev/null"));
        assert!(main.contains(
            "sudo ln -sf /etc/nginx/sites-available/app.example.com /etc/nginx/sites-enabled/app.example.com"
        ));
        assert!(def
            .command()
            .post_command
            .as_deref()
            .unwrap()
            .ends_with("sudo systemctl reload nginx"));
        assert_eq!(def.icon(), Icon::Server);
    }
}
