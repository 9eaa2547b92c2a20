//! Init command implementation

use clap::Args;
use infraroute_core::InfrarouteError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE: &str = "infraroute.yaml";
const ENV_FILE: &str = ".env.example";

/// Init command arguments
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Directory to write the configuration into
    #[arg(default_value = ".")]
    pub dir: String,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    /// Execute the init command
    pub async fn execute(&self, environment: Option<&str>) -> Result<(), InfrarouteError> {
        let written = self.write_files(environment.unwrap_or("dev"))?;

        println!("\nInfraroute configuration initialized!");
        println!("\nNext steps:");
        println!("  1. Copy .env.example to .env and fill in the credentials");
        println!("  2. Edit {} to list your inventory sources", CONFIG_FILE);
        println!("  3. Run: infraroute discover -f {}", written[0].display());
        Ok(())
    }

    fn write_files(&self, environment: &str) -> Result<Vec<PathBuf>, InfrarouteError> {
        let output_dir = Path::new(&self.dir);
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let files = [
            (output_dir.join(CONFIG_FILE), generate_config(environment)),
            (output_dir.join(ENV_FILE), generate_env_example()),
        ];

        if !self.force {
            if let Some((path, _)) = files.iter().find(|(path, _)| path.exists()) {
                return Err(InfrarouteError::Config(format!(
                    "'{}' already exists, use --force to overwrite",
                    path.display()
                )));
            }
        }

        let mut written = Vec::with_capacity(files.len());
        for (path, content) in files {
            fs::write(&path, content)?;
            info!("Created: {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Generate configuration file content
fn generate_config(environment: &str) -> String {
    format!(
        r#"# Infraroute configuration

environment: {}

registry:
  path: .infraroute
  ttl_hours: 24

discovery:
  hosts: [localhost]
  api_ports: [8000, 8080]
  max_concurrent_probes: 8
  timeouts:
    probe_ms: 1000
    connect_secs: 10
    query_secs: 30

router:
  auto_discover: true
  inventory_table: servers
  inventory_collection: servers
  inventory_endpoint: /api/servers
  status_endpoint: /api/status
  row_limit: 1000
  # Command answering the SSH scan; it reads the request as JSON on stdin
  # and prints a JSON array of rows
  # fallback_command: ["infra-scan", "--json"]

credentials:
  postgres:
    username: "{{{{ env.INFRAROUTE_PG_USER }}}}"
    password: "{{{{ env.INFRAROUTE_PG_PASSWORD }}}}"
    database: inventory
  rest-api:
    token: "{{{{ env.INFRAROUTE_API_TOKEN }}}}"

sources: []
#  - name: cmdb
#    type: rest-api
#    host: cmdb.internal
#    port: 443
#    tls: true
#    capabilities: [inventory, cmdb]

server:
  port: 8080
"#,
        environment
    )
}

/// Generate .env.example content
fn generate_env_example() -> String {
    r#"# Credentials referenced from infraroute.yaml
INFRAROUTE_PG_USER=inventory
INFRAROUTE_PG_PASSWORD=change-me
INFRAROUTE_API_TOKEN=change-me
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraroute_parser::{ConfigValidator, YamlParser};

    fn command(dir: &Path) -> InitCommand {
        InitCommand {
            dir: dir.to_string_lossy().into_owned(),
            force: false,
        }
    }

    #[test]
    fn test_generated_config_parses() {
        let content = generate_config("staging");

        let config = YamlParser::parse_raw(&content).unwrap();
        ConfigValidator::new().validate(&config).unwrap();
        assert_eq!(config.environment, "staging");
        assert!(config.router.auto_discover);
        assert_eq!(config.port(), 8080);
        assert!(config.credentials.contains_key("postgres"));
    }

    #[test]
    fn test_write_files_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("project");
        let cmd = command(&target);

        let written = cmd.write_files("dev").unwrap();
        assert_eq!(written.len(), 2);
        assert!(target.join(CONFIG_FILE).exists());
        assert!(target.join(ENV_FILE).exists());

        assert!(matches!(cmd.write_files("dev"), Err(InfrarouteError::Config(_))));

        let forced = InitCommand {
            force: true,
            ..command(&target)
        };
        assert!(forced.write_files("dev").is_ok());
    }
}
