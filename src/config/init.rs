// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Writes a commented shopstack.yml showing every section's defaults.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::template());
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn human(d: std::time::Duration) -> String {
    humantime_serde::re::humantime::format_duration(d).to_string()
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"listen: {listen}
tenants_dir: {tenants_dir}
# Host used in store URLs (env SERVER_IP overrides)
# public_host: shop.example.com
detect_public_host: {detect}

ports:
  base: {base}
  range: {range}

# runtime:
#   runtime: docker
#   socket: /var/run/docker.sock
#   compose_command: [docker-compose]

launch:
  timeout: {launch_timeout}
  teardown_timeout: {teardown_timeout}

database:
  max_attempts: {db_attempts}
  interval: {db_interval}

application:
  max_attempts: {app_attempts}
  interval: {app_interval}
  probe_timeout: {probe_timeout}

finalize:
  trigger_timeout: {trigger_timeout}
  settle_delay: {settle_delay}
  retry_delay: {retry_delay}
  retries: {retries}
  exec_timeout: {exec_timeout}

progress:
  retention: {retention}
  sweep_interval: {sweep_interval}

stack:
  database_image: {db_image}
  application_image: {app_image}
  admin_folder: {admin_folder}
  language: {language}
  country: {country}
"#,
        listen = config.listen,
        tenants_dir = config.tenants_dir.display(),
        detect = config.detect_public_host,
        base = config.ports.base,
        range = config.ports.range,
        launch_timeout = human(config.launch.timeout),
        teardown_timeout = human(config.launch.teardown_timeout),
        db_attempts = config.database.max_attempts,
        db_interval = human(config.database.interval),
        app_attempts = config.application.max_attempts,
        app_interval = human(config.application.interval),
        probe_timeout = human(config.application.probe_timeout),
        trigger_timeout = human(config.finalize.trigger_timeout),
        settle_delay = human(config.finalize.settle_delay),
        retry_delay = human(config.finalize.retry_delay),
        retries = config.finalize.retries,
        exec_timeout = human(config.finalize.exec_timeout),
        retention = human(config.progress.retention),
        sweep_interval = human(config.progress.sweep_interval),
        db_image = config.stack.database_image,
        app_image = config.stack.application_image,
        admin_folder = config.stack.admin_folder,
        language = config.stack.language,
        country = config.stack.country,
    )
}
