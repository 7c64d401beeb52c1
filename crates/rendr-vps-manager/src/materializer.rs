/*
[INPUT]:  Validated provisioning request, platform templates, EA binaries
[OUTPUT]: Materialized terminal instance (template copy + EA + config files)
[POS]:    Instance layer - filesystem side of provisioning (no network)
[UPDATE]: When the instance layout, excluded files, or injected configs change
*/

use rendr_vps_adapter::ProvisioningRequest;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::error::ProvisionError;
use crate::instance::TerminalInstance;
use crate::secret::SecretProvider;

/// File suffixes never copied from a template
const TRANSIENT_SUFFIXES: [&str; 2] = [".log", ".tmp"];

const INTEGRATION_SECTION: &str = "EA";
const CONNECTION_SECTION: &str = "Common";

/// Result of a successful materialization
#[derive(Debug, Clone)]
pub struct Materialized {
    pub instance: TerminalInstance,
    /// False when the instance directory already existed
    pub copied_template: bool,
    pub integration_binary: PathBuf,
}

/// Builds per-account terminal instances from the platform templates
pub struct Materializer {
    config: Arc<ManagerConfig>,
    secrets: Arc<dyn SecretProvider>,
}

impl Materializer {
    pub fn new(config: Arc<ManagerConfig>, secrets: Arc<dyn SecretProvider>) -> Self {
        Self { config, secrets }
    }

    /// Instance layout for a request, without touching the filesystem
    pub fn instance_for(&self, request: &ProvisioningRequest) -> TerminalInstance {
        TerminalInstance::new(
            &self.config.terminals_base_path,
            request.platform,
            &request.external_account_id,
        )
    }

    /// Copy the template (once), refresh the EA and both config files.
    ///
    /// Every precondition is checked before the first write.
    pub fn materialize(&self, request: &ProvisioningRequest) -> Result<Materialized, ProvisionError> {
        let sources = self.config.platform_paths(request.platform);
        if !sources.template_root.is_dir() {
            return Err(ProvisionError::TemplateMissing {
                platform: request.platform,
                path: sources.template_root.to_path_buf(),
            });
        }
        let binary_name = match sources.integration_binary.file_name() {
            Some(name) if sources.integration_binary.is_file() => name.to_os_string(),
            _ => {
                return Err(ProvisionError::IntegrationBinaryMissing {
                    path: sources.integration_binary.to_path_buf(),
                });
            }
        };
        let connection = render_connection_config(request, &self.config.profile)?;

        let instance = self.instance_for(request);
        info!(
            account_id = %request.external_account_id,
            platform = %request.platform,
            instance = %instance.root().display(),
            "materializing terminal instance"
        );

        let copied_template = if instance.exists() {
            warn!(
                instance = %instance.root().display(),
                "instance directory already exists; skipping template copy"
            );
            false
        } else {
            install_template(sources.template_root, instance.root())?;
            true
        };

        let binary_dir = instance.integration_binary_dir();
        fs::create_dir_all(&binary_dir)
            .map_err(ProvisionError::filesystem("create", &binary_dir))?;
        let integration_binary = binary_dir.join(binary_name);
        fs::copy(sources.integration_binary, &integration_binary)
            .map_err(ProvisionError::filesystem("copy integration binary to", &integration_binary))?;
        debug!(path = %integration_binary.display(), "integration binary refreshed");

        let integration_path = instance.integration_config_path();
        fs::write(&integration_path, self.render_integration_config(request))
            .map_err(ProvisionError::filesystem("write", &integration_path))?;

        let connection_path = instance.connection_config_path();
        if let Some(parent) = connection_path.parent() {
            fs::create_dir_all(parent).map_err(ProvisionError::filesystem("create", parent))?;
        }
        write_private(&connection_path, &connection)?;
        debug!(
            integration_config = %integration_path.display(),
            connection_config = %connection_path.display(),
            "instance configuration written"
        );

        Ok(Materialized {
            instance,
            copied_template,
            integration_binary,
        })
    }

    fn render_integration_config(&self, request: &ProvisioningRequest) -> String {
        let secret = self.secrets.secret_for(request);
        let registration_url = self.config.registration_url();
        let trades_url = self.config.trades_url();
        render_ini(
            INTEGRATION_SECTION,
            &[
                ("external_account_id", request.external_account_id.as_str()),
                ("register_url", registration_url.as_str()),
                ("trades_url", trades_url.as_str()),
                ("api_secret", secret.as_str()),
            ],
        )
    }
}

fn render_connection_config(
    request: &ProvisioningRequest,
    profile: &str,
) -> Result<String, ProvisionError> {
    let login = connection_field("Login", &request.login)?;
    let password = connection_field("Password", &request.investor_password)?;
    let server = connection_field("Server", &request.server)?;
    Ok(render_ini(
        CONNECTION_SECTION,
        &[
            ("Login", login),
            ("Password", password),
            ("Server", server),
            ("Profile", profile.trim()),
        ],
    ))
}

fn connection_field<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ProvisionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProvisionError::EmptyConnectionField(name));
    }
    if value.contains(['\r', '\n']) {
        return Err(ProvisionError::MalformedConnectionField(name));
    }
    Ok(value)
}

fn render_ini(section: &str, entries: &[(&str, &str)]) -> String {
    let mut out = format!("[{section}]\n");
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Copy into a staging directory first so a failed copy never leaves a
/// half-populated instance that later cycles would treat as complete.
fn install_template(template: &Path, target: &Path) -> Result<(), ProvisionError> {
    let staging = staging_path(target);
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .map_err(ProvisionError::filesystem("remove stale staging directory", &staging))?;
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(ProvisionError::filesystem("create", parent))?;
    }

    info!(
        template = %template.display(),
        target = %target.display(),
        "copying terminal template"
    );
    if let Err(err) = copy_tree(template, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(err);
    }
    fs::rename(&staging, target).map_err(ProvisionError::filesystem("move staging directory to", target))
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.staging"))
}

fn copy_tree(source: &Path, target: &Path) -> Result<(), ProvisionError> {
    fs::create_dir_all(target).map_err(ProvisionError::filesystem("create", target))?;
    let entries = fs::read_dir(source).map_err(ProvisionError::filesystem("read", source))?;
    for entry in entries {
        let entry = entry.map_err(ProvisionError::filesystem("read", source))?;
        let name = entry.file_name();
        if is_transient(&name.to_string_lossy()) {
            continue;
        }
        let from = entry.path();
        let to = target.join(&name);
        let file_type = entry
            .file_type()
            .map_err(ProvisionError::filesystem("inspect", &from))?;
        if file_type.is_symlink() {
            copy_link(&from, &to)?;
        } else if file_type.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(ProvisionError::filesystem("copy", &from))?;
        }
    }
    Ok(())
}

/// Links are recreated, never followed, so a looping link cannot recurse.
#[cfg(unix)]
fn copy_link(from: &Path, to: &Path) -> Result<(), ProvisionError> {
    let link = fs::read_link(from).map_err(ProvisionError::filesystem("read link", from))?;
    std::os::unix::fs::symlink(&link, to).map_err(ProvisionError::filesystem("create link", to))
}

#[cfg(not(unix))]
fn copy_link(from: &Path, _to: &Path) -> Result<(), ProvisionError> {
    warn!(path = %from.display(), "skipping symbolic link in template");
    Ok(())
}

fn is_transient(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    TRANSIENT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// The connection file carries a password; keep it owner-readable only.
fn write_private(path: &Path, contents: &str) -> Result<(), ProvisionError> {
    fs::write(path, contents).map_err(ProvisionError::filesystem("write", path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(path)
            .map_err(ProvisionError::filesystem("read metadata of", path))?
            .permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)
            .map_err(ProvisionError::filesystem("set permissions on", path))?;
    }

    Ok(())
}
