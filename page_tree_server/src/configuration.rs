use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use page_tree::AggregatorConfig;

use crate::server::{IncomingStream, ShutdownMode};

#[derive(serde::Deserialize, Clone, Debug)]
/// The top-level configuration, holding all the values required
/// to configure the entire application.
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub aggregation: AggregatorConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(serde::Deserialize, Clone, Debug)]
/// Configuration for the HTTP server used to expose our API
/// to users.
pub struct ServerConfig {
    /// The port that the server must listen on.
    ///
    /// Set it to `0` to let the OS pick a free port.
    pub port: u16,
    /// The network interface that the server must be bound to.
    ///
    /// E.g. `0.0.0.0` for listening to incoming requests from
    /// all sources.
    pub ip: IpAddr,
    /// How long to wait for open connections to complete when shutting down.
    #[serde(with = "humantime_serde")]
    pub graceful_shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Bind a TCP listener according to the specified parameters.
    pub async fn listener(&self) -> Result<IncomingStream, std::io::Error> {
        let addr = SocketAddr::new(self.ip, self.port);
        IncomingStream::bind(addr).await
    }

    /// How the server should shut down when asked to stop.
    pub fn shutdown_mode(&self) -> ShutdownMode {
        ShutdownMode::Graceful {
            timeout: self.graceful_shutdown_timeout,
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
/// Where projects, builds and instance trees are loaded from.
pub struct StoreConfig {
    /// The path to a JSON snapshot.
    ///
    /// Relative paths are resolved against the root of this crate.
    pub snapshot_path: PathBuf,
}

impl StoreConfig {
    /// The absolute path to the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        if self.snapshot_path.is_absolute() {
            self.snapshot_path.clone()
        } else {
            manifest_dir().join(&self.snapshot_path)
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct TelemetryConfig {
    /// The filter applied to log events when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
        }
    }
}

/// Retrieve the application configuration by merging together multiple configuration sources.
///
/// # Application profiles
///
/// We use the concept of application profiles to allow for
/// different configuration values depending on the type of environment
/// the application is running in.
///
/// If `profile` is `None`, the profile is read from the `APP_PROFILE`
/// environment variable.
///
/// # Hierarchy
///
/// The configuration sources are:
///
/// 1. `base.yml` - Contains the default configuration values, common to all profiles.
/// 2. `<profile>.yml` - Contains the configuration values specific to the desired profile.
/// 3. Environment variables - Contains the configuration values specific to the current environment.
///
/// The configuration sources are listed in priority order, i.e.
/// the last source in the list will override any previous source.
///
/// Environment variables are prefixed with `APP_` and use `__` to separate
/// nested keys, e.g. `APP_SERVER__PORT=8080` overrides `server.port`.
pub fn load_configuration(profile: Option<ApplicationProfile>) -> Result<Config, anyhow::Error> {
    let application_profile = match profile {
        Some(profile) => profile,
        None => load_app_profile().context("Failed to load the desired application profile")?,
    };

    let configuration_dir = manifest_dir().join("configuration");
    let base_filepath = configuration_dir.join("base.yml");
    let profile_filename = format!("{}.yml", application_profile.as_str());
    let profile_filepath = configuration_dir.join(profile_filename);

    let figment = Figment::new()
        .merge(Yaml::file(base_filepath))
        .merge(Yaml::file(profile_filepath))
        .merge(Env::prefixed("APP_").split("__"));

    let configuration: Config = figment
        .extract()
        .context("Failed to load hierarchical configuration")?;
    Ok(configuration)
}

fn manifest_dir() -> &'static Path {
    Path::new(env!(
        "CARGO_MANIFEST_DIR",
        "`CARGO_MANIFEST_DIR` was not set. Are you using a custom build system?"
    ))
}

/// Load the application profile from the `APP_PROFILE` environment variable.
fn load_app_profile() -> Result<ApplicationProfile, anyhow::Error> {
    static PROFILE_ENV_VAR: &str = "APP_PROFILE";

    let raw_value = std::env::var(PROFILE_ENV_VAR)
        .with_context(|| format!("Failed to read the `{PROFILE_ENV_VAR}` environment variable"))?;

    raw_value
        .parse()
        .with_context(|| format!("Failed to parse the `{PROFILE_ENV_VAR}` environment variable"))
}

/// The application profile, i.e. the type of environment the application is running in.
/// See [`load_configuration`] for more details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationProfile {
    /// Test profile.
    ///
    /// This is the profile used by the integration test suite.
    Test,
    /// Local development profile.
    ///
    /// This is the profile you should use when running the application locally
    /// for exploratory testing.
    Dev,
    /// Production profile.
    ///
    /// The corresponding configuration file is `prod.yml`.
    /// It's meant to contain exclusively non-sensitive configuration values.
    Prod,
}

impl ApplicationProfile {
    /// Return the profile as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationProfile::Test => "test",
            ApplicationProfile::Dev => "dev",
            ApplicationProfile::Prod => "prod",
        }
    }
}

impl std::str::FromStr for ApplicationProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(ApplicationProfile::Test),
            "dev" | "development" => Ok(ApplicationProfile::Dev),
            "prod" | "production" => Ok(ApplicationProfile::Prod),
            s => Err(anyhow::anyhow!(
                "`{}` is not a valid application profile.\nValid options are: `test`, `dev`, `prod`.",
                s
            )),
        }
    }
}
