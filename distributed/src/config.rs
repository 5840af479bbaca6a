use std::str::FromStr;

use snafu::OptionExt;

use crate::backend::CollectiveBackend;
use crate::error::*;
use crate::local::{LocalTransport, LocalWorld};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    Local,
}

/// How a process joins its distributed world.
///
/// ```ignore
/// let config = DistributedConfig::builder().world_size(4).build();
/// let ranks = config.launch(|backend| backend.rank())?;
/// ```
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct DistributedConfig {
    #[builder(default = TransportKind::Local)]
    pub transport: TransportKind,

    #[builder(default = 1)]
    pub world_size: usize,

    /// Backend name reported by `log_print`; defaults to the transport's name.
    #[builder(into)]
    pub name: Option<String>,

    #[builder(default = true)]
    pub manage_communicator: bool,
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DistributedConfig {
    /// Reads the configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TESSERA_TRANSPORT`: transport kind (default: local)
    /// - `TESSERA_WORLD_SIZE`: number of ranks (default: 1)
    /// - `TESSERA_BACKEND_NAME`: backend name (default: transport name)
    /// - `TESSERA_MANAGE_COMMUNICATOR`: whether to own the communicator (default: true)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let transport = parse(&lookup, "TESSERA_TRANSPORT")?.unwrap_or(defaults.transport);
        let world_size = parse(&lookup, "TESSERA_WORLD_SIZE")?.unwrap_or(defaults.world_size);
        let manage_communicator =
            parse(&lookup, "TESSERA_MANAGE_COMMUNICATOR")?.unwrap_or(defaults.manage_communicator);
        let name = lookup("TESSERA_BACKEND_NAME").filter(|name| !name.is_empty());

        if world_size == 0 {
            return InvalidConfigSnafu { key: "TESSERA_WORLD_SIZE", value: "0" }.fail();
        }

        Ok(Self { transport, world_size, name, manage_communicator })
    }

    /// Wraps a transport endpoint into a backend according to this configuration.
    pub fn connect<T: Transport>(&self, transport: T) -> Result<CollectiveBackend<T>> {
        CollectiveBackend::builder()
            .transport(transport)
            .maybe_name(self.name.clone())
            .manage_communicator(self.manage_communicator)
            .build()
    }

    /// Starts every rank of the configured world and runs `f` on each.
    ///
    /// Results are returned in rank order; the first rank error wins.
    pub fn launch<F, R>(&self, f: F) -> Result<Vec<R>>
    where
        F: Fn(CollectiveBackend<LocalTransport>) -> R + Sync,
        R: Send,
    {
        match self.transport {
            TransportKind::Local => LocalWorld::run(self.world_size, |endpoint| self.connect(endpoint).map(&f))
                .into_iter()
                .collect(),
        }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>> {
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    value.trim().parse().ok().context(InvalidConfigSnafu { key, value: &value }).map(Some)
}
