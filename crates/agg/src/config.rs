use agg_core::{DrainPolicy, PipelineConfig};
use agg_db::Durability;
use agg_events::queue::{EnqueuePolicy, DEFAULT_CAPACITY};
use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "AGG_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// SQLite file holding admitted identity keys.
    #[arg(long, env = "AGG_DB_PATH", default_value = "data/dedup_store.db")]
    pub db_path: PathBuf,

    #[arg(long, env = "AGG_QUEUE_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub queue_capacity: usize,

    /// Behaviour of `/publish` when the intake queue is full.
    #[arg(long, env = "AGG_ENQUEUE_POLICY", value_enum, default_value_t = EnqueueMode::Wait)]
    pub enqueue_policy: EnqueueMode,

    /// How long a `wait` publish may block before it is rejected.
    #[arg(long, env = "AGG_ENQUEUE_TIMEOUT_MS", default_value_t = 2000)]
    pub enqueue_timeout_ms: u64,

    /// What the worker does with queued events at shutdown.
    #[arg(long, env = "AGG_DRAIN_POLICY", value_enum, default_value_t = DrainMode::Backlog)]
    pub drain_policy: DrainMode,

    #[arg(long, env = "AGG_DURABILITY", value_enum, default_value_t = DurabilityMode::Full)]
    pub durability: DurabilityMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnqueueMode {
    Wait,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DrainMode {
    Backlog,
    CurrentItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DurabilityMode {
    Normal,
    Full,
}

impl ServeConfig {
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: self.queue_capacity,
            enqueue_policy: match self.enqueue_policy {
                EnqueueMode::Wait => EnqueuePolicy::Wait {
                    timeout: Duration::from_millis(self.enqueue_timeout_ms),
                },
                EnqueueMode::Reject => EnqueuePolicy::Reject,
            },
            drain_policy: match self.drain_policy {
                DrainMode::Backlog => DrainPolicy::Backlog,
                DrainMode::CurrentItem => DrainPolicy::CurrentItem,
            },
        }
    }

    pub fn durability(&self) -> Durability {
        match self.durability {
            DurabilityMode::Normal => Durability::Normal,
            DurabilityMode::Full => Durability::Full,
        }
    }
}
