use anyhow::bail;
use clap::{Parser, Subcommand};
use flexid::{BASELINE_PREFIX_LEN, BaselineId, CapacityPreset, DEFAULT_EPOCH};

/// Command-line arguments for the `flexid-cli` binary.
///
/// Every option can also be supplied through the environment variable named
/// in its help text, and a `.env` file in the working directory is loaded
/// before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flexid-cli",
    version,
    about = "Generate and decode monotonic, time-ordered IDs"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Emit IDs from a flexible generator, one per line.
    Flexible {
        /// Machine id, unique per node for the chosen preset.
        ///
        /// Environment variable: `FLEXID_MACHINE_ID`
        #[arg(long, env = "FLEXID_MACHINE_ID", default_value_t = 0)]
        machine_id: u64,

        /// Capacity preset: `small`, `medium`, or `large`.
        ///
        /// Environment variable: `FLEXID_PRESET`
        #[arg(long, env = "FLEXID_PRESET", default_value_t = String::from("small"))]
        preset: String,

        /// Prefix prepended to every ID.
        ///
        /// Environment variable: `FLEXID_PREFIX`
        #[arg(long, env = "FLEXID_PREFIX", default_value_t = String::new())]
        prefix: String,

        /// Number of IDs to emit.
        ///
        /// Environment variable: `FLEXID_COUNT`
        #[arg(long, env = "FLEXID_COUNT", default_value_t = 10)]
        count: usize,

        /// Check that the emitted IDs strictly increase.
        #[arg(long, default_value_t = false)]
        verify: bool,
    },

    /// Emit base-36 IDs from a lock-free baseline generator, one per line.
    Baseline {
        /// Worker id in `[0, 63]`.
        ///
        /// Environment variable: `FLEXID_WORKER_ID`
        #[arg(long, env = "FLEXID_WORKER_ID", default_value_t = 0)]
        worker_id: u64,

        /// Two-character ASCII prefix.
        ///
        /// Environment variable: `FLEXID_BASELINE_PREFIX`
        #[arg(long, env = "FLEXID_BASELINE_PREFIX", default_value_t = String::from("ID"))]
        prefix: String,

        /// Number of IDs to emit.
        ///
        /// Environment variable: `FLEXID_COUNT`
        #[arg(long, env = "FLEXID_COUNT", default_value_t = 10)]
        count: usize,
    },

    /// Decode a baseline ID into its prefix, worker, sequence, and timestamp.
    Parse {
        /// The 15-character baseline ID.
        id: String,

        /// Epoch the ID was generated against, in Unix milliseconds.
        #[arg(long, default_value_t = DEFAULT_EPOCH.as_millis() as u64)]
        epoch_ms: u64,

        /// Print the decoded fields as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Time both generators and report throughput.
    Bench {
        /// Capacity preset for the flexible generator.
        ///
        /// Environment variable: `FLEXID_PRESET`
        #[arg(long, env = "FLEXID_PRESET", default_value_t = String::from("small"))]
        preset: String,

        /// IDs to generate per generator.
        #[arg(long, default_value_t = 5_000)]
        count: usize,
    },
}

/// A validated command, ready to run.
#[derive(Debug, Clone)]
pub enum Command {
    Flexible(FlexibleConfig),
    Baseline(BaselineConfig),
    Parse(ParseConfig),
    Bench(BenchConfig),
}

#[derive(Debug, Clone)]
pub struct FlexibleConfig {
    pub preset: CapacityPreset,
    pub machine_id: u64,
    pub prefix: String,
    pub count: usize,
    pub verify: bool,
}

#[derive(Debug, Clone)]
pub struct BaselineConfig {
    pub worker_id: u64,
    pub prefix: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub id: String,
    pub epoch_ms: u64,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub preset: CapacityPreset,
    pub count: usize,
}

fn parse_preset(name: &str) -> anyhow::Result<CapacityPreset> {
    match CapacityPreset::from_name(name) {
        Some(preset) => Ok(preset),
        None => bail!("FLEXID_PRESET must be one of small, medium, large (got {name:?})"),
    }
}

impl TryFrom<CliArgs> for Command {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        match args.command {
            Commands::Flexible {
                machine_id,
                preset,
                prefix,
                count,
                verify,
            } => {
                let preset = parse_preset(&preset)?;
                if machine_id >= preset.machine_count() {
                    bail!(
                        "FLEXID_MACHINE_ID ({}) exceeds the preset's machine space (max = {})",
                        machine_id,
                        preset.machine_count() - 1
                    );
                }
                if count == 0 {
                    bail!("FLEXID_COUNT must be greater than 0");
                }
                Ok(Self::Flexible(FlexibleConfig {
                    preset,
                    machine_id,
                    prefix,
                    count,
                    verify,
                }))
            }
            Commands::Baseline {
                worker_id,
                prefix,
                count,
            } => {
                if worker_id > BaselineId::max_worker_id() {
                    bail!(
                        "FLEXID_WORKER_ID ({}) exceeds the worker space (max = {})",
                        worker_id,
                        BaselineId::max_worker_id()
                    );
                }
                if prefix.len() != BASELINE_PREFIX_LEN || !prefix.is_ascii() {
                    bail!(
                        "FLEXID_BASELINE_PREFIX must be exactly {BASELINE_PREFIX_LEN} ASCII characters (got {prefix:?})"
                    );
                }
                if count == 0 {
                    bail!("FLEXID_COUNT must be greater than 0");
                }
                Ok(Self::Baseline(BaselineConfig {
                    worker_id,
                    prefix,
                    count,
                }))
            }
            Commands::Parse { id, epoch_ms, json } => {
                Ok(Self::Parse(ParseConfig { id, epoch_ms, json }))
            }
            Commands::Bench { preset, count } => {
                let preset = parse_preset(&preset)?;
                if count == 0 {
                    bail!("bench count must be greater than 0");
                }
                Ok(Self::Bench(BenchConfig { preset, count }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> anyhow::Result<Command> {
        let args = CliArgs::try_parse_from(args)?;
        Command::try_from(args)
    }

    #[test]
    fn flexible_defaults_to_small_preset() {
        let Command::Flexible(config) = command(&["flexid", "flexible"]).unwrap() else {
            panic!("expected flexible command");
        };
        assert_eq!(config.preset, CapacityPreset::SMALL);
        assert_eq!(config.machine_id, 0);
        assert_eq!(config.count, 10);
    }

    #[test]
    fn flexible_rejects_machine_outside_preset() {
        assert!(command(&["flexid", "flexible", "--preset", "small", "--machine-id", "16"]).is_err());
        assert!(command(&["flexid", "flexible", "--preset", "MEDIUM", "--machine-id", "63"]).is_ok());
        assert!(command(&["flexid", "flexible", "--preset", "huge"]).is_err());
        assert!(command(&["flexid", "flexible", "--count", "0"]).is_err());
    }

    #[test]
    fn baseline_validates_prefix_and_worker() {
        assert!(command(&["flexid", "baseline", "--prefix", "FI", "--worker-id", "63"]).is_ok());
        assert!(command(&["flexid", "baseline", "--prefix", "FIX"]).is_err());
        assert!(command(&["flexid", "baseline", "--worker-id", "64"]).is_err());
    }

    #[test]
    fn parse_takes_positional_id() {
        let Command::Parse(config) =
            command(&["flexid", "parse", "FI000000000035S", "--json"]).unwrap()
        else {
            panic!("expected parse command");
        };
        assert_eq!(config.id, "FI000000000035S");
        assert!(config.json);
        assert_eq!(config.epoch_ms, DEFAULT_EPOCH.as_millis() as u64);
    }
}
