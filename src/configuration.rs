use anyhow::{Context, Result};
use clap::Parser;
use gtfs_validation::exec_params::*;
use gtfs_validation::{ExecParamRepository, ExportFormat};
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "gtfs-validator")]
#[command(author, version, about = "Validates a GTFS feed and writes the list of problems found")]
pub struct Arguments {
    /// Zip archive or directory of the feed
    #[arg(short, long)]
    pub input: Option<String>,
    /// Downloads the feed from this url instead (needs the read-url feature)
    #[arg(short, long)]
    pub url: Option<String>,
    /// Directory where the report is written
    #[arg(short, long)]
    pub output: Option<String>,
    /// Writes a protobuf report instead of JSON
    #[arg(short, long)]
    pub proto: bool,
    /// Comma separated files to skip, like `shapes.txt,transfers.txt`
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,
    /// Skips the rules when reading the feed produced errors
    #[arg(long)]
    pub abort_on_error: bool,
    /// JSON file with the parameters. Flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Smallest expected min_transfer_time, in seconds
    #[arg(long)]
    pub min_transfer_time_min: Option<i64>,
    /// Largest expected min_transfer_time, in seconds
    #[arg(long)]
    pub min_transfer_time_max: Option<i64>,
    /// Day the feed expiration is computed from, YYYYMMDD. Defaults to today
    #[arg(long)]
    pub validation_date: Option<String>,
    /// Dataset size, in MB, above which the rules stop
    #[arg(long)]
    pub max_size_mb: Option<u64>,
}

pub struct Configuration {
    pub params: ExecParamRepository,
    pub output: PathBuf,
    pub format: ExportFormat,
}

impl Arguments {
    fn flags(&self) -> Vec<(&'static str, String)> {
        let mut flags = vec![];
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                flags.push((key, value));
            }
        };
        push(INPUT, self.input.clone());
        push(URL, self.url.clone());
        push(OUTPUT, self.output.clone());
        push(PROTO, self.proto.then(|| "true".to_owned()));
        push(EXCLUDE, self.exclude.clone());
        push(ABORT_ON_ERROR, self.abort_on_error.then(|| "true".to_owned()));
        push(
            TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN,
            self.min_transfer_time_min.map(|v| v.to_string()),
        );
        push(
            TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX,
            self.min_transfer_time_max.map(|v| v.to_string()),
        );
        push(VALIDATION_DATE, self.validation_date.clone());
        push(MAX_DATASET_SIZE_MB, self.max_size_mb.map(|v| v.to_string()));
        flags
    }

    /// Parameters of the run: the defaults, then the config file, then the flags
    pub fn into_configuration(self) -> Result<Configuration> {
        let mut params = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read the configuration {}", path.display()))?;
                ExecParamRepository::from_json(&json)
                    .with_context(|| format!("Invalid configuration {}", path.display()))?
            }
            None => ExecParamRepository::new(),
        };

        let mut flags = ExecParamRepository::new();
        for (key, value) in self.flags() {
            flags.add(key, value)?;
        }
        params.merge(flags);

        let output = PathBuf::from(params.get_exec_param_value(OUTPUT)?);
        let format = if params.get_bool(PROTO).context("--proto")? {
            ExportFormat::Protobuf
        } else {
            ExportFormat::Json
        };
        Ok(Configuration {
            params,
            output,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let configuration = Arguments::parse_from(["gtfs-validator"])
            .into_configuration()
            .unwrap();
        assert_eq!(PathBuf::from("output"), configuration.output);
        assert_eq!(ExportFormat::Json, configuration.format);
        assert_eq!(
            "input.zip",
            configuration.params.get_exec_param_value(INPUT).unwrap()
        );
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{"input": "stm.zip", "output": "reports", "transfer_min_transfer_time_range_max": 600}"#,
        )
        .unwrap();

        let configuration = Arguments::parse_from([
            "gtfs-validator",
            "-c",
            path.to_str().unwrap(),
            "-i",
            "exo.zip",
            "--proto",
            "-x",
            "shapes.txt",
        ])
        .into_configuration()
        .unwrap();
        let params = &configuration.params;
        assert_eq!("exo.zip", params.get_exec_param_value(INPUT).unwrap());
        assert_eq!(PathBuf::from("reports"), configuration.output);
        assert_eq!(ExportFormat::Protobuf, configuration.format);
        assert_eq!(600, params.get_i64(TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX).unwrap());
        assert_eq!(vec!["shapes.txt"], params.get_list(EXCLUDE).unwrap());
    }

    #[test]
    fn invalid_flag_values() {
        let date = Arguments::parse_from(["gtfs-validator", "--validation-date", "2024-06-01"]);
        assert!(date.into_configuration().is_err());
    }

    #[test]
    fn invalid_value_in_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"transfer_min_transfer_time_range_max": "abc"}"#).unwrap();
        let arguments = Arguments {
            config: Some(path),
            ..Default::default()
        };
        assert!(arguments.into_configuration().is_err());
    }

    #[test]
    fn unknown_key_in_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"[{"key": "colour", "value": "green"}]"#).unwrap();
        let arguments = Arguments {
            config: Some(path),
            ..Default::default()
        };
        assert!(arguments.into_configuration().is_err());
    }
}
