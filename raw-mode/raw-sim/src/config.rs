use std::fs;

use anyhow::{Context, Result};
use shared::raw_hal::{ButtonTiming, RawConfig};

use crate::Args;

/// Builds the raw mode config from a JSON file, or from the command line
/// when no file is given. Command line values override the file.
pub fn load_config(args: &Args) -> Result<RawConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            parse_config(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => {
            let budget = args
                .budget
                .context("--budget is required without --config")?;
            let debounce_ms = args
                .debounce_ms
                .context("--debounce-ms is required without --config")?;
            let long_press_ms = args
                .long_press_ms
                .context("--long-press-ms is required without --config")?;

            RawConfig::new(
                budget,
                ButtonTiming {
                    debounce_ms,
                    long_press_ms,
                },
            )
        }
    };

    if let Some(budget) = args.budget {
        config.report_budget = budget;
    }
    if let Some(debounce_ms) = args.debounce_ms {
        config.timing.debounce_ms = debounce_ms;
    }
    if let Some(long_press_ms) = args.long_press_ms {
        config.timing.long_press_ms = long_press_ms;
    }
    if args.no_mask {
        config.emit_activity_mask = false;
    }

    Ok(config)
}

fn parse_config(contents: &str) -> Result<RawConfig> {
    Ok(serde_json::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use shared::raw_hal::{PriorityWeights, ScaleConfig};

    use super::*;

    fn args() -> Args {
        Args {
            config: None,
            script: PathBuf::from("script.jsonl"),
            budget: None,
            debounce_ms: None,
            long_press_ms: None,
            no_mask: false,
            noise: 0.0,
            seed: 0,
        }
    }

    #[test]
    fn test_command_line_config() {
        let mut args = args();
        assert!(load_config(&args).is_err());

        args.budget = Some(2);
        args.debounce_ms = Some(15);
        args.long_press_ms = Some(700);
        args.no_mask = true;

        let config = load_config(&args).unwrap();
        assert_eq!(config.report_budget, 2);
        assert_eq!(config.timing.debounce_ms, 15);
        assert_eq!(config.timing.long_press_ms, 700);
        assert!(!config.emit_activity_mask);
        assert_eq!(config.scale, ScaleConfig::default());
        assert_eq!(config.weights, PriorityWeights::default());
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "layout": { "pressure": 1, "toneholes": 9, "buttons": 3, "imu_axes": 6 },
            "scale": { "pressure": 1024, "tonehole": 512, "accel": 256, "gyro": 90 },
            "weights": { "pressure": 2, "tonehole": 1, "button": 1000, "accel": 1, "gyro": 1 },
            "timing": { "debounce_ms": 5, "long_press_ms": 400 },
            "report_budget": 3,
            "emit_activity_mask": true
        }"#;

        let config = parse_config(json).unwrap();
        assert_eq!(config.scale.gyro, 90);
        assert_eq!(config.weights.pressure, 2);
        assert_eq!(config.report_budget, 3);
        assert_eq!(config.validate(), Ok(()));

        assert!(parse_config("{ \"report_budget\": 3 }").is_err());
    }
}
