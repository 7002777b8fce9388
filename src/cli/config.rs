//! Conversion of CLI arguments into library configuration

use crate::cli::main_impl::{AdjustArgs, Cli, CliOutputFormat, ComposeArgs, RemoveArgs};
use crate::{
    config::{OutputFormat, ProcessorConfig},
    transforms::EnhanceFactors,
};
use anyhow::{Context, Result};
use std::path::Path;

pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Processor configuration for the `remove` command
    pub(crate) fn for_remove(cli: &Cli, args: &RemoveArgs) -> Result<ProcessorConfig> {
        let mut config = ProcessorConfig::default();
        Self::apply_output(cli, &mut config, args.output.as_deref());
        if let Some(threshold) = args.threshold {
            config.removal_mask_threshold = threshold;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Processor configuration for the `compose` command
    ///
    /// Starts from `--config` when given; explicit flags override it.
    pub(crate) fn for_compose(cli: &Cli, args: &ComposeArgs) -> Result<ProcessorConfig> {
        let mut config = match &args.config {
            Some(path) => ProcessorConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => ProcessorConfig::default(),
        };
        Self::apply_output(cli, &mut config, args.output.as_deref());

        let composite = &mut config.composite;
        if let Some(threshold) = args.threshold {
            composite.mask_threshold = threshold;
        }
        if args.keep_size {
            composite.placement.size_fraction = None;
        } else if let Some(size) = args.size {
            composite.placement.size_fraction = Some(size);
        }
        if args.top_left {
            composite.placement.left_fraction = None;
            composite.placement.top_fraction = None;
        } else {
            if let Some(left) = args.left {
                composite.placement.left_fraction = Some(left);
            }
            if let Some(top) = args.top {
                composite.placement.top_fraction = Some(top);
            }
        }
        if let Some(color) = args.solid_color {
            composite.use_solid_color = true;
            composite.solid_color = color;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Enhancement factors for the `adjust` command
    pub(crate) fn enhance_factors(args: &AdjustArgs) -> Result<EnhanceFactors> {
        let factors = EnhanceFactors {
            color: args.color,
            contrast: args.contrast,
            brightness: args.brightness,
            sharpness: args.sharpness,
        };
        factors.validate().context("Invalid enhancement factors")?;
        Ok(factors)
    }

    /// `--format` wins over the output extension, which wins over the config
    fn apply_output(cli: &Cli, config: &mut ProcessorConfig, output: Option<&Path>) {
        if let Some(format) = cli.format {
            config.output_format = format.into();
        } else if let Some(format) = output.and_then(OutputFormat::from_path) {
            config.output_format = format;
        }
        config.jpeg_quality = cli.jpeg_quality;
    }
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => OutputFormat::WebP,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
        }
    }
}

/// Parse a `WIDTHxHEIGHT` value such as `640x480`
pub(crate) fn parse_dimensions(value: &str) -> std::result::Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension '{part}': {e}"))
    };
    let dimensions = (parse(width)?, parse(height)?);
    if dimensions.0 == 0 || dimensions.1 == 0 {
        return Err(format!("dimensions must be non-zero, got '{value}'"));
    }
    Ok(dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::main_impl::Command;
    use crate::types::SolidColor;
    use clap::Parser;
    use std::io::Write;

    fn compose_args(cli: &Cli) -> &ComposeArgs {
        match &cli.command {
            Command::Compose(args) => args,
            _ => panic!("expected compose command"),
        }
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("640x480"), Ok((640, 480)));
        assert_eq!(parse_dimensions("10X20"), Ok((10, 20)));
        assert!(parse_dimensions("640").is_err());
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("ax10").is_err());
    }

    #[test]
    fn test_compose_defaults() {
        let cli = Cli::parse_from(["bgswap", "compose", "subject.png", "bg.jpg"]);
        let config = CliConfigBuilder::for_compose(&cli, compose_args(&cli)).unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[test]
    fn test_compose_flags_override() {
        let cli = Cli::parse_from([
            "bgswap",
            "--format",
            "jpeg",
            "compose",
            "subject.png",
            "bg.jpg",
            "--size",
            "0.3",
            "--top-left",
            "--solid-color",
            "#00ff00",
            "--threshold",
            "40",
        ]);
        let config = CliConfigBuilder::for_compose(&cli, compose_args(&cli)).unwrap();

        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.composite.mask_threshold, 40);
        assert_eq!(config.composite.placement.size_fraction, Some(0.3));
        assert_eq!(config.composite.placement.center(), None);
        assert!(config.composite.use_solid_color);
        assert_eq!(config.composite.solid_color, SolidColor::rgb(0, 255, 0));
    }

    #[test]
    fn test_compose_out_of_range_fraction_rejected() {
        let cli = Cli::parse_from(["bgswap", "compose", "s.png", "b.png", "--left", "1.5"]);
        assert!(CliConfigBuilder::for_compose(&cli, compose_args(&cli)).is_err());
    }

    #[test]
    fn test_compose_reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"composite": {{"mask_threshold": 99}}}}"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from(["bgswap", "compose", "s.png", "b.png", "--config", &path, "--keep-size"]);
        let config = CliConfigBuilder::for_compose(&cli, compose_args(&cli)).unwrap();
        assert_eq!(config.composite.mask_threshold, 99);
        assert_eq!(config.composite.placement.size_fraction, None);
    }

    #[test]
    fn test_remove_threshold_and_output_format() {
        let cli = Cli::parse_from([
            "bgswap", "remove", "a.png", "--model", "m.onnx", "--threshold", "0", "-o", "out.jpg",
        ]);
        let Command::Remove(args) = &cli.command else {
            panic!("expected remove command");
        };
        let config = CliConfigBuilder::for_remove(&cli, args).unwrap();
        assert_eq!(config.removal_mask_threshold, 0);
        assert_eq!(config.output_format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_explicit_format_beats_extension() {
        let cli = Cli::parse_from([
            "bgswap", "--format", "webp", "remove", "a.png", "--model", "m.onnx", "-o", "out.jpg",
        ]);
        let Command::Remove(args) = &cli.command else {
            panic!("expected remove command");
        };
        let config = CliConfigBuilder::for_remove(&cli, args).unwrap();
        assert_eq!(config.output_format, OutputFormat::WebP);
    }
}
