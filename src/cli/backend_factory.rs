//! CLI collaborator factory
//!
//! Turns CLI arguments into the background provider and copywriter handed to
//! the [`BannerPipeline`] builder. Remote collaborators are only available
//! with the `remote` feature.

use super::main_impl::Cli;
use crate::{
    background::BackgroundProvider,
    config::{BackgroundMode, BannerConfig},
    pipeline::BannerPipeline,
    services::ProgressReporter,
    text_gen::TextGenerator,
};
use anyhow::{Context, Result};
use tracing::debug;

/// Factory for the pipeline's external collaborators
pub(crate) struct CliBackendFactory;

impl CliBackendFactory {
    /// Build a ready pipeline for the parsed CLI
    ///
    /// Creates blocking HTTP clients, so call it off the async runtime.
    pub(crate) fn pipeline(
        cli: &Cli,
        config: BannerConfig,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<BannerPipeline> {
        let background = Self::background(cli, &config)?;
        let copywriter = Self::copywriter(cli)?;

        let mut builder = BannerPipeline::builder()
            .config(config)
            .progress_reporter(reporter);
        if let Some(provider) = background {
            builder = builder.background(provider);
        }
        if let Some(writer) = copywriter {
            builder = builder.copywriter(writer);
        }
        builder.build().context("Failed to create banner pipeline")
    }

    /// Background provider for generation modes
    ///
    /// Gradient and image modes return `None`; the pipeline builds those from
    /// the configuration itself.
    pub(crate) fn background(
        cli: &Cli,
        config: &BannerConfig,
    ) -> Result<Option<Box<dyn BackgroundProvider>>> {
        match config.mode {
            BackgroundMode::Gradient | BackgroundMode::Image => Ok(None),
            BackgroundMode::Generate | BackgroundMode::Inpaint => {
                Self::remote_background(cli).map(Some)
            },
        }
    }

    #[cfg(feature = "remote")]
    fn remote_background(cli: &Cli) -> Result<Box<dyn BackgroundProvider>> {
        use crate::background::{GeneratedBackground, StableDiffusionHttp};

        let mut client = StableDiffusionHttp::new(cli.sd_url.clone())
            .context("Failed to create image generation client")?;
        if let Some(steps) = cli.sd_steps {
            client = client.steps(steps);
        }
        debug!(url = %cli.sd_url, "Using Stable Diffusion image generator");
        Ok(Box::new(GeneratedBackground::new(client)))
    }

    #[cfg(not(feature = "remote"))]
    fn remote_background(_cli: &Cli) -> Result<Box<dyn BackgroundProvider>> {
        anyhow::bail!(
            "Image generation requires the `remote` feature. Rebuild with --features remote or use --mode gradient"
        )
    }

    /// Copywriter when an API key is available
    ///
    /// Without a key titles fall back to the product name.
    pub(crate) fn copywriter(cli: &Cli) -> Result<Option<Box<dyn TextGenerator>>> {
        match cli.copy_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Self::remote_copywriter(cli, key).map(Some),
            _ => {
                debug!("No copy API key, titles default to the product name");
                Ok(None)
            },
        }
    }

    #[cfg(feature = "remote")]
    fn remote_copywriter(cli: &Cli, api_key: &str) -> Result<Box<dyn TextGenerator>> {
        use crate::text_gen::ChatCompletionCopywriter;

        let mut writer =
            ChatCompletionCopywriter::new(api_key).context("Failed to create copy generation client")?;
        if let Some(url) = &cli.copy_url {
            writer = writer.base_url(url.clone());
        }
        if let Some(model) = &cli.copy_model {
            writer = writer.model(model.clone());
        }
        Ok(Box::new(writer))
    }

    #[cfg(not(feature = "remote"))]
    fn remote_copywriter(_cli: &Cli, _api_key: &str) -> Result<Box<dyn TextGenerator>> {
        Ok(Box::new(crate::text_gen::UnavailableCopy::new(
            "built without the `remote` feature",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NoOpProgressReporter;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["banner-compositor", "product.png"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_gradient_mode_needs_no_provider() {
        let cli = parse(&[]);
        let provider = CliBackendFactory::background(&cli, &BannerConfig::default()).unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn test_blank_api_key_means_no_copywriter() {
        let mut cli = parse(&[]);
        cli.copy_api_key = Some("   ".to_string());
        assert!(CliBackendFactory::copywriter(&cli).unwrap().is_none());
        cli.copy_api_key = None;
        assert!(CliBackendFactory::copywriter(&cli).unwrap().is_none());
    }

    #[test]
    fn test_api_key_creates_copywriter() {
        let mut cli = parse(&["--copy-model", "test-model"]);
        cli.copy_api_key = Some("secret".to_string());
        assert!(CliBackendFactory::copywriter(&cli).unwrap().is_some());
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_generation_modes_use_remote_generator() {
        let cli = parse(&["--sd-steps", "5"]);
        let config = BannerConfig::builder()
            .mode(BackgroundMode::Inpaint)
            .build()
            .unwrap();
        let provider = CliBackendFactory::background(&cli, &config).unwrap().unwrap();
        assert_eq!(provider.name(), "stable-diffusion");
    }

    #[test]
    fn test_pipeline_for_gradient_mode() {
        let mut cli = parse(&[]);
        cli.copy_api_key = None;
        let pipeline = CliBackendFactory::pipeline(
            &cli,
            BannerConfig::default(),
            Box::new(NoOpProgressReporter),
        )
        .unwrap();
        assert_eq!(pipeline.background_name(), "gradient");
    }
}
