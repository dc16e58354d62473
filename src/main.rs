use clap::Parser;
use log::LevelFilter;
use photoreal::{
    logger::{self, LoggerConfig},
    AspectRatio, GeminiClient, GeminiConfig, GenerationController, GenerationOptions,
    GenerationState, Mode, Resolution, SelectedFile, Style,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "photoreal", version, about = "Generate or edit photorealistic images")]
struct Cli {
    /// What to generate, or the edit instruction when --image is given
    #[arg(short, long, default_value = "")]
    prompt: String,

    #[arg(short, long, default_value_t = Style::Realistic)]
    style: Style,

    /// Ignored in edit mode
    #[arg(short, long, default_value_t = AspectRatio::Square)]
    aspect_ratio: AspectRatio,

    /// Quality hint folded into the prompt; ignored in edit mode
    #[arg(short, long, default_value_t = Resolution::Uhd)]
    resolution: Resolution,

    /// Reference image to edit
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Directory the result is saved into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    #[arg(long)]
    api_base: Option<String>,

    #[arg(long)]
    json_logs: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let logger_config = LoggerConfig::new()
        .with_json_output(cli.json_logs)
        .with_colors(!cli.json_logs);
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger::init_with_config(logger_config.with_level(level))?;

    if dotenv_loaded {
        log::debug!(".env file loaded");
    }

    let mut config = GeminiConfig::from_env();
    if let Some(api_base) = &cli.api_base {
        config = config.with_api_base(api_base);
    }
    logger::log_config_info(&config);

    let client = GeminiClient::new(config)?;
    let options = GenerationOptions::new()
        .with_prompt(cli.prompt.clone())
        .with_style(cli.style)
        .with_aspect_ratio(cli.aspect_ratio)
        .with_resolution(cli.resolution);
    let mut controller = GenerationController::with_options(client, options);

    if let Some(path) = &cli.image {
        controller.attach(SelectedFile::from_path(path)).await?;
        let dimensions_chosen =
            cli.aspect_ratio != AspectRatio::default() || cli.resolution != Resolution::default();
        if dimensions_chosen && !controller.dimension_controls_enabled() {
            log::warn!("Aspect ratio and resolution are disabled when editing an image");
        }
    }

    match controller.mode() {
        Mode::Edit => log::info!("Applying your edits..."),
        Mode::Generate => log::info!("Generating your vision..."),
    }

    let state = controller.submit().await.clone();
    match state {
        GenerationState::Success(image) => {
            let path =
                photoreal::save_image(&image, &controller.options().prompt, &cli.out).await?;
            println!("{}", path.display());
            Ok(())
        }
        GenerationState::Failure(message) => Err(message.into()),
        state => Err(format!("unexpected state after submit: {:?}", state).into()),
    }
}
