use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use portfolio_ai::advisor::{
    AutocompleteOptions, CompanyProfile, InvestmentAdvisor, MarketData, MarketDataError,
    NoopInsightStore, PredictionTimeframe, PricePoint,
};
use portfolio_ai::settings::mask_api_key;
use portfolio_ai::{
    FailoverOrchestrator, FileSettingsStore, GenerationRequest, ProviderConfig, ProviderId,
    UserSettings,
};

#[derive(Parser)]
#[command(name = "portfolio-ai")]
#[command(about = "Investment assistant backed by Gemini with OpenRouter failover")]
struct Cli {
    /// User settings file (provider preference and API keys)
    #[arg(short, long, default_value = "./portfolio-ai.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a raw prompt through the orchestrator
    Ask {
        prompt: String,
        #[arg(long)]
        system: Option<String>,
        /// gemini or openrouter
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Ask the financial assistant a question
    Chat { message: String },

    /// Classify a search query
    Intent { query: String },

    /// Suggest completions for partial input
    Complete {
        input: String,
        #[arg(short, long, default_value = "investment search")]
        context: String,
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Market-wide or single-ticker sentiment
    Sentiment { ticker: Option<String> },

    /// Market forecast (day, week, month or quarter)
    Forecast {
        #[arg(default_value = "week")]
        timeframe: String,
        /// Print only the top sectors
        #[arg(long)]
        sectors: bool,
    },

    /// Price forecast for one ticker
    Price { ticker: String },

    /// Show or update stored settings
    Settings {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        gemini_key: Option<String>,
        #[arg(long)]
        openrouter_key: Option<String>,
    },
}

/// The CLI has no quote service attached
struct OfflineMarketData;

#[async_trait]
impl MarketData for OfflineMarketData {
    async fn historical_prices(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError> {
        Err(MarketDataError::NotFound(symbol.to_string()))
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        Err(MarketDataError::NotFound(symbol.to_string()))
    }

    async fn market_overview(&self) -> Result<serde_json::Value, MarketDataError> {
        Err(MarketDataError::Request("no market data source configured".to_string()))
    }
}

fn parse_provider(value: &str) -> Result<ProviderId, String> {
    ProviderId::parse(value).ok_or_else(|| format!("Unknown provider '{}'", value))
}

fn parse_timeframe(value: &str) -> Result<PredictionTimeframe, String> {
    PredictionTimeframe::parse(value).ok_or_else(|| format!("Unknown timeframe '{}'", value))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn update_settings(
    store: &FileSettingsStore,
    provider: Option<String>,
    gemini_key: Option<String>,
    openrouter_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = store.load_sync()?.unwrap_or_default();
    let changed = provider.is_some() || gemini_key.is_some() || openrouter_key.is_some();

    if let Some(provider) = provider {
        settings.preferred_provider = Some(parse_provider(&provider)?);
    }
    if let Some(key) = gemini_key {
        settings.gemini_api_key = Some(key);
    }
    if let Some(key) = openrouter_key {
        settings.openrouter_api_key = Some(key);
    }
    if changed {
        store.save(&settings)?;
    }

    print_settings(store, &settings);
    Ok(())
}

fn print_settings(store: &FileSettingsStore, settings: &UserSettings) {
    let masked = |key: &Option<String>| key.as_deref().map(mask_api_key).unwrap_or_else(|| "(unset)".to_string());
    println!("Settings file: {}", store.path().display());
    println!(
        "Preferred provider: {}",
        settings.preferred_provider.unwrap_or_default()
    );
    println!("Gemini API key: {}", masked(&settings.gemini_api_key));
    println!("OpenRouter API key: {}", masked(&settings.openrouter_api_key));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portfolio_ai=info")),
        )
        .init();

    let cli = Cli::parse();
    let store = Arc::new(FileSettingsStore::new(cli.settings));

    if let Commands::Settings {
        provider,
        gemini_key,
        openrouter_key,
    } = cli.command
    {
        return update_settings(&store, provider, gemini_key, openrouter_key);
    }

    let orchestrator = Arc::new(FailoverOrchestrator::with_settings(
        ProviderConfig::from_env(),
        store,
    ));
    let advisor = InvestmentAdvisor::new(
        orchestrator.clone(),
        Arc::new(OfflineMarketData),
        Arc::new(NoopInsightStore),
    );

    match cli.command {
        Commands::Ask {
            prompt,
            system,
            provider,
            model,
            temperature,
        } => {
            let mut request = GenerationRequest::new(prompt);
            if let Some(system) = system {
                request = request.with_system_prompt(system);
            }
            if let Some(provider) = provider {
                request = request.with_provider(parse_provider(&provider)?);
            }
            if let Some(model) = model {
                request = request.with_model(model);
            }
            if let Some(temperature) = temperature {
                request = request.with_temperature(temperature);
            }

            let result = orchestrator.generate(request).await?;
            println!("[{}]\n{}", result.provider_used, result.text);
        }
        Commands::Chat { message } => {
            println!("{}", advisor.chat(&[], &message).await?);
        }
        Commands::Intent { query } => {
            println!("{}", advisor.search_intent(&query).await.as_str());
        }
        Commands::Complete {
            input,
            context,
            limit,
        } => {
            let options = AutocompleteOptions {
                limit,
                ..AutocompleteOptions::default()
            };
            for suggestion in advisor.autocomplete(&input, &context, &options).await {
                println!("{}", suggestion.text());
            }
        }
        Commands::Sentiment { ticker: Some(ticker) } => {
            print_json(&advisor.ticker_sentiment(&ticker, false).await?)?;
        }
        Commands::Sentiment { ticker: None } => {
            print_json(&advisor.market_sentiment(false).await?)?;
        }
        Commands::Forecast { timeframe, sectors } => {
            let timeframe = parse_timeframe(&timeframe)?;
            if sectors {
                print_json(&advisor.top_performing_sectors(timeframe).await?)?;
            } else {
                print_json(&advisor.market_prediction(timeframe).await?)?;
            }
        }
        Commands::Price { ticker } => {
            print_json(&advisor.price_prediction(&ticker).await?)?;
        }
        Commands::Settings { .. } => {}
    }

    let metrics = orchestrator.get_metrics();
    tracing::debug!("Failovers this run: {}", metrics.get_failover_count());
    Ok(())
}
