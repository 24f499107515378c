use anyhow::{Context, Result};
use clap::Parser;
use jsonfetch::{
    CancelSource, ClassifiedError, Client, ClientSettings, ErrorKind, RequestConfig, Response,
    ResponseData, make_cancel_source, settings::DEFAULT_TIMEOUT_MS,
};
use log::debug;
use serde_json::Value;
use std::process::ExitCode;
use std::time::Duration;

/// jsonfetch - HTTP requests with classified failures
///
/// Sends one request and prints the response body. Failures are reported
/// with their category and a matching exit code:
/// format 3, cancelled 4, network 5, validation 6, other 7.
///
/// Examples:
///   jsonfetch get --json https://api.example.com/items
///   jsonfetch post https://api.example.com/items -d '{"name": "widget"}'
#[derive(Parser, Debug)]
#[command(author, about, version = env!("JSONFETCH_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Request timeout in milliseconds
    #[arg(
        long = "timeout-ms",
        env = "JSONFETCH_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        global = true
    )]
    timeout_ms: u64,

    /// User agent sent with every request
    #[arg(long = "user-agent", env = "JSONFETCH_USER_AGENT", global = true)]
    user_agent: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a GET request
    Get(GetArgs),

    /// Send a POST request with a JSON body
    Post(BodyArgs),

    /// Send a PUT request with a JSON body
    Put(BodyArgs),

    /// Send a PATCH request with a JSON body
    Patch(BodyArgs),

    /// Send a DELETE request
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    #[arg(value_name = "URL")]
    url: String,

    #[command(flatten)]
    opts: RequestOpts,
}

#[derive(clap::Args, Debug)]
struct BodyArgs {
    #[arg(value_name = "URL")]
    url: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    data: String,

    #[command(flatten)]
    opts: RequestOpts,
}

#[derive(clap::Args, Debug)]
struct DeleteArgs {
    #[arg(value_name = "URL")]
    url: String,

    /// Optional JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    data: Option<String>,

    #[command(flatten)]
    opts: RequestOpts,
}

#[derive(clap::Args, Debug)]
struct RequestOpts {
    /// Require a JSON reply (sends `Accept: application/json`)
    #[arg(long)]
    json: bool,

    /// Extra request header, e.g. -H 'X-Api-Key: secret'
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE")]
    headers: Vec<String>,
}

impl Commands {
    fn opts(&self) -> &RequestOpts {
        match self {
            Commands::Get(args) => &args.opts,
            Commands::Post(args) | Commands::Put(args) | Commands::Patch(args) => &args.opts,
            Commands::Delete(args) => &args.opts,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ClassifiedError>() {
            Some(err) => {
                eprintln!("error ({}): {}", err.kind(), err.message());
                if let Some(response) = err.response() {
                    eprintln!("{}", render(response));
                }
                ExitCode::from(exit_code(err.kind()))
            }
            None => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = ClientSettings::default().timeout(Duration::from_millis(cli.timeout_ms));
    if let Some(user_agent) = cli.user_agent {
        settings = settings.user_agent(user_agent);
    }
    let client = Client::with_settings(&settings)?;

    let source = make_cancel_source();
    cancel_on_ctrl_c(source.clone());

    let config = request_config(cli.command.opts(), source)?;
    let response = send(&client, cli.command, &config).await?;

    debug!("{} {}", response.status.as_u16(), response.status_text);
    println!("{}", render(&response));
    Ok(())
}

async fn send(client: &Client, command: Commands, config: &RequestConfig) -> Result<Response> {
    let response = match command {
        Commands::Get(args) if args.opts.json => client.get_json(&args.url, config).await?,
        Commands::Get(args) => client.get(&args.url, config).await?,
        Commands::Post(args) => {
            let data = parse_data(&args.data)?;
            if args.opts.json {
                client.post_json(&args.url, data, config).await?
            } else {
                client.post(&args.url, data, config).await?
            }
        }
        Commands::Put(args) => {
            let data = parse_data(&args.data)?;
            if args.opts.json {
                client.put_json(&args.url, data, config).await?
            } else {
                client.put(&args.url, data, config).await?
            }
        }
        Commands::Patch(args) => {
            let data = parse_data(&args.data)?;
            if args.opts.json {
                client.patch_json(&args.url, data, config).await?
            } else {
                client.patch(&args.url, data, config).await?
            }
        }
        Commands::Delete(args) => {
            let data = args.data.as_deref().map(parse_data).transpose()?;
            if args.opts.json {
                client.delete_json(&args.url, data, config).await?
            } else {
                client.delete(&args.url, data, config).await?
            }
        }
    };
    Ok(response)
}

fn request_config(opts: &RequestOpts, source: CancelSource) -> Result<RequestConfig> {
    let mut config = RequestConfig::new().cancel_source(source);
    for header in &opts.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Invalid header '{}'. Expected 'Name: value'.", header))?;
        config = config
            .header(name.trim(), value.trim())
            .with_context(|| format!("Invalid header '{}'", header))?;
    }
    Ok(config)
}

fn parse_data(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("Request body is not valid JSON")
}

fn cancel_on_ctrl_c(source: CancelSource) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            source.cancel();
        }
    });
}

fn render(response: &Response) -> String {
    match &response.data {
        ResponseData::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        ResponseData::Text(text) => text.clone(),
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Format => 3,
        ErrorKind::Cancelled => 4,
        ErrorKind::Network => 5,
        ErrorKind::Validation => 6,
        ErrorKind::Other => 7,
    }
}
