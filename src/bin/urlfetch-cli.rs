use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

use urlfetcher::transport::MSGPACK_CONTENT_TYPE;
use urlfetcher::wire::{
    decode_response, encode_request, DecodedRequest, GetRequest, PostRequest, RequestOptions,
    ResponseTuple,
};

#[derive(Parser)]
#[command(name = "urlfetch-cli")]
#[command(about = "Send a fetch call to a running urlfetcher worker", long_about = None)]
struct Cli {
    /// Worker base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:10053")]
    worker: String,

    /// Timeout for the outbound call, in milliseconds.
    #[arg(short, long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Cookie as name=value (repeatable).
    #[arg(long = "cookie", value_parser = parse_cookie)]
    cookies: Vec<(String, String)>,

    /// Header as "Name: value" (repeatable).
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Follow redirects (true/false); the worker default applies when omitted.
    #[arg(long)]
    follow_redirects: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL with GET
    Get { url: String },
    /// Send data to a URL with POST
    Post {
        url: String,
        #[arg(short, long, default_value = "")]
        data: String,
    },
}

fn parse_cookie(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {s:?}"))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected \"Name: value\", got {s:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers: Vec<(String, Vec<String>)> = Vec::new();
    for (name, value) in cli.headers {
        match headers.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => headers.push((name, vec![value])),
        }
    }
    let options = RequestOptions {
        cookies: (!cli.cookies.is_empty()).then_some(cli.cookies),
        headers: (!headers.is_empty()).then_some(headers),
        follow_redirects: cli.follow_redirects,
    };

    let (verb, request) = match cli.command {
        Commands::Get { url } => (
            "get",
            DecodedRequest::Get(GetRequest {
                url,
                timeout_ms: cli.timeout_ms,
                options,
            }),
        ),
        Commands::Post { url, data } => (
            "post",
            DecodedRequest::Post(PostRequest {
                url,
                body: data.into_bytes(),
                timeout_ms: cli.timeout_ms,
                options,
            }),
        ),
    };

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/{}", cli.worker.trim_end_matches('/'), verb))
        .header(CONTENT_TYPE, HeaderValue::from_static(MSGPACK_CONTENT_TYPE))
        .body(encode_request(&request)?)
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: worker returned status {}", status);
        return Ok(());
    }

    let tuple = decode_response(&res.bytes().await?)?;
    println!("{}", serde_json::to_string_pretty(&render(&tuple))?);
    Ok(())
}

fn render(tuple: &ResponseTuple) -> Value {
    let headers: serde_json::Map<String, Value> = tuple
        .headers
        .iter()
        .map(|(name, values)| (name.clone(), json!(values)))
        .collect();

    json!({
        "success": tuple.success,
        "code": tuple.code,
        "headers": headers,
        "body": String::from_utf8_lossy(&tuple.body),
    })
}
