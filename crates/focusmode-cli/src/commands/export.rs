use std::path::PathBuf;

use base64::Engine as _;
use clap::Args;
use focusmode_core::{Config, ExportFormat, StatsRange};
use serde::Deserialize;

use super::{api_base, check_status};

#[derive(Args)]
pub struct ExportArgs {
    /// csv or pdf
    #[arg(long, default_value = "csv")]
    pub format: ExportFormat,
    /// today, week or month
    #[arg(long, default_value = "month")]
    pub range: StatsRange,
    /// User to export (defaults to `user_id` from the config)
    #[arg(long)]
    pub user: Option<String>,
    /// Output file (defaults to the server-suggested name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// API server base URL
    #[arg(long)]
    pub api_url: Option<String>,
}

#[derive(Deserialize)]
struct EncodedReport {
    content: String,
    filename: String,
}

/// A server-suggested name, accepted only if it is a bare file name.
fn safe_name(name: &str) -> Option<String> {
    let name = name.trim().trim_matches('"');
    let bare = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
    bare.then(|| name.to_string())
}

/// Filename from `Content-Disposition: attachment; filename="..."`.
fn attachment_name(resp: &reqwest::Response) -> Option<String> {
    let value = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    safe_name(value.split("filename=").nth(1)?)
}

pub async fn run(args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let user_id = args.user.unwrap_or_else(|| config.user_id.clone());
    let url = api_base(&config, args.api_url.as_deref())?.join("export")?;

    let body = serde_json::json!({
        "format": args.format,
        "userId": user_id,
        "range": args.range,
    });
    let resp = reqwest::Client::new().post(url).json(&body).send().await?;
    let resp = check_status(resp).await?;

    let (suggested, bytes) = match args.format {
        ExportFormat::Csv => {
            let name = attachment_name(&resp);
            (name, resp.bytes().await?.to_vec())
        }
        ExportFormat::Pdf => {
            let report: EncodedReport = resp.json().await?;
            let bytes = base64::engine::general_purpose::STANDARD.decode(report.content)?;
            (safe_name(&report.filename), bytes)
        }
    };

    let path = args
        .output
        .or_else(|| suggested.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(format!("focus-sessions.{}", args.format.extension())));
    std::fs::write(&path, &bytes)?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_names_must_be_bare() {
        assert_eq!(
            safe_name("\"focus-sessions-u1-week-20260310.csv\""),
            Some("focus-sessions-u1-week-20260310.csv".to_string())
        );
        assert_eq!(safe_name("../etc/passwd"), None);
        assert_eq!(safe_name("a\\b.pdf"), None);
        assert_eq!(safe_name(".."), None);
        assert_eq!(safe_name(""), None);
    }
}
