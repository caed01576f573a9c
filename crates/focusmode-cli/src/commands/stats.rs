use clap::Args;
use focusmode_core::{Config, DashboardStats, StatsRange};

use super::{api_base, check_status};

#[derive(Args)]
pub struct StatsArgs {
    /// today, week or month
    #[arg(long, default_value = "today")]
    pub range: StatsRange,
    /// User to report on (defaults to `user_id` from the config)
    #[arg(long)]
    pub user: Option<String>,
    /// API server base URL
    #[arg(long)]
    pub api_url: Option<String>,
}

pub async fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let user_id = args.user.unwrap_or_else(|| config.user_id.clone());

    let mut url = api_base(&config, args.api_url.as_deref())?.join("stats")?;
    url.query_pairs_mut()
        .append_pair("userId", &user_id)
        .append_pair("range", args.range.as_str());

    let resp = check_status(reqwest::get(url).await?).await?;
    let stats: DashboardStats = resp.json().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
