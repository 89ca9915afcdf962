use super::print_notifications;
use migdash::api::DashboardClient;
use migdash::logtree::LogBrowser;
use migdash::notify::{NotificationFeed, Notifier};
use migdash::utils;
use colored::*;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

async fn load(client: Arc<DashboardClient>, notifier: &Notifier, feed: &mut NotificationFeed) -> anyhow::Result<LogBrowser> {
    let pb = utils::create_spinner("Fetching log structure...");
    let browser = LogBrowser::load(client, notifier.clone()).await;
    pb.finish_and_clear();
    if browser.is_err() {
        print_notifications(feed);
    }
    Ok(browser?)
}

pub async fn tree(client: Arc<DashboardClient>) -> anyhow::Result<()> {
    let (notifier, mut feed) = Notifier::channel();
    let browser = load(client, &notifier, &mut feed).await?;
    if browser.tree().is_empty() {
        println!("   (No logs yet)");
    } else {
        print!("{}", browser.tree().render());
    }
    Ok(())
}

pub async fn view(
    client: Arc<DashboardClient>,
    path: &str,
    filter: Option<String>,
    exclude: Option<String>,
) -> anyhow::Result<()> {
    let filter_regex = filter.as_deref().map(Regex::new).transpose()?;
    let exclude_regex = exclude.as_deref().map(Regex::new).transpose()?;

    let (notifier, mut feed) = Notifier::channel();
    let browser = load(client, &notifier, &mut feed).await?;
    let Some(id) = browser.tree().find(path) else {
        anyhow::bail!("no log entry at {path}");
    };
    if browser.tree().get(id).is_dir() {
        print!("{}", browser.tree().render_subtree(id));
        return Ok(());
    }

    let file = browser.view_file(id).await;
    print_notifications(&mut feed);
    let file = file?;

    let heading = if file.markdown { format!("--- {} (markdown) ---", file.label) } else { format!("--- {} ---", file.label) };
    println!("\n{}", heading.bold().bright_white());
    for line in file.content.lines() {
        if let Some(re) = &exclude_regex { if re.is_match(line) { continue; } }
        if let Some(re) = &filter_regex { if !re.is_match(line) { continue; } }
        println!("{line}");
    }
    Ok(())
}

pub async fn download(client: Arc<DashboardClient>, path: &str, out: &Path) -> anyhow::Result<()> {
    let (notifier, mut feed) = Notifier::channel();
    let browser = load(client, &notifier, &mut feed).await?;
    let Some(id) = browser.tree().find(path) else {
        anyhow::bail!("no log entry at {path}");
    };

    let pb = utils::create_spinner("Downloading...");
    let saved = browser.download_file(id, out).await;
    pb.finish_and_clear();
    print_notifications(&mut feed);
    println!("Saved to {}", saved?.display().to_string().cyan());
    Ok(())
}
