//! Read-only status page. It renders a snapshot taken at startup and shares
//! nothing with the runner.

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::fmt::Write;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{AppConfig, DnsConfig, ProviderConfig};
use crate::desired::DomainRecord;

const STYLESHEET: &str = include_str!("../static/style.css");

#[derive(Debug, Clone)]
pub struct ZoneSummary {
    pub name: String,
    pub provider: &'static str,
}

#[derive(Debug, Clone)]
pub struct StatusView {
    pub zones: Vec<ZoneSummary>,
    pub domains: Vec<DomainRecord>,
    pub interval_secs: u64,
    pub dns: DnsConfig,
    pub discovery: bool,
}

impl StatusView {
    pub fn from_config(config: &AppConfig) -> Self {
        let zones = config
            .zones
            .iter()
            .map(|zone| ZoneSummary {
                name: zone.name.clone(),
                provider: match zone.provider {
                    ProviderConfig::Cloudflare { .. } => "cloudflare",
                    ProviderConfig::NextDns { .. } => "nextdns",
                },
            })
            .collect();
        Self {
            zones,
            domains: config.domains.clone(),
            interval_secs: config.interval,
            dns: config.dns,
            discovery: config.discovery.docker,
        }
    }

    pub fn render(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>dnssync</title>\n<link rel=\"stylesheet\" href=\"/static/style.css\">\n\
             </head>\n<body>\n<h1>dnssync</h1>\n",
        );
        let _ = writeln!(
            html,
            "<p class=\"muted\">Updating every {}s. IPv4: {}. IPv6: {}. Purge unknown records: {}. Container discovery: {}.</p>",
            self.interval_secs,
            on_off(self.dns.enable_ipv4),
            on_off(self.dns.enable_ipv6),
            on_off(self.dns.purge_unknown),
            on_off(self.discovery),
        );

        html.push_str("<h2>Zones</h2>\n<table>\n<tr><th>Zone</th><th>Provider</th></tr>\n");
        for zone in &self.zones {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape(&zone.name),
                zone.provider
            );
        }
        html.push_str("</table>\n");

        html.push_str(
            "<h2>Configured domains</h2>\n<table>\n<tr><th>Name</th><th>A</th><th>AAAA</th><th>TTL</th></tr>\n",
        );
        for domain in &self.domains {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&domain.name),
                domain.a.map_or_else(|| "public".to_string(), |ip| ip.to_string()),
                domain.aaaa.map_or_else(|| "public".to_string(), |ip| ip.to_string()),
                domain.ttl.map_or_else(|| "auto".to_string(), |t| t.to_string()),
            );
        }
        html.push_str("</table>\n</body>\n</html>\n");
        html
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn router(view: Arc<StatusView>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(|| async { "ok" }))
        .route("/static/style.css", get(stylesheet))
        .with_state(view)
}

async fn index(State(view): State<Arc<StatusView>>) -> Html<String> {
    Html(view.render())
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

/// Serves until `cancel` fires, then stops accepting and drains open
/// connections. Bounding the drain is up to the caller.
pub async fn serve(
    listener: TcpListener,
    view: Arc<StatusView>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "starting status server");
    axum::serve(listener, router(view))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    info!("status server stopped");
    Ok(())
}
