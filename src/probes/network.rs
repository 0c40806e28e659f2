// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Native network probe.
//!
//! Evaluates the network-observable methods (DNS, CDN, pixel and script
//! hosts, API endpoints, CNAME subdomains, WebSocket endpoints, ETags) from
//! the machine the audit runs on. Browser-only methods are reported as
//! `Unsupported`; their verdicts have to come from a page-embedded harness
//! replayed through [`crate::probes::ScriptedProbe`].

use anyhow::{Context, Result};
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioResolver;
use reqwest::Client;
use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use url::{Host, Url};

use super::{DetectionSignal, Probe, ProbeOutcome, SignalKind};
use crate::config::ProbeConfig;
use crate::errors::ProbeError;
use crate::types::{BlockType, TestMethod};

/// Answer of a host-level reachability check
#[derive(Debug, Clone, PartialEq)]
enum HostCheck {
    Reachable,
    Blocked(String),
    TimedOut,
}

pub struct NetworkProbe {
    resolver: TokioResolver,
    client: Client,
    scheme: String,
    timeout: Duration,
    detection_timeout: Duration,
    sinkholes: HashSet<IpAddr>,
    etag_origin: Option<String>,
}

impl NetworkProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let resolver = match TokioResolver::builder(TokioConnectionProvider::default()) {
            Ok(builder) => builder.build(),
            Err(e) => {
                warn!("System resolver configuration unavailable ({}), using defaults", e);
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            // certificate mismatches on block pages are not network blocks
            .danger_accept_invalid_certs(true)
            .build()
            .context("Failed to build HTTP client")?;

        let mut sinkholes = HashSet::new();
        for address in &config.sinkhole_addresses {
            let ip: IpAddr = address
                .parse()
                .with_context(|| format!("Invalid sinkhole address: {}", address))?;
            sinkholes.insert(ip);
        }

        Ok(Self {
            resolver,
            client,
            scheme: config.scheme.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            detection_timeout: Duration::from_millis(config.detection_timeout_ms),
            sinkholes,
            etag_origin: config.etag_origin.clone(),
        })
    }

    fn is_sinkhole(&self, ip: &IpAddr) -> bool {
        ip.is_unspecified() || ip.is_loopback() || self.sinkholes.contains(ip)
    }

    fn parse_target(&self, target: &str) -> Result<Url, ProbeError> {
        let raw = if target.contains("://") {
            target.to_string()
        } else {
            format!("{}://{}", self.scheme, target)
        };
        Url::parse(&raw).map_err(|e| ProbeError::Other(format!("invalid target '{}': {}", target, e)))
    }

    /// Resolve a URL's host and look for block answers. IP literals skip DNS.
    async fn resolve(&self, url: &Url, budget: Duration) -> HostCheck {
        match url.host() {
            Some(Host::Domain(domain)) => self.resolve_domain(domain, budget).await,
            Some(_) => HostCheck::Reachable,
            None => HostCheck::Blocked("target has no host".to_string()),
        }
    }

    async fn resolve_domain(&self, domain: &str, budget: Duration) -> HostCheck {
        match tokio::time::timeout(budget, self.resolver.lookup_ip(domain)).await {
            Err(_) => HostCheck::TimedOut,
            Ok(Err(e)) => HostCheck::Blocked(format!("DNS resolution failed: {}", e)),
            Ok(Ok(lookup)) => {
                let addresses: Vec<IpAddr> = lookup.iter().collect();
                if addresses.is_empty() {
                    return HostCheck::Blocked("DNS returned no addresses".to_string());
                }
                match addresses.iter().find(|ip| self.is_sinkhole(ip)) {
                    Some(ip) => HostCheck::Blocked(format!("Sinkhole answer {}", ip)),
                    None => {
                        debug!(domain = %domain, addresses = ?addresses, "Resolved");
                        HostCheck::Reachable
                    }
                }
            }
        }
    }

    /// First CNAME target of a domain, without the trailing dot
    async fn cname_target(&self, domain: &str) -> Option<String> {
        let lookup = self.resolver.lookup(domain, RecordType::CNAME).await.ok()?;
        lookup.iter().find_map(|rdata| match rdata {
            RData::CNAME(name) => Some(name.0.to_utf8().trim_end_matches('.').to_string()),
            _ => None,
        })
    }

    /// Resolve the subdomain, then the tracker host it aliases to. The
    /// subdomain answering normally while its canonical target is
    /// sinkholed or NXDOMAIN is CNAME uncloaking at work.
    async fn follow_cname(&self, url: &Url) -> HostCheck {
        let domain = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            _ => return self.resolve(url, self.timeout).await,
        };

        match self.resolve_domain(&domain, self.timeout).await {
            HostCheck::Reachable => {}
            other => return other,
        }

        match self.cname_target(&domain).await {
            Some(alias) if !alias.eq_ignore_ascii_case(&domain) => {
                let check = self.resolve_domain(&alias, self.timeout).await;
                debug!(domain = %domain, alias = %alias, check = ?check, "CNAME chain");
                alias_check(&domain, &alias, check)
            }
            _ => HostCheck::Reachable,
        }
    }

    /// HEAD request; any HTTP response counts as reachable
    async fn request(&self, url: &str, budget: Duration) -> HostCheck {
        match self.client.head(url).timeout(budget).send().await {
            Ok(response) => {
                debug!(url = url, status = response.status().as_u16(), "Reachable");
                HostCheck::Reachable
            }
            Err(e) if e.is_timeout() => HostCheck::TimedOut,
            Err(e) => HostCheck::Blocked(e.to_string()),
        }
    }

    /// Resolve then request; blocked at the first failing step
    async fn host_then_request(&self, url: &Url, budget: Duration) -> HostCheck {
        match self.resolve(url, budget).await {
            HostCheck::Reachable => self.request(url.as_str(), budget).await,
            other => other,
        }
    }

    fn outcome(check: HostCheck) -> ProbeOutcome {
        match check {
            HostCheck::Reachable => ProbeOutcome::allowed(),
            HostCheck::Blocked(reason) => ProbeOutcome::blocked(BlockType::NetworkBlock, reason),
            HostCheck::TimedOut => ProbeOutcome::blocked(BlockType::NetworkBlock, "Timeout"),
        }
    }

    async fn test_host(&self, target: &str, path: &str) -> Result<ProbeOutcome, ProbeError> {
        let mut url = self.parse_target(target)?;
        url.set_path(path);
        Ok(Self::outcome(self.host_then_request(&url, self.timeout).await))
    }

    async fn test_api(&self, target: &str) -> Result<ProbeOutcome, ProbeError> {
        let mut url = self.parse_target(target)?;
        url.set_path("/api/test");
        Ok(Self::outcome(self.request(url.as_str(), self.timeout).await))
    }

    async fn test_cname(&self, target: &str) -> Result<ProbeOutcome, ProbeError> {
        let url = self.parse_target(target)?;
        let check = match tokio::time::timeout(self.timeout, self.follow_cname(&url)).await {
            Err(_) => HostCheck::TimedOut,
            Ok(check) => check,
        };
        Ok(Self::outcome(check))
    }

    async fn test_websocket(&self, target: &str) -> Result<ProbeOutcome, ProbeError> {
        let url = self.parse_target(target)?;
        match self.resolve(&url, self.timeout).await {
            HostCheck::Reachable => {}
            other => return Ok(Self::outcome(other)),
        }

        let host = url
            .host_str()
            .ok_or_else(|| ProbeError::Other(format!("invalid target '{}'", target)))?
            .trim_matches(|c| c == '[' || c == ']')
            .to_string();
        let port = url.port_or_known_default().unwrap_or(443);

        let check = match tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), port))).await {
            Err(_) => HostCheck::TimedOut,
            Ok(Err(e)) => HostCheck::Blocked(format!("Connection failed: {}", e)),
            Ok(Ok(_stream)) => HostCheck::Reachable,
        };
        Ok(Self::outcome(check))
    }

    async fn test_etags(&self) -> Result<ProbeOutcome, ProbeError> {
        let Some(origin) = self.etag_origin.as_deref() else {
            return Ok(ProbeOutcome::unsupported(&TestMethod::HttpEtags));
        };

        match self.client.head(origin).send().await {
            Ok(response) => {
                if response.headers().contains_key(reqwest::header::ETAG) {
                    Ok(ProbeOutcome::allowed())
                } else {
                    Ok(ProbeOutcome::blocked(
                        BlockType::other("ETag Stripped"),
                        "None",
                    ))
                }
            }
            // the origin being unreachable says nothing about ETag handling
            Err(e) => Ok(ProbeOutcome::allowed().with_error(e.to_string())),
        }
    }

    /// Network-level detection vote. A timeout is "still trying", not a block.
    async fn dns_vote(&self, target: &str) -> Result<bool, ProbeError> {
        let url = self.parse_target(target)?;
        let check = self.host_then_request(&url, self.detection_timeout).await;
        debug!(target = target, check = ?check, "DNS detection vote");
        Ok(matches!(check, HostCheck::Blocked(_)))
    }
}

/// Blocks found on the canonical target name the alias in the error
fn alias_check(domain: &str, alias: &str, check: HostCheck) -> HostCheck {
    match check {
        HostCheck::Blocked(reason) => {
            HostCheck::Blocked(format!("CNAME {} -> {} blocked: {}", domain, alias, reason))
        }
        other => other,
    }
}

#[async_trait::async_trait]
impl Probe for NetworkProbe {
    fn name(&self) -> &str {
        "network"
    }

    async fn run(&self, method: &TestMethod, target: &str) -> Result<ProbeOutcome, ProbeError> {
        match method {
            TestMethod::Dns | TestMethod::Cdn | TestMethod::Pixel => {
                self.test_host(target, "/test.gif").await
            }
            TestMethod::Script => self.test_host(target, "/test.js").await,
            TestMethod::Api => self.test_api(target).await,
            TestMethod::Cname => self.test_cname(target).await,
            TestMethod::WebSocket => self.test_websocket(target).await,
            TestMethod::HttpEtags => self.test_etags().await,
            TestMethod::DomBait
            | TestMethod::ScriptInjection
            | TestMethod::CanvasApi
            | TestMethod::WebGlApi
            | TestMethod::AudioApi
            | TestMethod::FontApi
            | TestMethod::ScreenApi
            | TestMethod::NavigatorApi
            | TestMethod::WebRtcApi
            | TestMethod::ServiceWorker
            | TestMethod::BeaconApi
            | TestMethod::IndexedDb
            | TestMethod::LocalStorage
            | TestMethod::Unrecognized(_) => Ok(ProbeOutcome::unsupported(method)),
        }
    }

    async fn signal(&self, signal: &DetectionSignal) -> Result<bool, ProbeError> {
        match signal.kind {
            SignalKind::DnsBlock => self.dns_vote(&signal.target).await,
            other => Err(ProbeError::ApiUnavailable(format!(
                "{:?} requires a browser page",
                other
            ))),
        }
    }
}
