use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use crate::core::registry::ZoneRegistry;
use crate::desired::DesiredStateResolver;
use crate::ip_lookup::{AddressCache, IpLookup};
use crate::reconciler::{Reconciler, ZoneReport};

/// Drives reconciliation passes over every zone on a fixed interval.
pub struct Runner {
    registry: ZoneRegistry,
    resolver: DesiredStateResolver,
    reconciler: Reconciler,
    ip_lookup: Box<dyn IpLookup>,
    interval: Duration,
    grace: Duration,
}

impl Runner {
    pub fn new(
        registry: ZoneRegistry,
        resolver: DesiredStateResolver,
        reconciler: Reconciler,
        ip_lookup: Box<dyn IpLookup>,
        interval: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            registry,
            resolver,
            reconciler,
            ip_lookup,
            interval,
            grace,
        }
    }

    /// One full pass: desired state, then each zone in turn.
    pub async fn run_once(&self) -> BTreeMap<String, ZoneReport> {
        let zones = self.registry.names();
        let desired = self.resolver.resolve(&zones).await;
        let mut addresses = AddressCache::new(&*self.ip_lookup);
        let mut reports = BTreeMap::new();

        for (zone, provider) in self.registry.iter() {
            let domains = desired.get(zone).map(Vec::as_slice).unwrap_or_default();
            let span = info_span!("zone", zone, provider = provider.kind());
            let report = self
                .reconciler
                .reconcile(zone, provider, domains, &mut addresses)
                .instrument(span)
                .await;
            reports.insert(zone.to_string(), report);
        }
        reports
    }

    /// Runs a pass immediately, then one per interval until `cancel` fires.
    /// A pass in flight at cancellation gets `grace` to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            zones = self.registry.len(),
            "starting DNS updater"
        );
        if self.registry.is_empty() {
            warn!("no zones registered, passes will do nothing");
        }
        loop {
            if !self.pass_until_cancelled(&cancel).await {
                break;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = time::sleep(self.interval) => {}
            }
        }
        info!("received termination signal, DNS updater stopped");
    }

    /// Returns false when cancellation arrived during the pass.
    async fn pass_until_cancelled(&self, cancel: &CancellationToken) -> bool {
        let pass = self.run_once();
        tokio::pin!(pass);

        tokio::select! {
            _ = &mut pass => true,
            () = cancel.cancelled() => {
                if time::timeout(self.grace, &mut pass).await.is_err() {
                    warn!(grace_secs = self.grace.as_secs(), "abandoning in-flight pass");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DnsConfig;
    use crate::core::provider::DNSProvider;
    use crate::core::provider::mock::MemoryProvider;
    use crate::core::record::{DNSRecord, DNSRecordType};
    use crate::desired::{DomainRecord, MockDiscoverySource, Source};
    use crate::error::Error;
    use crate::ip_lookup::mock::MockIpLookup;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::assert_ok;

    /// Forwards to a shared `MemoryProvider` so tests can inspect it after
    /// handing ownership to the registry.
    struct Shared(Arc<MemoryProvider>);

    #[async_trait]
    impl DNSProvider for Shared {
        fn kind(&self) -> &'static str {
            self.0.kind()
        }
        async fn list_records(&self) -> Result<Vec<DNSRecord>, Error> {
            self.0.list_records().await
        }
        async fn upsert_record(&self, record: DNSRecord) -> Result<(), Error> {
            self.0.upsert_record(record).await
        }
        async fn delete_record(&self, record: DNSRecord) -> Result<(), Error> {
            self.0.delete_record(record).await
        }
    }

    fn a(name: &str, value: &str) -> DNSRecord {
        DNSRecord::new(DNSRecordType::A, name, value, None)
    }

    fn fixed(name: &str, ip: &str) -> DomainRecord {
        DomainRecord {
            a: Some(ip.parse().unwrap()),
            ..DomainRecord::new(name, Source::Static)
        }
    }

    fn runner(
        zones: Vec<(&str, Arc<MemoryProvider>)>,
        domains: Vec<DomainRecord>,
        interval: Duration,
    ) -> Runner {
        let mut registry = ZoneRegistry::new();
        for (zone, provider) in zones {
            registry.register(zone, Box::new(Shared(provider)));
        }
        Runner::new(
            registry,
            DesiredStateResolver::new(domains, None),
            Reconciler::new(DnsConfig {
                enable_ipv4: true,
                enable_ipv6: false,
                purge_unknown: true,
            }),
            Box::new(MockIpLookup::new()),
            interval,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_no_cross_zone_leakage() {
        let zone_a = Arc::new(MemoryProvider::with_records(vec![a(
            "keep.a.example",
            "192.0.2.1",
        )]));
        let zone_b = Arc::new(MemoryProvider::with_records(vec![a(
            "stale.b.example",
            "192.0.2.2",
        )]));
        let runner = runner(
            vec![("a.example", zone_a.clone()), ("b.example", zone_b.clone())],
            vec![fixed("keep.a.example", "192.0.2.1"), fixed("new.b.example", "192.0.2.3")],
            Duration::from_secs(60),
        );

        let reports = runner.run_once().await;

        assert_eq!(zone_a.records(), vec![a("keep.a.example", "192.0.2.1")]);
        assert!(zone_a.deletes().is_empty());
        assert_eq!(zone_a.upserts(), 0);
        assert_eq!(zone_b.records(), vec![a("new.b.example", "192.0.2.3")]);
        assert_eq!(reports["b.example"].deleted, 1);
        assert_eq!(reports["b.example"].upserted, 1);
    }

    #[tokio::test]
    async fn test_failing_zone_does_not_stop_others() {
        let broken = Arc::new(MemoryProvider::default());
        broken.set_fail_list(true);
        let healthy = Arc::new(MemoryProvider::default());
        let runner = runner(
            vec![("a.example", broken.clone()), ("b.example", healthy.clone())],
            vec![fixed("www.a.example", "192.0.2.1"), fixed("www.b.example", "192.0.2.2")],
            Duration::from_secs(60),
        );

        let reports = runner.run_once().await;

        assert!(reports["a.example"].aborted);
        assert!(broken.deletes().is_empty());
        assert_eq!(healthy.records(), vec![a("www.b.example", "192.0.2.2")]);
    }

    #[tokio::test]
    async fn test_discovery_is_queried_once_per_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut discovery = MockDiscoverySource::new();
        discovery.expect_discover().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![DomainRecord {
                a: Some("192.0.2.9".parse().unwrap()),
                ..DomainRecord::new("app.a.example", Source::Discovered)
            }])
        });

        let mut registry = ZoneRegistry::new();
        let zone_a = Arc::new(MemoryProvider::default());
        let zone_b = Arc::new(MemoryProvider::default());
        registry.register("a.example", Box::new(Shared(zone_a.clone())));
        registry.register("b.example", Box::new(Shared(zone_b.clone())));
        let runner = Runner::new(
            registry,
            DesiredStateResolver::new(vec![], Some(Box::new(discovery))),
            Reconciler::new(DnsConfig::default()),
            Box::new(MockIpLookup::new()),
            Duration::from_secs(60),
            Duration::from_secs(1),
        );

        runner.run_once().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(zone_a.records(), vec![a("app.a.example", "192.0.2.9")]);
        assert!(zone_b.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let provider = Arc::new(MemoryProvider::default());
        let runner = Arc::new(runner(
            vec![("a.example", provider.clone())],
            vec![fixed("www.a.example", "192.0.2.1")],
            Duration::from_secs(30),
        ));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let runner = runner.clone();
            let cancel = cancel.clone();
            async move { runner.run(cancel).await }
        });

        // first pass before any timer tick
        tokio::task::yield_now().await;
        time::sleep(Duration::from_secs(1)).await;
        let lists_after_first = provider
            .calls()
            .iter()
            .filter(|c| matches!(c, crate::core::provider::mock::Call::List))
            .count();
        assert_eq!(lists_after_first, 2);

        time::sleep(Duration::from_secs(30)).await;
        let lists_after_second = provider
            .calls()
            .iter()
            .filter(|c| matches!(c, crate::core::provider::mock::Call::List))
            .count();
        assert_eq!(lists_after_second, 4);

        cancel.cancel();
        assert_ok!(time::timeout(Duration::from_secs(5), handle).await);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_still_stops() {
        let runner = runner(vec![], vec![], Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = time::timeout(Duration::from_secs(5), runner.run(cancel)).await;
        assert_ok!(result);
    }
}
