//! Prometheus metrics for the registry node.
//!
//! A dedicated registry rather than the global default, so tests can
//! build as many instances as they like without collisions.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use attest_protocol::registry::{CredentialStatus, RegistryStats};

pub struct NodeMetrics {
    registry: Registry,

    pub credentials_issued_total: IntCounter,
    pub credentials_revoked_total: IntCounter,
    pub dids_registered_total: IntCounter,

    /// Labelled by verification outcome: valid, revoked, expired,
    /// unknown, issuer_not_authorized.
    pub verifications_total: IntCounterVec,
    pub verification_seconds: Histogram,

    pub ledger_credentials: IntGauge,
    pub ledger_revoked: IntGauge,
    pub registered_dids: IntGauge,
    pub authorized_issuers: IntGauge,
}

impl NodeMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let credentials_issued_total = IntCounter::with_opts(Opts::new(
            "attest_credentials_issued_total",
            "Credentials issued since node start",
        ))?;
        let credentials_revoked_total = IntCounter::with_opts(Opts::new(
            "attest_credentials_revoked_total",
            "Credentials revoked since node start",
        ))?;
        let dids_registered_total = IntCounter::with_opts(Opts::new(
            "attest_dids_registered_total",
            "DIDs registered since node start",
        ))?;
        let verifications_total = IntCounterVec::new(
            Opts::new("attest_verifications_total", "Verification requests by outcome"),
            &["result"],
        )?;
        let verification_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "attest_verification_seconds",
                "Verification request latency",
            )
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.025, 0.1]),
        )?;
        let ledger_credentials = IntGauge::with_opts(Opts::new(
            "attest_ledger_credentials",
            "Credentials currently on the ledger",
        ))?;
        let ledger_revoked = IntGauge::with_opts(Opts::new(
            "attest_ledger_revoked",
            "Revoked credentials on the ledger",
        ))?;
        let registered_dids = IntGauge::with_opts(Opts::new(
            "attest_registered_dids",
            "Registered DIDs",
        ))?;
        let authorized_issuers = IntGauge::with_opts(Opts::new(
            "attest_authorized_issuers",
            "Currently authorized issuers",
        ))?;

        registry.register(Box::new(credentials_issued_total.clone()))?;
        registry.register(Box::new(credentials_revoked_total.clone()))?;
        registry.register(Box::new(dids_registered_total.clone()))?;
        registry.register(Box::new(verifications_total.clone()))?;
        registry.register(Box::new(verification_seconds.clone()))?;
        registry.register(Box::new(ledger_credentials.clone()))?;
        registry.register(Box::new(ledger_revoked.clone()))?;
        registry.register(Box::new(registered_dids.clone()))?;
        registry.register(Box::new(authorized_issuers.clone()))?;

        Ok(Self {
            registry,
            credentials_issued_total,
            credentials_revoked_total,
            dids_registered_total,
            verifications_total,
            verification_seconds,
            ledger_credentials,
            ledger_revoked,
            registered_dids,
            authorized_issuers,
        })
    }

    pub fn record_verification(&self, status: CredentialStatus, seconds: f64) {
        self.verifications_total
            .with_label_values(&[status.as_str()])
            .inc();
        self.verification_seconds.observe(seconds);
    }

    pub fn update_gauges(&self, stats: &RegistryStats) {
        self.ledger_credentials.set(stats.credentials as i64);
        self.ledger_revoked.set(stats.revoked_credentials as i64);
        self.registered_dids.set(stats.registered_dids as i64);
        self.authorized_issuers.set(stats.authorized_issuers as i64);
    }

    /// Render the Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_render() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.credentials_issued_total.inc();
        metrics.record_verification(CredentialStatus::Valid, 0.0002);
        metrics.record_verification(CredentialStatus::Unknown, 0.0001);

        let output = metrics.render().unwrap();
        assert!(output.contains("attest_credentials_issued_total 1"));
        assert!(output.contains("result=\"valid\""));
        assert!(output.contains("result=\"unknown\""));
    }

    #[test]
    fn gauges_track_stats() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.update_gauges(&RegistryStats {
            credentials: 10,
            revoked_credentials: 2,
            registered_dids: 5,
            authorized_issuers: 3,
        });
        let output = metrics.render().unwrap();
        assert!(output.contains("attest_ledger_credentials 10"));
        assert!(output.contains("attest_ledger_revoked 2"));
    }

    #[test]
    fn independent_instances_do_not_collide() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.credentials_issued_total.inc();
        assert!(b.render().unwrap().contains("attest_credentials_issued_total 0"));
    }
}
