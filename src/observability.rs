use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total user messages handled. Labels: intent.
pub const MESSAGES_TOTAL: &str = "quadbot_messages_total";

/// Histogram: message handling latency in seconds.
pub const MESSAGE_DURATION_SECONDS: &str = "quadbot_message_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "quadbot_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "quadbot_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "quadbot_connections_rejected_total";

/// Gauge: booking conversations currently in flight.
pub const SESSIONS_ACTIVE: &str = "quadbot_sessions_active";

/// Counter: bookings confirmed.
pub const BOOKINGS_CREATED_TOTAL: &str = "quadbot_bookings_created_total";

/// Counter: bookings refused because the slot was already taken.
pub const BOOKING_CONFLICTS_TOTAL: &str = "quadbot_booking_conflicts_total";

/// Counter: ambient insights actually delivered.
pub const INSIGHTS_SENT_TOTAL: &str = "quadbot_insights_sent_total";

/// Counter: occupancy refresh ticks.
pub const OCCUPANCY_REFRESHES_TOTAL: &str = "quadbot_occupancy_refreshes_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
