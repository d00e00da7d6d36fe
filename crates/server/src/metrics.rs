use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

use service::ServiceError;

// Prometheus metrics (default registry)
pub static DOCUMENT_LOADS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rack_document_loads_total",
        "Total rack document loads"
    )
    .expect("register document_loads_total")
});

pub static DOCUMENT_SAVES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rack_document_saves_total",
        "Total successful rack document saves"
    )
    .expect("register document_saves_total")
});

pub static SAVE_CONFLICTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rack_save_conflicts_total",
        "Total saves rejected because the document changed"
    )
    .expect("register save_conflicts_total")
});

pub static STORAGE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rack_storage_errors_total",
        "Total operations failed because storage was unavailable"
    )
    .expect("register storage_errors_total")
});

/// Count the outcome of an interaction that loaded the document.
pub fn observe_load<T>(result: &Result<T, ServiceError>) {
    DOCUMENT_LOADS_TOTAL.inc();
    if let Err(ServiceError::StorageUnavailable(_)) = result {
        STORAGE_ERRORS_TOTAL.inc();
    }
}

/// Count the outcome of an edit (one load, at most one save).
pub fn observe_edit<T>(result: &Result<T, ServiceError>) {
    DOCUMENT_LOADS_TOTAL.inc();
    match result {
        Ok(_) => DOCUMENT_SAVES_TOTAL.inc(),
        Err(ServiceError::Conflict) => SAVE_CONFLICTS_TOTAL.inc(),
        Err(ServiceError::StorageUnavailable(_)) => STORAGE_ERRORS_TOTAL.inc(),
        Err(_) => {}
    }
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    // touch the counters so they are exported before first use
    Lazy::force(&DOCUMENT_LOADS_TOTAL);
    Lazy::force(&DOCUMENT_SAVES_TOTAL);
    Lazy::force(&SAVE_CONFLICTS_TOTAL);
    Lazy::force(&STORAGE_ERRORS_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
