pub use metrics::*;
use std::sync::LazyLock;

pub static ATTESTATION_POOL_SIZE: LazyLock<Result<IntGauge>> = LazyLock::new(|| {
    try_create_int_gauge(
        "attestation_pool_size",
        "The number of attestations available to be included in proposed blocks",
    )
});
