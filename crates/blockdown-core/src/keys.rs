//! Block and mark-definition keys

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Next process-unique key, as 12 lowercase hex digits
pub fn next_key() -> String {
    let n = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
    format!("{:012x}", n)
}
