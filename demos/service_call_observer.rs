//! Service call observer example for context-settings.
//!
//! Demonstrates:
//! - Tuning timeouts and the retry delay floor
//! - Subscribing observers and raising routed events
//! - Isolation of a panicking observer
//! - The irreversible developer overrides
//!
//! Run with: `cargo run --example service_call_observer`

use context_settings::{ContextSettings, ServiceCallRoutedEvent, ThrottleSetting, TraceLevel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PROFILE_URI: &str = "https://profile.example.com/me";

fn main() {
    println!("=== context-settings: Service Call Observer ===\n");

    let settings = ContextSettings::new();

    // -------------------------------------------------------------------------
    // 1. Timeouts
    // -------------------------------------------------------------------------
    println!("1. Configuring timeouts...");

    settings.set_http_timeout(Duration::from_secs(10));
    settings.set_http_retry_delay(Duration::from_millis(500));
    settings.set_diagnostics_trace_level(TraceLevel::Warning);

    println!("   http_timeout     = {:?}", settings.http_timeout());
    println!(
        "   http_retry_delay = {:?} (floored)",
        settings.http_retry_delay()
    );
    println!(
        "   trace level      = {}",
        settings.diagnostics_trace_level()
    );

    // -------------------------------------------------------------------------
    // 2. Observers
    // -------------------------------------------------------------------------
    println!("\n2. Subscribing observers...");

    settings.set_enable_service_call_routed_events(true);

    let routed = Arc::new(AtomicUsize::new(0));
    let routed_clone = routed.clone();
    let counter = settings.add_service_call_routed_handler(move |_| {
        routed_clone.fetch_add(1, Ordering::SeqCst);
    });
    let printer = settings.add_service_call_routed_handler(|event| {
        println!("   routed: {}", event);
    });
    settings.add_service_call_routed_handler(|_| panic!("misbehaving observer"));

    println!(
        "   handlers: {}, {}, plus one that panics",
        counter, printer
    );

    // -------------------------------------------------------------------------
    // 3. Raise
    // -------------------------------------------------------------------------
    println!("\n3. Raising events...");

    for call_id in 1..=3 {
        if settings.enable_service_call_routed_events() {
            let event = ServiceCallRoutedEvent::new(call_id, "GET", PROFILE_URI)
                .with_http_status(200)
                .with_elapsed(Duration::from_millis(40 * call_id));
            settings.raise_service_call_routed_event(&event);
        }
    }

    println!(
        "   counter observer saw {} events",
        routed.load(Ordering::SeqCst)
    );

    settings.remove_service_call_routed_handler(printer);
    println!(
        "   {} handlers remain after removing the printer",
        settings.service_call_routed_handlers().len()
    );

    // -------------------------------------------------------------------------
    // 4. Developer overrides
    // -------------------------------------------------------------------------
    println!("\n4. Developer overrides...");

    settings.disable_asserts_for_throttling_in_dev_sandboxes(ThrottleSetting::Enforce);
    println!(
        "   after Enforce: disabled = {}",
        settings.is_throttling_assert_disabled()
    );

    settings.disable_asserts_for_throttling_in_dev_sandboxes(
        ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling,
    );
    println!(
        "   after override: disabled = {}",
        settings.is_throttling_assert_disabled()
    );

    println!("\n=== Done ===");
}
