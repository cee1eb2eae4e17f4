use ndn_sim::ndn_content_store::ContentStore;
use ndn_sim::ndn_popularity::PopularitySampler;
use std::time::Instant;

/// Benchmark LRU content store throughput under Zipf-distributed requests
fn main() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Error)
        .init();

    println!("\n=== Content Store Benchmark (get-or-put under Zipf load) ===\n");

    let num_contents = 10_000u64;
    let requests = 1_000_000usize;

    // (capacity, zipf exponent)
    let configs = vec![
        ("Tiny cache, flat popularity", 10, 0.5),
        ("Tiny cache, skewed popularity", 10, 1.2),
        ("Medium cache, default popularity", 100, 0.8),
        ("Large cache, default popularity", 1_000, 0.8),
        ("Huge cache, default popularity", 5_000, 0.8),
    ];

    println!("{:<36} {:>10} {:>12} {:>14} {:>12}",
             "Configuration", "Time (ms)", "Mops/s", "Hit ratio", "Evictions");
    println!("{}", "-".repeat(88));

    for (name, capacity, exponent) in configs {
        let mut sampler = match PopularitySampler::seeded(num_contents, 0.0, exponent, 1) {
            Ok(sampler) => sampler,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                continue;
            }
        };
        let ids: Vec<u64> = (0..requests).map(|_| sampler.next()).collect();

        let mut store = match ContentStore::new(capacity) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                continue;
            }
        };

        let start = Instant::now();
        for &id in &ids {
            if store.get(id).is_none() {
                store.put(id);
            }
        }
        let elapsed = start.elapsed().as_secs_f64();

        let counters = store.counters();
        println!("{:<36} {:>10.2} {:>12.2} {:>13.1}% {:>12}",
                 name,
                 elapsed * 1000.0,
                 requests as f64 / elapsed / 1e6,
                 counters.hit_ratio() * 100.0,
                 counters.evictions);
    }

    println!("\n{}", "=".repeat(88));
    println!("\nNote: eviction shifts the whole index map, so cost grows with capacity.");
}
