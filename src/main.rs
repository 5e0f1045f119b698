use chained_buckets::HashTable;
use log::info;
use std::error::Error;
use std::time::Duration;

const DEFAULT_SAMPLE_SIZE: usize = 1000000;

fn avg_nanos(elapsed: Duration, samples: usize) -> f64 {
    elapsed.as_nanos() as f64 / samples as f64
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let sample_size: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => DEFAULT_SAMPLE_SIZE,
    };

    let samples: Vec<usize> = (0..sample_size).map(|_| rand::random::<usize>()).collect();

    let mut h: HashTable<usize, usize> = HashTable::new();
    for &k in &samples {
        h.set(k, k);
    }
    info!("Entries {} buckets {}", h.len(), h.bucket_count());
    info!("Load factor {}", h.load_factor());

    benchmarking::warm_up();

    let result = benchmarking::measure_function(|measurer| {
        measurer.measure(|| {
            let mut table: HashTable<usize, usize> = HashTable::new();
            for &k in &samples {
                table.set(k, k);
            }
            table
        });
    })
    .map_err(|e| format!("insert benchmark failed: {:?}", e))?;
    info!("Avg time to insert {}", avg_nanos(result.elapsed(), sample_size));

    let result = benchmarking::measure_function(|measurer| {
        measurer.measure(|| {
            let mut found: usize = 0;
            for k in &samples {
                if h.get(k).is_some() {
                    found += 1;
                }
            }
            found
        });
    })
    .map_err(|e| format!("lookup benchmark failed: {:?}", e))?;
    info!("Avg time to lookup {}", avg_nanos(result.elapsed(), sample_size));

    for k in &samples {
        if h.get(k).is_none() {
            return Err(format!("Failed to get key {}", k).into());
        }
    }

    let result = benchmarking::measure_function(|measurer| {
        measurer.measure(|| {
            let mut table: HashTable<usize, usize> = h.clone();
            for k in &samples {
                table.remove(k);
            }
            table
        });
    })
    .map_err(|e| format!("remove benchmark failed: {:?}", e))?;
    info!(
        "Avg time to clone and delete {}",
        avg_nanos(result.elapsed(), sample_size)
    );

    Ok(())
}
