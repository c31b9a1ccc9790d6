use chain_hash::HashMap;
use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    /// Number of random keys to insert.
    #[arg(short = 'n', long = "count", default_value_t = 100_000)]
    count: usize,

    /// Initial bucket count.
    #[arg(short = 'b', long = "buckets", default_value_t = 1 << 10)]
    buckets: usize,

    /// Max load factor to run with.
    #[arg(short = 'l', long = "max_load_factor", default_value_t = 1.0)]
    max_load_factor: f32,

    /// Seed for the key generator. Random when omitted.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let mut map: HashMap<u64, u64> = HashMap::with_bucket_count(args.buckets);
    if let Err(err) = map.set_max_load_factor(args.max_load_factor) {
        eprintln!("{err}");
        std::process::exit(2);
    }

    println!(
        "Filling map with {} random keys ({} initial buckets, max load factor {:.2})",
        args.count,
        map.bucket_count(),
        map.max_load_factor()
    );

    let mut duplicates = 0usize;
    let mut keys = Vec::with_capacity(args.count);
    for _ in 0..args.count {
        let key = rng.random::<u64>();
        let (_, inserted) = map.insert(key, key.wrapping_mul(3));
        if inserted {
            keys.push(key);
        } else {
            duplicates += 1;
        }
    }

    for key in &keys {
        assert_eq!(map.at(key).copied(), Ok(key.wrapping_mul(3)));
    }

    println!("Inserted {} keys ({} duplicates skipped)", map.len(), duplicates);
    println!(
        "Final load factor: {:.2}% across {} buckets",
        map.load_factor() * 100.0,
        map.bucket_count()
    );

    map.print_chain_histogram();
    map.debug_stats().print();

    for key in keys.iter().step_by(2) {
        map.erase(key);
    }
    println!("After erasing every other key: {} left", map.len());
    map.debug_stats().print();
}
