//! Times bulk insertion of unique random keys into a `HashMap` and into both
//! tree engines.
//!
//! Usage: `insert_timing [SIZE...]` (default sizes 320 640 1280).
//! `TREEDICT_SEED` fixes the key generator seed, `TREEDICT_LOG` sets the log level.

use std::collections::{HashMap, HashSet};
use std::env;
use std::error::Error;
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::{debug, info, LevelFilter};
use rand::{rngs::StdRng, Rng, SeedableRng};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use treedict::{TreeKind, TreeMap};

const DEFAULT_SIZES: [usize; 3] = [320, 640, 1280];

fn initialize_logging() -> Result<(), Box<dyn Error>> {
    let level = match env::var("TREEDICT_LOG") {
        Ok(level) => LevelFilter::from_str(&level)?,
        Err(_) => LevelFilter::Info,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;
    Ok(())
}

fn unique_keys<R: Rng>(rng: &mut R, n: usize) -> Vec<i32> {
    let mut keys = Vec::with_capacity(n);
    let mut seen = HashSet::with_capacity(n);
    while keys.len() < n {
        let key: i32 = rng.gen();
        if seen.insert(key) {
            keys.push(key);
        }
    }
    keys
}

fn time<F: FnOnce()>(f: F) -> Duration {
    let start = Instant::now();
    f();
    start.elapsed()
}

fn main() -> Result<(), Box<dyn Error>> {
    initialize_logging()?;

    let mut rng = match env::var("TREEDICT_SEED") {
        Ok(seed) => {
            let seed: u64 = seed.parse()?;
            debug!("seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        Err(_) => StdRng::from_entropy(),
    };
    let sizes = env::args()
        .skip(1)
        .map(|arg| arg.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()?;
    let sizes = if sizes.is_empty() {
        DEFAULT_SIZES.to_vec()
    } else {
        sizes
    };
    debug!("sizes {sizes:?}");

    let mut hash_map = HashMap::new();
    let mut rb = TreeMap::new(TreeKind::RedBlack);
    let mut avl = TreeMap::new(TreeKind::Avl);

    for n in sizes {
        let keys = unique_keys(&mut rng, n);
        info!("insertion: {n} elements");

        let elapsed = time(|| {
            for key in &keys {
                hash_map.insert(*key, 0);
            }
        });
        info!("hash map: {elapsed:?}");

        for map in [&mut rb, &mut avl] {
            let elapsed = time(|| {
                for key in &keys {
                    map.insert(*key, 0);
                }
            });
            info!("{}: {elapsed:?} (height {})", map.kind(), map.height());
        }

        hash_map.clear();
        rb.clear();
        avl.clear();
    }
    Ok(())
}
