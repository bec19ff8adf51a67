//! Work partitioning

use crate::error::{Result, ScrapeError};
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Requested worker count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workers {
    /// Use the host's available parallelism
    Auto,
    Count(NonZeroUsize),
}

impl Workers {
    /// Interpret a command-line job count: `0` is auto, negative is invalid
    pub fn from_jobs(jobs: i64) -> Result<Self> {
        match jobs {
            0 => Ok(Self::Auto),
            n if n < 0 => Err(ScrapeError::config(format!("job count must not be negative, got {n}"))),
            n => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(Self::Count)
                .ok_or_else(|| ScrapeError::config(format!("job count {n} is out of range"))),
        }
    }

    pub fn resolve(self) -> NonZeroUsize {
        match self {
            Self::Count(n) => n,
            Self::Auto => std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl FromStr for Workers {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let jobs = s
            .trim()
            .parse::<i64>()
            .map_err(|_| ScrapeError::config(format!("invalid job count '{s}'")))?;
        Self::from_jobs(jobs)
    }
}

/// Split `items` into `workers` contiguous shards.
///
/// Shard sizes are `K / W` or `K / W + 1`, the first `K % W` shards taking
/// the extra item. Concatenating the shards gives back `items`. Shards may be
/// empty when there are fewer items than workers.
pub fn partition<T: Clone>(items: &[T], workers: NonZeroUsize) -> Vec<Vec<T>> {
    let workers = workers.get();
    let base = items.len() / workers;
    let extra = items.len() % workers;

    let mut shards = Vec::with_capacity(workers);
    let mut start = 0;
    for index in 0..workers {
        let len = base + usize::from(index < extra);
        shards.push(items[start..start + len].to_vec());
        start += len;
    }
    shards
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn n(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).unwrap()
    }

    #[test]
    fn test_single_worker_gets_everything() {
        let items = vec![1, 2, 3];
        assert_eq!(partition(&items, n(1)), vec![items]);
    }

    #[test]
    fn test_extra_items_go_to_first_shards() {
        let items: Vec<u32> = (0..10).collect();
        let shards = partition(&items, n(4));
        assert_eq!(shards, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7], vec![8, 9]]);
    }

    #[test]
    fn test_more_workers_than_items() {
        let shards = partition(&["a", "b"], n(5));
        assert_eq!(shards.len(), 5);
        assert_eq!(shards[0], ["a"]);
        assert_eq!(shards[1], ["b"]);
        assert!(shards[2..].iter().all(Vec::is_empty));
    }

    #[test]
    fn test_empty_input() {
        let shards = partition::<u8>(&[], n(3));
        assert_eq!(shards, vec![Vec::<u8>::new(); 3]);
    }

    #[test]
    fn test_workers_from_jobs() {
        assert_eq!(Workers::from_jobs(0).unwrap(), Workers::Auto);
        assert_eq!(Workers::from_jobs(4).unwrap(), Workers::Count(n(4)));
        assert!(Workers::from_jobs(-1).is_err());
        assert!(Workers::Auto.resolve().get() >= 1);
    }

    #[test]
    fn test_workers_from_str() {
        assert_eq!("auto".parse::<Workers>().unwrap(), Workers::Auto);
        assert_eq!(" 8 ".parse::<Workers>().unwrap(), Workers::Count(n(8)));
        assert!("-2".parse::<Workers>().is_err());
        assert!("many".parse::<Workers>().is_err());
    }

    proptest! {
        #[test]
        fn prop_partition_is_lossless_and_balanced(len in 0usize..200, workers in 1usize..32) {
            let items: Vec<usize> = (0..len).collect();
            let shards = partition(&items, n(workers));

            prop_assert_eq!(shards.len(), workers);
            prop_assert_eq!(shards.concat(), items);

            let sizes: Vec<usize> = shards.iter().map(Vec::len).collect();
            let max = sizes.iter().copied().max().unwrap_or(0);
            let min = sizes.iter().copied().min().unwrap_or(0);
            prop_assert!(max - min <= 1);
            prop_assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
