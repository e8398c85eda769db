//! Splitting a sequence into fixed-size chunks

use std::num::NonZeroUsize;

/// Split `source` into batches of `batch_size` items
///
/// Every batch is full except possibly the last one. An empty source yields no batches.
///
/// # Example
/// ```
/// # use std::num::NonZeroUsize;
/// # use influxdb_http_client::batch::batches;
/// let size = NonZeroUsize::new(2).unwrap();
/// let chunks: Vec<Vec<u8>> = batches([1, 2, 3, 4, 5], size).collect();
/// assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
/// ```
pub fn batches<I: IntoIterator>(source: I, batch_size: NonZeroUsize) -> Batches<I::IntoIter> {
    Batches {
        source: source.into_iter(),
        batch_size,
    }
}

/// Iterator returned by [`batches`]
#[derive(Debug, Clone)]
pub struct Batches<I> {
    source: I,
    batch_size: NonZeroUsize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.source.by_ref().take(self.batch_size.get()).collect();
        (!batch.is_empty()).then_some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.batch_size.get();
        let (lower, upper) = self.source.size_hint();
        (lower.div_ceil(size), upper.map(|u| u.div_ceil(size)))
    }
}
