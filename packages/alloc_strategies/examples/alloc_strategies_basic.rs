//! Selecting an allocation strategy by policy without changing the code that uses it.

use alloc_strategies::{
    Block, Boxed, DynBlock, NoAlloc, RawBytes, Strategy, StrategyKind, ZeroedBytes,
};

/// Builds a histogram of byte values. The strategy decides where the buckets live.
fn histogram<S>(data: &[u8]) -> alloc_strategies::Result<Block<S>>
where
    S: Strategy<Val = u32>,
{
    let mut buckets = Block::<S>::new(256)?;

    // Strategies that do not hand out zeroed memory still default-initialize, but generic code
    // may want to know which one it got.
    println!(
        "{}: memory pre-zeroed = {}",
        S::KIND,
        S::KIND.zeroes_memory()
    );

    for byte in data {
        let bucket = buckets
            .get_mut(usize::from(*byte))
            .expect("a block of 256 buckets has one for every byte value");
        *bucket = bucket.wrapping_add(1);
    }

    Ok(buckets)
}

fn main() {
    let data = b"the quick brown fox jumps over the lazy dog";

    let boxed = histogram::<Boxed<u32>>(data).expect("boxed strategy allocates");
    let raw = histogram::<RawBytes<u32>>(data).expect("raw bytes strategy allocates");
    let zeroed = histogram::<ZeroedBytes<u32>>(data).expect("zeroed bytes strategy allocates");

    assert_eq!(boxed.as_slice(), raw.as_slice());
    assert_eq!(raw.as_slice(), zeroed.as_slice());
    println!(
        "spaces counted: {}",
        zeroed.get(usize::from(b' ')).copied().unwrap_or_default()
    );

    // A hot path that must not allocate can be checked by swapping the strategy.
    match histogram::<NoAlloc<u32>>(data) {
        Ok(_) => unreachable!("the forbidding strategy never allocates"),
        Err(error) => println!("no_alloc: {error}"),
    }

    // The policy may also come from configuration at runtime.
    for name in ["new", "malloc", "calloc", "noalloc"] {
        let kind: StrategyKind = name.parse().expect("all names above are known");

        match DynBlock::<u64>::new(kind, 4) {
            Ok(block) => println!("{name} -> {kind}: {:?}", block.as_slice()),
            Err(error) => println!("{name} -> {kind}: {error}"),
        }
    }
}
