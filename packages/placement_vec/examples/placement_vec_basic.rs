//! Basic usage example for `Sequence`.
//!
//! Demonstrates growth, insertion and erasure, copy and move semantics and fallible
//! reservation. Run with the `trace` output enabled to see every storage reallocation.

use placement_vec::{DropPolicy, Sequence};

fn main() {
    // Reallocations are reported as trace-level events.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let mut sequence = Sequence::new();

    for value in 1..=3 {
        sequence.push(value);
        println!(
            "Pushed {value}: len = {}, capacity = {}",
            sequence.len(),
            sequence.capacity()
        );
    }

    sequence.insert(1, 9);
    println!("After inserting 9 at index 1: {sequence:?}");

    sequence.erase(2);
    println!("After erasing index 2: {sequence:?}");

    sequence.resize(1);
    println!("After shrinking to 1: {sequence:?}");

    sequence.resize(3);
    println!("After growing to 3: {sequence:?}");

    // Clones are exactly sized, regardless of the spare capacity of the original.
    sequence.reserve(32);
    let clone = sequence.clone();
    println!(
        "Original capacity {}, clone capacity {}",
        sequence.capacity(),
        clone.capacity()
    );

    // Taking the contents leaves the original empty without storage.
    let taken = sequence.take();
    println!(
        "Taken: {taken:?}, original now has len {} and capacity {}",
        sequence.len(),
        sequence.capacity()
    );

    // Allocation failure can be handled instead of aborting.
    match sequence.try_reserve(usize::MAX) {
        Ok(()) => println!("Somehow reserved usize::MAX elements"),
        Err(error) => println!("Reservation failed as expected: {error}"),
    }

    // A sequence that must be emptied before it is dropped.
    let mut strict = Sequence::<String>::builder()
        .capacity(4)
        .drop_policy(DropPolicy::MustNotDropItems)
        .build();

    strict.push("first".to_string());
    strict.push("second".to_string());

    for value in strict.take() {
        println!("Drained {value}");
    }

    println!("Sequence example completed successfully!");
}
