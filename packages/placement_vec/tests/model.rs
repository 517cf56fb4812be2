//! Randomized operation sequences checked against `Vec` as the reference model.

use placement_vec::Sequence;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(u16),
    Insert(usize, u16),
    Erase(usize),
    Pop,
    Resize(usize),
    Reserve(usize),
    Truncate(usize),
    Assign(Vec<u16>),
    Take,
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u16>().prop_map(Op::Push),
        3 => (any::<usize>(), any::<u16>()).prop_map(|(index, value)| Op::Insert(index, value)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => Just(Op::Pop),
        1 => (0_usize..40).prop_map(Op::Resize),
        1 => (0_usize..64).prop_map(Op::Reserve),
        1 => (0_usize..40).prop_map(Op::Truncate),
        1 => proptest::collection::vec(any::<u16>(), 0..24).prop_map(Op::Assign),
        1 => Just(Op::Take),
        1 => Just(Op::Clear),
    ]
}

/// Applies `op` to both the sequence and the model. Indexes are wrapped into the valid range.
#[allow(
    clippy::arithmetic_side_effects,
    clippy::modulo_arithmetic,
    reason = "test code operating on small bounded values"
)]
fn apply(sequence: &mut Sequence<u16>, model: &mut Vec<u16>, op: Op) {
    match op {
        Op::Push(value) => {
            assert_eq!(*sequence.push(value), value);
            model.push(value);
        }
        Op::Insert(index, value) => {
            let index = index % (model.len() + 1);
            assert_eq!(sequence.insert(index, value), index);
            model.insert(index, value);
        }
        Op::Erase(index) => {
            if model.is_empty() {
                return;
            }

            let index = index % model.len();
            assert_eq!(sequence.erase(index), index);
            model.remove(index);
        }
        Op::Pop => {
            assert_eq!(sequence.pop(), model.pop());
        }
        Op::Resize(len) => {
            sequence.resize(len);
            model.resize(len, 0);
        }
        Op::Reserve(capacity) => {
            let before = sequence.capacity();
            sequence.reserve(capacity);
            assert_eq!(sequence.capacity(), before.max(capacity));
        }
        Op::Truncate(len) => {
            sequence.truncate(len);
            model.truncate(len);
        }
        Op::Assign(values) => {
            let source = Sequence::from(values.as_slice());
            sequence.clone_from(&source);
            model.clone_from(&values);
        }
        Op::Take => {
            let taken = sequence.take();
            assert_eq!(sequence.capacity(), 0);
            assert_eq!(taken, model.as_slice());

            *sequence = taken;
        }
        Op::Clear => {
            let capacity = sequence.capacity();
            sequence.clear();
            model.clear();
            assert_eq!(sequence.capacity(), capacity);
        }
    }
}

proptest! {
    #[test]
    fn behaves_like_vec(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let mut sequence = Sequence::new();
        let mut model = Vec::new();

        for op in ops {
            apply(&mut sequence, &mut model, op);

            prop_assert_eq!(sequence.as_slice(), model.as_slice());
            prop_assert_eq!(sequence.len(), model.len());
            prop_assert!(sequence.len() <= sequence.capacity());
        }

        let drained: Vec<_> = sequence.into_iter().collect();
        prop_assert_eq!(drained, model);
    }

    #[test]
    fn insert_then_erase_restores_contents(
        values in proptest::collection::vec(any::<u32>(), 0..64),
        index in any::<usize>(),
        inserted in any::<u32>(),
    ) {
        let mut sequence = Sequence::from(values.as_slice());
        #[allow(clippy::arithmetic_side_effects, reason = "test code, len is small")]
        let index = index % (values.len() + 1);

        sequence.insert(index, inserted);
        prop_assert_eq!(sequence[index], inserted);
        prop_assert_eq!(sequence.len(), values.len() + 1);

        sequence.erase(index);
        prop_assert_eq!(sequence.as_slice(), values.as_slice());
    }

    #[test]
    fn appends_reallocate_logarithmically(count in 1_usize..5000) {
        let mut sequence = Sequence::new();
        let mut reallocations = 0_u32;
        let mut capacity = sequence.capacity();

        for value in 0..count {
            sequence.push(value);

            if sequence.capacity() != capacity {
                reallocations += 1;
                capacity = sequence.capacity();
            }
        }

        // Capacity goes 1, 2, 4, ... so `count` appends need exactly this many allocations.
        prop_assert_eq!(reallocations, usize::BITS - (count - 1).leading_zeros() + 1);
        prop_assert!(sequence.capacity() >= count);
        prop_assert!(sequence.capacity() < count * 2);
    }

    #[test]
    fn clone_is_exact_and_independent(values in proptest::collection::vec(any::<i64>(), 0..64)) {
        let mut original: Sequence<i64> = values.iter().copied().collect();
        let clone = original.clone();

        prop_assert_eq!(clone.capacity(), values.len());
        prop_assert_eq!(&clone, &original);

        original.push(1);
        prop_assert_eq!(clone.as_slice(), values.as_slice());
    }
}
