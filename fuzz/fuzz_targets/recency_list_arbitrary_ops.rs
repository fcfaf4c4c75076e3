#![no_main]

use std::collections::VecDeque;

use keyagent::ds::RecencyList;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on RecencyList
//
// Mirrors every operation on a VecDeque (front = most recently used) and
// checks order, length and chain invariants after each step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = (data[0] % 16) as usize + 1;
    let mut list: RecencyList<u8> = RecencyList::with_capacity(capacity);
    let mut model: VecDeque<u8> = VecDeque::new();

    for pair in data[1..].chunks_exact(2) {
        let op = pair[0] % 5;
        let value = pair[1] % 32;

        match op {
            0 => {
                // push_front
                match list.push_front(value) {
                    Ok(_) => model.push_front(value),
                    Err(rejected) => {
                        assert_eq!(rejected, value);
                        assert_eq!(model.len(), capacity);
                    }
                }
            }
            1 => {
                // pop_back
                assert_eq!(list.pop_back(), model.pop_back());
            }
            2 => {
                // find + promote
                let found = list.find(|v| *v == value);
                let pos = model.iter().position(|v| *v == value);
                assert_eq!(found.is_some(), pos.is_some());
                if let (Some(cursor), Some(pos)) = (found, pos) {
                    assert!(list.promote(cursor));
                    let v = model.remove(pos).unwrap();
                    model.push_front(v);
                    assert_eq!(list.front(), Some(&value));
                }
            }
            3 => {
                // remove_where
                let removed = list.remove_where(|v| *v == value);
                let pos = model.iter().position(|v| *v == value);
                assert_eq!(removed, pos.and_then(|p| model.remove(p)));
            }
            _ => {
                // clear
                if value == 0 {
                    list.clear();
                    model.clear();
                }
            }
        }

        assert_eq!(list.len(), model.len());
        assert!(list.len() <= capacity);
        assert!(list.iter().eq(model.iter()));
        assert_eq!(list.back(), model.back());
        list.check_invariants().unwrap();
    }
});
