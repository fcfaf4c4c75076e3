#![no_main]

use std::collections::VecDeque;

use keyagent::ds::CircularQueue;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary enqueue/dequeue sequences on CircularQueue
//
// Checks FIFO order against a VecDeque bounded to the same capacity, and that
// rejected or empty operations leave the ring untouched.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let capacity = (data[0] % 8) as usize + 1;
    let mut queue: CircularQueue<u8> = CircularQueue::new(capacity);
    let mut model: VecDeque<u8> = VecDeque::new();

    for &byte in &data[1..] {
        match byte % 3 {
            0 | 1 => {
                // enqueue
                let before: Vec<u8> = queue.iter().copied().collect();
                match queue.enqueue(byte) {
                    Ok(()) => model.push_back(byte),
                    Err(full) => {
                        assert_eq!(full.into_inner(), byte);
                        assert_eq!(model.len(), capacity);
                        assert!(queue.iter().copied().eq(before));
                    }
                }
            }
            _ => {
                // dequeue
                assert_eq!(queue.dequeue(), model.pop_front());
            }
        }

        assert_eq!(queue.len(), model.len());
        assert_eq!(queue.is_full(), model.len() == capacity);
        assert_eq!(queue.peek(), model.front());
        queue.debug_validate_invariants();
    }
});
