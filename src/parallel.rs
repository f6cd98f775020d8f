//! Bounded worker fan-out over independent inputs.
//!
//! Each input is a self-contained, synchronous unit of work; workers share no
//! mutable state beyond the ordered result slots. Results always come back in
//! input order, never completion order.

use std::thread;

use parking_lot::Mutex;

/// Applies `f` to every input on a bounded pool of `threads` workers and
/// returns the results in input order.
///
/// `threads == 0` means all available cores; the count is always capped by
/// `num_cpus` and by the number of inputs. With one worker the inputs are
/// processed inline without spawning. The closure receives the input's
/// original position, and per-input failures should be returned as values so
/// one input's failure never cancels its siblings.
pub fn process_ordered<I, T, F>(inputs: &[I], threads: usize, f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(usize, &I) -> T + Sync,
{
    let threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads.min(num_cpus::get())
    }
    .min(inputs.len().max(1));

    if threads <= 1 {
        return inputs.iter().enumerate().map(|(i, x)| f(i, x)).collect();
    }

    let slots: Mutex<Vec<Option<T>>> = Mutex::new((0..inputs.len()).map(|_| None).collect());
    let chunk = inputs.len().div_ceil(threads);

    thread::scope(|scope| {
        for tid in 0..threads {
            let start = tid * chunk;
            let end = ((tid + 1) * chunk).min(inputs.len());
            if start >= end {
                break;
            }
            let slots = &slots;
            let f = &f;
            scope.spawn(move || {
                for i in start..end {
                    let out = f(i, &inputs[i]);
                    slots.lock()[i] = Some(out);
                }
            });
        }
    });

    slots
        .into_inner()
        .into_iter()
        .map(|slot| slot.unwrap()) // every slot is covered by exactly one chunk
        .collect()
}
