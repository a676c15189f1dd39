//! Utility functions to decompose numeric outcome values

use dlc::RangePayout;

/// Decompose a numeric value into digits in the specified base. If the decomposed
/// value contains less than `nb_digits`, zeroes will be prepended to reach `nb_digits`
/// size.
///
/// # Panics
///
/// Panics if `value` cannot be represented with `nb_digits` digits.
pub fn decompose_value(mut value: usize, base: usize, nb_digits: usize) -> Vec<usize> {
    let mut res = vec![0; nb_digits];

    for digit in res.iter_mut().rev() {
        *digit = value % base;
        value /= base;
    }

    assert_eq!(0, value, "value does not fit in {} digits", nb_digits);

    res
}

/// Takes a decomposed representation of a numerical value in a given base and returns
/// the represented value as a `usize`
pub fn compose_value(values: &[usize], base: usize) -> usize {
    values.iter().fold(0, |acc, digit| acc * base + digit)
}

/// Extends the first range of `outcomes` so that it starts at zero and the last
/// one so that it ends at `base^nb_digits - 1`, the largest value an oracle
/// can attest to with `nb_digits` digits. When `base^nb_digits` does not fit
/// in a `usize`, the last range is extended to `usize::MAX - 1`.
pub fn pad_range_payouts(
    mut outcomes: Vec<RangePayout>,
    base: usize,
    nb_digits: usize,
) -> Vec<RangePayout> {
    if let Some(first) = outcomes.first_mut() {
        first.count += first.start;
        first.start = 0;
    }

    if let Some(last) = outcomes.last_mut() {
        let max_value = base.checked_pow(nb_digits as u32).unwrap_or(usize::MAX);
        if last.start + last.count < max_value {
            last.count = max_value - last.start;
        }
    }

    outcomes
}

/// Returns the set of decomposed prefixes that cover the range [start, end].
/// Each prefix of length `k` covers the `base^(nb_digits - k)` consecutive
/// values that start with it. The prefixes are disjoint, returned in increasing
/// order of the values they cover, and as few as possible. A range spanning
/// every value that `nb_digits` digits can represent yields the empty prefix.
///
/// # Panics
///
/// Panics if `start` is greater than `end`.
pub fn group_by_ignoring_digits(
    start: usize,
    end: usize,
    base: usize,
    nb_digits: usize,
) -> Vec<Vec<usize>> {
    assert!(start <= end, "range start {} is after its end {}", start, end);

    let mut groups = Vec::new();
    let mut cur = start;

    loop {
        // Find the largest block aligned on `cur` that does not go over `end`.
        let mut ignored = 0;
        let mut block_size = 1;
        while ignored < nb_digits {
            let block = match base.checked_pow((ignored + 1) as u32) {
                Some(b) => b,
                None => break,
            };
            if cur % block != 0 || cur + (block - 1) > end {
                break;
            }
            ignored += 1;
            block_size = block;
        }

        let mut prefix = decompose_value(cur, base, nb_digits);
        prefix.truncate(nb_digits - ignored);
        groups.push(prefix);

        let block_end = cur + (block_size - 1);
        if block_end >= end {
            break;
        }
        cur = block_end + 1;
    }

    groups
}
